//! Text normalisation shared by title matching and word rules.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static IMDB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"tt\d{7,8}").unwrap());

/// Lower-case, strip diacritics and collapse every run of non-alphanumeric
/// characters (underscore included) into a single space.
pub fn simplify(text: &str) -> String {
    let stripped: String = text.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    stripped
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Words of the simplified text.
pub fn simplified_words(text: &str) -> Vec<String> {
    simplify(text).split(' ').filter(|w| !w.is_empty()).map(str::to_string).collect()
}

/// Spellings of a title worth matching against.
pub fn possible_titles(raw_title: &str) -> Vec<String> {
    let candidates = [
        simplify(raw_title),
        simplify(&raw_title.replace('&', " and ")),
        simplify(&raw_title.replace(" and ", " & ")),
    ];

    let mut titles: Vec<String> = Vec::with_capacity(candidates.len());
    for title in candidates {
        if !title.is_empty() && !titles.contains(&title) {
            titles.push(title);
        }
    }
    titles
}

/// First IMDB identifier (`tt` plus 7 or 8 digits) in the text.
pub fn extract_imdb(text: &str) -> Option<String> {
    IMDB_ID.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify_strips_diacritics_and_punctuation() {
        assert_eq!(simplify("Amélie (2001)"), "amelie 2001");
        assert_eq!(simplify("Movie.Name_2010-GRP"), "movie name 2010 grp");
        assert_eq!(simplify("  Crème  Brûlée!! "), "creme brulee");
        assert_eq!(simplify("..."), "");
    }

    #[test]
    fn test_simplified_words() {
        assert_eq!(simplified_words("The Movie: Part II"), vec!["the", "movie", "part", "ii"]);
        assert!(simplified_words("").is_empty());
    }

    #[test]
    fn test_possible_titles_expand_ampersand() {
        let titles = possible_titles("Fast & Furious");
        assert!(titles.contains(&"fast furious".to_string()));
        assert!(titles.contains(&"fast and furious".to_string()));
        assert_eq!(possible_titles("Movie Name"), vec!["movie name".to_string()]);
    }

    #[test]
    fn test_extract_imdb() {
        assert_eq!(
            extract_imdb("see http://www.imdb.com/title/tt0133093/ for details"),
            Some("tt0133093".to_string())
        );
        assert_eq!(extract_imdb("tt12345678"), Some("tt12345678".to_string()));
        assert_eq!(extract_imdb("tt123"), None);
        assert_eq!(extract_imdb(""), None);
    }
}
