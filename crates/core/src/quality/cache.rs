//! Read-through memo for quality guesses.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::types::QualityGuess;

/// Process-lifetime cache of guesses, keyed by a filename signature.
///
/// No eviction. Concurrent misses may compute the same entry twice, which is
/// harmless since guessing is deterministic.
#[derive(Debug, Default)]
pub struct GuessCache {
    entries: RwLock<HashMap<String, QualityGuess>>,
}

impl GuessCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<QualityGuess> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: String, guess: QualityGuess) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, guess);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache key for a set of filenames. Short extensions (under four chars) are
/// stripped so `movie.mkv` and `movie.avi` share an entry.
pub fn signature(files: &[String]) -> String {
    let normalized: Vec<String> = files
        .iter()
        .map(|f| match f.rsplit_once('.') {
            Some((stem, ext)) if !ext.is_empty() && ext.len() < 4 && !ext.contains('/') => {
                stem.to_string()
            }
            _ => f.clone(),
        })
        .collect();
    normalized.join("\u{1f}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_strips_short_extensions() {
        let a = signature(&["Movie.2010.720p.mkv".to_string()]);
        let b = signature(&["Movie.2010.720p.avi".to_string()]);
        assert_eq!(a, b);
        assert_eq!(a, "Movie.2010.720p");
    }

    #[test]
    fn test_signature_keeps_long_suffix() {
        let key = signature(&["Movie.Name.1999.720p.BluRay.x264-Group".to_string()]);
        assert_eq!(key, "Movie.Name.1999.720p.BluRay.x264-Group");
    }

    #[test]
    fn test_signature_distinguishes_file_sets() {
        let one = signature(&["a".to_string(), "b".to_string()]);
        let two = signature(&["ab".to_string()]);
        assert_ne!(one, two);
    }
}
