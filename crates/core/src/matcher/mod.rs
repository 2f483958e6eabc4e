//! Title and year matching between release names and wanted media.

mod scene;
mod text;

pub use scene::{correct_name, correct_year, CanonicalTitle, SceneTitleMatcher, TitleMatcher};
pub use text::{extract_imdb, possible_titles, simplified_words, simplify};
