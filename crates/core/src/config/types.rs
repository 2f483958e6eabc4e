use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;
use crate::searcher::SearchMethod;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub searcher: SearcherConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("hunter.db")
}

/// Search policy shared by the correctness filter and the orchestrator
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearcherConfig {
    /// Protocol to favour when ordering results
    #[serde(default)]
    pub preferred_method: SearchMethod,
    /// Comma-separated groups; a release must match at least one
    #[serde(default)]
    pub required_words: String,
    /// Comma-separated groups; a release must match none
    #[serde(default = "default_ignored_words")]
    pub ignored_words: String,
    /// Usenet retention in days (0 = no limit)
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Torrents with fewer seeders are skipped
    #[serde(default = "default_minimum_seeders")]
    pub minimum_seeders: u32,
    /// Search and download regardless of release dates
    #[serde(default)]
    pub always_search: bool,
    /// How often a search may ignore release dates once
    #[serde(default = "default_ignore_eta_interval_days")]
    pub ignore_eta_interval_days: u32,
}

impl Default for SearcherConfig {
    fn default() -> Self {
        Self {
            preferred_method: SearchMethod::default(),
            required_words: String::new(),
            ignored_words: default_ignored_words(),
            retention_days: default_retention_days(),
            minimum_seeders: default_minimum_seeders(),
            always_search: false,
            ignore_eta_interval_days: default_ignore_eta_interval_days(),
        }
    }
}

fn default_ignored_words() -> String {
    "german, dutch, french, truefrench, danish, swedish, spanish, italian, korean, dubbed, swesub, korsub, dksubs, vain".to_string()
}

fn default_retention_days() -> u32 {
    1500
}

fn default_minimum_seeders() -> u32 {
    1
}

fn default_ignore_eta_interval_days() -> u32 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.database.path, PathBuf::from("hunter.db"));
        assert_eq!(config.searcher.preferred_method, SearchMethod::Both);
        assert_eq!(config.searcher.retention_days, 1500);
        assert_eq!(config.searcher.minimum_seeders, 1);
        assert_eq!(config.searcher.ignore_eta_interval_days, 7);
        assert!(config.searcher.ignored_words.contains("truefrench"));
        assert!(!config.orchestrator.enabled);
    }

    #[test]
    fn test_deserialize_searcher_section() {
        let toml = r#"
[searcher]
preferred_method = "nzb"
required_words = "x264, /\\bhevc\\b/"
ignored_words = ""
always_search = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.searcher.preferred_method, SearchMethod::Nzb);
        assert_eq!(config.searcher.required_words, r"x264, /\bhevc\b/");
        assert!(config.searcher.ignored_words.is_empty());
        assert!(config.searcher.always_search);
        assert_eq!(config.searcher.retention_days, 1500);
    }

    #[test]
    fn test_deserialize_unknown_method_fails() {
        let toml = r#"
[searcher]
preferred_method = "ftp"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }
}
