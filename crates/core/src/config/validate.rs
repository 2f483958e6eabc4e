use super::{types::Config, ConfigError};
use crate::filter::WordRules;

/// Validate configuration
/// Currently validates:
/// - Word rules compile (`/pattern/` groups)
/// - Search and ETA intervals are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for (field, rules) in [
        ("searcher.required_words", &config.searcher.required_words),
        ("searcher.ignored_words", &config.searcher.ignored_words),
    ] {
        WordRules::parse(rules)
            .map_err(|e| ConfigError::ValidationError(format!("{}: {}", field, e)))?;
    }

    if config.searcher.ignore_eta_interval_days == 0 {
        return Err(ConfigError::ValidationError(
            "searcher.ignore_eta_interval_days cannot be 0".to_string(),
        ));
    }

    if config.orchestrator.search_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.search_interval_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
