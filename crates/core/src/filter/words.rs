//! Required/ignored word rules.
//!
//! A rule string is a comma-separated list of groups. A group matches when
//! all of its `&`-separated words are present, or, when wrapped in slashes
//! (`/pattern/`), when the pattern matches the simplified release name.

use std::collections::HashSet;

use regex_lite::Regex;
use thiserror::Error;

/// A `/pattern/` group that does not compile.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid word pattern {pattern}: {message}")]
pub struct WordPatternError {
    pub pattern: String,
    pub message: String,
}

#[derive(Debug, Clone)]
enum GroupKind {
    AllOf(Vec<String>),
    Pattern(Regex),
}

/// One comma-separated entry of a rule string.
#[derive(Debug, Clone)]
pub struct WordGroup {
    source: String,
    kind: GroupKind,
}

impl WordGroup {
    fn parse(source: &str) -> Result<Self, WordPatternError> {
        let kind = if source.len() >= 2 && source.starts_with('/') && source.ends_with('/') {
            let pattern = &source[1..source.len() - 1];
            let regex = Regex::new(pattern).map_err(|e| WordPatternError {
                pattern: source.to_string(),
                message: e.to_string(),
            })?;
            GroupKind::Pattern(regex)
        } else {
            let words: Vec<String> = source
                .split('&')
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect();
            GroupKind::AllOf(words)
        };

        Ok(Self {
            source: source.to_string(),
            kind,
        })
    }

    /// The group as written in the rule string.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// `name` must be simplified; `words` are its words.
    pub fn matches(&self, name: &str, words: &HashSet<&str>) -> bool {
        match &self.kind {
            GroupKind::AllOf(parts) => {
                !parts.is_empty() && parts.iter().all(|p| words.contains(p.as_str()))
            }
            GroupKind::Pattern(regex) => regex.is_match(name),
        }
    }
}

/// Parsed rule string.
#[derive(Debug, Clone, Default)]
pub struct WordRules {
    groups: Vec<WordGroup>,
}

impl WordRules {
    pub fn parse(rules: &str) -> Result<Self, WordPatternError> {
        let mut parsed = Self::default();
        parsed.extend(rules)?;
        Ok(parsed)
    }

    /// Add the groups of another rule string, skipping duplicates.
    pub fn extend(&mut self, rules: &str) -> Result<(), WordPatternError> {
        for entry in rules.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            if self.groups.iter().any(|g| g.source.eq_ignore_ascii_case(entry)) {
                continue;
            }
            self.groups.push(WordGroup::parse(entry)?);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// First group satisfied by the name.
    pub fn first_match(&self, name: &str, words: &HashSet<&str>) -> Option<&WordGroup> {
        self.groups.iter().find(|g| g.matches(name, words))
    }
}
