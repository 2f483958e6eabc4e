//! Ordered table of quality tiers.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info};

use super::types::{QualityError, QualityTier, SizeOverride, TagMatcher};

const BUILTIN_CATALOG: &str = include_str!("catalog.toml");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    pre_releases: Vec<String>,
    tiers: Vec<QualityTier>,
}

/// Read-only, ordered quality catalog.
///
/// Index 0 is the best tier. Identifiers are unique and never change after
/// load; only size bounds may be overridden, and only before the catalog is
/// shared.
#[derive(Debug, Clone)]
pub struct QualityCatalog {
    tiers: Vec<QualityTier>,
    index: HashMap<String, usize>,
    pre_releases: Vec<String>,
}

impl QualityCatalog {
    /// The built-in movie catalog.
    pub fn builtin() -> Result<Self, QualityError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Load a catalog from a TOML document with `pre_releases` and `[[tiers]]`.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, QualityError> {
        let file: CatalogFile =
            toml::from_str(toml_str).map_err(|e| QualityError::Parse(e.to_string()))?;
        Self::from_tiers(file.tiers, file.pre_releases)
    }

    /// Build a catalog from tiers listed best first.
    ///
    /// Fails on duplicate identifiers, `allow`/pre-release references to
    /// unknown tiers and inconsistent size ranges.
    pub fn from_tiers(
        tiers: Vec<QualityTier>,
        pre_releases: Vec<String>,
    ) -> Result<Self, QualityError> {
        let mut index = HashMap::with_capacity(tiers.len());
        let mut normalized = Vec::with_capacity(tiers.len());

        for (order, mut tier) in tiers.into_iter().enumerate() {
            tier.identifier = tier.identifier.to_lowercase();
            tier.order = order;
            tier.alternative = tier.alternative.into_iter().map(lowercase).collect();
            tier.tags = tier.tags.into_iter().map(lowercase).collect();
            tier.extensions = tier.extensions.iter().map(|e| e.to_lowercase()).collect();
            tier.allow = tier.allow.iter().map(|a| a.to_lowercase()).collect();

            validate_sizes(&tier, tier.size_min, tier.size_max)?;

            if index.insert(tier.identifier.clone(), order).is_some() {
                return Err(QualityError::DuplicateIdentifier(tier.identifier));
            }
            normalized.push(tier);
        }

        for tier in &normalized {
            if let Some(unknown) = tier.allow.iter().find(|a| !index.contains_key(*a)) {
                return Err(QualityError::UnknownIdentifier(unknown.clone()));
            }
        }

        let pre_releases: Vec<String> = pre_releases.iter().map(|p| p.to_lowercase()).collect();
        if let Some(unknown) = pre_releases.iter().find(|p| !index.contains_key(*p)) {
            return Err(QualityError::UnknownIdentifier(unknown.clone()));
        }

        debug!("Loaded quality catalog with {} tiers", normalized.len());

        Ok(Self {
            tiers: normalized,
            index,
            pre_releases,
        })
    }

    /// Apply persisted size bounds. Overrides for unknown tiers are an error.
    pub fn apply_size_overrides(&mut self, overrides: &[SizeOverride]) -> Result<(), QualityError> {
        for o in overrides {
            let idx = *self
                .index
                .get(&o.identifier.to_lowercase())
                .ok_or_else(|| QualityError::UnknownIdentifier(o.identifier.clone()))?;
            let tier = &mut self.tiers[idx];
            validate_sizes(tier, o.size_min, o.size_max)?;

            if tier.size_min != o.size_min || tier.size_max != o.size_max {
                info!(
                    "Quality {} size override: {}-{} MB",
                    tier.identifier, o.size_min, o.size_max
                );
            }
            tier.size_min = o.size_min;
            tier.size_max = o.size_max;
            tier.median_size = tier.median_size.clamp(o.size_min, o.size_max);
        }
        Ok(())
    }

    pub fn get(&self, identifier: &str) -> Option<&QualityTier> {
        self.index.get(identifier).map(|&i| &self.tiers[i])
    }

    /// All tiers, best first.
    pub fn all(&self) -> &[QualityTier] {
        &self.tiers
    }

    pub fn order_index_of(&self, identifier: &str) -> Option<usize> {
        self.index.get(identifier).copied()
    }

    /// Tiers that exist before an official release (cam, telesync, ...).
    pub fn pre_releases(&self) -> &[String] {
        &self.pre_releases
    }

    pub fn is_pre_release(&self, identifier: &str) -> bool {
        self.pre_releases.iter().any(|p| p == identifier)
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

fn lowercase(tag: TagMatcher) -> TagMatcher {
    match tag {
        TagMatcher::Word(w) => TagMatcher::Word(w.to_lowercase()),
        TagMatcher::AllOf(parts) => {
            TagMatcher::AllOf(parts.into_iter().map(|p| p.to_lowercase()).collect())
        }
    }
}

fn validate_sizes(tier: &QualityTier, size_min: u64, size_max: u64) -> Result<(), QualityError> {
    if size_min > size_max || size_max == 0 {
        return Err(QualityError::InvalidSizeRange {
            identifier: tier.identifier.clone(),
            size_min,
            size_max,
            median_size: tier.median_size,
        });
    }
    Ok(())
}
