//! Per-country laureate counts

use crate::normalizer::{CanonicalCountry, CountryNormalizer};
use crate::LaureateRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Laureate count per canonical country, plus the alpha-3 code last seen for it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryTally {
    pub counts: HashMap<String, usize>,
    pub codes: HashMap<String, String>,
    /// Laureates with no usable birth country
    pub skipped: usize,
    /// Laureates whose country code had no ISO alpha-3 equivalent
    pub unresolved_codes: usize,
}

impl CountryTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and count every laureate
    pub fn from_laureates(laureates: &[LaureateRecord], normalizer: &CountryNormalizer) -> Self {
        let mut tally = Self::new();
        debug!("Normalizing countries with {:?} rule chain", normalizer.mode());

        for laureate in laureates {
            match normalizer.normalize(laureate) {
                Some(country) => {
                    if laureate.born_country_code.is_some() && country.iso3.is_none() {
                        tally.unresolved_codes += 1;
                    }
                    tally.record(country);
                }
                None => {
                    debug!("Skipping laureate {:?}: no country of birth", laureate.id);
                    tally.skipped += 1;
                }
            }
        }

        info!(
            "Counted {} laureates across {} countries ({} without birth country, {} unresolved codes)",
            tally.total(),
            tally.counts.len(),
            tally.skipped,
            tally.unresolved_codes
        );

        tally
    }

    /// Count one laureate. A later code for the same country replaces an earlier one.
    pub fn record(&mut self, country: CanonicalCountry) {
        if let Some(code) = country.iso3 {
            self.codes.insert(country.name.clone(), code);
        }
        *self.counts.entry(country.name).or_insert(0) += 1;
    }

    pub fn count(&self, country: &str) -> usize {
        self.counts.get(country).copied().unwrap_or(0)
    }

    pub fn code(&self, country: &str) -> Option<&str> {
        self.codes.get(country).map(String::as_str)
    }

    /// Laureates counted across all countries
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Countries by descending count, ties by name
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}
