//! Nobel Laureate Atlas
//!
//! Fetches the public laureate and prize datasets, keeps the laureates that
//! actually appear on a prize, folds each birth country into a canonical
//! label and renders the per-country counts as a choropleth world map.
//!
//! # Pipeline
//!
//! ```text
//! fetch(laureates) → fetch(prizes) → filter → normalize + tally → report → render → export
//! ```
//!
//! | Stage      | Module        | Output                  |
//! |------------|---------------|-------------------------|
//! | Fetch      | [`fetcher`]   | `LaureateDocument`, `PrizeDocument` |
//! | Filter     | [`filter`]    | laureates referenced by a prize |
//! | Normalize  | [`normalizer`]| `CanonicalCountry` per laureate |
//! | Tally      | [`aggregator`]| `CountryTally`          |
//! | Report     | [`report`]    | `ChoroplethReport`      |
//! | Render     | [`render`]    | Plotly `Figure`         |
//! | Export     | [`export`]    | HTML / image / JSON artifacts, browser view |
//!
//! Only a failed fetch aborts a run. Records with missing fields or unknown
//! country codes are skipped locally.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub mod aggregator;
pub mod countries;
pub mod export;
pub mod fetcher;
pub mod filter;
pub mod normalizer;
pub mod pipeline;
pub mod render;
pub mod report;

pub use aggregator::CountryTally;
pub use countries::CountryCodeTable;
pub use fetcher::{Dataset, DatasetSource, FetchConfig, FileSource, HttpSource};
pub use normalizer::{CanonicalCountry, ChainMode, CountryNormalizer, NormalizerConfig};
pub use pipeline::{Pipeline, PipelineOutput};
pub use render::{Figure, PlotlyRenderer, Renderer};
pub use report::{ChoroplethReport, ColorFloor, LocationMode, ReportConfig};

/// Laureate endpoint of the Nobel Prize API (v1)
pub const LAUREATE_URL: &str = "https://api.nobelprize.org/v1/laureate.json";

/// Prize endpoint of the Nobel Prize API (v1)
pub const PRIZE_URL: &str = "https://api.nobelprize.org/v1/prize.json";

/// Default map title
pub const DEFAULT_TITLE: &str = "Number of Nobel Prize Winners by Country of Birth";

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("failed to download {dataset} data: {reason}")]
    Fetch { dataset: Dataset, reason: String },
    #[error("{dataset} data could not be parsed: {source}")]
    Malformed {
        dataset: Dataset,
        source: serde_json::Error,
    },
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot tell the image format of {0:?} (use .png, .jpg, .webp, .svg or .pdf)")]
    ImageFormat(std::path::PathBuf),
}

impl AtlasError {
    /// True for errors raised while retrieving a dataset
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Malformed { .. } | Self::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;

/// A person or organization from the laureate dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaureateRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born_country: Option<String>,
    /// ISO 3166-1 alpha-2 code matching `born_country`, when the API knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born_country_code: Option<String>,
}

impl LaureateRecord {
    pub fn new(id: impl Into<String>, born_country: Option<&str>) -> Self {
        Self {
            id: Some(id.into()),
            born_country: born_country.map(str::to_string),
            born_country_code: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.born_country_code = Some(code.to_string());
        self
    }
}

/// Reference from a prize to one of its laureates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeLaureateRef {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
}

/// One award event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrizeRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub year: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Absent for prizes that were not awarded
    #[serde(default)]
    pub laureates: Vec<PrizeLaureateRef>,
}

impl PrizeRecord {
    /// Prize awarded to the given laureate ids
    pub fn awarded_to(ids: &[&str]) -> Self {
        Self {
            year: None,
            category: None,
            laureates: ids
                .iter()
                .map(|id| PrizeLaureateRef {
                    id: Some(id.to_string()),
                })
                .collect(),
        }
    }
}

/// Body of the laureate endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaureateDocument {
    pub laureates: Vec<LaureateRecord>,
}

/// Body of the prize endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrizeDocument {
    pub prizes: Vec<PrizeRecord>,
}

/// Accept ids written either as JSON strings or JSON numbers; anything else is treated as missing
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
