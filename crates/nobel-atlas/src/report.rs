//! Choropleth report assembly
//!
//! Turns a [`CountryTally`] into the rows and color axis the renderer
//! consumes. The legend carries three ticks:
//!
//! ```text
//! floor "(Min)"   max/2 "(Medium)"   max "(Max)"
//! ```

use crate::aggregator::CountryTally;
use crate::DEFAULT_TITLE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// How the renderer interprets row locations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationMode {
    /// Canonical country names
    #[default]
    CountryNames,
    /// ISO 3166-1 alpha-3 codes
    Iso3,
}

impl LocationMode {
    /// Plotly `locationmode` value
    pub fn as_plotly(&self) -> &'static str {
        match self {
            Self::CountryNames => "country names",
            Self::Iso3 => "ISO-3",
        }
    }
}

/// Lower bound of the color axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorFloor {
    #[default]
    One,
    Zero,
}

impl ColorFloor {
    pub fn value(&self) -> usize {
        match self {
            Self::One => 1,
            Self::Zero => 0,
        }
    }
}

/// Presentation options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub title: String,
    /// Named Plotly continuous color scale
    pub color_scale: String,
    pub location_mode: LocationMode,
    pub floor: ColorFloor,
    pub colorbar_title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            color_scale: "Viridis".to_string(),
            location_mode: LocationMode::CountryNames,
            floor: ColorFloor::One,
            colorbar_title: "Count".to_string(),
        }
    }
}

/// One map location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Country name or alpha-3 code, depending on [`LocationMode`]
    pub location: String,
    pub count: usize,
    /// Hover label (canonical country name)
    pub label: String,
}

/// Legend tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorAxis {
    pub min: usize,
    pub max: usize,
    pub ticks: Vec<Tick>,
}

impl ColorAxis {
    pub fn new(min: usize, max: usize) -> Self {
        let mid = max as f64 / 2.0;
        let ticks = vec![
            Tick {
                value: min as f64,
                label: format!("{} (Min)", min),
            },
            Tick {
                value: mid,
                label: format!("{} (Medium)", max / 2),
            },
            Tick {
                value: max as f64,
                label: format!("{} (Max)", max),
            },
        ];
        Self { min, max, ticks }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Laureates counted in the tally
    pub total_laureates: usize,
    /// Laureates that landed on a map row
    pub mapped_laureates: usize,
    pub countries: usize,
    pub generated_at: String,
}

/// Everything the renderer needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoroplethReport {
    pub config: ReportConfig,
    pub rows: Vec<ReportRow>,
    pub color_axis: ColorAxis,
    pub metadata: ReportMetadata,
}

/// Build the choropleth table from a tally.
///
/// In [`LocationMode::Iso3`] countries without a retained code are left off
/// the map, and countries sharing a code share one row. A tally with nothing
/// to place still yields a report; the map is then blank.
pub fn build_report(tally: &CountryTally, config: &ReportConfig) -> ChoroplethReport {
    if tally.is_empty() {
        warn!("No laureate has a resolvable country of birth");
    }

    let mut rows: Vec<ReportRow> = Vec::new();
    let mut by_location: HashMap<String, usize> = HashMap::new();
    let mut unmapped = 0;

    for (name, count) in tally.ranked() {
        let location = match config.location_mode {
            LocationMode::CountryNames => name.to_string(),
            LocationMode::Iso3 => match tally.code(name) {
                Some(code) => code.to_string(),
                None => {
                    debug!("No ISO-3 code for {:?}, left off the map", name);
                    unmapped += count;
                    continue;
                }
            },
        };

        match by_location.get(&location) {
            Some(&i) => {
                rows[i].count += count;
                rows[i].label.push_str(", ");
                rows[i].label.push_str(name);
            }
            None => {
                by_location.insert(location.clone(), rows.len());
                rows.push(ReportRow {
                    location,
                    count,
                    label: name.to_string(),
                });
            }
        }
    }

    if rows.is_empty() && !tally.is_empty() {
        warn!("None of the {} counted countries can be placed on the map", tally.counts.len());
    }

    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.location.cmp(&b.location)));

    let floor = config.floor.value();
    let max = rows.iter().map(|r| r.count).max().unwrap_or(floor);
    let color_axis = ColorAxis::new(floor, max);
    let mapped_laureates = rows.iter().map(|r| r.count).sum();

    if unmapped > 0 {
        info!("{} laureates have no ISO-3 code and are not mapped", unmapped);
    }
    info!(
        "Report: {} locations, color range {}..={}",
        rows.len(),
        color_axis.min,
        color_axis.max
    );

    ChoroplethReport {
        config: config.clone(),
        metadata: ReportMetadata {
            total_laureates: tally.total(),
            mapped_laureates,
            countries: rows.len(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        },
        rows,
        color_axis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::CanonicalCountry;

    fn tally(entries: &[(&str, Option<&str>, usize)]) -> CountryTally {
        let mut tally = CountryTally::new();
        for &(name, iso3, count) in entries {
            for _ in 0..count {
                tally.record(CanonicalCountry {
                    name: name.to_string(),
                    iso3: iso3.map(str::to_string),
                });
            }
        }
        tally
    }

    #[test]
    fn test_name_rows() {
        let tally = tally(&[("France", None, 2), ("Germany", None, 1)]);
        let report = build_report(&tally, &ReportConfig::default());

        assert_eq!(
            report.rows,
            vec![
                ReportRow {
                    location: "France".to_string(),
                    count: 2,
                    label: "France".to_string()
                },
                ReportRow {
                    location: "Germany".to_string(),
                    count: 1,
                    label: "Germany".to_string()
                },
            ]
        );
        assert_eq!(report.metadata.total_laureates, 3);
        assert_eq!(report.metadata.mapped_laureates, 3);
    }

    #[test]
    fn test_color_axis_ticks() {
        let axis = ColorAxis::new(1, 7);
        assert_eq!(axis.min, 1);
        assert_eq!(axis.max, 7);

        let values: Vec<f64> = axis.ticks.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![1.0, 3.5, 7.0]);

        let labels: Vec<&str> = axis.ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["1 (Min)", "3 (Medium)", "7 (Max)"]);
    }

    #[test]
    fn test_zero_floor() {
        let tally = tally(&[("Sweden", None, 4)]);
        let config = ReportConfig {
            floor: ColorFloor::Zero,
            ..ReportConfig::default()
        };

        let report = build_report(&tally, &config);
        assert_eq!(report.color_axis.min, 0);
        assert_eq!(report.color_axis.max, 4);
        assert_eq!(report.color_axis.ticks[0].label, "0 (Min)");
        assert_eq!(report.color_axis.ticks[1].label, "2 (Medium)");
    }

    #[test]
    fn test_iso3_rows() {
        let tally = tally(&[
            ("Germany", Some("DEU"), 3),
            ("West Germany", Some("DEU"), 1),
            ("Scotland", None, 2),
            ("France", Some("FRA"), 2),
        ]);
        let config = ReportConfig {
            location_mode: LocationMode::Iso3,
            ..ReportConfig::default()
        };

        let report = build_report(&tally, &config);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].location, "DEU");
        assert_eq!(report.rows[0].count, 4);
        assert_eq!(report.rows[0].label, "Germany, West Germany");
        assert_eq!(report.rows[1].location, "FRA");
        assert_eq!(report.metadata.total_laureates, 8);
        assert_eq!(report.metadata.mapped_laureates, 6);
        assert_eq!(report.color_axis.max, 4);
    }

    #[test]
    fn test_empty_tally_gives_blank_map() {
        let report = build_report(&CountryTally::new(), &ReportConfig::default());
        assert!(report.rows.is_empty());
        assert_eq!(report.color_axis.min, 1);
        assert_eq!(report.color_axis.max, 1);
        assert_eq!(report.metadata.total_laureates, 0);
        assert_eq!(report.metadata.countries, 0);

        // Names present but none carries a code
        let config = ReportConfig {
            location_mode: LocationMode::Iso3,
            floor: ColorFloor::Zero,
            ..ReportConfig::default()
        };
        let report = build_report(&tally(&[("Scotland", None, 1)]), &config);
        assert!(report.rows.is_empty());
        assert_eq!(report.metadata.total_laureates, 1);
        assert_eq!(report.metadata.mapped_laureates, 0);
        assert_eq!((report.color_axis.min, report.color_axis.max), (0, 0));
    }

    #[test]
    fn test_plotly_location_modes() {
        assert_eq!(LocationMode::CountryNames.as_plotly(), "country names");
        assert_eq!(LocationMode::Iso3.as_plotly(), "ISO-3");
    }
}
