//! Country-of-birth normalization
//!
//! Raw `bornCountry` strings carry historical and annotated forms. Three
//! rewrite rules fold them into one label per country:
//!
//! | # | Pattern                 | Example                       | Result            |
//! |---|-------------------------|-------------------------------|-------------------|
//! | 1 | `"... (now X)"`         | `Prussia (now Germany)`       | `Germany`         |
//! | 2 | `"... (X)"`             | `Bombay (Mumbai)`             | `Mumbai`          |
//! | 3 | `"Region, X"`           | `Galicia, Austria-Hungary`    | `Austria-Hungary` |
//!
//! Rule 3 keeps only the segment after the first comma, so
//! `Sopron, Hungary, Austria-Hungary` becomes `Hungary`. Strings matching none
//! of the rules pass through unchanged, and a rewritten value is rewritten
//! again until no rule matches, so normalizing a canonical name returns it
//! as is. When a two-letter country code accompanies the name it is mapped to
//! ISO alpha-3 through [`CountryCodeTable`].

use crate::countries::CountryCodeTable;
use crate::LaureateRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SUCCESSOR_MARKER: &str = "(now ";
const COMMA_QUALIFIER: &str = ", ";

/// How the three rewrite rules combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainMode {
    /// Each pass applies the first rule that matches
    #[default]
    FirstMatch,
    /// Each pass applies every rule in turn to the value left by the previous one
    Cascade,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizerConfig {
    pub mode: ChainMode,
}

/// Normalized birth country of one laureate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalCountry {
    pub name: String,
    /// ISO 3166-1 alpha-3 code, only when a recognized alpha-2 code came with the name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso3: Option<String>,
}

/// Text after `"(now "` up to the closing parenthesis (or the end when unclosed)
fn successor_state(s: &str) -> Option<&str> {
    let start = s.find(SUCCESSOR_MARKER)? + SUCCESSOR_MARKER.len();
    Some(up_to_close(&s[start..]))
}

/// Text inside the first parenthesis
fn parenthetical(s: &str) -> Option<&str> {
    let start = s.find('(')? + 1;
    Some(up_to_close(&s[start..]))
}

/// Segment between the first `", "` and the next one (or the end)
fn after_qualifier(s: &str) -> Option<&str> {
    let rest = &s[s.find(COMMA_QUALIFIER)? + COMMA_QUALIFIER.len()..];
    Some(rest.find(COMMA_QUALIFIER).map_or(rest, |end| &rest[..end]))
}

fn up_to_close(s: &str) -> &str {
    s.find(')').map_or(s, |end| &s[..end])
}

/// One pass of the rule chain; `None` when no rule matched.
/// A match always yields a strictly shorter value.
fn rewrite(s: &str, mode: ChainMode) -> Option<&str> {
    match mode {
        ChainMode::FirstMatch => successor_state(s)
            .or_else(|| parenthetical(s))
            .or_else(|| after_qualifier(s)),
        ChainMode::Cascade => {
            let mut current = s;
            let mut matched = false;
            let rules: [fn(&str) -> Option<&str>; 3] =
                [successor_state, parenthetical, after_qualifier];
            for rule in rules {
                if let Some(next) = rule(current) {
                    current = next;
                    matched = true;
                }
            }
            matched.then_some(current)
        }
    }
}

/// Normalize a raw country-of-birth string
pub fn normalize_name(raw: &str, mode: ChainMode) -> String {
    let mut current = raw;
    while let Some(next) = rewrite(current, mode) {
        current = next;
    }
    current.to_string()
}

/// Maps laureate records to canonical countries
#[derive(Debug, Clone)]
pub struct CountryNormalizer {
    mode: ChainMode,
    codes: CountryCodeTable,
}

impl Default for CountryNormalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl CountryNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self::with_table(config, CountryCodeTable::with_defaults())
    }

    pub fn with_table(config: NormalizerConfig, codes: CountryCodeTable) -> Self {
        Self {
            mode: config.mode,
            codes,
        }
    }

    pub fn mode(&self) -> ChainMode {
        self.mode
    }

    /// Alpha-3 code for a raw alpha-2 code
    pub fn resolve_code(&self, alpha2: &str) -> Option<String> {
        let resolved = self.codes.alpha3(alpha2).map(str::to_string);
        if resolved.is_none() {
            debug!("Unrecognized country code {:?}", alpha2);
        }
        resolved
    }

    /// Canonical country of a laureate; `None` when the birth country is missing or empty
    pub fn normalize(&self, laureate: &LaureateRecord) -> Option<CanonicalCountry> {
        let raw = laureate
            .born_country
            .as_deref()
            .filter(|country| !country.is_empty())?;

        let name = normalize_name(raw, self.mode);
        let iso3 = laureate
            .born_country_code
            .as_deref()
            .and_then(|code| self.resolve_code(code));

        Some(CanonicalCountry { name, iso3 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn first(raw: &str) -> String {
        normalize_name(raw, ChainMode::FirstMatch)
    }

    fn cascade(raw: &str) -> String {
        normalize_name(raw, ChainMode::Cascade)
    }

    #[test]
    fn test_successor_state_rule() {
        assert_eq!(first("Prussia (now Germany)"), "Germany");
        assert_eq!(first("Russian Empire (now Poland)"), "Poland");
        assert_eq!(first("Java, Dutch East Indies (now Indonesia)"), "Indonesia");
    }

    #[test]
    fn test_parenthetical_rule() {
        assert_eq!(first("Bombay (Mumbai)"), "Mumbai");
        assert_eq!(first("Hesse (Germany)"), "Germany");
    }

    #[test]
    fn test_comma_qualifier_rule() {
        assert_eq!(first("Galicia, Austria-Hungary"), "Austria-Hungary");
        assert_eq!(first("Faroe Islands, Denmark"), "Denmark");

        // Only the segment after the first comma survives
        let raw = "Sopron, Hungary, Austria-Hungary";
        assert_eq!(first(raw), "Hungary");
        assert_eq!(cascade(raw), "Hungary");
        assert_eq!(first(&first(raw)), first(raw));
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(first("France"), "France");
        assert_eq!(first("Guadeloupe Island"), "Guadeloupe Island");
        assert_eq!(first("Bosnia and Herzegovina"), "Bosnia and Herzegovina");
        assert_eq!(first("Guinea-Bissau"), "Guinea-Bissau");
    }

    #[test]
    fn test_degenerate_parentheses() {
        assert_eq!(first("Austria (now "), "");
        assert_eq!(first("Austria (now"), "now");
        assert_eq!(first("Prussia (now Germany"), "Germany");
        assert_eq!(first("Vienna (Austria"), "Austria");
        assert_eq!(first("Nowhere ()"), "");
        assert_eq!(first("Trailing, "), "");
    }

    #[test]
    fn test_overlapping_patterns_settle() {
        let raw = "Prussia (now Poland, Russia)";
        assert_eq!(first(raw), "Russia");
        assert_eq!(cascade(raw), "Russia");
        assert_eq!(first("Poland, Russia"), "Russia");

        let nested = "Vienna (Leopoldstadt, Austria, Lower Austria (NOE))";
        assert_eq!(first(nested), "NOE");
        assert_eq!(cascade(nested), "Austria");

        // Agree when only one pattern is present
        for raw in ["Prussia (now Germany)", "Bombay (Mumbai)", "Galicia, Austria-Hungary", "France"] {
            assert_eq!(first(raw), cascade(raw));
        }
    }

    #[test]
    fn test_normalizer_mode() {
        assert_eq!(CountryNormalizer::default().mode(), ChainMode::FirstMatch);

        let cascading = CountryNormalizer::new(NormalizerConfig {
            mode: ChainMode::Cascade,
        });
        assert_eq!(cascading.mode(), ChainMode::Cascade);

        let laureate = LaureateRecord::new("7", Some("Vienna (Leopoldstadt, Austria, Lower Austria (NOE))"));
        assert_eq!(cascading.normalize(&laureate).unwrap().name, "Austria");
    }

    #[test]
    fn test_normalize_record() {
        let normalizer = CountryNormalizer::default();

        let plain = LaureateRecord::new("1", Some("Prussia (now Germany)"));
        assert_eq!(
            normalizer.normalize(&plain),
            Some(CanonicalCountry {
                name: "Germany".to_string(),
                iso3: None
            })
        );

        let coded = LaureateRecord::new("6", Some("Russian Empire (now Poland)")).with_code("PL");
        assert_eq!(normalizer.normalize(&coded).unwrap().iso3.as_deref(), Some("POL"));
    }

    #[test]
    fn test_missing_or_empty_country() {
        let normalizer = CountryNormalizer::default();
        assert!(normalizer.normalize(&LaureateRecord::new("1", None)).is_none());
        assert!(normalizer.normalize(&LaureateRecord::new("2", Some(""))).is_none());

        // A code alone does not make a country
        let code_only = LaureateRecord::new("3", None).with_code("FR");
        assert!(normalizer.normalize(&code_only).is_none());
    }

    #[test]
    fn test_unknown_code_keeps_name() {
        let normalizer = CountryNormalizer::default();
        let laureate = LaureateRecord::new("4", Some("Atlantis")).with_code("QQ");

        let canonical = normalizer.normalize(&laureate).unwrap();
        assert_eq!(canonical.name, "Atlantis");
        assert_eq!(canonical.iso3, None);
    }

    proptest! {
        #[test]
        fn prop_canonical_names_are_fixed_points(name in "[A-Za-z][A-Za-z .'-]{0,30}") {
            prop_assert_eq!(first(&name), name.clone());
            prop_assert_eq!(cascade(&name), name);
        }

        #[test]
        fn prop_normalization_is_idempotent(
            old in "[A-Za-z][A-Za-z .-]{0,20}",
            new in "[A-Za-z][A-Za-z.-]{0,20}",
            tail in "[A-Za-z][A-Za-z .-]{0,20}",
            rule in 0usize..4,
        ) {
            let raw = match rule {
                0 => format!("{} (now {})", old, new),
                1 => format!("{} ({})", old, new),
                2 => format!("{}, {}", old, new),
                _ => format!("{}, {}, {}", old, new, tail),
            };
            for mode in [ChainMode::FirstMatch, ChainMode::Cascade] {
                let once = normalize_name(&raw, mode);
                prop_assert_eq!(&once, &new);
                prop_assert_eq!(normalize_name(&once, mode), once.clone());
            }
        }

        #[test]
        fn prop_any_string_settles(raw in "[A-Za-z (),]{0,40}") {
            for mode in [ChainMode::FirstMatch, ChainMode::Cascade] {
                let once = normalize_name(&raw, mode);
                prop_assert_eq!(normalize_name(&once, mode), once.clone());
            }
        }
    }
}
