//! Report filtering for selective output.
//!
//! Allows configuring which decoded reports to print based on station
//! patterns, report kind, wind, visibility and ceiling thresholds.

use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};
use std::fmt;

use crate::report::{Report, ReportKind, RespectModifier};

/// A list of patterns that deserializes from either a string or array.
///
/// Used for the station field to allow both:
/// - `station = "K*"` (single pattern)
/// - `station = ["KJFK", "KLGA"]` (multiple patterns with OR logic)
#[derive(Debug, Clone, Default)]
pub struct PatternList(Vec<String>);

impl PatternList {
    pub fn patterns(&self) -> &[String] {
        &self.0
    }

    /// Check if any pattern matches the value.
    pub fn matches_any(&self, value: &str) -> bool {
        self.0.iter().any(|p| matches_wildcard(p, value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for PatternList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PatternListVisitor;

        impl<'de> Visitor<'de> for PatternListVisitor {
            type Value = PatternList;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or array of strings")
            }

            fn visit_str<E>(self, value: &str) -> Result<PatternList, E>
            where
                E: de::Error,
            {
                Ok(PatternList(vec![value.to_string()]))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<PatternList, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut patterns = Vec::new();
                while let Some(value) = seq.next_element::<String>()? {
                    patterns.push(value);
                }
                Ok(PatternList(patterns))
            }
        }

        deserializer.deserialize_any(PatternListVisitor)
    }
}

/// A filter for matching decoded reports.
///
/// All specified fields must match (AND logic).
/// Use multiple filters for OR logic.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportFilter {
    /// Optional name for this filter, logged when it matches a report.
    pub name: Option<String>,

    /// Station identifier patterns (supports `*` wildcard for prefix/suffix).
    pub station: Option<PatternList>,

    /// Report kinds to match.
    pub kinds: Option<Vec<ReportKind>>,

    /// Respect modifiers to match.
    pub modifiers: Option<Vec<RespectModifier>>,

    /// Minimum sustained wind speed in knots.
    pub min_wind_knots: Option<u16>,

    /// Minimum gust speed in knots; reports without gusts never match.
    pub min_gust_knots: Option<u16>,

    /// Maximum visibility in statute miles.
    pub max_visibility_miles: Option<f64>,

    /// Maximum ceiling in feet; reports without a ceiling never match.
    pub max_ceiling_ft: Option<u32>,

    /// Require (or forbid) present-weather groups.
    pub has_weather: Option<bool>,
}

impl ReportFilter {
    /// Check if a report matches this filter.
    ///
    /// All specified fields must match (AND logic).
    pub fn matches(&self, report: &Report) -> bool {
        if let Some(ref patterns) = self.station
            && !patterns.is_empty()
            && !patterns.matches_any(&report.station)
        {
            return false;
        }

        if let Some(ref kinds) = self.kinds
            && !kinds.contains(&report.kind)
        {
            return false;
        }

        if let Some(ref modifiers) = self.modifiers
            && !modifiers.contains(&report.modifier)
        {
            return false;
        }

        if let Some(min_wind) = self.min_wind_knots
            && report.wind.speed_knots() < min_wind
        {
            return false;
        }

        if let Some(min_gust) = self.min_gust_knots {
            match report.wind.gust_knots() {
                Some(gust) if gust >= min_gust => {}
                _ => return false,
            }
        }

        if let Some(max_vis) = self.max_visibility_miles
            && report.visibility.distance.as_f64() > max_vis
        {
            return false;
        }

        if let Some(max_ceiling) = self.max_ceiling_ft {
            match report.ceiling_ft() {
                Some(ceiling) if ceiling <= max_ceiling => {}
                _ => return false,
            }
        }

        if let Some(has_weather) = self.has_weather
            && report.weather.is_empty() == has_weather
        {
            return false;
        }

        true
    }

    /// Validate the filter configuration.
    ///
    /// Returns an error if any patterns are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref patterns) = self.station {
            for pattern in patterns.patterns() {
                validate_wildcard_pattern(pattern)?;
            }
        }
        if let Some(max_vis) = self.max_visibility_miles
            && max_vis < 0.0
        {
            return Err(format!("max_visibility_miles must be non-negative, got {}", max_vis));
        }
        Ok(())
    }
}

/// Check if any filter in the list matches the report.
///
/// Returns `true` if at least one filter matches (OR logic).
/// Returns `false` if the list is empty.
pub fn any_filter_matches(filters: &[ReportFilter], report: &Report) -> bool {
    first_match(filters, report).is_some()
}

/// Return the first filter that matches the report, if any.
pub fn first_match<'f>(filters: &'f [ReportFilter], report: &Report) -> Option<&'f ReportFilter> {
    filters.iter().find(|f| f.matches(report))
}

/// Match a string against a wildcard pattern.
///
/// Supports `*` as prefix or suffix wildcard (not both).
/// Matching is case-insensitive.
fn matches_wildcard(pattern: &str, value: &str) -> bool {
    let pattern_upper = pattern.to_ascii_uppercase();
    let value_upper = value.to_ascii_uppercase();

    if let Some(suffix) = pattern_upper.strip_prefix('*') {
        value_upper.ends_with(suffix)
    } else if let Some(prefix) = pattern_upper.strip_suffix('*') {
        value_upper.starts_with(prefix)
    } else {
        pattern_upper == value_upper
    }
}

fn validate_wildcard_pattern(pattern: &str) -> Result<(), String> {
    let wildcard_count = pattern.chars().filter(|&c| c == '*').count();

    if wildcard_count > 1 {
        return Err(format!(
            "Pattern '{}' has multiple wildcards; only one is allowed",
            pattern
        ));
    }

    if wildcard_count == 1 && !pattern.starts_with('*') && !pattern.ends_with('*') {
        return Err(format!(
            "Pattern '{}' has wildcard in middle; only prefix (*ABC) or suffix (ABC*) allowed",
            pattern
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::decode;

    fn report(line: &str) -> Report {
        decode(line).unwrap_or_else(|e| panic!("Should decode {}: {}", line, e))
    }

    #[test]
    fn test_matches_wildcard() {
        assert!(matches_wildcard("K*", "KJFK"));
        assert!(matches_wildcard("*FK", "kjfk"));
        assert!(matches_wildcard("kjfk", "KJFK"));
        assert!(!matches_wildcard("E*", "KJFK"));
        assert!(!matches_wildcard("KLGA", "KJFK"));
    }

    #[test]
    fn test_validate_wildcard_pattern() {
        assert!(validate_wildcard_pattern("K*").is_ok());
        assert!(validate_wildcard_pattern("*JFK").is_ok());
        assert!(validate_wildcard_pattern("KJFK").is_ok());
        assert!(validate_wildcard_pattern("*J*").is_err());
        assert!(validate_wildcard_pattern("K*K").is_err());
    }

    #[test]
    fn test_filter_station_array() {
        let toml = r#"
            station = ["KJFK", "EG*"]
        "#;
        let filter: ReportFilter = toml::from_str(toml).unwrap();

        assert!(filter.matches(&report("KJFK 250251Z 08006KT 10SM")));
        assert!(filter.matches(&report("EGLL 250250Z 24012KT 6SM")));
        assert!(!filter.matches(&report("KLGA 250251Z 08006KT 10SM")));
    }

    #[test]
    fn test_filter_kinds() {
        let toml = r#"
            kinds = ["special"]
        "#;
        let filter: ReportFilter = toml::from_str(toml).unwrap();

        assert!(filter.matches(&report("SPECI KJFK 250251Z 08006KT 10SM")));
        assert!(!filter.matches(&report("METAR KJFK 250251Z 08006KT 10SM")));
    }

    #[test]
    fn test_filter_wind_thresholds() {
        let filter = ReportFilter {
            min_wind_knots: Some(15),
            ..Default::default()
        };
        assert!(filter.matches(&report("KJFK 250251Z 27020KT 10SM")));
        assert!(!filter.matches(&report("KJFK 250251Z 00000KT 10SM")));

        let gusts = ReportFilter {
            min_gust_knots: Some(25),
            ..Default::default()
        };
        assert!(gusts.matches(&report("KJFK 250251Z 27015G28KT 10SM")));
        assert!(!gusts.matches(&report("KJFK 250251Z 27015G20KT 10SM")));
        assert!(!gusts.matches(&report("KJFK 250251Z 27030KT 10SM")));
    }

    #[test]
    fn test_filter_low_visibility_and_ceiling() {
        let filter = ReportFilter {
            max_visibility_miles: Some(3.0),
            max_ceiling_ft: Some(1000),
            ..Default::default()
        };

        assert!(filter.matches(&report("KJFK 250251Z 08006KT 1 1/2SM BR OVC008")));
        // Visibility fine, ceiling low
        assert!(!filter.matches(&report("KJFK 250251Z 08006KT 10SM OVC008")));
        // No ceiling at all
        assert!(!filter.matches(&report("KJFK 250251Z 08006KT 1/2SM FG FEW002")));
    }

    #[test]
    fn test_filter_has_weather() {
        let filter = ReportFilter {
            has_weather: Some(true),
            ..Default::default()
        };
        assert!(filter.matches(&report("KJFK 250251Z 08006KT 3SM -RA")));
        assert!(!filter.matches(&report("KJFK 250251Z 08006KT 10SM")));
    }

    #[test]
    fn test_any_filter_matches_or_logic() {
        let toml = r#"
            [[filters]]
            station = "KJFK"

            [[filters]]
            modifiers = ["automatic"]
        "#;
        #[derive(Deserialize)]
        struct TestConfig {
            filters: Vec<ReportFilter>,
        }
        let config: TestConfig = toml::from_str(toml).unwrap();
        let filters = config.filters;

        assert!(any_filter_matches(&filters, &report("KJFK 250251Z 08006KT 10SM")));
        assert!(any_filter_matches(
            &filters,
            &report("KLGA 250251Z AUTO 08006KT 10SM")
        ));
        assert!(!any_filter_matches(
            &filters,
            &report("KLGA 250251Z 08006KT 10SM")
        ));
    }

    #[test]
    fn test_first_match_returns_named_filter() {
        let filters = vec![
            ReportFilter {
                name: Some("gusty".to_string()),
                min_gust_knots: Some(20),
                ..Default::default()
            },
            ReportFilter {
                name: Some("new_york".to_string()),
                station: Some(PatternList(vec!["KJFK".to_string()])),
                ..Default::default()
            },
        ];

        let calm = report("KJFK 250251Z 08006KT 10SM");
        let matched = first_match(&filters, &calm).unwrap();
        assert_eq!(matched.name.as_deref(), Some("new_york"));

        let gusty = report("KJFK 250251Z 21010G25KT 10SM");
        let matched = first_match(&filters, &gusty).unwrap();
        assert_eq!(matched.name.as_deref(), Some("gusty"));

        assert!(first_match(&filters, &report("KLGA 250251Z 08006KT 10SM")).is_none());
    }

    #[test]
    fn test_empty_filters() {
        let filters: Vec<ReportFilter> = vec![];
        assert!(!any_filter_matches(
            &filters,
            &report("KJFK 250251Z 08006KT 10SM")
        ));
    }

    #[test]
    fn test_validate_rejects_negative_visibility() {
        let filter = ReportFilter {
            max_visibility_miles: Some(-1.0),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_pattern_list_from_string_and_array() {
        let list: PatternList = serde_json::from_str(r#""K*""#).unwrap();
        assert_eq!(list.patterns(), &["K*"]);

        let list: PatternList = serde_json::from_str(r#"["KJFK", "KLGA"]"#).unwrap();
        assert_eq!(list.patterns(), &["KJFK", "KLGA"]);
    }
}
