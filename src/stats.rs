//! Statistics tracking for decoded reports.
//!
//! Tracks decode counts, failures broken down by error kind, and
//! distributions of wind speed and visibility across a batch of reports.

use hdrhistogram::Histogram;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::parser::DecodeError;
use crate::report::{Report, ReportKind};

/// Visibility is recorded in sixteenths of a mile, the finest reportable step.
const VISIBILITY_SCALE: f64 = 16.0;

/// Thread-safe statistics collector for decoded reports.
#[derive(Debug)]
pub struct DecodeStats {
    /// Reports decoded successfully
    pub total_reports: AtomicU64,

    /// Lines that failed to decode
    pub decode_failures: AtomicU64,

    /// Lines skipped before decoding (blank or comments)
    pub skipped_lines: AtomicU64,

    /// Total bytes of raw input processed
    pub bytes_processed: AtomicU64,

    /// Histogram of sustained wind speeds in knots
    wind_histogram: RwLock<Histogram<u64>>,

    /// Histogram of visibility in sixteenths of a statute mile
    visibility_histogram: RwLock<Histogram<u64>>,

    reports_by_kind: RwLock<HashMap<ReportKind, u64>>,

    failures_by_error: RwLock<HashMap<&'static str, u64>>,

    /// Weather groups by their code (e.g. "-RA")
    weather_codes: RwLock<HashMap<String, u64>>,

    top_stations: RwLock<HashMap<String, u64>>,

    start_time: Instant,
}

impl DecodeStats {
    pub fn new() -> Self {
        Self {
            total_reports: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            skipped_lines: AtomicU64::new(0),
            bytes_processed: AtomicU64::new(0),
            // Auto-resizing: hurricane-force gusts and 100+ mile visibilities both occur
            wind_histogram: RwLock::new(Histogram::new(2).expect("Failed to create wind histogram")),
            visibility_histogram: RwLock::new(
                Histogram::new(2).expect("Failed to create visibility histogram"),
            ),
            reports_by_kind: RwLock::new(HashMap::new()),
            failures_by_error: RwLock::new(HashMap::new()),
            weather_codes: RwLock::new(HashMap::new()),
            top_stations: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record a successfully decoded report.
    pub fn record_report(&self, report: &Report) {
        self.total_reports.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut hist) = self.wind_histogram.write() {
            let _ = hist.record(report.wind.speed_knots() as u64);
        }

        let sixteenths = (report.visibility.distance.as_f64() * VISIBILITY_SCALE).round() as u64;
        if let Ok(mut hist) = self.visibility_histogram.write() {
            let _ = hist.record(sixteenths);
        }

        if let Ok(mut map) = self.reports_by_kind.write() {
            *map.entry(report.kind).or_insert(0) += 1;
        }

        if !report.weather.is_empty()
            && let Ok(mut map) = self.weather_codes.write()
        {
            for phenomenon in &report.weather {
                *map.entry(phenomenon.to_string()).or_insert(0) += 1;
            }
        }

        if let Ok(mut map) = self.top_stations.write() {
            *map.entry(report.station.clone()).or_insert(0) += 1;
        }
    }

    /// Record a decode failure.
    pub fn record_failure(&self, error: &DecodeError) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut map) = self.failures_by_error.write() {
            *map.entry(error_kind(error)).or_insert(0) += 1;
        }
    }

    pub fn record_skipped(&self) {
        self.skipped_lines.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes(&self, bytes: u64) {
        self.bytes_processed.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn reports_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_reports.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Generate a summary report.
    pub fn summary(&self) -> StatsSummary {
        let total = self.total_reports.load(Ordering::Relaxed);

        let wind_percentiles = self
            .wind_histogram
            .read()
            .ok()
            .filter(|h| !h.is_empty())
            .map(|h| HistogramPercentiles {
                p50: h.value_at_quantile(0.50) as f64,
                p90: h.value_at_quantile(0.90) as f64,
                p99: h.value_at_quantile(0.99) as f64,
                min: h.min() as f64,
                max: h.max() as f64,
                mean: h.mean(),
            });

        // Scale back from sixteenths to statute miles
        let visibility_percentiles = self
            .visibility_histogram
            .read()
            .ok()
            .filter(|h| !h.is_empty())
            .map(|h| HistogramPercentiles {
                p50: h.value_at_quantile(0.50) as f64 / VISIBILITY_SCALE,
                p90: h.value_at_quantile(0.90) as f64 / VISIBILITY_SCALE,
                p99: h.value_at_quantile(0.99) as f64 / VISIBILITY_SCALE,
                min: h.min() as f64 / VISIBILITY_SCALE,
                max: h.max() as f64 / VISIBILITY_SCALE,
                mean: h.mean() / VISIBILITY_SCALE,
            });

        let reports_by_kind = self
            .reports_by_kind
            .read()
            .map(|m| m.iter().map(|(k, v)| (k.to_string(), *v)).collect())
            .unwrap_or_default();

        let failures_by_error = self
            .failures_by_error
            .read()
            .map(|m| m.iter().map(|(k, v)| (k.to_string(), *v)).collect())
            .unwrap_or_default();

        let weather_codes = self
            .weather_codes
            .read()
            .map(|m| m.clone())
            .unwrap_or_default();

        let top_stations = self
            .top_stations
            .read()
            .map(|m| {
                let mut vec: Vec<_> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
                vec.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                vec.truncate(10);
                vec
            })
            .unwrap_or_default();

        StatsSummary {
            elapsed_secs: self.elapsed().as_secs_f64(),
            total_reports: total,
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            skipped_lines: self.skipped_lines.load(Ordering::Relaxed),
            bytes_processed: self.bytes_processed.load(Ordering::Relaxed),
            reports_per_second: self.reports_per_second(),
            wind_percentiles,
            visibility_percentiles,
            reports_by_kind,
            failures_by_error,
            weather_codes,
            top_stations,
        }
    }
}

impl Default for DecodeStats {
    fn default() -> Self {
        Self::new()
    }
}

fn error_kind(error: &DecodeError) -> &'static str {
    match error {
        DecodeError::MalformedTime(_) => "malformed_time",
        DecodeError::MissingWindGroup(_) => "missing_wind_group",
        DecodeError::TruncatedReport { .. } => "truncated_report",
        DecodeError::InvalidVisibility(_) => "invalid_visibility",
        DecodeError::InvalidVariance(_) => "invalid_variance",
        DecodeError::UnexpectedVariance(_) => "unexpected_variance",
        DecodeError::UnrecognizedWeather(_) => "unrecognized_weather",
        DecodeError::UnexpectedToken(_) => "unexpected_token",
    }
}

/// Percentile values from a histogram.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramPercentiles {
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Summary of collected statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub elapsed_secs: f64,
    pub total_reports: u64,
    pub decode_failures: u64,
    pub skipped_lines: u64,
    pub bytes_processed: u64,
    pub reports_per_second: f64,
    pub wind_percentiles: Option<HistogramPercentiles>,
    pub visibility_percentiles: Option<HistogramPercentiles>,
    pub reports_by_kind: HashMap<String, u64>,
    pub failures_by_error: HashMap<String, u64>,
    pub weather_codes: HashMap<String, u64>,
    pub top_stations: Vec<(String, u64)>,
}

fn write_counts(
    f: &mut std::fmt::Formatter<'_>,
    title: &str,
    counts: &HashMap<String, u64>,
) -> std::fmt::Result {
    if counts.is_empty() {
        return Ok(());
    }
    writeln!(f, "{}:", title)?;
    let mut entries: Vec<_> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (key, count) in entries {
        writeln!(f, "  {}: {}", key, count)?;
    }
    writeln!(f)
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "═══════════════════════════════════════════════════════")?;
        writeln!(f, "                METAR DECODE STATISTICS")?;
        writeln!(f, "═══════════════════════════════════════════════════════")?;
        writeln!(f)?;
        writeln!(f, "Runtime: {:.1}s", self.elapsed_secs)?;
        writeln!(f, "Reports decoded: {}", self.total_reports)?;
        let attempted = self.total_reports + self.decode_failures;
        writeln!(
            f,
            "Decode failures: {} ({:.1}%)",
            self.decode_failures,
            if attempted > 0 {
                self.decode_failures as f64 / attempted as f64 * 100.0
            } else {
                0.0
            }
        )?;
        writeln!(f, "Skipped lines: {}", self.skipped_lines)?;
        writeln!(f, "Bytes processed: {} KB", self.bytes_processed / 1024)?;
        writeln!(f, "Rate: {:.1} reports/sec", self.reports_per_second)?;
        writeln!(f)?;

        if let Some(ref p) = self.wind_percentiles {
            writeln!(f, "Wind Speed Distribution (kt):")?;
            writeln!(f, "  Min: {}, Max: {}, Mean: {:.1}", p.min, p.max, p.mean)?;
            writeln!(f, "  P50: {}, P90: {}, P99: {}", p.p50, p.p90, p.p99)?;
            writeln!(f)?;
        }

        if let Some(ref p) = self.visibility_percentiles {
            writeln!(f, "Visibility Distribution (SM):")?;
            writeln!(f, "  Min: {:.2}, Max: {:.2}, Mean: {:.2}", p.min, p.max, p.mean)?;
            writeln!(f, "  P50: {:.2}, P90: {:.2}, P99: {:.2}", p.p50, p.p90, p.p99)?;
            writeln!(f)?;
        }

        write_counts(f, "Reports by Kind", &self.reports_by_kind)?;
        write_counts(f, "Failures by Error", &self.failures_by_error)?;
        write_counts(f, "Weather Groups", &self.weather_codes)?;

        if !self.top_stations.is_empty() {
            writeln!(f, "Top 10 Stations:")?;
            for (i, (station, count)) in self.top_stations.iter().enumerate() {
                writeln!(f, "  {}. {}: {}", i + 1, station, count)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::decode;

    #[test]
    fn test_record_report() {
        let stats = DecodeStats::new();
        stats.record_report(&decode("METAR KJFK 250251Z 08006KT 10SM -RA").unwrap());

        assert_eq!(stats.total_reports.load(Ordering::Relaxed), 1);
        let summary = stats.summary();
        assert_eq!(summary.reports_by_kind.get("METAR"), Some(&1));
        assert_eq!(summary.weather_codes.get("-RA"), Some(&1));
        assert_eq!(summary.top_stations, vec![("KJFK".to_string(), 1)]);
    }

    #[test]
    fn test_record_failure_by_kind() {
        let stats = DecodeStats::new();
        for line in ["KJFK 2502Z 08006KT 10SM", "KJFK 250251Z 10SM", "KJFK 999Z 0KT 1SM"] {
            stats.record_failure(&decode(line).unwrap_err());
        }

        let summary = stats.summary();
        assert_eq!(summary.decode_failures, 3);
        assert_eq!(summary.failures_by_error.get("malformed_time"), Some(&2));
        assert_eq!(summary.failures_by_error.get("missing_wind_group"), Some(&1));
    }

    #[test]
    fn test_visibility_percentiles_in_miles() {
        let stats = DecodeStats::new();
        stats.record_report(&decode("KJFK 250251Z 08006KT 1/4SM FG").unwrap());
        stats.record_report(&decode("KJFK 250351Z 08006KT 1/4SM FG").unwrap());

        let p = stats.summary().visibility_percentiles.unwrap();
        assert!((p.min - 0.25).abs() < 0.01);
        assert!((p.max - 0.25).abs() < 0.01);
    }

    #[test]
    fn test_empty_summary_has_no_percentiles() {
        let summary = DecodeStats::new().summary();
        assert!(summary.wind_percentiles.is_none());
        assert!(summary.visibility_percentiles.is_none());
        assert_eq!(summary.total_reports, 0);
    }

    #[test]
    fn test_summary_generation() {
        let stats = DecodeStats::new();
        for minute in 0..10 {
            let line = format!("KJFK 2502{:02}Z 27015G25KT 10SM", minute);
            stats.record_report(&decode(&line).unwrap());
        }
        stats.record_skipped();
        stats.record_bytes(1000);

        let summary = stats.summary();
        assert_eq!(summary.total_reports, 10);
        assert_eq!(summary.skipped_lines, 1);
        assert_eq!(summary.bytes_processed, 1000);
        let wind = summary.wind_percentiles.as_ref().unwrap();
        assert_eq!(wind.p50, 15.0);

        let rendered = summary.to_string();
        assert!(rendered.contains("Reports decoded: 10"));
        assert!(rendered.contains("1. KJFK: 10"));
    }
}
