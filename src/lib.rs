//! METAR Decoder - A Rust library and CLI for decoding surface weather observations.
//!
//! This crate provides:
//! - A cursor-driven, nom-based decoder for METAR/SPECI report lines
//! - Strongly-typed report values (wind, visibility, weather, sky, ...)
//! - Report filters and statistics for batch decoding
//!
//! # Example
//!
//! ```rust
//! use metar_decoder::{decode, DecodeStats};
//!
//! let line = "METAR KJFK 250251Z 21010G18KT 180V240 1 5/16SM -RA BR BKN043 19/09 A3034";
//! let report = decode(line).expect("Failed to decode report");
//! assert_eq!(report.station, "KJFK");
//! assert_eq!(report.wind.gust_knots(), Some(18));
//!
//! let stats = DecodeStats::new();
//! stats.record_report(&report);
//!
//! println!("{}", stats.summary());
//! ```

pub mod config;
pub mod filter;
pub mod parser;
pub mod report;
pub mod stats;
pub mod weather;

pub use config::{Config, OutputFormat};
pub use filter::{ReportFilter, any_filter_matches, first_match};
pub use parser::{
    DecodeError, DecodeMode, DecodeOptions, Decoder, decode, decode_with, looks_like_report,
    tokenize,
};
pub use report::{
    Altimeter, Celsius, ObservationTime, Report, ReportKind, RespectModifier, SkyCondition, StatuteMiles,
    Temperature, Visibility, Wind, WindDirection,
};
pub use stats::{DecodeStats, StatsSummary};
pub use weather::WeatherPhenomenon;
