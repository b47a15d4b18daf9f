//! METAR decoder CLI - decode surface weather observations from files or stdin.

use anyhow::{Context, Result};
use clap::Parser;
use metar_decoder::{
    config::{Config, OutputFormat},
    filter::first_match,
    parser::{DecodeMode, DecodeOptions, decode_with, looks_like_report},
    report::Report,
    stats::DecodeStats,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Decode METAR/SPECI surface weather observations, one report per line
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files to read reports from (stdin when none are given)
    files: Vec<PathBuf>,

    /// Reject unrecognized weather codes and stray groups
    #[arg(long)]
    strict: bool,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Print a statistics summary at the end
    #[arg(short, long)]
    stats: bool,

    /// Config file path (defaults to the platform config directory)
    #[arg(short, long, env = "METAR_DECODER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Settings resolved from the config file and command line.
struct Settings {
    options: DecodeOptions,
    output: OutputFormat,
    config: Config,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = match args.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    let mut options = config.decode_options();
    if args.strict {
        options.mode = DecodeMode::Strict;
    }
    let settings = Settings {
        options,
        output: args.output.unwrap_or(config.output),
        config,
    };
    info!(mode = ?settings.options.mode, filters = settings.config.filters.len(), "Decoder configured");

    let stats = DecodeStats::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.files.is_empty() {
        let stdin = io::stdin();
        process_reader(stdin.lock(), &settings, &stats, &mut out)?;
    } else {
        for path in &args.files {
            info!("Reading {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            process_reader(BufReader::new(file), &settings, &stats, &mut out)?;
        }
    }

    if args.stats || settings.config.stats {
        writeln!(out)?;
        write!(out, "{}", stats.summary())?;
    }

    Ok(())
}

fn process_reader<R: BufRead, W: Write>(
    reader: R,
    settings: &Settings,
    stats: &DecodeStats,
    out: &mut W,
) -> Result<()> {
    for line in reader.lines() {
        let line = line.context("Failed to read input")?;
        if let Some(report) = process_line(&line, settings, stats) {
            write_report(out, &report, settings.output)?;
        }
    }
    Ok(())
}

/// Decode one line, returning the report if it should be printed.
fn process_line(line: &str, settings: &Settings, stats: &DecodeStats) -> Option<Report> {
    stats.record_bytes(line.len() as u64);

    if !looks_like_report(line) {
        stats.record_skipped();
        debug!("Skipping line: {}", line);
        return None;
    }

    match decode_with(line, settings.options) {
        Ok(report) => {
            stats.record_report(&report);

            let filters = &settings.config.filters;
            if filters.is_empty() {
                return Some(report);
            }
            match first_match(filters, &report) {
                Some(filter) => {
                    debug!(
                        filter = filter.name.as_deref().unwrap_or("unnamed"),
                        station = %report.station,
                        "Report matched filter"
                    );
                    Some(report)
                }
                None => {
                    debug!("Filtered report from {}", report.station);
                    None
                }
            }
        }
        Err(e) => {
            stats.record_failure(&e);
            warn!("Failed to decode '{}': {}", line.trim(), e);
            None
        }
    }
}

fn write_report<W: Write>(out: &mut W, report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", report)?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Describe => {
            let wind = report.wind;
            write!(
                out,
                "{} day {} {:02}:{:02}Z: wind {}",
                report.station,
                report.time.day,
                report.time.hour,
                report.time.minute,
                if wind.is_calm() {
                    "calm".to_string()
                } else {
                    format!("{} at {} kt", wind.direction(), wind.speed_knots())
                }
            )?;
            if let Some(gust) = wind.gust_knots() {
                write!(out, " gusting {} kt", gust)?;
            }
            write!(
                out,
                ", visibility {}{} SM",
                if report.visibility.less_than { "less than " } else { "" },
                report.visibility.distance
            )?;
            for phenomenon in &report.weather {
                write!(out, ", {}", phenomenon.description())?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
