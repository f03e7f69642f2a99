//! Nobel Laureate Atlas CLI
//!
//! Downloads the laureate and prize datasets and shows a choropleth map of
//! laureates by country of birth.
//!
//! Usage:
//!   nobel-atlas
//!   nobel-atlas --iso3 --zero-floor --html atlas.html --no-show
//!   nobel-atlas --data-dir data/nobel --figure-json atlas.json
//!   nobel-atlas --image atlas.pdf --no-show

use anyhow::Result;
use clap::Parser;
use nobel_atlas::export::{ExportConfig, Exporter};
use nobel_atlas::{
    ChainMode, ColorFloor, CountryNormalizer, DatasetSource, FetchConfig, FileSource,
    HttpSource, LocationMode, NormalizerConfig, Pipeline, PlotlyRenderer, ReportConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "nobel-atlas",
    about = "Map Nobel Prize laureates by country of birth"
)]
struct Args {
    /// Read laureate.json and prize.json from this directory instead of the API
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Locate countries by ISO-3 code instead of by name
    #[arg(long)]
    iso3: bool,

    /// Start the color scale at 0 instead of 1
    #[arg(long)]
    zero_floor: bool,

    /// Apply each country rewrite rule to the result of the previous one
    #[arg(long)]
    cascade: bool,

    /// Write a standalone interactive HTML page
    #[arg(long)]
    html: Option<PathBuf>,

    /// Save a static image or PDF (.png, .jpg, .webp, .svg, .pdf) via Plotly's kaleido
    #[arg(long)]
    image: Option<PathBuf>,

    /// Write the Plotly figure JSON
    #[arg(long)]
    figure_json: Option<PathBuf>,

    /// Write the per-country table as JSON
    #[arg(long)]
    table: Option<PathBuf>,

    /// Do not open the map in a browser
    #[arg(long)]
    no_show: bool,

    /// Request timeout in seconds (default: none)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("Nobel Laureate Atlas");
    info!("{}", "=".repeat(60));

    let source: Box<dyn DatasetSource> = match &args.data_dir {
        Some(dir) => Box::new(FileSource::new(dir)),
        None => Box::new(HttpSource::new(FetchConfig {
            timeout: args.timeout_secs.map(Duration::from_secs),
            ..FetchConfig::default()
        })?),
    };

    let normalizer = CountryNormalizer::new(NormalizerConfig {
        mode: if args.cascade {
            ChainMode::Cascade
        } else {
            ChainMode::FirstMatch
        },
    });

    let report_config = ReportConfig {
        location_mode: if args.iso3 {
            LocationMode::Iso3
        } else {
            LocationMode::CountryNames
        },
        floor: if args.zero_floor {
            ColorFloor::Zero
        } else {
            ColorFloor::One
        },
        ..ReportConfig::default()
    };

    let output = match Pipeline::new(source, normalizer, report_config).run(&PlotlyRenderer) {
        Ok(output) => output,
        Err(e) if e.is_fetch_failure() => {
            error!("{}", e);
            eprintln!("Error downloading data: {}", e);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    info!("\nTop 10 countries by laureates born there:");
    for (country, count) in output.tally.ranked().iter().take(10) {
        info!("  {:4} | {}", count, country);
    }

    let exporter = Exporter::new(ExportConfig {
        show: !args.no_show,
        html: args.html,
        image: args.image,
        figure_json: args.figure_json,
        table_json: args.table,
    });
    let summary = exporter.export(&output.figure, &output.report)?;

    // Summary
    info!("\n{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Laureates on a prize: {}", output.kept_laureates);
    info!("Laureates counted: {}", output.tally.total());
    info!("Laureates mapped: {}", output.report.metadata.mapped_laureates);
    info!("Countries: {}", output.report.metadata.countries);
    for path in summary.written.iter().chain(&summary.image) {
        info!("  wrote {:?}", path);
    }

    Ok(ExitCode::SUCCESS)
}
