//! This program charts the evaluation results of the C-BI conversational query
//! mapper. It reads the semicolon-separated results table produced by the
//! test suite, selects the runs that match a set of tuning thresholds, and
//! draws the similarity, pruning and timing charts of the evaluation.

mod config;
mod dataset;
mod filter;
mod input;
mod progress;
mod render;
mod stats;
mod views;

use crate::{config::Config, progress::ProgressReport};
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use std::{num::NonZeroU32, path::PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};

/// Draw the charts of a C-BI evaluation run
///
/// Every threshold selects the runs whose corresponding column is exactly
/// equal to it. The synonym threshold is replaced by each value of the sweep
/// in the top-k similarity and timing charts.
#[derive(Parser, Debug)]
#[command(version, author)]
struct Args {
    /// Semicolon-separated results file, optionally gzip-compressed (.gz)
    #[arg(short, long, default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Directory where the SVG charts are written
    ///
    /// Will be created if it does not exist yet.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Similarity threshold for members ("simMember" column)
    #[arg(long, default_value = "0.9")]
    sim_member: f64,

    /// Similarity threshold for metadata ("simMeta" column)
    #[arg(long, default_value = "0.4")]
    sim_meta: f64,

    /// Synonym threshold for members ("synMember" column)
    #[arg(long, default_value = "1")]
    syn_member: f64,

    /// Synonym threshold for metadata ("synMeta" column)
    #[arg(long, default_value = "5")]
    syn_meta: f64,

    /// Ngram size ("ngramSize" column)
    #[arg(long, default_value = "3")]
    ngram_size: f64,

    /// Coverage threshold ("%missing" column)
    #[arg(long, default_value = "0.6")]
    missing: f64,

    /// Distance threshold ("maxDistance" column)
    #[arg(long, default_value = "3")]
    max_distance: f64,

    /// Metadata synonym thresholds compared in the top-k and timing charts
    #[arg(long, value_delimiter = ',', default_value = "1,3,5")]
    syn_meta_sweep: Vec<f64>,

    /// Largest candidate rank of the top-k similarity chart
    #[arg(short = 'k', long, default_value = "5")]
    max_k: NonZeroU32,
}
//
impl Args {
    /// Decode and validate CLI arguments
    pub fn parse_and_check() -> Result<Self> {
        Self::parse().check()
    }

    /// Check CLI arguments for basic sanity
    fn check(self) -> Result<Self> {
        let thresholds = [
            self.sim_member,
            self.sim_meta,
            self.syn_member,
            self.syn_meta,
            self.ngram_size,
            self.missing,
            self.max_distance,
        ];
        anyhow::ensure!(
            thresholds.iter().all(|t| t.is_finite()),
            "thresholds must be finite numbers"
        );
        anyhow::ensure!(
            !self.syn_meta_sweep.is_empty(),
            "the synonym threshold sweep needs at least one value"
        );
        anyhow::ensure!(
            self.syn_meta_sweep.iter().all(|t| t.is_finite()),
            "the synonym threshold sweep must only contain finite numbers"
        );
        Ok(self)
    }
}
//
#[tokio::main]
async fn main() -> Result<()> {
    // Set up logging
    setup_logging().map_err(|e| anyhow::format_err!("{e}"))?;

    // Decode CLI arguments
    let args = Args::parse_and_check()?;
    let config = Config::new(args);
    log::debug!("Running with {config:#?}");

    // Set up progress reporting
    let report = ProgressReport::new();

    // Load the results
    let dataset = input::load(&config.input, &report).await?;

    // Reduce them into the series of each chart
    let views = views::compute_all(&config, &dataset);

    // Draw the charts
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("creating output directory {}", config.output_dir.display()))?;
    render::save_all(&views, &config.output_dir, &report)?;

    // Display the charted data
    {
        let stdout = tokio::io::stdout();
        let mut stdout = BufWriter::new(stdout);
        for line in views::summary(&views) {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
    }
    Ok(())
}

/// Use anyhow for Result type erasure
pub use anyhow::Result;

/// Default location of the results file
pub const DEFAULT_INPUT: &str = "resources/test/test.csv";

/// Default location of the charts
pub const DEFAULT_OUTPUT_DIR: &str = "resources/test/charts";

/// Set up logging
fn setup_logging() -> syslog::Result<()> {
    syslog::init(
        syslog::Facility::LOG_USER,
        if cfg!(feature = "log-trace") {
            LevelFilter::Trace
        } else if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        None,
    )
}
