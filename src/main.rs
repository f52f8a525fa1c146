//! Medal Charts - Olympic medal statistics & static chart generator
//!
//! Loads the country-wise medal CSV, prints descriptive statistics and
//! renders four charts (line, grouped bar, correlation heatmap, pie).

mod charts;
mod data;
mod report;
mod stats;

use anyhow::{Context, Result};
use charts::StaticChartRenderer;
use clap::Parser;
use data::MedalLoader;
use stats::StatsReport;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "medal_charts",
    version,
    about = "Olympic medal statistics and charts"
)]
struct Cli {
    /// Country-wise medal CSV with a header row
    #[arg(default_value = "olympics_medals_country_wise.csv")]
    input: PathBuf,
    /// Keep the chart images in this directory instead of a scratch directory
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
    /// Chart width in pixels
    #[arg(long, default_value_t = 1200)]
    width: u32,
    /// Chart height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,
    /// Also write the statistics as JSON to this path
    #[arg(long)]
    stats_json: Option<PathBuf>,
    /// Only write the charts, do not open them in the image viewer
    #[arg(long, requires = "out_dir")]
    no_display: bool,
}

impl Cli {
    /// Directory the charts are rendered into. Without `--out-dir` this is a
    /// fresh scratch directory that outlives the process so the viewer can
    /// still read the images.
    fn chart_dir(&self) -> Result<PathBuf> {
        match &self.out_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(tempfile::Builder::new()
                .prefix("medal_charts-")
                .tempdir()
                .context("creating scratch chart directory")?
                .keep()),
        }
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // ─── load & clean ───────────────────────────────────────────────
    let mut loader = MedalLoader::new();
    loader
        .load_csv(&cli.input)
        .with_context(|| format!("loading {}", cli.input.display()))?;
    if loader.get_row_count() == 0 {
        warn!(path = %cli.input.display(), "medal table has no rows");
    }
    let df = loader.into_dataframe()?;

    // ─── statistics ─────────────────────────────────────────────────
    let report = StatsReport::compute(&df).context("computing statistics")?;
    report::print_summary(&report);
    if let Some(path) = &cli.stats_json {
        report::write_json(&report, path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote statistics json");
    }

    // ─── charts ─────────────────────────────────────────────────────
    let renderer = StaticChartRenderer::new(cli.chart_dir()?, cli.width, cli.height);
    let written = renderer
        .render_all(&df, |path| {
            if cli.no_display {
                return;
            }
            // each chart is handed to the viewer before the next one is drawn
            if let Err(e) = open::that(path) {
                warn!(path = %path.display(), error = %e, "could not display chart");
            }
        })
        .context("rendering charts")?;
    info!(
        out_dir = %renderer.out_dir().display(),
        charts = written.len(),
        "all charts rendered"
    );

    Ok(())
}
