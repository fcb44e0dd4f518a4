use anyhow::{Context, Result};
use clap::Parser;
use climatetech::{
    pipeline::{self, Outcome},
    store, Config,
};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Normalize raw climate-technology statistics into dashboard datasets.
#[derive(Parser, Debug)]
struct Args {
    /// Data root holding raw/, processed/ and scraped/
    #[arg(long, env = "CLIMATETECH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// YAML config file (default: <data_dir>/pipeline.yaml)
    #[arg(long, env = "CLIMATETECH_CONFIG")]
    config: Option<PathBuf>,

    /// Write seeded sample datasets into processed/ and scraped/ and exit
    #[arg(long)]
    samples: bool,

    /// Print per-dataset file status after the run
    #[arg(long)]
    status: bool,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,climatetech=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configure dirs ───────────────────────────────────────────
    let args = Args::parse();
    let config = Config::resolve(args.config.clone(), args.data_dir.clone())
        .context("loading configuration")?;
    config.ensure_dirs().with_context(|| {
        format!("creating data directories under {}", config.base_dir.display())
    })?;
    info!(base_dir = %config.base_dir.display(), "configured");

    // ─── 3) samples only ─────────────────────────────────────────────
    if args.samples {
        for (kind, rows) in pipeline::write_samples(&config).context("writing sample data")? {
            info!(dataset = kind.name(), rows, "sample written");
        }
        return Ok(());
    }

    // ─── 4) process raw → processed ──────────────────────────────────
    let report = pipeline::run(&config).context("pipeline run")?;
    for status in &report.datasets {
        match &status.outcome {
            Outcome::Processed { rows, warnings } => info!(
                dataset = status.dataset.name(),
                rows,
                warnings = warnings.len(),
                "✓ {}",
                status.output.display()
            ),
            Outcome::Skipped { reason } => {
                warn!(dataset = status.dataset.name(), "skipped: {}", reason)
            }
            Outcome::Failed { kind, error } => {
                error!(dataset = status.dataset.name(), kind, "failed: {}", error)
            }
        }
    }
    info!(
        processed = report.processed(),
        skipped = report.skipped(),
        failed = report.failed(),
        "all done"
    );

    // ─── 5) optional status listing ──────────────────────────────────
    if args.status {
        for s in store::data_status(&config) {
            match (&s.error, s.exists) {
                (Some(e), _) => warn!(file = %s.path.display(), "{}: {}", s.description, e),
                (None, false) => info!(file = %s.path.display(), "{}: missing", s.description),
                (None, true) => info!(
                    file = %s.path.display(),
                    rows = s.rows.unwrap_or(0),
                    cols = s.columns.unwrap_or(0),
                    bytes = s.size_bytes.unwrap_or(0),
                    modified = ?s.modified,
                    "{}",
                    s.description
                ),
            }
        }
    }

    Ok(())
}
