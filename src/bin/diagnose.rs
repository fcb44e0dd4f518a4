use anyhow::{Context, Result};
use clap::Parser;
use climatetech::{
    decode::{diagnose_file, is_backup, rewrite_utf8, Encoding},
    process::reader,
    Config,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Report how each raw CSV decodes and parses; optionally rewrite as UTF-8.
#[derive(Parser, Debug)]
struct Args {
    /// Data root holding raw/
    #[arg(long, env = "CLIMATETECH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// YAML config file (default: <data_dir>/pipeline.yaml)
    #[arg(long, env = "CLIMATETECH_CONFIG")]
    config: Option<PathBuf>,

    /// Rewrite each readable file as UTF-8 with BOM, keeping <name>.backup.csv
    #[arg(long)]
    fix: bool,
}

fn raw_csvs(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.csv");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .with_context(|| format!("bad pattern {}", pattern.display()))?
        .filter_map(|p| p.ok())
        .filter(|p| !is_backup(p))
        .collect();
    files.sort();
    Ok(files)
}

/// Log the diagnosis of one file. Returns whether the reader can use it.
fn diagnose(path: &Path, candidates: &[Encoding]) -> Result<bool> {
    let name = path.display();
    let diag = diagnose_file(path, candidates).with_context(|| format!("reading {name}"))?;
    info!(file = %name, bytes = diag.size_bytes, "diagnosing");

    for (enc, ok) in &diag.attempts {
        if *ok {
            info!(file = %name, encoding = %enc, "decodes");
        } else {
            warn!(file = %name, encoding = %enc, "decode error");
        }
    }
    let Some(encoding) = diag.encoding else {
        error!(file = %name, "no candidate encoding decoded the file");
        return Ok(false);
    };
    for (i, line) in diag.preview.iter().enumerate() {
        info!(file = %name, "{}: {}", i + 1, line);
    }

    match reader::read(path, encoding) {
        Ok(table) => {
            info!(
                file = %name,
                %encoding,
                delimiter = %(table.delimiter as char).escape_default(),
                rows = table.row_count(),
                cols = table.width(),
                headers = ?table.headers,
                "parsed"
            );
            Ok(true)
        }
        Err(e) => {
            error!(file = %name, %encoding, "{}", e);
            Ok(false)
        }
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::resolve(args.config, args.data_dir).context("loading configuration")?;
    let raw_dir = config.raw_dir();
    if !raw_dir.is_dir() {
        error!(dir = %raw_dir.display(), "raw directory does not exist");
        return Ok(());
    }

    let files = raw_csvs(&raw_dir)?;
    if files.is_empty() {
        warn!(dir = %raw_dir.display(), "no CSV files");
        return Ok(());
    }
    info!("{} file(s) found", files.len());

    let mut fixed = 0;
    for path in &files {
        let usable = diagnose(path, &config.encodings)?;
        if !(args.fix && usable) {
            continue;
        }
        match rewrite_utf8(path, &config.encodings) {
            Ok(Encoding::Utf8Bom) => info!(file = %path.display(), "already utf-8-sig"),
            Ok(from) => {
                info!(file = %path.display(), "{} → utf-8-sig", from);
                fixed += 1;
            }
            Err(e) => error!(file = %path.display(), "fix failed: {}", e),
        }
    }

    if fixed > 0 && config.encodings.first() != Some(&Encoding::Utf8Bom) {
        warn!(
            "rewritten files start with a UTF-8 BOM; list `utf-8-sig` first under `encodings` \
             so they are not resolved as {}",
            config.encodings.first().map(Encoding::label).unwrap_or("-")
        );
    }
    Ok(())
}
