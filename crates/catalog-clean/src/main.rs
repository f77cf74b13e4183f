/// CLI for catalog normalization: read a scraped product dump (JSON array),
/// run it through the cleaning pipeline, write the clean catalog, and log a
/// per-reason rejection breakdown.
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use furnish_core::catalog::clean_products_value;

#[derive(Parser, Debug)]
#[command(name = "catalog-clean", about = "Normalize a scraped furniture product dump")]
struct Args {
    /// Path to the raw scraped products JSON array.
    #[arg(long)]
    raw: PathBuf,
    /// Path to write the clean catalog JSON to.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();

    let raw_text = fs::read_to_string(&args.raw)
        .with_context(|| format!("reading {}", args.raw.display()))?;
    let raw_value: serde_json::Value =
        serde_json::from_str(&raw_text).with_context(|| format!("parsing {}", args.raw.display()))?;

    let (cleaned, rejects) = clean_products_value(&raw_value)
        .with_context(|| format!("normalizing {}", args.raw.display()))?;

    let total = cleaned.len() + rejects.values().sum::<usize>();
    info!(
        total,
        accepted = cleaned.len(),
        rejected = total - cleaned.len(),
        "catalog cleaned"
    );
    for (reason, count) in &rejects {
        let share = if total > 0 {
            100.0 * *count as f64 / total as f64
        } else {
            0.0
        };
        info!(reason = %reason, count, share = format!("{share:.1}%"), "rejection breakdown");
    }

    let out_text = serde_json::to_string_pretty(&cleaned)?;
    fs::write(&args.out, out_text)
        .with_context(|| format!("writing {}", args.out.display()))?;
    info!(path = %args.out.display(), items = cleaned.len(), "clean catalog written");
    Ok(())
}
