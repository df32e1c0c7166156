//! `qcline`: command-line shell over the batch inspection engine.
//!
//! # Usage
//!
//! ```
//! qcline steps --material chilled
//! qcline batch-number --material "Chicken Breast" --date 2025-06-27
//! qcline --config qcline.toml replay shift.toml --json
//! ```

mod journal;
mod render;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use journal::Journal;
use qcline_core::{batch_number, plant::Plant, step::MaterialType};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "qcline", version, about = "Batch inspection and CCP tracking")]
struct Cli {
  /// Path to a TOML settings file.
  #[arg(short, long, value_name = "FILE", env = "QCLINE_CONFIG")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List the process steps of the configured template.
  Steps {
    /// Only steps that apply to this material type.
    #[arg(long)]
    material: Option<MaterialType>,
  },

  /// Generate a batch number.
  BatchNumber {
    /// Raw material name, e.g. "Chicken Breast".
    #[arg(long)]
    material: String,
    /// Receiving date (default: today, UTC).
    #[arg(long)]
    date:     Option<NaiveDate>,
    /// Three-letter supplier code (default: from settings).
    #[arg(long)]
    supplier: Option<String>,
  },

  /// Replay a journal of operations against an empty plant.
  Replay {
    journal: PathBuf,
    /// Print the resulting batches as JSON.
    #[arg(long)]
    json:    bool,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(cli.config.as_deref())?;

  match cli.command {
    Command::Steps { material } => {
      let registry = settings.registry()?;
      print!("{}", render::steps(&registry, material));
    }
    Command::BatchNumber { material, date, supplier } => {
      let date = date.unwrap_or_else(|| Utc::now().date_naive());
      let supplier = supplier.unwrap_or_else(|| settings.supplier_code.clone());
      let number = batch_number::generate_for(&material, date, &supplier)?;
      println!("{number}");
    }
    Command::Replay { journal, json } => {
      let raw = std::fs::read_to_string(&journal)
        .with_context(|| format!("reading journal {}", journal.display()))?;
      let parsed = Journal::from_toml_str(&raw)?;

      let mut plant = Plant::new(settings.registry()?).with_options(settings.plant_options());
      let applied = journal::replay(&mut plant, parsed, &settings, Utc::now())?;
      tracing::info!(operations = applied, "journal replayed");

      let batches = plant.batches()?;
      if json {
        println!("{}", serde_json::to_string_pretty(&batches)?);
      } else {
        for batch in &batches {
          println!("{}", render::batch_line(batch, plant.registry()));
        }
        println!("{}", render::summary(&plant.summary()?));
      }
    }
  }

  Ok(())
}
