//! Operation journals: a TOML list of plant operations replayed in order.
//!
//! ```toml
//! [[op]]
//! kind = "create_batch"
//! raw_material = "Chicken Breast"
//! raw_material_type = "chilled"
//! quantity = 250.0
//! start_time = "2025-06-27T07:30:00Z"
//!
//! [[op]]
//! kind = "decide"
//! batch = "CHB27F25SYR"
//! step = 0
//! decision = "approve"
//! readings = { vic1 = "pass", vic2 = "pass", vic3 = "pass", vic4 = "pass" }
//! ```
//!
//! Batches are addressed by batch number and checkpoints by step id, so a
//! journal can be written by hand. Timestamps are quoted RFC 3339 strings.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context as _, anyhow};
use chrono::{DateTime, Utc};
use qcline_core::{
  batch::{Decision, NewBatch},
  batch_number,
  disposition::Disposition,
  metric::{MetricReading, MetricValue},
  plant::Plant,
  step::{MaterialType, NewProcessStep, StepId},
};
use serde::Deserialize;

use crate::settings::Settings;

#[derive(Debug, Deserialize)]
pub struct Journal {
  #[serde(default, rename = "op")]
  pub ops: Vec<Op>,
}

impl Journal {
  pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
    toml::from_str(input).context("parsing journal")
  }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Op {
  CreateBatch(CreateBatch),
  Decide(Decide),
  AddStep {
    step: NewProcessStep,
  },
  UpdateStep {
    id:   StepId,
    step: NewProcessStep,
  },
  RemoveStep {
    id: StepId,
  },
}

impl Op {
  fn label(&self) -> String {
    match self {
      Self::CreateBatch(c) => match &c.batch_number {
        Some(n) => format!("create_batch {n}"),
        None => format!("create_batch ({})", c.raw_material),
      },
      Self::Decide(d) => format!("decide {} step {}", d.batch, d.step),
      Self::AddStep { step } => format!("add_step {:?}", step.name),
      Self::UpdateStep { id, .. } => format!("update_step {id}"),
      Self::RemoveStep { id } => format!("remove_step {id}"),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct CreateBatch {
  /// Generated from material, start date and supplier when absent.
  #[serde(default)]
  pub batch_number:       Option<String>,
  pub raw_material:       String,
  pub raw_material_type:  MaterialType,
  pub quantity:           f64,
  #[serde(default)]
  pub unit:               Option<String>,
  pub start_time:         DateTime<Utc>,
  #[serde(default)]
  pub supplier:           Option<String>,
  #[serde(default)]
  pub parallel_processes: BTreeSet<StepId>,
}

#[derive(Debug, Deserialize)]
pub struct Decide {
  pub batch:     String,
  pub step:      StepId,
  pub decision:  Decision,
  #[serde(default)]
  pub inspector: Option<String>,
  #[serde(default)]
  pub notes:     Option<String>,
  /// Defaults to the replay clock.
  #[serde(default)]
  pub at:        Option<DateTime<Utc>>,
  #[serde(default)]
  pub readings:  Option<BTreeMap<String, MetricValue>>,
}

// ─── Replay ──────────────────────────────────────────────────────────────────

/// Apply every operation of `journal` to `plant`, stopping at the first
/// failure. Returns the number of operations applied.
pub fn replay(
  plant: &mut Plant,
  journal: Journal,
  settings: &Settings,
  now: DateTime<Utc>,
) -> anyhow::Result<usize> {
  let total = journal.ops.len();
  for (index, op) in journal.ops.into_iter().enumerate() {
    let label = op.label();
    apply(plant, op, settings, now)
      .with_context(|| format!("operation {} of {total} ({label}) failed", index + 1))?;
    tracing::debug!(op = %label, "applied");
  }
  Ok(total)
}

fn apply(
  plant: &mut Plant,
  op: Op,
  settings: &Settings,
  now: DateTime<Utc>,
) -> anyhow::Result<()> {
  match op {
    Op::CreateBatch(c) => {
      let number = match c.batch_number {
        Some(n) => n,
        None => batch_number::generate_for(
          &c.raw_material,
          c.start_time.date_naive(),
          c.supplier.as_deref().unwrap_or(&settings.supplier_code),
        )?,
      };
      let mut input =
        NewBatch::new(number, c.raw_material, c.raw_material_type, c.quantity, c.start_time)
          .with_parallel(c.parallel_processes);
      if let Some(unit) = c.unit {
        input = input.with_unit(unit);
      }
      plant.create_batch(input)?;
    }
    Op::Decide(d) => {
      let batch_id = plant
        .lookup_batch_by_number(&d.batch)?
        .map(|b| b.id)
        .ok_or_else(|| anyhow!("no batch numbered {:?}", d.batch))?;
      let checkpoint_id = plant.checkpoint_for_step(batch_id, d.step)?;

      let inspector = d.inspector.unwrap_or_else(|| settings.inspector.clone());
      let mut disposition = Disposition::new(d.decision, inspector, d.at.unwrap_or(now));
      if let Some(notes) = d.notes {
        disposition = disposition.with_notes(notes);
      }
      if let Some(readings) = d.readings {
        disposition = disposition.with_readings(
          readings
            .into_iter()
            .map(|(id, value)| MetricReading { metric_id: id, value: Some(value) }),
        );
      }
      plant.apply_decision(batch_id, checkpoint_id, disposition)?;
    }
    Op::AddStep { step } => {
      plant.add_process_step(step)?;
    }
    Op::UpdateStep { id, step } => plant.update_process_step(id, step)?,
    Op::RemoveStep { id } => {
      plant.remove_process_step(id)?;
    }
  }
  Ok(())
}
