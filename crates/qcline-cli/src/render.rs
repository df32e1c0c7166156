//! Plain-text output.

use std::fmt::Write as _;

use qcline_core::{
  batch::Batch,
  query::{self, PlantSummary},
  registry::ProcessRegistry,
  step::MaterialType,
};

/// One line per step: id, CCP label, stage, minutes, metric count, name.
pub fn steps(registry: &ProcessRegistry, material: Option<MaterialType>) -> String {
  let mut out = String::new();
  for step in registry.steps() {
    if let Some(m) = material
      && !step.applies_to(m)
    {
      continue;
    }
    let _ = writeln!(
      out,
      "{:>3}  {:<7} {:<13} {:>4} min  {:>2} metrics  {}",
      step.id,
      step.ccp_number.as_deref().unwrap_or("-"),
      step.stage,
      step.estimated_time,
      step.metrics.len(),
      step.name,
    );
  }
  out
}

/// Status line for one batch.
pub fn batch_line(batch: &Batch, registry: &ProcessRegistry) -> String {
  format!(
    "{:<14} {:<9} {:<13} {:>5.1}%  step {:<3} {} CCP pending",
    batch.batch_number,
    batch.status,
    query::current_stage(batch, registry),
    query::progress_percent(batch),
    batch.current_step,
    query::pending_ccp_count(batch),
  )
}

pub fn summary(summary: &PlantSummary) -> String {
  let mut out = format!(
    "{} active, {} completed, {} rejected, {} CCP checkpoints pending",
    summary.active, summary.completed, summary.rejected, summary.pending_ccps,
  );
  for (material, count) in &summary.active_by_material {
    let _ = write!(out, "\n  {material}: {count} active");
  }
  out
}
