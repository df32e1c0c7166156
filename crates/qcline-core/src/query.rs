//! Read-side helpers over batches. Nothing here mutates.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
  batch::{Batch, BatchStatus, Checkpoint, CheckpointStatus},
  registry::ProcessRegistry,
  step::{MaterialType, Stage},
};

/// The stage a batch is in.
///
/// A completed batch reports the stage of its last approved checkpoint;
/// otherwise the registry step at `current_step` decides.
pub fn current_stage(batch: &Batch, registry: &ProcessRegistry) -> Stage {
  if batch.status == BatchStatus::Completed {
    return batch
      .checkpoints
      .iter()
      .filter(|c| c.status == CheckpointStatus::Approved)
      .max_by_key(|c| c.step_number)
      .map_or(Stage::Packaging, |c| c.stage);
  }
  registry
    .get(batch.current_step)
    .map_or(Stage::Preprocessing, |s| s.stage)
}

/// Share of approved checkpoints, `0.0..=100.0`. A batch without checkpoints
/// reports `0.0`.
pub fn progress_percent(batch: &Batch) -> f64 {
  let total = batch.checkpoints.len();
  if total == 0 {
    return 0.0;
  }
  let approved = batch
    .checkpoints
    .iter()
    .filter(|c| c.status == CheckpointStatus::Approved)
    .count();
  100.0 * approved as f64 / total as f64
}

/// Critical control points still waiting for their first disposition.
pub fn pending_ccp_count(batch: &Batch) -> usize {
  batch
    .checkpoints
    .iter()
    .filter(|c| c.is_ccp() && c.status == CheckpointStatus::Pending)
    .count()
}

/// Case-insensitive exact match on the batch number.
pub fn find_by_batch_number<'a, I>(batches: I, number: &str) -> Option<&'a Batch>
where
  I: IntoIterator<Item = &'a Batch>,
{
  let wanted = number.trim();
  batches
    .into_iter()
    .find(|b| b.batch_number.eq_ignore_ascii_case(wanted))
}

/// The checkpoint at the batch's current step.
pub fn current_checkpoint(batch: &Batch) -> Option<&Checkpoint> {
  batch.checkpoint_for_step(batch.current_step)
}

/// Checkpoints an inspector can act on now: the current step's checkpoint,
/// whatever its status, plus open checkpoints before it. Empty once the
/// batch is terminal.
pub fn actionable_checkpoints(batch: &Batch) -> Vec<&Checkpoint> {
  if !batch.is_active() {
    return Vec::new();
  }
  batch
    .checkpoints
    .iter()
    .filter(|c| {
      c.step_number == batch.current_step
        || (c.status.is_open() && c.step_number < batch.current_step)
    })
    .collect()
}

/// Time since the batch started, clamped at zero.
pub fn elapsed(batch: &Batch, now: DateTime<Utc>) -> Duration {
  (now - batch.start_time).max(Duration::zero())
}

/// Estimated minutes of work left: the registry estimates of every
/// checkpoint not yet approved. Steps removed from the registry count as 0.
pub fn remaining_minutes(batch: &Batch, registry: &ProcessRegistry) -> u32 {
  batch
    .checkpoints
    .iter()
    .filter(|c| c.status != CheckpointStatus::Approved)
    .filter_map(|c| registry.get(c.step_number))
    .map(|s| s.estimated_time)
    .sum()
}

// ─── Plant-wide totals ───────────────────────────────────────────────────────

/// Dashboard counters over a set of batches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlantSummary {
  pub active:               usize,
  pub completed:            usize,
  pub rejected:             usize,
  /// Active batches per material type.
  pub active_by_material:   BTreeMap<String, usize>,
  /// Pending CCP checkpoints summed over active batches. Terminal batches
  /// contribute nothing, even with CCPs left undecided.
  pub pending_ccps:         usize,
}

impl PlantSummary {
  pub fn from_batches<'a>(batches: impl IntoIterator<Item = &'a Batch>) -> Self {
    let mut summary = Self::default();
    for batch in batches {
      match batch.status {
        BatchStatus::Active => {
          summary.active += 1;
          summary.pending_ccps += pending_ccp_count(batch);
          *summary
            .active_by_material
            .entry(batch.raw_material_type.to_string())
            .or_default() += 1;
        }
        BatchStatus::Completed => summary.completed += 1,
        BatchStatus::Rejected => summary.rejected += 1,
      }
    }
    summary
  }

  pub fn active_for(&self, material: MaterialType) -> usize {
    self
      .active_by_material
      .get(&material.to_string())
      .copied()
      .unwrap_or(0)
  }
}
