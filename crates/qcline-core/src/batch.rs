//! Batches and their per-step checkpoints.
//!
//! A batch is created once by the [factory](crate::factory) and afterwards
//! only changed through the [disposition engine](crate::disposition). Once
//! its status leaves [`BatchStatus::Active`] it is read-only.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  metric::MetricObservation,
  step::{MaterialType, Stage, StepId},
};

// ─── Statuses ────────────────────────────────────────────────────────────────

/// Lifecycle of a batch. `Completed` and `Rejected` are terminal.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BatchStatus {
  Active,
  Completed,
  Rejected,
}

impl BatchStatus {
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Active) }
}

/// Inspection state of a single checkpoint.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckpointStatus {
  Pending,
  InProgress,
  Approved,
  Rejected,
  Reprocess,
}

impl CheckpointStatus {
  /// Still waiting for a (fresh) disposition.
  pub fn is_open(self) -> bool {
    matches!(self, Self::Pending | Self::InProgress | Self::Reprocess)
  }
}

/// An inspector's verdict on a checkpoint.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Decision {
  #[serde(alias = "approve")]
  #[strum(to_string = "approved", serialize = "approve")]
  Approved,
  #[serde(alias = "reject")]
  #[strum(to_string = "rejected", serialize = "reject")]
  Rejected,
  Reprocess,
}

impl From<Decision> for CheckpointStatus {
  fn from(d: Decision) -> Self {
    match d {
      Decision::Approved => Self::Approved,
      Decision::Rejected => Self::Rejected,
      Decision::Reprocess => Self::Reprocess,
    }
  }
}

// ─── Checkpoint ──────────────────────────────────────────────────────────────

/// The inspection record of one process step for one batch.
///
/// Name, CCP label, stage and metrics are copied from the step when the batch
/// is created; later edits to the step do not reach this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
  pub id:          Uuid,
  pub step_number: StepId,
  pub name:        String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ccp_number:  Option<String>,
  pub stage:       Stage,
  pub status:      CheckpointStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub inspector:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timestamp:   Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes:       Option<String>,
  pub metrics:     Vec<MetricObservation>,
}

impl Checkpoint {
  pub fn is_ccp(&self) -> bool { self.ccp_number.is_some() }

  pub fn metric(&self, id: &str) -> Option<&MetricObservation> {
    self.metrics.iter().find(|m| m.id() == id)
  }

  /// Ids of required metrics that are empty or failing.
  pub fn unsatisfied_required(&self) -> Vec<String> {
    unsatisfied_required(&self.metrics)
  }
}

pub(crate) fn unsatisfied_required(metrics: &[MetricObservation]) -> Vec<String> {
  metrics
    .iter()
    .filter(|m| m.definition.required && !m.is_satisfied())
    .map(|m| m.id().to_owned())
    .collect()
}

// ─── Batch ───────────────────────────────────────────────────────────────────

/// A lot of raw material moving through its applicable process steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
  pub id:                 Uuid,
  pub batch_number:       String,
  pub raw_material:       String,
  pub raw_material_type:  MaterialType,
  pub quantity:           f64,
  pub unit:               String,
  pub start_time:         DateTime<Utc>,
  /// Step number of the checkpoint the batch is waiting on.
  pub current_step:       StepId,
  pub status:             BatchStatus,
  pub checkpoints:        Vec<Checkpoint>,
  /// Steps flagged as runnable side by side. Display only.
  #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
  pub parallel_processes: BTreeSet<StepId>,
}

impl Batch {
  pub fn is_active(&self) -> bool { self.status == BatchStatus::Active }

  pub fn checkpoint(&self, id: Uuid) -> Option<&Checkpoint> {
    self.checkpoints.iter().find(|c| c.id == id)
  }

  pub fn checkpoint_for_step(&self, step: StepId) -> Option<&Checkpoint> {
    self.checkpoints.iter().find(|c| c.step_number == step)
  }

  /// Smallest checkpoint step number strictly after `step`.
  pub fn next_step_after(&self, step: StepId) -> Option<StepId> {
    self
      .checkpoints
      .iter()
      .map(|c| c.step_number)
      .filter(|&s| s > step)
      .min()
  }
}

// ─── NewBatch ────────────────────────────────────────────────────────────────

/// Input to [`create_batch`](crate::factory::create_batch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBatch {
  pub batch_number:       String,
  pub raw_material:       String,
  pub raw_material_type:  MaterialType,
  pub quantity:           f64,
  #[serde(default = "default_unit")]
  pub unit:               String,
  pub start_time:         DateTime<Utc>,
  #[serde(default)]
  pub parallel_processes: BTreeSet<StepId>,
}

fn default_unit() -> String { "kg".to_owned() }

impl NewBatch {
  /// A batch measured in kilograms with no parallel steps.
  pub fn new(
    batch_number: impl Into<String>,
    raw_material: impl Into<String>,
    raw_material_type: MaterialType,
    quantity: f64,
    start_time: DateTime<Utc>,
  ) -> Self {
    Self {
      batch_number: batch_number.into(),
      raw_material: raw_material.into(),
      raw_material_type,
      quantity,
      unit: default_unit(),
      start_time,
      parallel_processes: BTreeSet::new(),
    }
  }

  pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
    self.unit = unit.into();
    self
  }

  pub fn with_parallel(mut self, steps: impl IntoIterator<Item = StepId>) -> Self {
    self.parallel_processes.extend(steps);
    self
  }
}
