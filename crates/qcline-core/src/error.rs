//! Error types for `qcline-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{batch::BatchStatus, step::{MaterialType, StepId}};

#[derive(Debug, Error)]
pub enum Error {
  /// No process step applies to the requested material type.
  #[error("no process steps are configured for material type {0}")]
  EmptyTemplate(MaterialType),

  /// Approval was attempted while required metrics are missing or failing.
  #[error(
    "checkpoint {checkpoint_id} cannot be approved; required metrics missing \
     or out of range: {}",
    metrics.join(", ")
  )]
  IncompleteMetrics {
    checkpoint_id: Uuid,
    /// Ids of the offending metric observations.
    metrics:       Vec<String>,
  },

  #[error("checkpoint not found: {0}")]
  CheckpointNotFound(Uuid),

  #[error("process step not found: {0}")]
  StepNotFound(StepId),

  #[error("batch not found: {0}")]
  BatchNotFound(String),

  #[error("metric {metric_id:?} not found on checkpoint {checkpoint_id}")]
  MetricNotFound {
    checkpoint_id: Uuid,
    metric_id:     String,
  },

  /// A disposition was attempted on a batch that is no longer active.
  #[error("batch {batch_number} is {status}; no further dispositions allowed")]
  TerminalBatch {
    batch_number: String,
    status:       BatchStatus,
  },

  #[error("batch number {0:?} is already in use")]
  DuplicateBatchNumber(String),

  #[error("invalid process step: {0}")]
  InvalidStep(String),

  #[error("invalid batch: {0}")]
  InvalidBatch(String),

  #[error("invalid batch number component: {0}")]
  InvalidBatchNumber(String),

  #[error("template parse error: {0}")]
  Template(#[from] toml::de::Error),
}

impl Error {
  /// `true` for every variant that reports a stale or unknown reference.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::CheckpointNotFound(_)
        | Self::StepNotFound(_)
        | Self::BatchNotFound(_)
        | Self::MetricNotFound { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
