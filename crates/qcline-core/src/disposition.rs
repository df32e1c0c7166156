//! Checkpoint disposition engine.
//!
//! Applies an inspector's decision to one checkpoint of a batch and moves the
//! batch along:
//!
//! | decision    | checkpoint at `current_step`         | any other checkpoint              |
//! |-------------|--------------------------------------|-----------------------------------|
//! | `approved`  | advance to next step, or `completed` | no batch change                   |
//! | `rejected`  | batch `rejected`                     | batch `rejected`                  |
//! | `reprocess` | no batch change                      | earlier step: batch returns there |
//!
//! Approval is gated on every required metric having a passing value. A
//! refused approval leaves the checkpoint exactly as it was. A batch never
//! completes while any checkpoint is still marked `reprocess`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  batch::{Batch, BatchStatus, CheckpointStatus, Decision, unsatisfied_required},
  metric::{MetricObservation, MetricReading},
};

/// Everything an inspector submits for one checkpoint.
#[derive(Debug, Clone)]
pub struct Disposition {
  pub decision:  Decision,
  pub inspector: String,
  pub notes:     Option<String>,
  /// Values to record before deciding. `None` keeps the stored values.
  pub readings:  Option<Vec<MetricReading>>,
  pub at:        DateTime<Utc>,
}

impl Disposition {
  pub fn new(decision: Decision, inspector: impl Into<String>, at: DateTime<Utc>) -> Self {
    Self {
      decision,
      inspector: inspector.into(),
      notes: None,
      readings: None,
      at,
    }
  }

  pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
    self.notes = Some(notes.into());
    self
  }

  pub fn with_readings(mut self, readings: impl IntoIterator<Item = MetricReading>) -> Self {
    self.readings = Some(readings.into_iter().collect());
    self
  }
}

/// Apply `disposition` to checkpoint `checkpoint_id` of `batch`.
pub fn apply_decision(
  batch: &mut Batch,
  checkpoint_id: Uuid,
  disposition: Disposition,
) -> Result<&Batch> {
  if batch.status.is_terminal() {
    return Err(Error::TerminalBatch {
      batch_number: batch.batch_number.clone(),
      status:       batch.status,
    });
  }

  let index = batch
    .checkpoints
    .iter()
    .position(|c| c.id == checkpoint_id)
    .ok_or(Error::CheckpointNotFound(checkpoint_id))?;

  let metrics = match &disposition.readings {
    Some(readings) => {
      record_readings(&batch.checkpoints[index].metrics, checkpoint_id, readings)?
    }
    None => batch.checkpoints[index].metrics.clone(),
  };

  if disposition.decision == Decision::Approved {
    let missing = unsatisfied_required(&metrics);
    if !missing.is_empty() {
      tracing::debug!(
        batch = %batch.batch_number,
        checkpoint = %checkpoint_id,
        ?missing,
        "approval refused"
      );
      return Err(Error::IncompleteMetrics {
        checkpoint_id,
        metrics: missing,
      });
    }
  }

  let checkpoint = &mut batch.checkpoints[index];
  checkpoint.metrics = metrics;
  checkpoint.status = disposition.decision.into();
  checkpoint.inspector = Some(disposition.inspector);
  checkpoint.timestamp = Some(disposition.at);
  checkpoint.notes = disposition.notes;
  let step = checkpoint.step_number;

  tracing::info!(
    batch = %batch.batch_number,
    step = %step,
    decision = %disposition.decision,
    "checkpoint dispositioned"
  );

  match disposition.decision {
    Decision::Rejected => {
      batch.status = BatchStatus::Rejected;
      tracing::info!(batch = %batch.batch_number, step = %step, "batch rejected");
    }
    Decision::Approved if step == batch.current_step => {
      match batch.next_step_after(step) {
        Some(next) => {
          batch.current_step = next;
          tracing::debug!(batch = %batch.batch_number, from = %step, to = %next, "advanced");
        }
        None if batch.checkpoints.iter().any(|c| c.status == CheckpointStatus::Reprocess) => {
          tracing::debug!(batch = %batch.batch_number, "completion held by reprocess");
        }
        None => {
          batch.status = BatchStatus::Completed;
          tracing::info!(batch = %batch.batch_number, "batch completed");
        }
      }
    }
    Decision::Reprocess if step < batch.current_step => {
      tracing::debug!(
        batch = %batch.batch_number,
        from = %batch.current_step,
        to = %step,
        "returned for reprocess"
      );
      batch.current_step = step;
    }
    Decision::Approved | Decision::Reprocess => {}
  }

  Ok(&*batch)
}

/// Copy `stored`, apply `readings` on top and re-derive every verdict.
fn record_readings(
  stored: &[MetricObservation],
  checkpoint_id: Uuid,
  readings: &[MetricReading],
) -> Result<Vec<MetricObservation>> {
  let mut metrics = stored.to_vec();
  for reading in readings {
    let obs = metrics
      .iter_mut()
      .find(|m| m.id() == reading.metric_id)
      .ok_or_else(|| Error::MetricNotFound {
        checkpoint_id,
        metric_id: reading.metric_id.clone(),
      })?;
    obs.record(reading.value.clone());
  }
  for obs in &mut metrics {
    obs.revalidate();
  }
  Ok(metrics)
}
