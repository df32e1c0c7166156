//! Batch factory: instantiate a batch and its checkpoints from the registry.

use uuid::Uuid;

use crate::{
  Error, Result,
  batch::{Batch, BatchStatus, Checkpoint, CheckpointStatus, NewBatch},
  metric::MetricObservation,
  registry::ProcessRegistry,
  step::ProcessStep,
};

/// Create a batch whose checkpoints mirror every step that applies to its
/// material type, in registry order.
///
/// Every checkpoint starts out [`CheckpointStatus::Pending`] with unrecorded
/// metrics. The batch number is stored trimmed. The returned batch is not
/// stored anywhere; that is up to the caller.
pub fn create_batch(registry: &ProcessRegistry, input: NewBatch) -> Result<Batch> {
  if input.batch_number.trim().is_empty() {
    return Err(Error::InvalidBatch("batch number must not be blank".into()));
  }
  if input.raw_material.trim().is_empty() {
    return Err(Error::InvalidBatch("raw material must not be blank".into()));
  }
  if !(input.quantity.is_finite() && input.quantity > 0.0) {
    return Err(Error::InvalidBatch(format!(
      "quantity must be greater than zero, got {}",
      input.quantity
    )));
  }

  let checkpoints: Vec<Checkpoint> = registry
    .steps_for_material(input.raw_material_type)
    .map(snapshot)
    .collect();

  let Some(first) = checkpoints.first() else {
    return Err(Error::EmptyTemplate(input.raw_material_type));
  };
  let current_step = first.step_number;

  let batch = Batch {
    id: Uuid::new_v4(),
    batch_number: input.batch_number.trim().to_owned(),
    raw_material: input.raw_material,
    raw_material_type: input.raw_material_type,
    quantity: input.quantity,
    unit: input.unit,
    start_time: input.start_time,
    current_step,
    status: BatchStatus::Active,
    checkpoints,
    parallel_processes: input.parallel_processes,
  };

  tracing::info!(
    batch = %batch.batch_number,
    material = %batch.raw_material_type,
    checkpoints = batch.checkpoints.len(),
    "batch created"
  );
  Ok(batch)
}

/// Deep-copy a step into a fresh checkpoint.
fn snapshot(step: &ProcessStep) -> Checkpoint {
  Checkpoint {
    id:          Uuid::new_v4(),
    step_number: step.id,
    name:        step.name.clone(),
    ccp_number:  step.ccp_number.clone(),
    stage:       step.stage,
    status:      CheckpointStatus::Pending,
    inspector:   None,
    timestamp:   None,
    notes:       None,
    metrics:     step
      .metrics
      .iter()
      .cloned()
      .map(MetricObservation::unrecorded)
      .collect(),
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{
    metric::{MetricDefinition, MetricKind},
    step::{MaterialType, NewProcessStep, Stage, StepId},
  };

  fn registry() -> ProcessRegistry {
    ProcessRegistry::default_template().unwrap()
  }

  fn request(material: MaterialType) -> NewBatch {
    NewBatch::new("CHB27F25SYR", "Chicken Breast", material, 250.0, Utc::now())
  }

  #[test]
  fn checkpoints_match_applicable_steps_in_order() {
    let reg = registry();
    for material in [MaterialType::Frozen, MaterialType::Chilled] {
      let batch = create_batch(&reg, request(material)).unwrap();
      let expected: Vec<StepId> = reg.steps_for_material(material).map(|s| s.id).collect();
      let actual: Vec<StepId> = batch.checkpoints.iter().map(|c| c.step_number).collect();
      assert_eq!(actual, expected, "{material}");
    }
  }

  #[test]
  fn batch_number_is_stored_trimmed() {
    let input =
      NewBatch::new("  CHB27F25SYR\t", "Chicken Breast", MaterialType::Chilled, 5.0, Utc::now());
    let batch = create_batch(&registry(), input).unwrap();
    assert_eq!(batch.batch_number, "CHB27F25SYR");
  }

  #[test]
  fn new_batch_starts_active_at_first_step_with_pending_checkpoints() {
    let batch = create_batch(&registry(), request(MaterialType::Chilled)).unwrap();
    assert_eq!(batch.status, BatchStatus::Active);
    assert_eq!(batch.current_step, StepId(0));
    assert!(batch
      .checkpoints
      .iter()
      .all(|c| c.status == CheckpointStatus::Pending && c.inspector.is_none()));
  }

  #[test]
  fn metrics_are_unrecorded_copies() {
    let reg = registry();
    let batch = create_batch(&reg, request(MaterialType::Frozen)).unwrap();
    let cooking = batch.checkpoint_for_step(StepId(7)).unwrap();
    let template = reg.get(StepId(7)).unwrap();
    assert_eq!(cooking.metrics.len(), template.metrics.len());
    for (obs, def) in cooking.metrics.iter().zip(&template.metrics) {
      assert_eq!(&obs.definition, def);
      assert!(obs.value().is_none());
      assert!(obs.passed().is_none());
    }
    assert_eq!(cooking.ccp_number.as_deref(), Some("CCP-02"));
    assert_eq!(cooking.stage, Stage::Processing);
  }

  #[test]
  fn checkpoint_ids_are_unique_across_batches() {
    let reg = registry();
    let a = create_batch(&reg, request(MaterialType::Frozen)).unwrap();
    let b = create_batch(&reg, request(MaterialType::Frozen)).unwrap();
    assert_ne!(a.id, b.id);
    assert_ne!(a.checkpoints[0].id, b.checkpoints[0].id);
  }

  #[test]
  fn material_without_steps_is_an_empty_template() {
    let err = create_batch(&registry(), request(MaterialType::Seasonings)).unwrap_err();
    assert!(matches!(err, Error::EmptyTemplate(MaterialType::Seasonings)));
  }

  #[test]
  fn quantity_must_be_positive() {
    let mut req = request(MaterialType::Frozen);
    req.quantity = 0.0;
    assert!(matches!(create_batch(&registry(), req), Err(Error::InvalidBatch(_))));

    let mut req = request(MaterialType::Frozen);
    req.quantity = f64::NAN;
    assert!(matches!(create_batch(&registry(), req), Err(Error::InvalidBatch(_))));
  }

  #[test]
  fn registry_edits_do_not_reach_existing_batches() {
    let mut reg = ProcessRegistry::new();
    let id = reg
      .add_step(
        NewProcessStep::new("Weighing", Stage::Processing, [MaterialType::Chilled])
          .with_metric(MetricDefinition::new("w", "Weight", MetricKind::Weight).required()),
      )
      .unwrap();
    let batch = create_batch(&reg, request(MaterialType::Chilled)).unwrap();

    reg
      .update_step(
        id,
        NewProcessStep::new("Reweighing", Stage::Processing, [MaterialType::Chilled]),
      )
      .unwrap();
    reg.remove_step(id).unwrap();

    assert_eq!(batch.checkpoints.len(), 1);
    assert_eq!(batch.checkpoints[0].name, "Weighing");
    assert_eq!(batch.checkpoints[0].metrics.len(), 1);
  }
}
