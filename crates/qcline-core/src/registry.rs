//! [`ProcessRegistry`]: the ordered, editable catalog of process steps.

use crate::{
  Error, Result,
  step::{MaterialType, NewProcessStep, ProcessStep, StepId},
};

/// Ordered collection of [`ProcessStep`]s, unique by id.
///
/// Registry order is the order checkpoints are instantiated in. Editing or
/// removing a step never touches batches that were already created from it;
/// the factory always copies out of the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessRegistry {
  steps: Vec<ProcessStep>,
}

impl ProcessRegistry {
  pub fn new() -> Self { Self::default() }

  /// Build a registry from fully-specified steps, keeping their order.
  ///
  /// Ids must strictly increase in the order given, so registry order and
  /// step-number order agree.
  pub fn from_steps(steps: Vec<ProcessStep>) -> Result<Self> {
    let mut previous: Option<StepId> = None;
    for step in &steps {
      if let Some(prev) = previous
        && step.id <= prev
      {
        return Err(Error::InvalidStep(format!(
          "step id {} follows {}; ids must increase in registry order",
          step.id, prev
        )));
      }
      check(step)?;
      previous = Some(step.id);
    }
    Ok(Self { steps })
  }

  pub fn steps(&self) -> &[ProcessStep] { &self.steps }

  pub fn len(&self) -> usize { self.steps.len() }

  pub fn is_empty(&self) -> bool { self.steps.is_empty() }

  pub fn get(&self, id: StepId) -> Option<&ProcessStep> {
    self.steps.iter().find(|s| s.id == id)
  }

  /// Steps that apply to `material`, in registry order.
  pub fn steps_for_material(
    &self,
    material: MaterialType,
  ) -> impl Iterator<Item = &ProcessStep> + '_ {
    self.steps.iter().filter(move |s| s.applies_to(material))
  }

  /// Append a new step. Its id is one past the largest existing id.
  pub fn add_step(&mut self, step: NewProcessStep) -> Result<StepId> {
    step.validate()?;
    let last = self.steps.iter().map(|s| s.id.0).max().unwrap_or(0);
    let id = last
      .checked_add(1)
      .map(StepId)
      .ok_or_else(|| Error::InvalidStep(format!("no step id left after {last}")))?;
    tracing::info!(step = %id, name = %step.name, "process step added");
    self.steps.push(step.with_id(id));
    Ok(id)
  }

  /// Replace the body of step `id`, keeping its position.
  pub fn update_step(&mut self, id: StepId, step: NewProcessStep) -> Result<()> {
    step.validate()?;
    let slot = self
      .steps
      .iter_mut()
      .find(|s| s.id == id)
      .ok_or(Error::StepNotFound(id))?;
    *slot = step.with_id(id);
    tracing::info!(step = %id, "process step updated");
    Ok(())
  }

  /// Remove step `id` and return it.
  pub fn remove_step(&mut self, id: StepId) -> Result<ProcessStep> {
    let index = self
      .steps
      .iter()
      .position(|s| s.id == id)
      .ok_or(Error::StepNotFound(id))?;
    tracing::info!(step = %id, "process step removed");
    Ok(self.steps.remove(index))
  }
}

/// Validate a stored step by round-tripping its body through
/// [`NewProcessStep::validate`].
fn check(step: &ProcessStep) -> Result<()> {
  let (_, body) = step.clone().into_parts();
  body.validate()
}
