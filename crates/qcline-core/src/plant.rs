//! [`Plant`]: the single entry point for callers.
//!
//! Owns the process registry and a [`BatchStore`], and routes every
//! operation to the factory, the disposition engine or the query layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  batch::{Batch, NewBatch},
  disposition::{self, Disposition},
  factory,
  query::PlantSummary,
  registry::ProcessRegistry,
  step::{NewProcessStep, ProcessStep, StepId},
  store::{BatchStore, MemoryStore},
};

/// Plant-wide policy switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantOptions {
  /// Refuse a new batch whose number matches an existing one, ignoring case.
  pub reject_duplicate_batch_numbers: bool,
}

impl Default for PlantOptions {
  fn default() -> Self { Self { reject_duplicate_batch_numbers: true } }
}

#[derive(Debug)]
pub struct Plant<S: BatchStore = MemoryStore> {
  registry: ProcessRegistry,
  store:    S,
  options:  PlantOptions,
}

impl Plant<MemoryStore> {
  /// An empty in-memory plant running `registry`.
  pub fn new(registry: ProcessRegistry) -> Self {
    Self::with_store(registry, MemoryStore::new())
  }
}

impl<S: BatchStore> Plant<S> {
  pub fn with_store(registry: ProcessRegistry, store: S) -> Self {
    Self { registry, store, options: PlantOptions::default() }
  }

  pub fn with_options(mut self, options: PlantOptions) -> Self {
    self.options = options;
    self
  }

  pub fn options(&self) -> PlantOptions { self.options }

  pub fn registry(&self) -> &ProcessRegistry { &self.registry }

  // ── Batches ───────────────────────────────────────────────────────────

  /// Instantiate and store a new batch from the current registry.
  pub fn create_batch(&mut self, input: NewBatch) -> Result<&Batch> {
    let number = input.batch_number.trim();
    if self.options.reject_duplicate_batch_numbers
      && let Some(existing) = self.store.find_by_number(number)?
    {
      return Err(Error::DuplicateBatchNumber(existing.batch_number.clone()));
    }
    let batch = factory::create_batch(&self.registry, input)?;
    self.store.insert(batch)
  }

  /// Record a disposition on one checkpoint of a stored batch.
  pub fn apply_decision(
    &mut self,
    batch_id: Uuid,
    checkpoint_id: Uuid,
    disposition: Disposition,
  ) -> Result<&Batch> {
    let batch = self
      .store
      .get_mut(batch_id)?
      .ok_or_else(|| Error::BatchNotFound(batch_id.to_string()))?;
    disposition::apply_decision(batch, checkpoint_id, disposition)
  }

  /// Id of the checkpoint that batch `batch_id` holds for `step`.
  pub fn checkpoint_for_step(&self, batch_id: Uuid, step: StepId) -> Result<Uuid> {
    self
      .batch(batch_id)?
      .checkpoint_for_step(step)
      .map(|c| c.id)
      .ok_or(Error::StepNotFound(step))
  }

  pub fn batch(&self, id: Uuid) -> Result<&Batch> {
    self
      .store
      .get(id)?
      .ok_or_else(|| Error::BatchNotFound(id.to_string()))
  }

  pub fn batches(&self) -> Result<Vec<&Batch>> { self.store.list() }

  /// Case-insensitive lookup by batch number.
  pub fn lookup_batch_by_number(&self, number: &str) -> Result<Option<&Batch>> {
    self.store.find_by_number(number)
  }

  pub fn summary(&self) -> Result<PlantSummary> {
    Ok(PlantSummary::from_batches(self.store.list()?))
  }

  // ── Registry ──────────────────────────────────────────────────────────

  /// Add a step to the registry. Existing batches are unaffected.
  pub fn add_process_step(&mut self, step: NewProcessStep) -> Result<StepId> {
    self.registry.add_step(step)
  }

  pub fn update_process_step(&mut self, id: StepId, step: NewProcessStep) -> Result<()> {
    self.registry.update_step(id, step)
  }

  pub fn remove_process_step(&mut self, id: StepId) -> Result<ProcessStep> {
    self.registry.remove_step(id)
  }
}
