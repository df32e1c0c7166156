//! The `BatchStore` trait and the in-memory backend.
//!
//! [`Plant`](crate::plant::Plant) depends on this abstraction, not on any
//! concrete backend.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{Error, Result, batch::Batch, query};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Owner of every batch in the plant.
///
/// Stored batches are mutated in place through [`BatchStore::get_mut`]; the
/// store itself never changes a batch's contents.
pub trait BatchStore {
  /// Store a freshly created batch and return a reference to the stored copy.
  ///
  /// Returns an error if a batch with the same id is already stored.
  fn insert(&mut self, batch: Batch) -> Result<&Batch>;

  /// Retrieve a batch by id. Returns `None` if not found.
  fn get(&self, id: Uuid) -> Result<Option<&Batch>>;

  fn get_mut(&mut self, id: Uuid) -> Result<Option<&mut Batch>>;

  /// All batches in insertion order.
  fn list(&self) -> Result<Vec<&Batch>>;

  /// Case-insensitive lookup on the batch number.
  fn find_by_number(&self, number: &str) -> Result<Option<&Batch>>;
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

/// A [`BatchStore`] backed by a `Vec` and an id index.
#[derive(Debug, Default)]
pub struct MemoryStore {
  batches: Vec<Batch>,
  index:   HashMap<Uuid, usize>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.batches.len() }

  pub fn is_empty(&self) -> bool { self.batches.is_empty() }
}

impl BatchStore for MemoryStore {
  fn insert(&mut self, batch: Batch) -> Result<&Batch> {
    if self.index.contains_key(&batch.id) {
      return Err(Error::InvalidBatch(format!("batch id {} is already stored", batch.id)));
    }
    let slot = self.batches.len();
    self.index.insert(batch.id, slot);
    self.batches.push(batch);
    Ok(&self.batches[slot])
  }

  fn get(&self, id: Uuid) -> Result<Option<&Batch>> {
    Ok(self.index.get(&id).map(|&i| &self.batches[i]))
  }

  fn get_mut(&mut self, id: Uuid) -> Result<Option<&mut Batch>> {
    Ok(match self.index.get(&id) {
      Some(&i) => self.batches.get_mut(i),
      None => None,
    })
  }

  fn list(&self) -> Result<Vec<&Batch>> { Ok(self.batches.iter().collect()) }

  fn find_by_number(&self, number: &str) -> Result<Option<&Batch>> {
    Ok(query::find_by_batch_number(&self.batches, number))
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{
    batch::NewBatch,
    factory::create_batch,
    registry::ProcessRegistry,
    step::MaterialType,
  };

  fn batch(number: &str) -> Batch {
    let reg = ProcessRegistry::default_template().unwrap();
    create_batch(&reg, NewBatch::new(number, "Beef Cuts", MaterialType::Frozen, 40.0, Utc::now()))
      .unwrap()
  }

  #[test]
  fn insert_and_get() {
    let mut s = MemoryStore::new();
    let b = batch("BEC01A25SYR");
    let id = b.id;
    s.insert(b).unwrap();

    let fetched = s.get(id).unwrap().unwrap();
    assert_eq!(fetched.batch_number, "BEC01A25SYR");
    assert_eq!(s.len(), 1);
  }

  #[test]
  fn get_missing_returns_none() {
    let s = MemoryStore::new();
    assert!(s.get(Uuid::new_v4()).unwrap().is_none());
    assert!(s.is_empty());
  }

  #[test]
  fn list_keeps_insertion_order() {
    let mut s = MemoryStore::new();
    for n in ["B3", "B1", "B2"] {
      s.insert(batch(n)).unwrap();
    }
    let numbers: Vec<&str> = s
      .list()
      .unwrap()
      .into_iter()
      .map(|b| b.batch_number.as_str())
      .collect();
    assert_eq!(numbers, ["B3", "B1", "B2"]);
  }

  #[test]
  fn same_id_cannot_be_stored_twice() {
    let mut s = MemoryStore::new();
    let b = batch("B1");
    s.insert(b.clone()).unwrap();
    assert!(matches!(s.insert(b), Err(Error::InvalidBatch(_))));
  }

  #[test]
  fn get_mut_changes_are_visible() {
    let mut s = MemoryStore::new();
    let b = batch("B1");
    let id = b.id;
    s.insert(b).unwrap();
    s.get_mut(id).unwrap().unwrap().unit = "lb".into();
    assert_eq!(s.get(id).unwrap().unwrap().unit, "lb");
  }

  #[test]
  fn find_by_number_ignores_case() {
    let mut s = MemoryStore::new();
    s.insert(batch("CHB27F25SYR")).unwrap();
    assert!(s.find_by_number("chb27f25syr").unwrap().is_some());
    assert!(s.find_by_number("CHB27F25SYX").unwrap().is_none());
  }
}
