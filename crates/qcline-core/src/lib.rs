//! Core types and logic for the qcline batch inspection engine.
//!
//! A [`ProcessRegistry`](registry::ProcessRegistry) describes the process
//! steps of a plant. Each new [`Batch`](batch::Batch) gets its own
//! checkpoint per applicable step, and inspectors move it forward by
//! recording [dispositions](disposition::Disposition) on those checkpoints.
//! [`Plant`](plant::Plant) ties the pieces together.
//!
//! This crate performs no I/O beyond parsing template text handed to it.

pub mod batch;
pub mod batch_number;
pub mod disposition;
pub mod error;
pub mod factory;
pub mod metric;
pub mod plant;
pub mod query;
pub mod registry;
pub mod step;
pub mod store;
pub mod template;

pub use error::{Error, Result};
