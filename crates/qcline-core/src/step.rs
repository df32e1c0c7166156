//! Process steps: the template from which batch checkpoints are instantiated.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{Error, Result, metric::MetricDefinition};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Ordinal identifier of a process step.
///
/// Ids are unique within a registry but need not be contiguous; "next step"
/// is always resolved by ordering, never by arithmetic.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StepId(pub u32);

impl fmt::Display for StepId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Raw material family; decides which steps a batch goes through.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MaterialType {
  Frozen,
  Chilled,
  Seasonings,
  Packaging,
}

/// Coarse grouping of steps used for progress display.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Stage {
  Preprocessing,
  Processing,
  Packaging,
}

// ─── ProcessStep ─────────────────────────────────────────────────────────────

/// A registered process step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStep {
  pub id:             StepId,
  pub name:           String,
  /// HACCP label such as `CCP-02`. A step is a Critical Control Point exactly
  /// when this is present.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ccp_number:     Option<String>,
  /// Expected duration in minutes.
  pub estimated_time: u32,
  #[serde(default)]
  pub description:    String,
  pub material_types: Vec<MaterialType>,
  pub stage:          Stage,
  #[serde(default)]
  pub metrics:        Vec<MetricDefinition>,
}

impl ProcessStep {
  pub fn is_ccp(&self) -> bool { self.ccp_number.is_some() }

  pub fn applies_to(&self, material: MaterialType) -> bool {
    self.material_types.contains(&material)
  }

  /// Split into the id and the editable fields.
  pub fn into_parts(self) -> (StepId, NewProcessStep) {
    (self.id, NewProcessStep {
      name:           self.name,
      ccp_number:     self.ccp_number,
      estimated_time: self.estimated_time,
      description:    self.description,
      material_types: self.material_types,
      stage:          self.stage,
      metrics:        self.metrics,
    })
  }
}

// ─── NewProcessStep ──────────────────────────────────────────────────────────

/// The editable body of a step: input to
/// [`ProcessRegistry::add_step`](crate::registry::ProcessRegistry::add_step)
/// and [`ProcessRegistry::update_step`](crate::registry::ProcessRegistry::update_step).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProcessStep {
  pub name:           String,
  #[serde(default)]
  pub ccp_number:     Option<String>,
  pub estimated_time: u32,
  #[serde(default)]
  pub description:    String,
  pub material_types: Vec<MaterialType>,
  pub stage:          Stage,
  #[serde(default)]
  pub metrics:        Vec<MetricDefinition>,
}

impl NewProcessStep {
  /// A non-CCP step with no metrics and a 15 minute estimate.
  pub fn new(
    name: impl Into<String>,
    stage: Stage,
    material_types: impl IntoIterator<Item = MaterialType>,
  ) -> Self {
    Self {
      name: name.into(),
      ccp_number: None,
      estimated_time: 15,
      description: String::new(),
      material_types: material_types.into_iter().collect(),
      stage,
      metrics: Vec::new(),
    }
  }

  pub fn with_ccp(mut self, label: impl Into<String>) -> Self {
    self.ccp_number = Some(label.into());
    self
  }

  pub fn with_estimated_time(mut self, minutes: u32) -> Self {
    self.estimated_time = minutes;
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn with_metric(mut self, metric: MetricDefinition) -> Self {
    self.metrics.push(metric);
    self
  }

  pub fn with_id(self, id: StepId) -> ProcessStep {
    ProcessStep {
      id,
      name: self.name,
      ccp_number: self.ccp_number,
      estimated_time: self.estimated_time,
      description: self.description,
      material_types: self.material_types,
      stage: self.stage,
      metrics: self.metrics,
    }
  }

  /// Check the structural invariants of a step body.
  pub fn validate(&self) -> Result<()> {
    let invalid = |msg: String| -> Result<()> { Err(Error::InvalidStep(msg)) };

    if self.name.trim().is_empty() {
      return invalid("step name must not be blank".into());
    }
    if self.estimated_time == 0 {
      return invalid(format!(
        "{:?}: estimated time must be greater than zero",
        self.name
      ));
    }
    if self.material_types.is_empty() {
      return invalid(format!(
        "{:?}: at least one material type is required",
        self.name
      ));
    }
    if let Some(label) = &self.ccp_number
      && label.trim().is_empty()
    {
      return invalid(format!("{:?}: CCP number must not be blank", self.name));
    }

    let mut seen = HashSet::new();
    for metric in &self.metrics {
      metric.validate().map_err(|e| {
        Error::InvalidStep(format!("{:?}: {e}", self.name))
      })?;
      if !seen.insert(metric.id.as_str()) {
        return invalid(format!(
          "{:?}: duplicate metric id {:?}",
          self.name, metric.id
        ));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::metric::{MetricDefinition, MetricKind};

  fn base() -> NewProcessStep {
    NewProcessStep::new("Cooking", Stage::Processing, [MaterialType::Frozen])
  }

  #[test]
  fn material_type_parses_case_insensitively() {
    assert_eq!("Frozen".parse::<MaterialType>().unwrap(), MaterialType::Frozen);
    assert_eq!(MaterialType::Seasonings.to_string(), "seasonings");
    assert!("dried".parse::<MaterialType>().is_err());
  }

  #[test]
  fn ccp_flag_follows_label() {
    let step = base().with_ccp("CCP-02").with_id(StepId(7));
    assert!(step.is_ccp());
    assert!(!base().with_id(StepId(8)).is_ccp());
  }

  #[test]
  fn validate_accepts_well_formed_step() {
    let step = base()
      .with_ccp("CCP-02")
      .with_metric(
        MetricDefinition::new("cook1", "Core Temperature", MetricKind::Temperature)
          .with_min(75.0)
          .required(),
      );
    step.validate().unwrap();
  }

  #[test]
  fn validate_rejects_zero_duration_and_empty_materials() {
    let step = base().with_estimated_time(0);
    assert!(matches!(step.validate(), Err(Error::InvalidStep(_))));

    let mut step = base();
    step.material_types.clear();
    assert!(matches!(step.validate(), Err(Error::InvalidStep(_))));
  }

  #[test]
  fn validate_rejects_blank_ccp_label() {
    let step = base().with_ccp("  ");
    assert!(matches!(step.validate(), Err(Error::InvalidStep(_))));
  }

  #[test]
  fn validate_rejects_duplicate_metric_ids() {
    let metric = MetricDefinition::new("m1", "Weight", MetricKind::Weight);
    let step = base().with_metric(metric.clone()).with_metric(metric);
    let err = step.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate metric id"));
  }

  #[test]
  fn validate_rejects_inverted_bounds() {
    let step = base().with_metric(
      MetricDefinition::new("m1", "pH", MetricKind::Ph)
        .with_min(7.0)
        .with_max(4.0),
    );
    assert!(matches!(step.validate(), Err(Error::InvalidStep(_))));
  }
}
