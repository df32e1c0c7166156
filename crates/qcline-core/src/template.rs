//! Loading process templates from TOML.
//!
//! A template is a list of `[[step]]` tables, each with optional
//! `[[step.metrics]]` sub-tables:
//!
//! ```toml
//! [[step]]
//! id = 7
//! name = "COOKING TO CORE TEMP"
//! ccp_number = "CCP-02"
//! estimated_time = 45
//! material_types = ["frozen", "chilled"]
//! stage = "processing"
//!
//!   [[step.metrics]]
//!   id = "cook1"
//!   name = "Core Temperature"
//!   type = "temperature"
//!   unit = "°C"
//!   min = 75.0
//!   required = true
//! ```

use serde::Deserialize;

use crate::{Result, registry::ProcessRegistry, step::ProcessStep};

/// The built-in frozen/chilled HACCP template.
const DEFAULT_TEMPLATE: &str = include_str!("../templates/default.toml");

#[derive(Deserialize)]
struct TemplateFile {
  #[serde(default, rename = "step")]
  steps: Vec<ProcessStep>,
}

impl ProcessRegistry {
  /// Parse and validate a TOML template.
  pub fn from_toml_str(input: &str) -> Result<Self> {
    let file: TemplateFile = toml::from_str(input)?;
    Self::from_steps(file.steps)
  }

  /// The 13-step receiving-to-dispatch template for frozen and chilled meat.
  pub fn default_template() -> Result<Self> { Self::from_toml_str(DEFAULT_TEMPLATE) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    Error,
    metric::MetricKind,
    step::{MaterialType, Stage, StepId},
  };

  #[test]
  fn default_template_parses() {
    let reg = ProcessRegistry::from_toml_str(DEFAULT_TEMPLATE).unwrap();
    assert_eq!(reg.len(), 13);
    assert_eq!(reg.steps()[0].id, StepId(0));
    assert_eq!(reg.steps()[12].id, StepId(12));
  }

  #[test]
  fn default_template_has_five_ccps() {
    let reg = ProcessRegistry::default_template().unwrap();
    let ccps: Vec<_> = reg
      .steps()
      .iter()
      .filter_map(|s| s.ccp_number.as_deref())
      .collect();
    assert_eq!(ccps, ["CCP-01", "CCP-02", "CCP-03", "CCP-04", "CCP-05"]);
  }

  #[test]
  fn thawing_applies_to_frozen_only() {
    let reg = ProcessRegistry::default_template().unwrap();
    assert_eq!(reg.steps_for_material(MaterialType::Frozen).count(), 13);
    let chilled: Vec<_> = reg
      .steps_for_material(MaterialType::Chilled)
      .map(|s| s.id)
      .collect();
    assert_eq!(chilled.len(), 12);
    assert!(!chilled.contains(&StepId(3)));
    assert_eq!(reg.steps_for_material(MaterialType::Seasonings).count(), 0);
  }

  #[test]
  fn stages_are_in_order() {
    let reg = ProcessRegistry::default_template().unwrap();
    let stages: Vec<Stage> = reg.steps().iter().map(|s| s.stage).collect();
    let mut sorted = stages.clone();
    sorted.sort();
    assert_eq!(stages, sorted);
  }

  #[test]
  fn cooking_metric_bounds_survive_parsing() {
    let reg = ProcessRegistry::default_template().unwrap();
    let cooking = reg.get(StepId(7)).unwrap();
    assert_eq!(cooking.ccp_number.as_deref(), Some("CCP-02"));
    let core = &cooking.metrics[0];
    assert_eq!(core.id, "cook1");
    assert_eq!(core.kind, MetricKind::Temperature);
    assert_eq!(core.min, Some(75.0));
    assert_eq!(core.max, None);
    assert!(core.required);
  }

  #[test]
  fn malformed_toml_is_a_template_error() {
    let err = ProcessRegistry::from_toml_str("[[step]]\nid = \"zero\"").unwrap_err();
    assert!(matches!(err, Error::Template(_)));
  }

  #[test]
  fn invalid_step_in_template_is_rejected() {
    let input = r#"
      [[step]]
      id = 1
      name = "Weighing"
      estimated_time = 0
      material_types = ["chilled"]
      stage = "processing"
    "#;
    let err = ProcessRegistry::from_toml_str(input).unwrap_err();
    assert!(matches!(err, Error::InvalidStep(_)));
  }

  #[test]
  fn integer_bounds_are_accepted() {
    let input = r#"
      [[step]]
      id = 1
      name = "Storage"
      estimated_time = 10
      material_types = ["chilled"]
      stage = "preprocessing"

        [[step.metrics]]
        id = "t"
        name = "Storage Temperature"
        type = "temperature"
        max = 4
        required = true
    "#;
    let reg = ProcessRegistry::from_toml_str(input).unwrap();
    assert_eq!(reg.steps()[0].metrics[0].max, Some(4.0));
  }
}
