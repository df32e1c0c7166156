//! Quality metrics: template definitions, recorded observations and the
//! acceptance rule that decides whether an observation passes.
//!
//! A [`MetricDefinition`] belongs to a process step and never changes once a
//! batch has been created. Each checkpoint owns its own deep copy wrapped in a
//! [`MetricObservation`], so recording a value on one batch cannot leak into
//! another batch or back into the template.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── Kinds & values ──────────────────────────────────────────────────────────

/// What a metric measures. Informational; acceptance only looks at bounds.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricKind {
  Temperature,
  Weight,
  Visual,
  Ph,
  Moisture,
  Count,
  Percentage,
  Time,
  Pressure,
}

/// Outcome of a visual check, recorded as-is.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VisualOutcome {
  Pass,
  Fail,
  Marginal,
}

/// A recorded measurement.
///
/// Serialised untagged: `21.5`, `"pass"` and `"see photo"` are all valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
  Number(f64),
  Visual(VisualOutcome),
  Text(String),
}

impl MetricValue {
  pub fn as_number(&self) -> Option<f64> {
    match self {
      Self::Number(n) => Some(*n),
      _ => None,
    }
  }

  /// Blank text counts as no value at all.
  pub fn is_empty(&self) -> bool {
    match self {
      Self::Text(s) => s.trim().is_empty(),
      Self::Number(_) | Self::Visual(_) => false,
    }
  }
}

impl From<f64> for MetricValue {
  fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<VisualOutcome> for MetricValue {
  fn from(v: VisualOutcome) -> Self { Self::Visual(v) }
}

impl From<&str> for MetricValue {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

// ─── MetricDefinition ────────────────────────────────────────────────────────

/// Template for one measurement taken at a process step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
  pub id:        String,
  pub name:      String,
  #[serde(rename = "type")]
  pub kind:      MetricKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub unit:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min:       Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max:       Option<f64>,
  #[serde(default)]
  pub required:  bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub help_text: Option<String>,
}

impl MetricDefinition {
  /// An optional, unbounded metric.
  pub fn new(id: impl Into<String>, name: impl Into<String>, kind: MetricKind) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      kind,
      unit: None,
      min: None,
      max: None,
      required: false,
      help_text: None,
    }
  }

  pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
    self.unit = Some(unit.into());
    self
  }

  pub fn with_min(mut self, min: f64) -> Self {
    self.min = Some(min);
    self
  }

  pub fn with_max(mut self, max: f64) -> Self {
    self.max = Some(max);
    self
  }

  pub fn with_help(mut self, text: impl Into<String>) -> Self {
    self.help_text = Some(text.into());
    self
  }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }

  /// Bounds must be finite and ordered.
  pub fn validate(&self) -> Result<(), String> {
    if self.id.trim().is_empty() {
      return Err(format!("metric {:?} has a blank id", self.name));
    }
    for bound in [self.min, self.max].into_iter().flatten() {
      if !bound.is_finite() {
        return Err(format!("metric {:?} has a non-finite bound", self.id));
      }
    }
    if let (Some(min), Some(max)) = (self.min, self.max)
      && min > max
    {
      return Err(format!(
        "metric {:?}: minimum {min} exceeds maximum {max}",
        self.id
      ));
    }
    Ok(())
  }
}

// ─── MetricObservation ───────────────────────────────────────────────────────

/// A checkpoint's copy of a [`MetricDefinition`] together with the recorded
/// value and the validator's verdict.
///
/// `passed` cannot be set directly; it is recomputed from the value every time
/// a value is recorded, and again when an observation is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredObservation")]
pub struct MetricObservation {
  #[serde(flatten)]
  pub definition: MetricDefinition,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  value:          Option<MetricValue>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  passed:         Option<bool>,
}

impl MetricObservation {
  /// Fresh observation with no value and no verdict.
  pub fn unrecorded(definition: MetricDefinition) -> Self {
    Self {
      definition,
      value: None,
      passed: None,
    }
  }

  pub fn id(&self) -> &str { &self.definition.id }

  pub fn value(&self) -> Option<&MetricValue> { self.value.as_ref() }

  /// The validator's verdict at the time the value was last recorded.
  pub fn passed(&self) -> Option<bool> { self.passed }

  /// Store `value` (or clear it) and recompute the verdict.
  pub fn record(&mut self, value: Option<MetricValue>) {
    self.value = value;
    self.revalidate();
  }

  /// Recompute `passed` from the current value.
  pub fn revalidate(&mut self) { self.passed = Some(validate(self)); }

  /// Has a non-empty value that passes validation.
  pub fn is_satisfied(&self) -> bool { self.has_value() && validate(self) }

  fn has_value(&self) -> bool {
    self.value.as_ref().is_some_and(|v| !v.is_empty())
  }
}

/// Wire form of [`MetricObservation`]. The stored verdict only records
/// whether one was ever computed; its value is never trusted.
#[derive(Deserialize)]
struct StoredObservation {
  #[serde(flatten)]
  definition: MetricDefinition,
  #[serde(default)]
  value:      Option<MetricValue>,
  #[serde(default)]
  passed:     Option<bool>,
}

impl From<StoredObservation> for MetricObservation {
  fn from(stored: StoredObservation) -> Self {
    let mut observation = Self {
      definition: stored.definition,
      value:      stored.value,
      passed:     None,
    };
    if observation.value.is_some() || stored.passed.is_some() {
      observation.revalidate();
    }
    observation
  }
}

/// One value entered by an inspector, addressed by metric id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
  pub metric_id: String,
  #[serde(default)]
  pub value:     Option<MetricValue>,
}

impl MetricReading {
  pub fn new(metric_id: impl Into<String>, value: impl Into<MetricValue>) -> Self {
    Self {
      metric_id: metric_id.into(),
      value:     Some(value.into()),
    }
  }

  pub fn cleared(metric_id: impl Into<String>) -> Self {
    Self {
      metric_id: metric_id.into(),
      value:     None,
    }
  }
}

// ─── Validator ───────────────────────────────────────────────────────────────

/// Decide whether an observation satisfies its acceptance rule.
///
/// Required metrics fail while empty. Numeric values are checked against
/// whichever bounds are configured. Anything else (visual outcomes, free
/// text, unbounded metrics, optional metrics left empty) passes.
pub fn validate(observation: &MetricObservation) -> bool {
  let def = &observation.definition;

  if def.required && !observation.has_value() {
    return false;
  }

  let Some(value) = observation.value.as_ref().and_then(MetricValue::as_number)
  else {
    return true;
  };

  match (def.min, def.max) {
    (Some(min), Some(max)) => min <= value && value <= max,
    (None, Some(max)) => value <= max,
    (Some(min), None) => value >= min,
    (None, None) => true,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn observe(def: MetricDefinition, value: Option<MetricValue>) -> MetricObservation {
    let mut obs = MetricObservation::unrecorded(def);
    obs.record(value);
    obs
  }

  fn ranged() -> MetricDefinition {
    MetricDefinition::new("ster1", "Retort Chamber Temperature", MetricKind::Temperature)
      .with_unit("°C")
      .with_min(119.0)
      .with_max(123.0)
      .required()
  }

  #[test]
  fn required_without_value_fails() {
    let obs = observe(ranged(), None);
    assert!(!validate(&obs));
    assert_eq!(obs.passed(), Some(false));
  }

  #[test]
  fn required_blank_text_fails() {
    let def = MetricDefinition::new("v1", "Seal", MetricKind::Visual).required();
    assert!(!validate(&observe(def, Some("   ".into()))));
  }

  #[test]
  fn optional_without_value_passes() {
    let def = MetricDefinition::new("rrc2", "Core Temperature", MetricKind::Temperature)
      .with_max(-18.0);
    assert!(validate(&observe(def, None)));
  }

  #[test]
  fn closed_range_includes_both_bounds() {
    for v in [119.0_f64, 121.0, 123.0] {
      assert!(validate(&observe(ranged(), Some(v.into()))), "{v} should pass");
    }
    for v in [118.0_f64, 124.0] {
      assert!(!validate(&observe(ranged(), Some(v.into()))), "{v} should fail");
    }
  }

  #[test]
  fn max_only_bound() {
    let def = MetricDefinition::new("rrc1", "Surface Temperature", MetricKind::Temperature)
      .with_max(4.0)
      .required();
    assert!(validate(&observe(def.clone(), Some(4.0_f64.into()))));
    assert!(validate(&observe(def.clone(), Some((-2.5_f64).into()))));
    assert!(!validate(&observe(def, Some(4.1_f64.into()))));
  }

  #[test]
  fn min_only_bound() {
    let def = MetricDefinition::new("cook1", "Core Temperature", MetricKind::Temperature)
      .with_min(75.0)
      .required();
    assert!(validate(&observe(def.clone(), Some(75.0_f64.into()))));
    assert!(!validate(&observe(def, Some(74.0_f64.into()))));
  }

  #[test]
  fn zero_is_a_present_value() {
    let def = MetricDefinition::new("disp2", "Transport Temperature", MetricKind::Temperature)
      .with_max(0.0)
      .required();
    assert!(validate(&observe(def, Some(0.0_f64.into()))));
  }

  #[test]
  fn visual_outcomes_pass_once_present() {
    let def = MetricDefinition::new("md1", "Fe test piece", MetricKind::Visual).required();
    for outcome in [VisualOutcome::Pass, VisualOutcome::Fail, VisualOutcome::Marginal] {
      assert!(validate(&observe(def.clone(), Some(outcome.into()))));
    }
  }

  #[test]
  fn text_on_bounded_metric_is_not_range_checked() {
    assert!(validate(&observe(ranged(), Some("sensor offline".into()))));
  }

  #[test]
  fn satisfied_requires_a_value() {
    let def = MetricDefinition::new("weigh1", "Weight", MetricKind::Weight);
    let empty = observe(def.clone(), None);
    assert!(validate(&empty));
    assert!(!empty.is_satisfied());
    assert!(observe(def, Some(12.0_f64.into())).is_satisfied());
  }

  #[test]
  fn recording_recomputes_verdict() {
    let mut obs = MetricObservation::unrecorded(ranged());
    assert_eq!(obs.passed(), None);
    obs.record(Some(130.0_f64.into()));
    assert_eq!(obs.passed(), Some(false));
    obs.record(Some(120.0_f64.into()));
    assert_eq!(obs.passed(), Some(true));
  }

  #[test]
  fn metric_values_deserialize_untagged() {
    let values: Vec<MetricValue> =
      serde_json::from_str(r#"[3.5, "pass", "marginal", "see photo"]"#).unwrap();
    assert_eq!(values, vec![
      MetricValue::Number(3.5),
      MetricValue::Visual(VisualOutcome::Pass),
      MetricValue::Visual(VisualOutcome::Marginal),
      MetricValue::Text("see photo".into()),
    ]);
  }

  #[test]
  fn stored_verdict_is_recomputed_on_load() {
    let obs: MetricObservation = serde_json::from_str(
      r#"{"id": "ster1", "name": "Retort", "type": "temperature",
          "min": 119, "max": 123, "required": true, "value": 90.0, "passed": true}"#,
    )
    .unwrap();
    assert_eq!(obs.passed(), Some(false));
    assert!(!obs.is_satisfied());

    let cleared: MetricObservation = serde_json::from_str(
      r#"{"id": "ster1", "name": "Retort", "type": "temperature", "required": true, "passed": true}"#,
    )
    .unwrap();
    assert_eq!(cleared.passed(), Some(false));

    let fresh: MetricObservation =
      serde_json::from_str(r#"{"id": "ster1", "name": "Retort", "type": "temperature"}"#).unwrap();
    assert_eq!(fresh, MetricObservation::unrecorded(fresh.definition.clone()));
  }

  #[test]
  fn bounds_must_be_ordered() {
    assert!(ranged().validate().is_ok());
    let bad = MetricDefinition::new("x", "x", MetricKind::Count)
      .with_min(3.0)
      .with_max(2.0);
    assert!(bad.validate().is_err());
  }
}
