//! Runtime settings for the `qcline` binary.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML file
//! (`--config`), then `QCLINE_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use qcline_core::{
  batch_number::DEFAULT_SUPPLIER_CODE,
  plant::PlantOptions,
  registry::ProcessRegistry,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// Process template to load instead of the built-in one.
  #[serde(default)]
  pub template_path:                  Option<PathBuf>,
  #[serde(default = "default_supplier")]
  pub supplier_code:                  String,
  /// Inspector recorded on journal decisions that do not name one.
  #[serde(default = "default_inspector")]
  pub inspector:                      String,
  #[serde(default = "default_true")]
  pub reject_duplicate_batch_numbers: bool,
}

fn default_supplier() -> String { DEFAULT_SUPPLIER_CODE.to_owned() }

fn default_inspector() -> String { "qa".to_owned() }

fn default_true() -> bool { true }

impl Settings {
  /// Layer the optional file at `path` and the environment.
  pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
      builder = builder.add_source(config::File::from(path).required(false));
    }
    builder = builder.add_source(config::Environment::with_prefix("QCLINE"));
    Self::build(builder)
  }

  fn build(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> anyhow::Result<Self> {
    builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  /// The configured template, or the built-in one.
  pub fn registry(&self) -> anyhow::Result<ProcessRegistry> {
    let Some(path) = &self.template_path else {
      return ProcessRegistry::default_template().context("built-in template is invalid");
    };
    let path = expand_tilde(path);
    let raw = std::fs::read_to_string(&path)
      .with_context(|| format!("reading template {}", path.display()))?;
    ProcessRegistry::from_toml_str(&raw)
      .with_context(|| format!("loading template {}", path.display()))
  }

  pub fn plant_options(&self) -> PlantOptions {
    PlantOptions {
      reject_duplicate_batch_numbers: self.reject_duplicate_batch_numbers,
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
