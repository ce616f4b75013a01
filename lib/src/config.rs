//! Optional YAML configuration, command line flags take precedence over it.

use crate::{
    interpreter::{Delegate, InterpreterOptions},
    model::{ModelSpec, Normalization, OutputKind, Style},
    Error,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A model registered by the user in addition to the built-in styles
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomModel {
    pub name: String,
    pub path: PathBuf,
    #[serde(default = "default_output")]
    pub output: OutputKind,
    #[serde(default = "default_normalization")]
    pub normalization: Normalization,
}

fn default_output() -> OutputKind {
    OutputKind::Rgb
}

fn default_normalization() -> Normalization {
    Normalization::SignedUnit
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory the built-in model files are looked up in
    pub model_dir: Option<PathBuf>,
    pub style: Option<String>,
    pub threads: Option<usize>,
    pub delegate: Option<Delegate>,
    pub input_size: Option<u32>,
    #[serde(default)]
    pub custom_models: Vec<CustomModel>,
}

impl Config {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn model_dir(&self) -> &Path {
        self.model_dir
            .as_deref()
            .unwrap_or_else(|| Path::new(crate::DEFAULT_MODEL_DIR))
    }

    pub fn interpreter_options(&self) -> InterpreterOptions {
        let defaults = InterpreterOptions::default();
        InterpreterOptions {
            threads: self.threads.unwrap_or(defaults.threads),
            delegate: self.delegate.unwrap_or(defaults.delegate),
        }
    }

    /// Resolves a style name, configured custom models shadow built-in
    /// styles of the same name.
    pub fn resolve(&self, name: &str) -> Result<ModelSpec, Error> {
        let spec = match self.custom_models.iter().find(|cm| cm.name == name) {
            Some(cm) => ModelSpec::custom(&cm.name, &cm.path, cm.output, cm.normalization),
            None => ModelSpec::for_style(name.parse::<Style>()?, self.model_dir()),
        };

        Ok(match self.input_size {
            Some(size) => spec.with_input_size(size),
            None => spec,
        })
    }

    /// Every style name that `resolve` accepts
    pub fn style_specs(&self) -> Vec<ModelSpec> {
        let mut specs: Vec<_> = self
            .custom_models
            .iter()
            .map(|cm| ModelSpec::custom(&cm.name, &cm.path, cm.output, cm.normalization))
            .collect();

        specs.extend(
            Style::all()
                .iter()
                .filter(|style| !self.custom_models.iter().any(|cm| cm.name == style.name()))
                .map(|style| ModelSpec::for_style(*style, self.model_dir())),
        );

        specs
    }
}
