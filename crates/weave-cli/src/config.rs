//! `weave.toml` project manifests and `answers.toml` input files.
//!
//! Both are flat TOML, parsed with `serde`/`toml` the way the teacher's
//! own `lumen.toml` manifest is (`config.rs`'s doc comment there lays out
//! a whole package-manifest grammar; ours is far smaller, but the same
//! "one struct per TOML table" shape applies).

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use weave_value::Value;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// `weave.toml`: where the archetype lives and where generation output
/// should land by default.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub archetype: ArchetypeSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchetypeSection {
    /// Logical path of the entry script, resolved against `root`.
    pub entry: String,
    /// Directory the archive resolves every `source`/`exec`/template
    /// path against. Defaults to the manifest's own directory.
    #[serde(default = "default_root")]
    pub root: String,
}

fn default_root() -> String {
    ".".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub directory: String,
}

fn default_output_dir() -> String {
    "generated".to_string()
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

pub fn load_project_config(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// `answers.toml`: pre-resolved input values for batch (non-interactive)
/// generation, split between externals (always win) and defaults (used
/// only when nothing else resolves the input).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnswersFile {
    #[serde(default)]
    pub values: IndexMap<String, toml::Value>,
    #[serde(default)]
    pub defaults: IndexMap<String, toml::Value>,
}

pub fn load_answers(path: &Path) -> Result<AnswersFile, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

impl AnswersFile {
    pub fn external_values(&self) -> IndexMap<String, Value> {
        self.values.iter().map(|(k, v)| (k.clone(), toml_to_value(v))).collect()
    }

    pub fn external_defaults(&self) -> IndexMap<String, Value> {
        self.defaults.iter().map(|(k, v)| (k.clone(), toml_to_value(v))).collect()
    }
}

fn toml_to_value(value: &toml::Value) -> Value {
    match value {
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Integer(i) => Value::Int(*i),
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Array(items) => {
            Value::List(items.iter().map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())).collect())
        }
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_file_splits_values_and_defaults() {
        let toml_text = r#"
            [values]
            name = "demo"
            flags = ["a", "b"]

            [defaults]
            license = "MIT"
        "#;
        let answers: AnswersFile = toml::from_str(toml_text).unwrap();
        let values = answers.external_values();
        let defaults = answers.external_defaults();
        assert_eq!(values.get("name"), Some(&Value::String("demo".to_string())));
        assert_eq!(values.get("flags"), Some(&Value::List(vec!["a".to_string(), "b".to_string()])));
        assert_eq!(defaults.get("license"), Some(&Value::String("MIT".to_string())));
    }

    #[test]
    fn project_config_defaults_output_directory() {
        let toml_text = r#"
            [archetype]
            entry = "main.json"
        "#;
        let config: ProjectConfig = toml::from_str(toml_text).unwrap();
        assert_eq!(config.output.directory, "generated");
        assert_eq!(config.archetype.root, ".");
    }
}
