//! Configuration provenance tracking
//!
//! Track where each configuration value came from (preset, YAML, env, builder)

use super::preset::Preset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration provenance tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigProvenance {
    /// Base preset used
    preset: Preset,

    /// Field path → source
    /// Example: "limits.max_tokens" → ConfigSource::Env("PROVQL__LIMITS__MAX_TOKENS")
    field_sources: BTreeMap<String, ConfigSource>,
}

/// Configuration source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// From preset defaults
    Preset(Preset),

    /// From YAML file (path only, no line tracking)
    Yaml { path: String },

    /// From environment variable
    Env(String),

    /// From builder API
    Builder,
}

impl ConfigProvenance {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            preset,
            field_sources: BTreeMap::new(),
        }
    }

    /// Record field-level override; a later source replaces an earlier one
    pub fn track_field(&mut self, field_path: &str, source: ConfigSource) {
        self.field_sources.insert(field_path.to_string(), source);
    }

    /// Source of a field, falling back to the preset for untouched fields
    pub fn source_of(&self, field_path: &str) -> ConfigSource {
        self.field_sources
            .get(field_path)
            .cloned()
            .unwrap_or(ConfigSource::Preset(self.preset))
    }

    pub fn get_source(&self, field_path: &str) -> Option<&ConfigSource> {
        self.field_sources.get(field_path)
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn field_sources(&self) -> &BTreeMap<String, ConfigSource> {
        &self.field_sources
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Base preset: {}", self.preset)];

        if !self.field_sources.is_empty() {
            lines.push("Overridden fields:".to_string());
            for (field, source) in &self.field_sources {
                lines.push(format!("  {} <- {}", field, source.describe()));
            }
        }

        lines.join("\n")
    }
}

impl ConfigSource {
    /// Short description
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::Preset(p) => format!("preset:{}", p),
            ConfigSource::Yaml { path } => format!("yaml:{}", path),
            ConfigSource::Env(var) => format!("env:{}", var),
            ConfigSource::Builder => "builder".to_string(),
        }
    }
}
