//! Configuration I/O schema (YAML v1)
//!
//! Overrides are patches: every field is optional and an absent field keeps
//! the preset value. Loading logic lives in `compiler_config.rs`.

use super::compiler_config::VerificationMode;
use crate::features::serialization::Format;
use serde::{Deserialize, Serialize};

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base preset
    pub preset: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<LimitsPatch>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationPatch>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputPatch>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogPatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_source_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_statement_depth: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<VerificationMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_cache_capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_schema_minimal() {
        let export: ConfigExportV1 = serde_yaml::from_str("version: 1\npreset: strict\n").unwrap();
        assert_eq!(export.version, 1);
        assert_eq!(export.preset, "strict");
        assert!(export.overrides.is_none());
    }

    #[test]
    fn test_yaml_schema_partial_override() {
        let yaml = r#"
version: 1
preset: balanced
overrides:
  limits:
    max_tokens: 512
  verification:
    mode: runtime_only
  output:
    format: json
"#;
        let export: ConfigExportV1 = serde_yaml::from_str(yaml).unwrap();
        let overrides = export.overrides.unwrap();
        let limits = overrides.limits.unwrap();
        assert_eq!(limits.max_tokens, Some(512));
        assert_eq!(limits.max_source_bytes, None);
        assert_eq!(
            overrides.verification.unwrap().mode,
            Some(VerificationMode::RuntimeOnly)
        );
        assert_eq!(overrides.output.unwrap().format, Some(Format::Json));
        assert!(overrides.catalog.is_none());
    }

    #[test]
    fn test_yaml_schema_rejects_unknown_fields() {
        let yaml = "version: 1\npreset: strict\noverrides:\n  limits:\n    max_tokenz: 5\n";
        assert!(serde_yaml::from_str::<ConfigExportV1>(yaml).is_err());
    }
}
