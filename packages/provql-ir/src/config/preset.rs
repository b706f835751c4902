//! Preset configurations
//!
//! Presets provide complete default configurations for common deployments.

use serde::{Deserialize, Serialize};

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Untrusted input: small limits, static verification first
    ///
    /// - Source: 16 KiB, 2 048 tokens, depth 32
    /// - Lookup timeout: 250 ms
    Strict,

    /// Default service settings
    ///
    /// - Source: 64 KiB, 8 192 tokens, depth 64
    /// - Lookup timeout: 1 s
    Balanced,

    /// Batch / tooling: generous limits, runtime-only verification
    ///
    /// - Source: 1 MiB, 65 536 tokens, depth 128
    /// - Lookup timeout: 5 s
    Permissive,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Self::Strict, Self::Balanced, Self::Permissive];

    /// Parse preset from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "balanced" => Ok(Self::Balanced),
            "permissive" => Ok(Self::Permissive),
            _ => Err(format!(
                "Unknown preset '{}'. Valid presets: strict, balanced, permissive",
                s
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Balanced => "balanced",
            Self::Permissive => "permissive",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Balanced
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
