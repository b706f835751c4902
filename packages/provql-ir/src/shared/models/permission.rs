//! Role permission profiles

use super::type_expr::TypeCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How much of an IR node the permission validator inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Assignment rows only
    #[default]
    Standard,
    /// Rows, WHERE/projection columns; inferred dialect rejected for mutations
    Strict,
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "standard",
            Self::Strict => "strict",
        })
    }
}

/// Per-role whitelist of type categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionProfile {
    pub role_id: String,
    pub type_whitelist: BTreeSet<TypeCategory>,
    #[serde(default)]
    pub validation_level: ValidationLevel,
}

impl PermissionProfile {
    pub fn new(
        role_id: impl Into<String>,
        whitelist: impl IntoIterator<Item = TypeCategory>,
    ) -> Self {
        Self {
            role_id: role_id.into(),
            type_whitelist: whitelist.into_iter().collect(),
            validation_level: ValidationLevel::Standard,
        }
    }

    /// Profile allowing every category
    pub fn unrestricted(role_id: impl Into<String>) -> Self {
        Self::new(role_id, TypeCategory::ALL)
    }

    pub fn strict(mut self) -> Self {
        self.validation_level = ValidationLevel::Strict;
        self
    }

    pub fn allows(&self, category: TypeCategory) -> bool {
        self.type_whitelist.contains(&category)
    }
}
