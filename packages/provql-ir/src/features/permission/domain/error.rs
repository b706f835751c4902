use crate::shared::models::TypeCategory;
use thiserror::Error;

/// A column's resolved type is not allowed for the role
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("permission denied for role '{role_id}' on column '{column}': {reason}")]
pub struct PermissionError {
    pub column: String,
    pub category: TypeCategory,
    pub role_id: String,
    pub reason: String,
}

impl PermissionError {
    pub fn not_whitelisted(column: impl Into<String>, category: TypeCategory, role_id: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            category,
            role_id: role_id.into(),
            reason: format!("category {} not in whitelist", category),
        }
    }

    pub fn suggestion(&self) -> String {
        if self.reason.starts_with("category") {
            format!("grant {} to role '{}' or use a different column", self.category, self.role_id)
        } else {
            format!("annotate the value, e.g. {} = <value> : <Type>", self.column)
        }
    }
}
