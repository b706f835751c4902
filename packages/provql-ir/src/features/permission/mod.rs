//! Permission validation
//!
//! Checks an `IRNode` against a role's `PermissionProfile`. Runs after IR
//! generation, never before.

pub mod domain;
pub mod infrastructure;

pub use domain::PermissionError;
pub use infrastructure::PermissionValidator;

use crate::features::ir_generation::IRNode;
use crate::shared::models::PermissionProfile;

pub fn validate(node: &IRNode, profile: &PermissionProfile) -> Result<(), PermissionError> {
    PermissionValidator.validate(node, profile)
}
