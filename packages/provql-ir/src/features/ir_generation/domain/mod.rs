pub mod error;
pub mod ir_node;

pub use error::LoweringError;
pub use ir_node::{IRColumn, IRExpr, IRNode, IROrder, IRRow, PermissionContext, ProofBlob};
