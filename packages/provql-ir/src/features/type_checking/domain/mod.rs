pub mod error;
pub mod typed_statement;

pub use error::{CheckError, CheckResult, ProofError, TypeError};
pub use typed_statement::{
    ColumnRef, Dialect, TypedAssignment, TypedExpr, TypedOrderBy, TypedStatement,
};
