pub mod checker;
pub mod inference;

pub use checker::TypeChecker;
pub use inference::{coerce_literal, fold_constant, infer_literal, Coercion};
