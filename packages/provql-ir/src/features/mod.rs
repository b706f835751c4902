//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! Each feature contains (as needed):
//! - domain/     - Pure data and errors
//! - ports/      - Interface definitions (traits)
//! - application/ - Facades
//! - infrastructure/ - Implementations

// Compile stages, in pipeline order
pub mod lexing;
pub mod parsing;
pub mod type_checking;
pub mod ir_generation;
pub mod permission;
pub mod serialization;

// Refinement verification used by type checking
pub mod smt;

// Collaborators the pipeline consumes or hands IR to
pub mod catalog;
pub mod execution;
