mod evaluator;
mod in_memory;

pub use evaluator::{compare_values, evaluate};
pub use in_memory::InMemoryEngine;
