pub mod error;

pub use error::PermissionError;
