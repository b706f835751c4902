pub mod validator;

pub use validator::PermissionValidator;
