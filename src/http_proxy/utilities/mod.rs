pub mod authorization;
pub mod error_json;
