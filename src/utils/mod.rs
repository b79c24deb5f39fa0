pub mod error;
pub mod logger;
pub mod mime;
pub mod monitor;
pub mod validation;
