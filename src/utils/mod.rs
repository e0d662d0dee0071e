pub mod error;
pub mod logger;
pub mod monitor;
pub mod names;
pub mod validation;
