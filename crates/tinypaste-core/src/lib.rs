pub mod config;
pub mod id;

pub use config::{ConfigError, PasteConfig};
pub use id::{IdSource, RandomIdGenerator, is_safe_name};
