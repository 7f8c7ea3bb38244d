/// Database connection and schema bootstrap
pub mod database;

/// Runtime settings loading from chit.toml
pub mod settings;

pub use settings::{Settings, load_default_settings, load_settings};
