//! Settings loading.

mod settings;

pub use settings::{ConnectionSettings, Settings, DEFAULT_SETTINGS_FILE};
