pub mod defaults;
pub mod manager;
pub mod settings;

pub use manager::ConfigManager;
pub use settings::{CONFIG_ENV_VAR, Settings};
