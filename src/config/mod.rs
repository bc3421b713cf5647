mod loader;

pub use loader::{load_config, resolve_relative, ApibenchConfig, LoadedConfig, CONFIG_FILE};
