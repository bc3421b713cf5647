use std::collections::HashMap;

pub type EnvMap = HashMap<String, String>;

#[cfg(feature = "cli")]
mod loader;
mod placeholders;

#[cfg(feature = "cli")]
pub use loader::{load_env_file, parse_assignment};
pub use placeholders::interpolate;
