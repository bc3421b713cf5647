pub mod config;
pub mod env;
pub mod executor;
pub mod model;
pub mod store;
pub mod workbench;
