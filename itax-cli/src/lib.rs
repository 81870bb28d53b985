pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod report;
pub mod utils;

pub use cli::{Cli, Command};
pub use config::{Config, ConfigError};
