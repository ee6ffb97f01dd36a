//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use k1_core::K1Config;

/// Load the configuration file named on the command line, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<K1Config> {
    match config_path {
        Some(path) => Ok(K1Config::from_file(std::path::Path::new(path))?),
        None => Ok(K1Config::default()),
    }
}
