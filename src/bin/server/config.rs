//! Configuration loading for the binary

use data_explorer::config::ApplicationConfig;
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
const DEFAULT_CONFIG_FILE: &str = "explorer.toml";

/// Load configuration from file or environment
///
/// Priority:
/// 1. `--config` flag
/// 2. EXPLORER_CONFIG environment variable
/// 3. explorer.toml
/// 4. Default configuration
///
/// Environment overrides apply in every case. An explicitly named file that
/// fails to load is an error; a broken `explorer.toml` falls back to defaults.
pub fn load_config(cli_path: Option<&Path>) -> data_explorer::Result<ApplicationConfig> {
    let explicit: Option<PathBuf> = cli_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("EXPLORER_CONFIG").ok().map(PathBuf::from));

    if let Some(path) = explicit {
        let config = ApplicationConfig::load(&path)?;
        eprintln!("[config] Loaded configuration from: {}", path.display());
        return Ok(config);
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        match ApplicationConfig::load(default_path) {
            Ok(config) => {
                eprintln!("[config] Loaded configuration from {}", DEFAULT_CONFIG_FILE);
                return Ok(config);
            },
            Err(e) => {
                eprintln!(
                    "[config] Failed to parse {}: {}. Using defaults.",
                    DEFAULT_CONFIG_FILE, e
                );
            },
        }
    }

    eprintln!("[config] Using default configuration");
    let config = ApplicationConfig::from_env();
    config.validate()?;
    Ok(config)
}
