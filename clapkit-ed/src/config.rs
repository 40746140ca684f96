//! Service configuration
//!
//! Listen port resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (handled by clap's `env` fallback)
//! 3. TOML config file (`ed_port` key)
//! 4. Compiled default

use std::path::PathBuf;

use tracing::warn;

/// Default listen port for the editor service
pub const DEFAULT_PORT: u16 = 5761;

/// Resolve the port the service should bind.
pub fn resolve_port(cli_arg: Option<u16>) -> u16 {
    // Priority 1-2: command line / environment, both surfaced through clap
    if let Some(port) = cli_arg {
        return port;
    }

    // Priority 3: TOML config file
    if let Some(port) = port_from_config_file() {
        return port;
    }

    // Priority 4: compiled default
    DEFAULT_PORT
}

/// Platform config file: `<config dir>/clapkit/config.toml`
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("clapkit").join("config.toml"))
}

fn port_from_config_file() -> Option<u16> {
    let path = config_file_path()?;
    let content = std::fs::read_to_string(&path).ok()?;
    let config: toml::Value = match toml::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            warn!("ignoring unreadable config file {}: {err}", path.display());
            return None;
        }
    };
    config
        .get("ed_port")
        .and_then(toml::Value::as_integer)
        .and_then(|port| u16::try_from(port).ok())
}
