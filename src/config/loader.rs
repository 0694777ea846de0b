//! Configuration loading.
//!
//! The config file is optional; a missing file means code defaults. A file
//! that exists but fails to parse is an error worth surfacing rather than
//! silently ignoring.

use std::path::Path;

use super::Config;

/// Load configuration from `path`, or from `config.json` in the working
/// directory when no path is given. Serde defaults fill any omitted fields.
pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = path.unwrap_or_else(|| Path::new("config.json"));
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Config::default());
        }
        Err(err) => {
            return Err(anyhow::anyhow!(
                "failed to read config file {}: {err}",
                path.display()
            ));
        }
    };
    serde_json::from_str(&raw)
        .map_err(|err| anyhow::anyhow!("failed to parse config file {}: {err}", path.display()))
}
