//! Loading of the optional TOML session configuration.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use grid_pursuit_session::SessionConfig;

/// Reads the session configuration at `path`, or the defaults when absent.
pub(crate) fn load(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid configuration {}", path.display()))
}

fn parse(contents: &str) -> Result<SessionConfig> {
    Ok(toml::from_str(contents)?)
}
