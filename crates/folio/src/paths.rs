use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "FOLIO_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "folio";
const APPLICATION: &str = "folio";
const CONFIG_FILE: &str = "config.toml";

/// Where the config file is looked up, in priority order: `--config`,
/// `$FOLIO_CONFIG_DIR/config.toml`, then the platform config directory
/// (`$XDG_CONFIG_HOME/folio/config.toml` on Linux).
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(dir) = env_override(ENV_CONFIG_DIR) {
        return Ok(dir.join(CONFIG_FILE));
    }
    let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .ok_or_else(|| anyhow!("failed to determine user directories"))?;
    Ok(project_dirs.config_dir().join(CONFIG_FILE))
}

fn env_override(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
