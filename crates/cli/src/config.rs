use std::path::{Path, PathBuf};

use {serde::Deserialize, tracing::debug};

use talash_telegram::BotConfig;

const CONFIG_FILENAME: &str = "talash.toml";

/// Top-level configuration file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub telegram: BotConfig,
}

/// Load config from an explicit path, or discover it in the standard
/// locations. No file at all means defaults. An unreadable or invalid file
/// is an error: defaulting here could silently drop the channel gate.
pub fn load(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(path) = path.map(Path::to_path_buf).or_else(find_config_file) else {
        debug!("no config file found, using defaults");
        return Ok(AppConfig::default());
    };

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let config: AppConfig = toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Search order: project-local, then user-global.
fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", "talash") {
        let global = dirs.config_dir().join(CONFIG_FILENAME);
        if global.exists() {
            return Some(global);
        }
    }
    None
}
