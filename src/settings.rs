use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::files::read_json;

// ── App settings ─────────────────────────────────────────────────

/// Application-level settings stored in the OS config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppSettings {
    pub version: u32,
    /// Override for the host's catalog file. None = `~/.config/archmie/commands.json`.
    #[serde(default)]
    pub commands_file: Option<PathBuf>,
    /// Terminal emulator to try before the built-in list.
    #[serde(default)]
    pub preferred_terminal: Option<String>,
    /// Program prefixed to commands run with admin privileges.
    #[serde(default = "default_elevation_program")]
    pub elevation_program: String,
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

const SETTINGS_VERSION: u32 = 1;

fn default_elevation_program() -> String {
    "pkexec".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            commands_file: None,
            preferred_terminal: None,
            elevation_program: default_elevation_program(),
            log_filter: default_log_filter(),
        }
    }
}

impl AppSettings {
    /// Catalog file the local host reads and writes.
    pub fn commands_path(&self) -> PathBuf {
        self.commands_file
            .clone()
            .unwrap_or_else(|| crate::paths::default_commands_path(&crate::paths::home_dir()))
    }
}

/// Load settings from the app config directory. Returns None if no settings file exists.
///
/// An unreadable file is logged and replaced by defaults rather than failing startup.
pub fn load_settings(app_config_dir: &Path) -> Option<AppSettings> {
    let path = crate::paths::settings_path(app_config_dir);
    if !path.exists() {
        return None;
    }
    match read_json::<AppSettings>(&path) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(path = %path.display(), "Ignoring unreadable settings: {e}");
            Some(AppSettings::default())
        }
    }
}
