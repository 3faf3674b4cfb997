//! File names and locations used by the app and the local host.
//!
//! Functions take the config directory as a `&Path` so the desktop shell and
//! the CLI resolve the same files.

use std::path::{Path, PathBuf};

// ── Application identity ─────────────────────────────────────────

pub const APP_ID: &str = "com.archmie.app";

/// Directory under the user's `.config` where the host keeps the catalog.
pub const HOST_DIR: &str = "archmie";

// ── Leaf filenames ───────────────────────────────────────────────

pub const SETTINGS_FILE: &str = "settings.json";
pub const STORAGE_FILE: &str = "storage.json";
pub const COMMANDS_FILE: &str = "commands.json";

// ── Config-dir functions (take app_config_dir) ───────────────────

pub fn settings_path(app_config_dir: &Path) -> PathBuf {
    app_config_dir.join(SETTINGS_FILE)
}

pub fn storage_path(app_config_dir: &Path) -> PathBuf {
    app_config_dir.join(STORAGE_FILE)
}

// ── Host paths ───────────────────────────────────────────────────

/// Default location of the command catalog: `~/.config/archmie/commands.json`.
pub fn default_commands_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config").join(HOST_DIR).join(COMMANDS_FILE)
}

/// The app config dir used outside Tauri: `<config_dir>/com.archmie.app`,
/// matching what Tauri resolves for the desktop shell.
pub fn fallback_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| home_dir().join(".config"))
        .join(APP_ID)
}

pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
