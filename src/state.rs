use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::execution::ExecutionDispatcher;
use crate::host::{LocalHost, LocalHostConfig, NativeHostClient};
use crate::kv::{FileKeyValueStore, KeyValueStore};
use crate::paths;
use crate::repository::CommandRepository;
use crate::settings::{self, AppSettings};
use crate::theme::ThemeStore;

// ── Application State ──────────────────────────────────────────────

/// Everything the desktop shell and the CLI share. Built once at startup and
/// handed out behind an `Arc`; components receive their host and storage here
/// instead of reaching for globals.
pub struct AppState {
    pub app_config_dir: PathBuf,
    pub settings: AppSettings,
    pub host: Arc<dyn NativeHostClient>,
    pub storage: Arc<dyn KeyValueStore>,
    pub commands: CommandRepository,
    pub theme: ThemeStore,
    pub execution: ExecutionDispatcher,
}

impl AppState {
    pub fn new(
        app_config_dir: PathBuf,
        settings: AppSettings,
        host: Arc<dyn NativeHostClient>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            commands: CommandRepository::new(Arc::clone(&host), Arc::clone(&storage)),
            theme: ThemeStore::init(Arc::clone(&storage)),
            execution: ExecutionDispatcher::new(Arc::clone(&host)),
            app_config_dir,
            settings,
            host,
            storage,
        }
    }

    /// Settings from `app_config_dir`, or defaults when none were saved.
    pub fn load_settings(app_config_dir: &Path) -> AppSettings {
        settings::load_settings(app_config_dir).unwrap_or_default()
    }

    /// File-backed storage under `app_config_dir`.
    pub fn file_storage(app_config_dir: &Path) -> Arc<dyn KeyValueStore> {
        Arc::new(FileKeyValueStore::open(&paths::storage_path(app_config_dir)))
    }

    /// In-process host configured from `settings`.
    pub fn local_host(settings: &AppSettings) -> LocalHost {
        LocalHost::new(LocalHostConfig::from_settings(settings))
    }
}
