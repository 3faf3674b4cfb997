//! Theme mode and configurable colors, with the visual variables derived from
//! them. Every change is persisted under two independent keys: the mode as a
//! raw string and the config as JSON.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use ts_rs::TS;

use crate::error::AppError;
use crate::kv::{self, KeyValueStore, THEME_CONFIG_KEY, THEME_KEY};
use crate::model::theme::visual_variables;
use crate::model::{ThemeConfig, ThemeConfigPatch, ThemeKey, ThemeMode, VisualVariables};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ThemeState {
    /// Also published as the document's `data-theme` attribute.
    pub mode: ThemeMode,
    pub config: ThemeConfig,
    #[ts(type = "Record<string, string>")]
    pub variables: VisualVariables,
}

impl ThemeState {
    pub fn new(mode: ThemeMode, config: ThemeConfig) -> Self {
        let variables = visual_variables(mode, &config);
        Self {
            mode,
            config,
            variables,
        }
    }
}

impl Default for ThemeState {
    fn default() -> Self {
        Self::new(ThemeMode::default(), ThemeConfig::default())
    }
}

fn stored_mode(storage: &dyn KeyValueStore) -> ThemeMode {
    match storage.get(THEME_KEY) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("Ignoring stored theme mode: {e}");
            ThemeMode::default()
        }),
        Ok(None) => ThemeMode::default(),
        Err(e) => {
            tracing::warn!("Failed to read theme mode: {e}");
            ThemeMode::default()
        }
    }
}

fn stored_config(storage: &dyn KeyValueStore) -> ThemeConfig {
    match storage.get(THEME_CONFIG_KEY) {
        Ok(Some(raw)) => match parse_config_patch(&raw) {
            Ok(patch) => ThemeConfig::default().overlay(patch),
            Err(message) => {
                let e = AppError::CacheParse {
                    key: THEME_CONFIG_KEY.to_string(),
                    message,
                };
                tracing::warn!("{e}");
                ThemeConfig::default()
            }
        },
        Ok(None) => ThemeConfig::default(),
        Err(e) => {
            tracing::warn!("Failed to read theme config: {e}");
            ThemeConfig::default()
        }
    }
}

/// Overlays are by key, so only an object is a valid config patch.
fn parse_config_patch(text: &str) -> Result<ThemeConfigPatch, String> {
    match serde_json::from_str::<Value>(text).map_err(|e| e.to_string())? {
        fields @ Value::Object(_) => serde_json::from_value(fields).map_err(|e| e.to_string()),
        _ => Err("expected a JSON object".to_string()),
    }
}

pub struct ThemeStore {
    storage: Arc<dyn KeyValueStore>,
    store: Store<ThemeState>,
}

impl ThemeStore {
    /// Restore the last mode and config from `storage`. Missing or malformed
    /// entries fall back to defaults field by field.
    pub fn init(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = ThemeState::new(stored_mode(&*storage), stored_config(&*storage));
        Self {
            storage,
            store: Store::new(state),
        }
    }

    pub fn store(&self) -> &Store<ThemeState> {
        &self.store
    }

    pub fn mode(&self) -> ThemeMode {
        self.store.with_state(|s| s.mode)
    }

    pub fn config(&self) -> ThemeConfig {
        self.store.with_state(|s| s.config.clone())
    }

    pub fn variables(&self) -> VisualVariables {
        self.store.with_state(|s| s.variables.clone())
    }

    /// Flip between light and dark. Returns the new mode.
    pub fn toggle(&self) -> ThemeMode {
        self.apply(|s| s.mode = s.mode.toggled()).mode
    }

    pub fn set_mode(&self, mode: ThemeMode) {
        self.apply(|s| s.mode = mode);
    }

    /// Set one configurable color. The value is stored verbatim.
    pub fn update(&self, key: ThemeKey, value: String) {
        self.apply(|s| s.config.set(key, value));
    }

    /// Restore the default config. The mode is left alone.
    pub fn reset(&self) {
        self.apply(|s| s.config = ThemeConfig::default());
    }

    /// The current config as pretty-printed JSON.
    pub fn export(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(&self.config())?)
    }

    /// Replace the config with `text` overlaid on the defaults. Keys outside
    /// the config are ignored. Anything but a JSON object is rejected, and on
    /// rejection nothing changes.
    pub fn import(&self, text: &str) -> Result<ThemeConfig, AppError> {
        let patch = parse_config_patch(text).map_err(|message| {
            tracing::error!("Rejected theme import: {message}");
            AppError::ImportParse { message }
        })?;
        let config = ThemeConfig::default().overlay(patch);
        self.apply(|s| s.config.clone_from(&config));
        Ok(config)
    }

    fn apply<F: FnOnce(&mut ThemeState)>(&self, f: F) -> ThemeState {
        let snapshot = self.store.update(|s| {
            f(s);
            s.variables = visual_variables(s.mode, &s.config);
            s.clone()
        });
        self.persist(&snapshot);
        snapshot
    }

    fn persist(&self, state: &ThemeState) {
        if let Err(e) = self.storage.set(THEME_KEY, state.mode.as_str()) {
            tracing::warn!("Failed to persist theme mode: {e}");
        }
        if let Err(e) = kv::set_json(&*self.storage, THEME_CONFIG_KEY, &state.config) {
            tracing::warn!("Failed to persist theme config: {e}");
        }
    }
}
