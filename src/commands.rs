use std::sync::Arc;

use serde_json::Value;
use tauri::{Manager, State};

use crate::execution::ExecutionState;
use crate::model::{Command, CommandEdit, ThemeConfig, ThemeKey, ThemeMode};
use crate::repository::{CatalogState, CategoryFilter, CommandGroups};
use crate::settings::AppSettings;
use crate::state::AppState;
use crate::theme::ThemeState;

// ── Native host contract ───────────────────────────────────────────
//
// Same command names and argument keys the webview has always used for the
// host. Results are passed through untouched.

#[tauri::command]
pub async fn read_commands_file(state: State<'_, Arc<AppState>>) -> Result<Value, String> {
    Ok(state.host.read_commands_file().await?)
}

#[tauri::command]
pub async fn write_commands_file(
    state: State<'_, Arc<AppState>>,
    commands: Vec<Command>,
) -> Result<(), String> {
    Ok(state.host.write_commands_file(&commands).await?)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn execute_command(
    state: State<'_, Arc<AppState>>,
    command: String,
    is_admin: bool,
) -> Result<Value, String> {
    Ok(state.host.execute_command(&command, is_admin).await?)
}

#[tauri::command]
pub async fn open_in_terminal(
    state: State<'_, Arc<AppState>>,
    command: String,
) -> Result<(), String> {
    Ok(state.host.open_in_terminal(&command).await?)
}

#[tauri::command]
pub async fn app_exit(state: State<'_, Arc<AppState>>) -> Result<(), String> {
    Ok(state.host.app_exit().await?)
}

// ── Settings ───────────────────────────────────────────────────────

#[tauri::command]
pub fn get_settings(state: State<Arc<AppState>>) -> AppSettings {
    state.settings.clone()
}

// ── Catalog ────────────────────────────────────────────────────────

#[tauri::command]
pub fn get_catalog(state: State<Arc<AppState>>) -> CatalogState {
    state.commands.store().get_state()
}

/// Reload from the host, falling back to the cache and then the defaults.
#[tauri::command]
pub async fn load_catalog(state: State<'_, Arc<AppState>>) -> Result<CatalogState, String> {
    state.commands.load().await;
    Ok(state.commands.store().get_state())
}

#[tauri::command]
pub fn get_command_groups(state: State<Arc<AppState>>, filter: CategoryFilter) -> CommandGroups {
    state.commands.groups(&filter)
}

#[tauri::command]
pub fn get_categories(state: State<Arc<AppState>>) -> Vec<CategoryFilter> {
    state.commands.categories()
}

/// A fresh draft for the editor. Nothing is persisted until it is added.
#[tauri::command]
pub fn new_command_draft() -> Command {
    Command::draft()
}

#[tauri::command]
pub async fn save_catalog(
    state: State<'_, Arc<AppState>>,
    commands: Vec<Command>,
) -> Result<Vec<Command>, String> {
    Ok(state.commands.save(commands).await?)
}

#[tauri::command]
pub async fn add_command(
    state: State<'_, Arc<AppState>>,
    command: Command,
) -> Result<Command, String> {
    Ok(state.commands.add(command).await?)
}

#[tauri::command]
pub async fn edit_command(
    state: State<'_, Arc<AppState>>,
    id: String,
    edit: CommandEdit,
) -> Result<Command, String> {
    Ok(state.commands.edit(&id, &edit).await?)
}

#[tauri::command]
pub async fn delete_command(state: State<'_, Arc<AppState>>, id: String) -> Result<bool, String> {
    Ok(state.commands.delete(&id).await?)
}

// ── Execution ──────────────────────────────────────────────────────

#[tauri::command]
pub fn get_execution_state(state: State<Arc<AppState>>) -> ExecutionState {
    state.execution.store().get_state()
}

/// Run a command line. Failures are reported as output text, not as errors.
#[tauri::command]
pub async fn run_command(
    state: State<'_, Arc<AppState>>,
    command: String,
    is_admin: bool,
) -> Result<String, String> {
    Ok(state.execution.execute(&command, is_admin).await)
}

#[tauri::command]
pub async fn run_catalog_command(
    state: State<'_, Arc<AppState>>,
    id: String,
    is_admin: bool,
) -> Result<String, String> {
    Ok(state.execution.run_by_id(&state.commands, &id, is_admin).await?)
}

#[tauri::command]
pub async fn run_in_terminal(
    state: State<'_, Arc<AppState>>,
    command: String,
) -> Result<String, String> {
    Ok(state.execution.open_in_terminal(&command).await)
}

/// Exit through the host. If the host is unreachable, close the main window.
#[tauri::command]
pub async fn exit_app(
    state: State<'_, Arc<AppState>>,
    app_handle: tauri::AppHandle,
) -> Result<(), String> {
    state
        .execution
        .exit(|| {
            if let Some(window) = app_handle.get_webview_window("main") {
                if let Err(e) = window.close() {
                    tracing::warn!("Failed to close main window: {e}");
                }
            }
        })
        .await;
    Ok(())
}

// ── Theme ──────────────────────────────────────────────────────────

#[tauri::command]
pub fn get_theme(state: State<Arc<AppState>>) -> ThemeState {
    state.theme.store().get_state()
}

#[tauri::command]
pub fn toggle_theme(state: State<Arc<AppState>>) -> ThemeMode {
    state.theme.toggle()
}

#[tauri::command]
pub fn set_theme_mode(state: State<Arc<AppState>>, mode: ThemeMode) {
    state.theme.set_mode(mode);
}

#[tauri::command]
pub fn update_theme_color(state: State<Arc<AppState>>, key: ThemeKey, value: String) {
    state.theme.update(key, value);
}

#[tauri::command]
pub fn reset_theme(state: State<Arc<AppState>>) {
    state.theme.reset();
}

#[tauri::command]
pub fn export_theme(state: State<Arc<AppState>>) -> Result<String, String> {
    Ok(state.theme.export()?)
}

#[tauri::command]
pub fn import_theme(state: State<Arc<AppState>>, json: String) -> Result<ThemeConfig, String> {
    Ok(state.theme.import(&json)?)
}
