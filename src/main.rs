// Prevents additional console window on Windows in release.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::sync::Arc;

use serde::Serialize;
use tauri::{AppHandle, Emitter, Manager};

use archmie::commands;
use archmie::events;
use archmie::logging;
use archmie::state::AppState;

fn emit<S: Serialize + Clone>(app: &AppHandle, event: &str, payload: &S) {
    if let Err(e) = app.emit(event, payload) {
        tracing::warn!(event, "Failed to emit event: {e}");
    }
}

/// Push every store snapshot to the webview.
fn forward_store_events(app: &AppHandle, state: &AppState) {
    let handle = app.clone();
    state
        .commands
        .store()
        .subscribe(move |catalog| emit(&handle, events::CATALOG_CHANGED, catalog));
    let handle = app.clone();
    state
        .theme
        .store()
        .subscribe(move |theme| emit(&handle, events::THEME_CHANGED, theme));
    let handle = app.clone();
    state
        .execution
        .store()
        .subscribe(move |execution| emit(&handle, events::EXECUTION_CHANGED, execution));
}

#[allow(clippy::expect_used)] // app cannot start without config dir / Tauri runtime
fn main() {
    tauri::Builder::default()
        .setup(|app| {
            let app_config_dir = app
                .path()
                .app_config_dir()
                .expect("failed to resolve app config dir");

            let settings = AppState::load_settings(&app_config_dir);
            logging::init(&settings.log_filter);

            let storage = AppState::file_storage(&app_config_dir);
            let exit_handle = app.handle().clone();
            let host = Arc::new(
                AppState::local_host(&settings).with_exit_hook(move || exit_handle.exit(0)),
            );
            let state = Arc::new(AppState::new(app_config_dir, settings, host, storage));

            forward_store_events(app.handle(), &state);
            app.manage(state.clone());

            tauri::async_runtime::spawn(async move {
                let source = state.commands.load().await;
                tracing::info!(?source, "Command catalog ready");
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Native host contract
            commands::read_commands_file,
            commands::write_commands_file,
            commands::execute_command,
            commands::open_in_terminal,
            commands::app_exit,
            // Settings
            commands::get_settings,
            // Catalog
            commands::get_catalog,
            commands::load_catalog,
            commands::get_command_groups,
            commands::get_categories,
            commands::new_command_draft,
            commands::save_catalog,
            commands::add_command,
            commands::edit_command,
            commands::delete_command,
            // Execution
            commands::get_execution_state,
            commands::run_command,
            commands::run_catalog_command,
            commands::run_in_terminal,
            commands::exit_app,
            // Theme
            commands::get_theme,
            commands::toggle_theme,
            commands::set_theme_mode,
            commands::update_theme_color,
            commands::reset_theme,
            commands::export_theme,
            commands::import_theme,
        ])
        .run(tauri::generate_context!())
        .expect("error while running Archmie");
}
