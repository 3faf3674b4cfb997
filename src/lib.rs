pub mod clock;
pub mod error;
pub mod events;
pub mod execution;
pub mod files;
pub mod host;
pub mod kv;
pub mod logging;
pub mod model;
pub mod paths;
pub mod repository;
pub mod settings;
pub mod state;
pub mod store;
pub mod theme;

#[cfg(feature = "tauri-app")]
pub mod commands;
