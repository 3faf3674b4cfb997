//! Event names emitted to the webview whenever a store publishes a new snapshot.
//! Each payload is the full state of the corresponding store.

/// Payload: `CatalogState`.
pub const CATALOG_CHANGED: &str = "catalog:changed";
/// Payload: `ThemeState`.
pub const THEME_CHANGED: &str = "theme:changed";
/// Payload: `ExecutionState`.
pub const EXECUTION_CHANGED: &str = "execution:changed";

pub const ALL: [&str; 3] = [CATALOG_CHANGED, THEME_CHANGED, EXECUTION_CHANGED];
