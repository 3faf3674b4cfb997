pub mod command;
pub mod theme;

// Re-export commonly used types at the model level.
pub use command::{default_catalog, Command, CommandEdit, CommandsFile};
pub use theme::{ThemeConfig, ThemeConfigPatch, ThemeKey, ThemeMode, VisualVariables};
