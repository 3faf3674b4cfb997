//! Call contract toward the native host: the process that owns the catalog
//! file, runs shell commands, and spawns terminals.
//!
//! [`LocalHost`] performs the work in-process; [`MemoryHost`] is an in-memory
//! fake for tests and dry runs.

pub mod local;
pub mod memory;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::AppError;
use crate::model::Command;

pub use local::{LocalHost, LocalHostConfig};
pub use memory::MemoryHost;

/// Object-safe boxed future returned by every host call.
pub type HostFuture<'a, T> = BoxFuture<'a, Result<T, AppError>>;

pub trait NativeHostClient: Send + Sync {
    /// Either a raw array of commands or an object with a `commands` field.
    /// The caller validates the shape.
    fn read_commands_file(&self) -> HostFuture<'_, Value>;

    fn write_commands_file<'a>(&'a self, commands: &'a [Command]) -> HostFuture<'a, ()>;

    /// Text output, or a structured result the caller stringifies.
    fn execute_command<'a>(&'a self, command: &'a str, is_admin: bool) -> HostFuture<'a, Value>;

    fn open_in_terminal<'a>(&'a self, command: &'a str) -> HostFuture<'a, ()>;

    /// Terminate the host process.
    fn app_exit(&self) -> HostFuture<'_, ()>;
}
