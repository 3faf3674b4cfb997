use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use super::{HostFuture, NativeHostClient};
use crate::error::AppError;
use crate::model::{Command, CommandsFile};

/// In-memory native host. Reads echo back the last write, and every request
/// is recorded for inspection.
#[derive(Debug, Default)]
pub struct MemoryHost {
    inner: Mutex<MemoryHostState>,
}

#[derive(Debug, Default)]
struct MemoryHostState {
    unreachable: bool,
    file: Vec<Command>,
    read_response: Option<Value>,
    results: HashMap<String, Result<Value, String>>,
    delays: HashMap<String, Duration>,
    executed: Vec<(String, bool)>,
    terminal_requests: Vec<String>,
    write_count: usize,
    exit_requested: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(commands: Vec<Command>) -> Self {
        let host = Self::new();
        host.inner.lock().file = commands;
        host
    }

    /// While unreachable, every call fails with [`AppError::Transport`].
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.lock().unreachable = !reachable;
    }

    /// Answer reads with this raw payload instead of the stored catalog.
    pub fn set_read_response(&self, response: Value) {
        self.inner.lock().read_response = Some(response);
    }

    pub fn set_execution_result(&self, command: &str, result: Result<Value, String>) {
        self.inner.lock().results.insert(command.to_string(), result);
    }

    /// Hold the execution of `command` for `delay` before answering.
    pub fn set_execution_delay(&self, command: &str, delay: Duration) {
        self.inner.lock().delays.insert(command.to_string(), delay);
    }

    pub fn stored_catalog(&self) -> Vec<Command> {
        self.inner.lock().file.clone()
    }

    pub fn executed(&self) -> Vec<(String, bool)> {
        self.inner.lock().executed.clone()
    }

    pub fn terminal_requests(&self) -> Vec<String> {
        self.inner.lock().terminal_requests.clone()
    }

    pub fn write_count(&self) -> usize {
        self.inner.lock().write_count
    }

    pub fn exit_requested(&self) -> bool {
        self.inner.lock().exit_requested
    }

    fn check_reachable(&self) -> Result<(), AppError> {
        if self.inner.lock().unreachable {
            Err(AppError::transport("memory host is offline"))
        } else {
            Ok(())
        }
    }
}

impl NativeHostClient for MemoryHost {
    fn read_commands_file(&self) -> HostFuture<'_, Value> {
        Box::pin(async move {
            self.check_reachable()?;
            let state = self.inner.lock();
            if let Some(response) = &state.read_response {
                return Ok(response.clone());
            }
            let file = CommandsFile {
                commands: state.file.clone(),
            };
            Ok(serde_json::to_value(file)?)
        })
    }

    fn write_commands_file<'a>(&'a self, commands: &'a [Command]) -> HostFuture<'a, ()> {
        Box::pin(async move {
            self.check_reachable()?;
            let mut state = self.inner.lock();
            state.file = commands.to_vec();
            state.read_response = None;
            state.write_count += 1;
            Ok(())
        })
    }

    fn execute_command<'a>(&'a self, command: &'a str, is_admin: bool) -> HostFuture<'a, Value> {
        Box::pin(async move {
            self.check_reachable()?;
            let (result, delay) = {
                let mut state = self.inner.lock();
                state.executed.push((command.to_string(), is_admin));
                (state.results.get(command).cloned(), state.delays.get(command).copied())
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match result {
                Some(Ok(value)) => Ok(value),
                Some(Err(message)) => Err(AppError::execution(message)),
                None => Ok(Value::String(format!("$ {command}"))),
            }
        })
    }

    fn open_in_terminal<'a>(&'a self, command: &'a str) -> HostFuture<'a, ()> {
        Box::pin(async move {
            self.check_reachable()?;
            self.inner.lock().terminal_requests.push(command.to_string());
            Ok(())
        })
    }

    fn app_exit(&self) -> HostFuture<'_, ()> {
        Box::pin(async move {
            self.check_reachable()?;
            self.inner.lock().exit_requested = true;
            Ok(())
        })
    }
}
