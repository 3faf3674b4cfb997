//! Forwards commands to the native host and reports results through a single
//! shared output channel.
//!
//! There is one `busy` flag and one `output` string for all requests. Two
//! overlapping `execute` calls both toggle the same flag, and whichever
//! finishes last owns the output.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use ts_rs::TS;

use crate::error::AppError;
use crate::host::NativeHostClient;
use crate::repository::CommandRepository;
use crate::store::Store;

/// Shown in the output channel while a command is outstanding.
pub const RUNNING_MESSAGE: &str = "Running command...";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ExecutionState {
    pub busy: bool,
    pub output: String,
}

/// Clears the busy flag when dropped, including when the awaiting future is
/// dropped before the host answers.
struct BusyGuard<'a> {
    store: &'a Store<ExecutionState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.store.update(|s| s.busy = false);
    }
}

/// Render a host result for display: text as-is, anything else as pretty JSON.
pub fn stringify_output(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

pub struct ExecutionDispatcher {
    host: Arc<dyn NativeHostClient>,
    store: Store<ExecutionState>,
}

impl ExecutionDispatcher {
    pub fn new(host: Arc<dyn NativeHostClient>) -> Self {
        Self {
            host,
            store: Store::default(),
        }
    }

    pub fn store(&self) -> &Store<ExecutionState> {
        &self.store
    }

    pub fn is_busy(&self) -> bool {
        self.store.with_state(|s| s.busy)
    }

    /// Run `command` on the host and publish its output. Failures become
    /// output text; this never returns an error.
    pub async fn execute(&self, command: &str, is_admin: bool) -> String {
        self.store.update(|s| {
            s.busy = true;
            s.output = RUNNING_MESSAGE.to_string();
        });
        let _busy = BusyGuard { store: &self.store };

        let output = match self.host.execute_command(command, is_admin).await {
            Ok(value) => stringify_output(&value),
            Err(e) => {
                tracing::warn!(command, "Command execution failed: {e}");
                format!("Failed to execute command: {e}")
            }
        };
        self.store.update(|s| s.output.clone_from(&output));
        output
    }

    /// Execute the catalog entry with `id`.
    pub async fn run_by_id(
        &self,
        commands: &CommandRepository,
        id: &str,
        is_admin: bool,
    ) -> Result<String, AppError> {
        let command = commands.find(id).ok_or_else(|| AppError::NotFound {
            what: format!("Command {id}"),
        })?;
        Ok(self.execute(&command.command, is_admin).await)
    }

    /// Hand `command` to a native terminal. The output channel gets a short
    /// status line, not the command's own output.
    pub async fn open_in_terminal(&self, command: &str) -> String {
        let status = match self.host.open_in_terminal(command).await {
            Ok(()) => format!("Command sent to native terminal: {command}"),
            Err(e) => {
                tracing::warn!(command, "Failed to open terminal: {e}");
                format!("Failed to open terminal: {e}")
            }
        };
        self.store.update(|s| s.output.clone_from(&status));
        status
    }

    /// Ask the host to terminate. If it cannot be reached, `close_window` is
    /// called instead.
    pub async fn exit<F: FnOnce()>(&self, close_window: F) {
        if let Err(e) = self.host.app_exit().await {
            tracing::warn!("Host exit failed, closing window instead: {e}");
            close_window();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::host::MemoryHost;
    use crate::kv::MemoryKeyValueStore;
    use crate::model::default_catalog;

    fn setup() -> (Arc<MemoryHost>, ExecutionDispatcher) {
        let host = Arc::new(MemoryHost::new());
        let dispatcher = ExecutionDispatcher::new(host.clone());
        (host, dispatcher)
    }

    #[tokio::test]
    async fn execute_publishes_output_and_clears_busy() {
        let (host, dispatcher) = setup();
        host.set_execution_result("uname -a", Ok(json!("Linux archmie")));
        let busy_seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&busy_seen);
        dispatcher
            .store()
            .subscribe(move |s: &ExecutionState| sink.lock().push((s.busy, s.output.clone())));

        let out = dispatcher.execute("uname -a", false).await;

        assert_eq!(out, "Linux archmie");
        assert_eq!(
            dispatcher.store().get_state(),
            ExecutionState {
                busy: false,
                output: "Linux archmie".into()
            }
        );
        let seen = busy_seen.lock();
        assert_eq!(seen[0], (true, RUNNING_MESSAGE.to_string()));
        assert_eq!(seen.last().unwrap(), &(false, "Linux archmie".to_string()));
        assert_eq!(host.executed(), vec![("uname -a".to_string(), false)]);
    }

    #[tokio::test]
    async fn structured_results_are_pretty_printed() {
        let (host, dispatcher) = setup();
        host.set_execution_result("stat", Ok(json!({"code": 0})));
        assert_eq!(dispatcher.execute("stat", true).await, "{\n  \"code\": 0\n}");
    }

    #[tokio::test]
    async fn failures_become_output_text() {
        let (host, dispatcher) = setup();
        host.set_execution_result("boom", Err("exit status 2".into()));
        let out = dispatcher.execute("boom", false).await;
        assert_eq!(out, "Failed to execute command: exit status 2");
        assert!(!dispatcher.is_busy());

        host.set_reachable(false);
        let out = dispatcher.execute("ls", false).await;
        assert!(out.starts_with("Failed to execute command: Native host unavailable"));
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn dropped_request_still_clears_busy() {
        let (host, dispatcher) = setup();
        host.set_execution_delay("sleep", Duration::from_millis(500));

        let result =
            tokio::time::timeout(Duration::from_millis(20), dispatcher.execute("sleep", false)).await;

        assert!(result.is_err());
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn overlapping_executions_share_one_channel() {
        let (host, dispatcher) = setup();
        host.set_execution_delay("slow", Duration::from_millis(60));

        let (slow, fast) = tokio::join!(
            dispatcher.execute("slow", false),
            dispatcher.execute("fast", false)
        );

        assert_eq!(slow, "$ slow");
        assert_eq!(fast, "$ fast");
        // The later finisher owns the shared output.
        assert_eq!(dispatcher.store().get_state().output, "$ slow");
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn run_by_id_resolves_catalog_entries() {
        let host = Arc::new(MemoryHost::with_catalog(default_catalog()));
        let repo = CommandRepository::new(host.clone(), Arc::new(MemoryKeyValueStore::new()));
        repo.load().await;
        let dispatcher = ExecutionDispatcher::new(host.clone());

        dispatcher.run_by_id(&repo, "6", true).await.unwrap();
        assert_eq!(host.executed(), vec![("df -h".to_string(), true)]);

        let missing = dispatcher.run_by_id(&repo, "99", false).await;
        assert!(matches!(missing, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn terminal_handoff_reports_status_line() {
        let (host, dispatcher) = setup();
        let status = dispatcher.open_in_terminal("htop").await;
        assert_eq!(status, "Command sent to native terminal: htop");
        assert_eq!(host.terminal_requests(), vec!["htop".to_string()]);

        host.set_reachable(false);
        let status = dispatcher.open_in_terminal("htop").await;
        assert!(status.starts_with("Failed to open terminal:"));
        assert_eq!(dispatcher.store().get_state().output, status);
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn exit_falls_back_to_closing_window() {
        let (host, dispatcher) = setup();
        let mut closed = false;
        dispatcher.exit(|| closed = true).await;
        assert!(host.exit_requested());
        assert!(!closed);

        host.set_reachable(false);
        dispatcher.exit(|| closed = true).await;
        assert!(closed);
    }
}
