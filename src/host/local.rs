use std::path::PathBuf;
use std::process::Stdio;

use serde_json::Value;

use super::{HostFuture, NativeHostClient};
use crate::error::AppError;
use crate::files;
use crate::model::{default_catalog, Command, CommandsFile};
use crate::settings::AppSettings;

/// Terminal emulators tried in order, with the flag that introduces the
/// program to run.
const TERMINALS: [(&str, &str); 6] = [
    ("gnome-terminal", "--"),
    ("konsole", "-e"),
    ("xfce4-terminal", "-x"),
    ("xterm", "-e"),
    ("alacritty", "-e"),
    ("kitty", "-e"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalHostConfig {
    pub commands_path: PathBuf,
    pub preferred_terminal: Option<String>,
    pub elevation_program: String,
}

impl LocalHostConfig {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            commands_path: settings.commands_path(),
            preferred_terminal: settings.preferred_terminal.clone(),
            elevation_program: settings.elevation_program.clone(),
        }
    }
}

type ExitHook = Box<dyn Fn() + Send + Sync>;

#[derive(Debug, PartialEq, Eq)]
struct ShellInvocation {
    program: String,
    args: Vec<String>,
    elevated: bool,
}

/// Write the catalog file on the blocking pool.
async fn write_catalog(path: PathBuf, file: CommandsFile) -> Result<(), AppError> {
    tokio::task::spawn_blocking(move || files::write_json(&path, &file))
        .await
        .map_err(|e| AppError::transport(format!("Catalog write task failed: {e}")))?
}

/// Native host running inside this process: file I/O on the catalog file,
/// shell execution through `tokio::process`, terminal hand-off.
pub struct LocalHost {
    config: LocalHostConfig,
    exit_hook: Option<ExitHook>,
}

impl LocalHost {
    pub fn new(config: LocalHostConfig) -> Self {
        Self {
            config,
            exit_hook: None,
        }
    }

    /// Replace the default `process::exit(0)` used by [`NativeHostClient::app_exit`].
    pub fn with_exit_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.exit_hook = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &LocalHostConfig {
        &self.config
    }

    /// How `command` is launched. Windows has no elevation prefix, so an admin
    /// request there runs unelevated.
    fn shell_invocation(&self, windows: bool, command: &str, is_admin: bool) -> ShellInvocation {
        if windows {
            ShellInvocation {
                program: "cmd".into(),
                args: vec!["/C".into(), command.into()],
                elevated: false,
            }
        } else if is_admin {
            ShellInvocation {
                program: self.config.elevation_program.clone(),
                args: vec!["sh".into(), "-c".into(), command.into()],
                elevated: true,
            }
        } else {
            ShellInvocation {
                program: "sh".into(),
                args: vec!["-c".into(), command.into()],
                elevated: false,
            }
        }
    }

    fn shell_command(&self, command: &str, is_admin: bool) -> tokio::process::Command {
        let invocation = self.shell_invocation(cfg!(target_os = "windows"), command, is_admin);
        if is_admin && !invocation.elevated {
            tracing::warn!(command, "Elevation is not supported here; running unelevated");
        }
        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd
    }

    /// Terminals to try, the configured one first.
    fn terminal_candidates(&self) -> Vec<(String, &'static str)> {
        let mut candidates = Vec::with_capacity(TERMINALS.len() + 1);
        if let Some(preferred) = &self.config.preferred_terminal {
            let flag = TERMINALS
                .iter()
                .find(|(name, _)| *name == preferred.as_str())
                .map_or("-e", |(_, flag)| *flag);
            candidates.push((preferred.clone(), flag));
        }
        for (name, flag) in TERMINALS {
            if self.config.preferred_terminal.as_deref() != Some(name) {
                candidates.push((name.to_string(), flag));
            }
        }
        candidates
    }
}

/// Shell snippet that runs `command`, reports its exit status, and waits for
/// Enter so the terminal stays open.
fn wait_script(command: &str) -> String {
    format!(
        "{command}; status=$?; if [ $status -eq 0 ]; then echo \"\\nCommand finished successfully (status $status).\"; else echo \"\\nCommand failed (status $status).\"; fi; echo \"\\nPress Enter to close...\"; read -r _"
    )
}

fn collect_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    match (stdout.trim_end().is_empty(), stderr.trim_end().is_empty()) {
        (_, true) => stdout.trim_end().to_string(),
        (true, false) => stderr.trim_end().to_string(),
        (false, false) => format!("{}\n{}", stdout.trim_end(), stderr.trim_end()),
    }
}

impl NativeHostClient for LocalHost {
    fn read_commands_file(&self) -> HostFuture<'_, Value> {
        Box::pin(async move {
            let path = &self.config.commands_path;
            match tokio::fs::read_to_string(path).await {
                Ok(data) => Ok(serde_json::from_str::<Value>(&data).map_err(|e| {
                    AppError::transport(format!("Failed to parse {}: {e}", path.display()))
                })?),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    // First run: seed the file with the built-in catalog.
                    let seeded = CommandsFile {
                        commands: default_catalog(),
                    };
                    let value = serde_json::to_value(&seeded)?;
                    write_catalog(path.clone(), seeded).await?;
                    tracing::info!(path = %path.display(), "Seeded command catalog");
                    Ok(value)
                }
                Err(e) => Err(AppError::transport(format!(
                    "Failed to read {}: {e}",
                    path.display()
                ))),
            }
        })
    }

    fn write_commands_file<'a>(&'a self, commands: &'a [Command]) -> HostFuture<'a, ()> {
        Box::pin(async move {
            let file = CommandsFile {
                commands: commands.to_vec(),
            };
            write_catalog(self.config.commands_path.clone(), file).await
        })
    }

    fn execute_command<'a>(&'a self, command: &'a str, is_admin: bool) -> HostFuture<'a, Value> {
        Box::pin(async move {
            tracing::debug!(command, is_admin, "Executing command");
            let output = self
                .shell_command(command, is_admin)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| AppError::execution(format!("Failed to start command: {e}")))?;

            let text = collect_output(&output);
            if output.status.success() {
                Ok(Value::String(text))
            } else {
                Err(AppError::execution(format!(
                    "Command exited with {}: {text}",
                    output.status
                )))
            }
        })
    }

    fn open_in_terminal<'a>(&'a self, command: &'a str) -> HostFuture<'a, ()> {
        Box::pin(async move {
            if cfg!(target_os = "windows") {
                let script = format!(
                    "{command} & echo. & if %ERRORLEVEL%==0 (echo Command finished successfully.) else (echo Command failed with code %ERRORLEVEL%) & echo. & set /p _=Press Enter to close..."
                );
                tokio::process::Command::new("cmd")
                    .args(["/C", "start", "cmd", "/K"])
                    .arg(&script)
                    .spawn()
                    .map_err(|e| AppError::execution(format!("Failed to open terminal: {e}")))?;
                return Ok(());
            }

            if cfg!(target_os = "macos") {
                let escaped = wait_script(command).replace('\\', "\\\\").replace('"', "\\\"");
                let script = format!("tell application \"Terminal\" to do script \"{escaped}\"");
                tokio::process::Command::new("osascript")
                    .args(["-e", &script])
                    .spawn()
                    .map_err(|e| AppError::execution(format!("Failed to open terminal: {e}")))?;
                return Ok(());
            }

            let script = wait_script(command);
            for (terminal, flag) in self.terminal_candidates() {
                if which::which(&terminal).is_err() {
                    continue;
                }
                match tokio::process::Command::new(&terminal)
                    .arg(flag)
                    .args(["sh", "-c", &script])
                    .spawn()
                {
                    Ok(_) => {
                        tracing::debug!(terminal = %terminal, "Opened command in terminal");
                        return Ok(());
                    }
                    Err(e) => tracing::warn!(terminal = %terminal, "Failed to launch terminal: {e}"),
                }
            }

            let supported: Vec<&str> = TERMINALS.iter().map(|(name, _)| *name).collect();
            Err(AppError::execution(format!(
                "No terminal found. Supported terminals: {}",
                supported.join(", ")
            )))
        })
    }

    fn app_exit(&self) -> HostFuture<'_, ()> {
        Box::pin(async move {
            match &self.exit_hook {
                Some(hook) => hook(),
                None => std::process::exit(0),
            }
            Ok(())
        })
    }
}
