use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use archmie::error::AppError;
use archmie::logging;
use archmie::model::{Command, CommandEdit, ThemeKey, ThemeMode};
use archmie::paths;
use archmie::repository::CategoryFilter;
use archmie::state::AppState;

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "archmie-cli", about = "Archmie command launcher (headless)", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// App config directory override
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List commands grouped by subcategory
    List {
        /// Only show this category
        #[arg(long)]
        category: Option<String>,
    },
    /// List categories
    Categories,
    /// Show one command
    Show { id: String },
    /// Run a catalog command and print its output
    Run {
        id: String,
        /// Run with elevated privileges even if the command does not ask for it
        #[arg(long)]
        admin: bool,
    },
    /// Run an arbitrary command line
    Exec {
        command: String,
        #[arg(long)]
        admin: bool,
    },
    /// Open a catalog command in a native terminal
    Terminal { id: String },
    /// Add a command. Unset fields take the new-command template.
    Add {
        #[command(flatten)]
        fields: CommandFields,
    },
    /// Edit a command. Unset fields keep their current value.
    Edit {
        id: String,
        #[command(flatten)]
        fields: CommandFields,
    },
    /// Delete a command
    Delete { id: String },
    /// Theme management
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
}

#[derive(clap::Args)]
struct CommandFields {
    #[arg(long)]
    title: Option<String>,
    /// Shell command line
    #[arg(long = "run")]
    command: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    subcategory: Option<String>,
    #[arg(long)]
    admin: Option<bool>,
}

impl CommandFields {
    fn apply_to(self, edit: &mut CommandEdit) {
        if let Some(title) = self.title {
            edit.title = title;
        }
        if let Some(command) = self.command {
            edit.command = command;
        }
        if let Some(description) = self.description {
            edit.description = description;
        }
        if let Some(category) = self.category {
            edit.category = category;
        }
        if let Some(subcategory) = self.subcategory {
            edit.subcategory = subcategory;
        }
        if self.admin.is_some() {
            edit.is_admin = self.admin;
        }
    }
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Show mode, config, and derived variables
    Show,
    /// Switch between light and dark
    Toggle,
    /// Set the mode explicitly
    Mode { mode: ThemeMode },
    /// Set one color (primary, secondary, accent, text)
    Set { key: ThemeKey, value: String },
    /// Restore the default colors
    Reset,
    /// Print the config as JSON
    Export,
    /// Load a config from a JSON file
    Import { file: PathBuf },
}

// ── Output formatting ────────────────────────────────────────────

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn print_command(command: &Command) {
    let admin = if command.is_admin { " (admin)" } else { "" };
    println!("[{}] {}{admin}", command.id, command.title);
    println!("    $ {}", command.command);
    if !command.description.is_empty() {
        println!("    {}", command.description);
    }
}

fn category_label(filter: &CategoryFilter) -> &str {
    match filter {
        CategoryFilter::All => "All",
        CategoryFilter::Named(name) => name,
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound {
        what: format!("Command {id}"),
    }
}

// ── Dispatch ─────────────────────────────────────────────────────

async fn run_cli(state: &AppState, command: Commands, json: bool) -> Result<(), AppError> {
    match command {
        Commands::List { category } => {
            let filter = category.map_or(CategoryFilter::All, CategoryFilter::Named);
            let groups = state.commands.groups(&filter);
            if json {
                print_json(&groups);
                return Ok(());
            }
            for (subcategory, commands) in &groups {
                println!("── {subcategory} ──");
                for command in commands {
                    print_command(command);
                }
            }
        }
        Commands::Categories => {
            let categories = state.commands.categories();
            if json {
                print_json(&categories);
            } else {
                for category in &categories {
                    println!("{}", category_label(category));
                }
            }
        }
        Commands::Show { id } => {
            let command = state.commands.find(&id).ok_or_else(|| not_found(&id))?;
            if json {
                print_json(&command);
            } else {
                println!("{} / {}", command.category, command.subcategory);
                print_command(&command);
            }
        }
        Commands::Run { id, admin } => {
            let command = state.commands.find(&id).ok_or_else(|| not_found(&id))?;
            let output = state
                .execution
                .execute(&command.command, admin || command.is_admin)
                .await;
            if json {
                print_json(&serde_json::json!({ "output": output }));
            } else {
                println!("{output}");
            }
        }
        Commands::Exec { command, admin } => {
            let output = state.execution.execute(&command, admin).await;
            if json {
                print_json(&serde_json::json!({ "output": output }));
            } else {
                println!("{output}");
            }
        }
        Commands::Terminal { id } => {
            let command = state.commands.find(&id).ok_or_else(|| not_found(&id))?;
            println!("{}", state.execution.open_in_terminal(&command.command).await);
        }
        Commands::Add { fields } => {
            let mut command = Command::draft();
            let mut edit = CommandEdit::from(&command);
            fields.apply_to(&mut edit);
            command.apply(&edit);
            let added = state.commands.add(command).await?;
            if json {
                print_json(&added);
            } else {
                println!("Added command {}", added.id);
            }
        }
        Commands::Edit { id, fields } => {
            let current = state.commands.find(&id).ok_or_else(|| not_found(&id))?;
            let mut edit = CommandEdit::from(&current);
            fields.apply_to(&mut edit);
            let edited = state.commands.edit(&id, &edit).await?;
            if json {
                print_json(&edited);
            } else {
                print_command(&edited);
            }
        }
        Commands::Delete { id } => {
            if !state.commands.delete(&id).await? {
                return Err(not_found(&id));
            }
            if !json {
                println!("Deleted command {id}");
            }
        }
        Commands::Theme { action } => run_theme(state, action, json)?,
    }
    Ok(())
}

fn run_theme(state: &AppState, action: ThemeAction, json: bool) -> Result<(), AppError> {
    let theme = &state.theme;
    match action {
        ThemeAction::Show => {}
        ThemeAction::Toggle => {
            theme.toggle();
        }
        ThemeAction::Mode { mode } => theme.set_mode(mode),
        ThemeAction::Set { key, value } => theme.update(key, value),
        ThemeAction::Reset => theme.reset(),
        ThemeAction::Export => {
            println!("{}", theme.export()?);
            return Ok(());
        }
        ThemeAction::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            theme.import(&text)?;
        }
    }

    let current = theme.store().get_state();
    if json {
        print_json(&current);
    } else {
        println!("mode: {}", current.mode);
        for (name, value) in &current.variables {
            println!("  --{name}: {value}");
        }
    }
    Ok(())
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let app_config_dir = cli.config_dir.unwrap_or_else(paths::fallback_config_dir);
    let settings = AppState::load_settings(&app_config_dir);
    logging::init(&settings.log_filter);

    let storage = AppState::file_storage(&app_config_dir);
    let host = Arc::new(AppState::local_host(&settings));
    let state = AppState::new(app_config_dir, settings, host, storage);

    if !matches!(cli.command, Commands::Theme { .. }) {
        state.commands.load().await;
    }

    if let Err(e) = run_cli(&state, cli.command, cli.json).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
