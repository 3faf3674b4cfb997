//! The command catalog: load with fallback, write-through persistence, CRUD,
//! and grouping queries.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::error::AppError;
use crate::host::NativeHostClient;
use crate::kv::{self, KeyValueStore, COMMANDS_CACHE_KEY};
use crate::model::command::{is_draft_id, stable_id};
use crate::model::{default_catalog, Command, CommandEdit, CommandsFile};
use crate::store::Store;

/// Where the current catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum CatalogSource {
    Host,
    Cache,
    Defaults,
    /// Set by a save, whether or not the host accepted the write.
    Local,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogState {
    pub commands: Vec<Command>,
    /// None until the first load or save.
    pub source: Option<CatalogSource>,
}

/// Category filter for [`group_by_subcategory`]. `All` disables filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", tag = "kind", content = "name")]
#[ts(export)]
pub enum CategoryFilter {
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn matches(&self, command: &Command) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(category) => command.category == *category,
        }
    }
}

/// Subcategory name → commands, in first-encounter order.
pub type CommandGroups = IndexMap<String, Vec<Command>>;

// ── Pure catalog functions ──────────────────────────────────────────

fn shape_error(message: impl Into<String>) -> AppError {
    AppError::ShapeValidation {
        message: message.into(),
    }
}

/// Returns the first id that appears more than once.
fn duplicate_id(commands: &[Command]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(commands.len());
    commands
        .iter()
        .map(|c| c.id.as_str())
        .find(|id| !seen.insert(*id))
}

/// Accept a host response that is either a raw array of commands or an
/// object with a `commands` array. Every element must be an object with at
/// least `id` and `command`.
pub fn extract_commands(response: &Value) -> Result<Vec<Command>, AppError> {
    let candidate = match response {
        Value::Array(_) => response,
        Value::Object(fields) => fields
            .get("commands")
            .ok_or_else(|| shape_error("object has no `commands` field"))?,
        _ => return Err(shape_error("expected an array or an object")),
    };
    let Value::Array(items) = candidate else {
        return Err(shape_error("`commands` is not an array"));
    };
    for (i, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            return Err(shape_error(format!("entry {i} is not an object")));
        };
        if !fields.contains_key("id") || !fields.contains_key("command") {
            return Err(shape_error(format!("entry {i} lacks `id` or `command`")));
        }
    }
    let commands: Vec<Command> =
        serde_json::from_value(candidate.clone()).map_err(|e| shape_error(e.to_string()))?;
    if let Some(id) = duplicate_id(&commands) {
        return Err(shape_error(format!("duplicate id `{id}`")));
    }
    Ok(commands)
}

/// Filter by category, then group by subcategory in first-encounter order.
pub fn group_by_subcategory(catalog: &[Command], filter: &CategoryFilter) -> CommandGroups {
    let mut groups = CommandGroups::new();
    for command in catalog.iter().filter(|c| filter.matches(c)) {
        groups
            .entry(command.subcategory.clone())
            .or_default()
            .push(command.clone());
    }
    groups
}

/// Distinct categories of the full catalog, in first-encounter order,
/// prefixed with [`CategoryFilter::All`].
pub fn categories(catalog: &[Command]) -> Vec<CategoryFilter> {
    let mut seen = HashSet::new();
    std::iter::once(CategoryFilter::All)
        .chain(
            catalog
                .iter()
                .filter(|c| seen.insert(c.category.as_str()))
                .map(|c| CategoryFilter::Named(c.category.clone())),
        )
        .collect()
}

/// Swap every draft id for a stable one.
fn finalize_drafts(commands: &mut [Command]) {
    for command in commands.iter_mut().filter(|c| c.is_draft()) {
        command.id = stable_id();
    }
}

// ── Repository ──────────────────────────────────────────────────────

pub struct CommandRepository {
    host: Arc<dyn NativeHostClient>,
    storage: Arc<dyn KeyValueStore>,
    store: Store<CatalogState>,
    /// Held for the whole of each async operation so that loads and saves
    /// apply in the order they were issued.
    serial: tokio::sync::Mutex<()>,
}

impl CommandRepository {
    pub fn new(host: Arc<dyn NativeHostClient>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            host,
            storage,
            store: Store::default(),
            serial: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Store<CatalogState> {
        &self.store
    }

    pub fn commands(&self) -> Vec<Command> {
        self.store.with_state(|s| s.commands.clone())
    }

    pub fn find(&self, id: &str) -> Option<Command> {
        self.store
            .with_state(|s| s.commands.iter().find(|c| c.id == id).cloned())
    }

    pub fn groups(&self, filter: &CategoryFilter) -> CommandGroups {
        self.store
            .with_state(|s| group_by_subcategory(&s.commands, filter))
    }

    pub fn categories(&self) -> Vec<CategoryFilter> {
        self.store.with_state(|s| categories(&s.commands))
    }

    /// Fetch the catalog from the host, falling back to the cached snapshot
    /// and then to the built-in catalog. Never fails; the result is mirrored
    /// to the cache.
    pub async fn load(&self) -> CatalogSource {
        let _serial = self.serial.lock().await;

        let remote = match self.host.read_commands_file().await {
            Ok(response) => extract_commands(&response),
            Err(e) => Err(e),
        };
        let (commands, source) = match remote {
            Ok(commands) => (commands, CatalogSource::Host),
            Err(e) => {
                tracing::warn!("Failed to load commands from host: {e}");
                self.fallback()
            }
        };

        tracing::debug!(count = commands.len(), ?source, "Loaded command catalog");
        self.write_cache(&commands);
        self.store.replace(CatalogState {
            commands,
            source: Some(source),
        });
        source
    }

    fn fallback(&self) -> (Vec<Command>, CatalogSource) {
        match kv::get_json::<CommandsFile>(&*self.storage, COMMANDS_CACHE_KEY) {
            Ok(Some(file)) => match duplicate_id(&file.commands).map(str::to_owned) {
                None => return (file.commands, CatalogSource::Cache),
                Some(id) => tracing::warn!("Cached catalog has duplicate id `{id}`"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("{e}"),
        }
        (default_catalog(), CatalogSource::Defaults)
    }

    fn write_cache(&self, commands: &[Command]) {
        let file = CommandsFile {
            commands: commands.to_vec(),
        };
        if let Err(e) = kv::set_json(&*self.storage, COMMANDS_CACHE_KEY, &file) {
            tracing::warn!("Failed to cache commands: {e}");
        }
    }

    /// Replace the catalog. Draft ids are swapped for stable ones first.
    ///
    /// A host write failure is only logged: state and cache are updated
    /// regardless. The only error is a catalog with duplicate ids.
    pub async fn save(&self, updated: Vec<Command>) -> Result<Vec<Command>, AppError> {
        let _serial = self.serial.lock().await;
        self.save_serialized(updated).await
    }

    async fn save_serialized(&self, mut updated: Vec<Command>) -> Result<Vec<Command>, AppError> {
        finalize_drafts(&mut updated);
        if let Some(id) = duplicate_id(&updated) {
            return Err(AppError::ValidationError {
                message: format!("Duplicate command id `{id}`"),
            });
        }

        if let Err(e) = self.host.write_commands_file(&updated).await {
            tracing::warn!("Failed to save commands to host, keeping local copy: {e}");
        }

        self.write_cache(&updated);
        self.store.replace(CatalogState {
            commands: updated.clone(),
            source: Some(CatalogSource::Local),
        });
        Ok(updated)
    }

    /// Append a command and save. A draft id is replaced by a stable id;
    /// returns the command as persisted.
    pub async fn add(&self, mut command: Command) -> Result<Command, AppError> {
        let _serial = self.serial.lock().await;
        let mut next = self.commands();
        if command.is_draft() {
            command.id = stable_id();
        } else if next.iter().any(|c| c.id == command.id) {
            return Err(AppError::ValidationError {
                message: format!("Duplicate command id `{}`", command.id),
            });
        }
        next.push(command.clone());
        self.save_serialized(next).await?;
        Ok(command)
    }

    /// Replace the editable fields of the command with `id` and save.
    /// Drafts cannot be edited in place: they enter the catalog through
    /// [`CommandRepository::add`].
    pub async fn edit(&self, id: &str, edit: &CommandEdit) -> Result<Command, AppError> {
        let _serial = self.serial.lock().await;
        let mut next = self.commands();
        let Some(position) = next.iter().position(|c| c.id == id) else {
            return Err(AppError::NotFound {
                what: format!("Command {id}"),
            });
        };
        if is_draft_id(id) {
            return Err(AppError::ValidationError {
                message: format!("Command `{id}` is an unsaved draft; add it instead"),
            });
        }
        if let Some(target) = next.get_mut(position) {
            target.apply(edit);
        }
        let saved = self.save_serialized(next).await?;
        saved.get(position).cloned().ok_or_else(|| AppError::NotFound {
            what: format!("Command {id}"),
        })
    }

    /// Remove the command with `id` and save. Returns `false` (and saves
    /// nothing) when no such command exists.
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let _serial = self.serial.lock().await;
        let mut next = self.commands();
        let before = next.len();
        next.retain(|c| c.id != id);
        if next.len() == before {
            return Ok(false);
        }
        self.save_serialized(next).await?;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::host::MemoryHost;
    use crate::kv::MemoryKeyValueStore;

    fn cmd(id: &str, category: &str, subcategory: &str) -> Command {
        Command {
            id: id.into(),
            category: category.into(),
            subcategory: subcategory.into(),
            title: format!("Title {id}"),
            command: format!("echo {id}"),
            description: String::new(),
            is_admin: false,
        }
    }

    fn setup(host: MemoryHost) -> (Arc<MemoryHost>, Arc<MemoryKeyValueStore>, CommandRepository) {
        let host = Arc::new(host);
        let storage = Arc::new(MemoryKeyValueStore::new());
        let repo = CommandRepository::new(host.clone(), storage.clone());
        (host, storage, repo)
    }

    fn cached(storage: &MemoryKeyValueStore) -> Vec<Command> {
        kv::get_json::<CommandsFile>(storage, COMMANDS_CACHE_KEY)
            .unwrap()
            .unwrap()
            .commands
    }

    // ── Shape validation ───────────────────────────────────────────

    #[test]
    fn accepts_raw_array_and_wrapper() {
        let raw = json!([{"id": "a", "command": "ls"}]);
        let wrapped = json!({"commands": [{"id": "a", "command": "ls"}]});
        assert_eq!(extract_commands(&raw).unwrap(), extract_commands(&wrapped).unwrap());
    }

    #[test]
    fn rejects_malformed_shapes() {
        for bad in [
            json!("commands"),
            json!({"items": []}),
            json!({"commands": {"id": "a"}}),
            json!([null]),
            json!([{"id": "a"}]),
            json!([{"command": "ls"}]),
            json!([{"id": 5, "command": "ls"}]),
            json!([{"id": "a", "command": "ls"}, {"id": "a", "command": "pwd"}]),
        ] {
            assert!(
                matches!(extract_commands(&bad), Err(AppError::ShapeValidation { .. })),
                "accepted {bad}"
            );
        }
    }

    // ── Grouping ───────────────────────────────────────────────────

    #[test]
    fn grouping_keeps_first_encounter_order() {
        let catalog = vec![
            cmd("1", "B", "zeta"),
            cmd("2", "A", "alpha"),
            cmd("3", "B", "zeta"),
            cmd("4", "B", "mid"),
        ];
        let groups = group_by_subcategory(&catalog, &CategoryFilter::All);
        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        let zeta: Vec<&str> = groups["zeta"].iter().map(|c| c.id.as_str()).collect();
        assert_eq!(zeta, ["1", "3"]);

        let only_b = group_by_subcategory(&catalog, &CategoryFilter::Named("B".into()));
        let keys: Vec<&str> = only_b.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "mid"]);

        assert!(group_by_subcategory(&catalog, &CategoryFilter::Named("C".into())).is_empty());
    }

    #[test]
    fn categories_start_with_all() {
        let cats = categories(&default_catalog());
        assert_eq!(
            cats,
            vec![
                CategoryFilter::All,
                CategoryFilter::Named("Sistema".into()),
                CategoryFilter::Named("Pacotes".into()),
                CategoryFilter::Named("Informações".into()),
            ]
        );
        assert_eq!(categories(&[]), vec![CategoryFilter::All]);
    }

    // ── Load ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn load_from_host_and_write_through() {
        let catalog = vec![cmd("x", "A", "a")];
        let (_host, storage, repo) = setup(MemoryHost::with_catalog(catalog.clone()));

        assert_eq!(repo.load().await, CatalogSource::Host);
        assert_eq!(repo.commands(), catalog);
        assert_eq!(cached(&storage), catalog);
    }

    #[tokio::test]
    async fn unreachable_host_without_cache_yields_defaults() {
        let (host, storage, repo) = setup(MemoryHost::new());
        host.set_reachable(false);

        assert_eq!(repo.load().await, CatalogSource::Defaults);
        let commands = repo.commands();
        assert_eq!(commands, default_catalog());
        assert_eq!(commands.len(), 6);
        assert_eq!(cached(&storage), default_catalog());
    }

    #[tokio::test]
    async fn unreachable_host_uses_cache() {
        let (host, storage, repo) = setup(MemoryHost::new());
        let snapshot = vec![cmd("c1", "A", "a"), cmd("c2", "A", "b")];
        kv::set_json(&*storage, COMMANDS_CACHE_KEY, &CommandsFile { commands: snapshot.clone() })
            .unwrap();
        host.set_reachable(false);

        assert_eq!(repo.load().await, CatalogSource::Cache);
        assert_eq!(repo.commands(), snapshot);
    }

    #[tokio::test]
    async fn bad_shape_is_treated_like_transport_failure() {
        let (host, storage, repo) = setup(MemoryHost::new());
        let snapshot = vec![cmd("c1", "A", "a")];
        kv::set_json(&*storage, COMMANDS_CACHE_KEY, &CommandsFile { commands: snapshot.clone() })
            .unwrap();
        host.set_read_response(json!({"commands": [{"title": "no id"}]}));

        assert_eq!(repo.load().await, CatalogSource::Cache);
        assert_eq!(repo.commands(), snapshot);
    }

    #[tokio::test]
    async fn malformed_cache_is_swallowed() {
        let (host, storage, repo) = setup(MemoryHost::new());
        storage.set(COMMANDS_CACHE_KEY, "{\"commands\": [").unwrap();
        host.set_reachable(false);

        assert_eq!(repo.load().await, CatalogSource::Defaults);
        assert_eq!(repo.commands(), default_catalog());
        assert_eq!(cached(&storage), default_catalog());
    }

    // ── Save / CRUD ────────────────────────────────────────────────

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (_host, _storage, repo) = setup(MemoryHost::new());
        let list = vec![cmd("3", "A", "a"), cmd("1", "B", "b"), cmd("2", "A", "c")];

        repo.save(list.clone()).await.unwrap();
        assert_eq!(repo.load().await, CatalogSource::Host);
        assert_eq!(repo.commands(), list);
    }

    #[tokio::test]
    async fn save_survives_unreachable_host() {
        let (host, storage, repo) = setup(MemoryHost::new());
        host.set_reachable(false);
        let list = vec![cmd("1", "A", "a")];

        let saved = repo.save(list.clone()).await.unwrap();
        assert_eq!(saved, list);
        assert_eq!(repo.commands(), list);
        assert_eq!(cached(&storage), list);
        assert_eq!(host.write_count(), 0);
    }

    #[tokio::test]
    async fn save_rejects_duplicate_ids() {
        let (host, _storage, repo) = setup(MemoryHost::new());
        let result = repo.save(vec![cmd("1", "A", "a"), cmd("1", "A", "b")]).await;
        assert!(matches!(result, Err(AppError::ValidationError { .. })));
        assert_eq!(host.write_count(), 0);
        assert!(repo.commands().is_empty());
    }

    #[tokio::test]
    async fn save_finalizes_draft_ids() {
        let (_host, _storage, repo) = setup(MemoryHost::new());
        let saved = repo.save(vec![Command::draft(), Command::draft()]).await.unwrap();
        assert!(saved.iter().all(|c| !c.is_draft()));
        assert_ne!(saved[0].id, saved[1].id);
    }

    #[tokio::test]
    async fn add_then_delete_restores_catalog() {
        let (host, _storage, repo) = setup(MemoryHost::with_catalog(default_catalog()));
        repo.load().await;
        let before = repo.commands();

        let added = repo.add(Command::draft()).await.unwrap();
        assert!(!added.is_draft());
        assert_eq!(repo.commands().len(), before.len() + 1);
        assert_eq!(repo.find(&added.id), Some(added.clone()));
        assert_eq!(host.stored_catalog().last(), Some(&added));

        assert!(repo.delete(&added.id).await.unwrap());
        assert_eq!(repo.commands(), before);
        assert_eq!(host.stored_catalog(), before);
    }

    #[tokio::test]
    async fn add_rejects_existing_non_draft_id() {
        let (_host, _storage, repo) = setup(MemoryHost::with_catalog(default_catalog()));
        repo.load().await;
        let result = repo.add(cmd("1", "A", "a")).await;
        assert!(matches!(result, Err(AppError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn rapid_adds_get_distinct_ids() {
        let (_host, _storage, repo) = setup(MemoryHost::new());
        let a = repo.add(Command::draft()).await.unwrap();
        let b = repo.add(Command::draft()).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(repo.commands().len(), 2);
    }

    #[tokio::test]
    async fn edit_replaces_fields_in_place() {
        let (_host, _storage, repo) = setup(MemoryHost::with_catalog(default_catalog()));
        repo.load().await;
        let edit = CommandEdit {
            title: "Pesquisar".into(),
            command: "pacman -Ss vim".into(),
            description: "Busca vim".into(),
            category: "Pacotes".into(),
            subcategory: "Procurar Pacote".into(),
            is_admin: None,
        };

        let edited = repo.edit("3", &edit).await.unwrap();
        assert_eq!(edited.id, "3");
        assert!(!edited.is_admin);
        let commands = repo.commands();
        assert_eq!(commands[2], edited);
        assert_eq!(commands[2].command, "pacman -Ss vim");
        assert_eq!(commands.len(), 6);
    }

    #[tokio::test]
    async fn edit_unknown_id_is_not_found() {
        let (host, _storage, repo) = setup(MemoryHost::new());
        let result = repo.edit("missing", &CommandEdit::default()).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
        assert_eq!(host.write_count(), 0);
    }

    #[tokio::test]
    async fn edit_rejects_draft_ids() {
        let (host, _storage, repo) = setup(MemoryHost::with_catalog(vec![
            cmd("new-1", "A", "x"),
            cmd("2", "A", "x"),
        ]));
        repo.load().await;

        let result = repo.edit("new-1", &CommandEdit::default()).await;

        assert!(matches!(result, Err(AppError::ValidationError { .. })));
        assert_eq!(host.write_count(), 0);
        assert!(repo.find("new-1").is_some());
    }

    #[tokio::test]
    async fn edit_returns_the_command_as_saved() {
        let (_host, _storage, repo) = setup(MemoryHost::with_catalog(vec![
            cmd("new-1", "A", "x"),
            cmd("2", "A", "x"),
        ]));
        repo.load().await;
        let mut edit = CommandEdit::from(&cmd("2", "A", "x"));
        edit.title = "Renamed".into();

        let edited = repo.edit("2", &edit).await.unwrap();

        assert_eq!(edited.id, "2");
        assert_eq!(repo.find("2"), Some(edited));
        assert!(repo.commands().iter().all(|c| !c.is_draft()));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_a_noop() {
        let (host, _storage, repo) = setup(MemoryHost::with_catalog(default_catalog()));
        repo.load().await;
        assert!(!repo.delete("nope").await.unwrap());
        assert_eq!(repo.commands().len(), 6);
        assert_eq!(host.write_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_see_every_catalog_change() {
        let (_host, _storage, repo) = setup(MemoryHost::with_catalog(default_catalog()));
        let sizes = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&sizes);
        repo.store()
            .subscribe(move |s: &CatalogState| sink.lock().push(s.commands.len()));

        repo.load().await;
        let added = repo.add(Command::draft()).await.unwrap();
        repo.delete(&added.id).await.unwrap();

        assert_eq!(*sizes.lock(), vec![6, 7, 6]);
    }
}
