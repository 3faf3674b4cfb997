use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::clock;

/// Prefix carried by the id of a command that has not been saved yet.
pub const DRAFT_ID_PREFIX: &str = "new-";

/// One entry of the catalog: a shell command plus its grouping keys.
///
/// Only `id` and `command` are required on the wire; the remaining fields
/// default to empty so that sparse host data still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Command {
    pub id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub title: String,
    pub command: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl Command {
    /// A fresh, unsaved command pre-filled with the editor's template values.
    pub fn draft() -> Self {
        Self {
            id: draft_id(),
            category: "Personalizado".into(),
            subcategory: "Meus Comandos".into(),
            title: "Novo Comando".into(),
            command: "echo 'Hello World'".into(),
            description: "Descrição do novo comando".into(),
            is_admin: false,
        }
    }

    pub fn is_draft(&self) -> bool {
        is_draft_id(&self.id)
    }

    /// Overwrite the editable fields. `id` is never touched; `is_admin` only
    /// when the edit carries an explicit value.
    pub fn apply(&mut self, edit: &CommandEdit) {
        self.title.clone_from(&edit.title);
        self.command.clone_from(&edit.command);
        self.description.clone_from(&edit.description);
        self.category.clone_from(&edit.category);
        self.subcategory.clone_from(&edit.subcategory);
        if let Some(is_admin) = edit.is_admin {
            self.is_admin = is_admin;
        }
    }
}

/// The editable fields of a command, as submitted by the edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CommandEdit {
    pub title: String,
    pub command: String,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

impl From<&Command> for CommandEdit {
    fn from(cmd: &Command) -> Self {
        Self {
            title: cmd.title.clone(),
            command: cmd.command.clone(),
            description: cmd.description.clone(),
            category: cmd.category.clone(),
            subcategory: cmd.subcategory.clone(),
            is_admin: Some(cmd.is_admin),
        }
    }
}

/// Envelope used both by the host's catalog file and the local cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandsFile {
    pub commands: Vec<Command>,
}

pub fn is_draft_id(id: &str) -> bool {
    id.starts_with(DRAFT_ID_PREFIX)
}

/// `new-<ms>` temporary id for an unsaved command.
pub fn draft_id() -> String {
    format!("{DRAFT_ID_PREFIX}{}", clock::unix_time_ms_now())
}

/// Stable id assigned at save time, derived from the save timestamp.
pub fn stable_id() -> String {
    clock::next_monotonic_timestamp_ms().to_string()
}

fn seed(
    id: &str,
    category: &str,
    subcategory: &str,
    title: &str,
    command: &str,
    description: &str,
    is_admin: bool,
) -> Command {
    Command {
        id: id.into(),
        category: category.into(),
        subcategory: subcategory.into(),
        title: title.into(),
        command: command.into(),
        description: description.into(),
        is_admin,
    }
}

/// Built-in catalog used when neither the host nor the cache can provide one.
pub fn default_catalog() -> Vec<Command> {
    vec![
        seed(
            "1",
            "Sistema",
            "Atualizar Sistema",
            "Atualizar Sistema",
            "sudo pacman -Syu",
            "Atualiza todo o sistema e pacotes",
            true,
        ),
        seed(
            "2",
            "Pacotes",
            "Instalar Pacote",
            "Instalar Pacote",
            "sudo pacman -S",
            "Instala um pacote específico",
            true,
        ),
        seed(
            "3",
            "Pacotes",
            "Procurar Pacote",
            "Procurar Pacote",
            "pacman -Ss",
            "Procura por pacotes no repositório",
            false,
        ),
        seed(
            "4",
            "Sistema",
            "Limpar Cache",
            "Limpar Cache",
            "sudo pacman -Sc",
            "Limpa o cache de pacotes",
            true,
        ),
        seed(
            "5",
            "Informações",
            "Informações do Sistema",
            "Ver Informações do Sistema",
            "uname -a",
            "Mostra informações detalhadas do sistema",
            false,
        ),
        seed(
            "6",
            "Informações",
            "Espaço em Disco",
            "Ver Espaço em Disco",
            "df -h",
            "Mostra o uso de espaço em disco",
            false,
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_camel_case_admin_flag() {
        let cmd = &default_catalog()[0];
        let json = serde_json::to_value(cmd).unwrap();
        assert_eq!(json["isAdmin"], true);
        assert!(json.get("is_admin").is_none());
    }

    #[test]
    fn sparse_entries_deserialize_with_defaults() {
        let cmd: Command =
            serde_json::from_str(r#"{"id":"9","command":"ls"}"#).unwrap();
        assert_eq!(cmd.id, "9");
        assert_eq!(cmd.command, "ls");
        assert!(cmd.title.is_empty());
        assert!(!cmd.is_admin);
    }

    #[test]
    fn default_catalog_has_six_seeded_entries() {
        let catalog = default_catalog();
        let ids: Vec<&str> = catalog.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5", "6"]);
        assert_eq!(catalog[4].title, "Ver Informações do Sistema");
        assert_eq!(catalog[5].command, "df -h");
        assert_eq!(catalog.iter().filter(|c| c.is_admin).count(), 3);
    }

    #[test]
    fn draft_carries_prefix_and_template() {
        let draft = Command::draft();
        assert!(draft.is_draft());
        assert_eq!(draft.category, "Personalizado");
        assert_eq!(draft.subcategory, "Meus Comandos");
        assert!(!stable_id().starts_with(DRAFT_ID_PREFIX));
    }

    #[test]
    fn apply_keeps_id_and_admin_unless_overridden() {
        let mut cmd = default_catalog()[2].clone();
        let mut edit = CommandEdit {
            title: "Buscar".into(),
            command: "pacman -Ss vim".into(),
            description: "d".into(),
            category: "Pacotes".into(),
            subcategory: "Busca".into(),
            is_admin: None,
        };
        cmd.apply(&edit);
        assert_eq!(cmd.id, "3");
        assert_eq!(cmd.title, "Buscar");
        assert!(!cmd.is_admin);

        edit.is_admin = Some(true);
        cmd.apply(&edit);
        assert!(cmd.is_admin);
    }
}
