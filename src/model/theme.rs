use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Light or dark appearance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    /// Page background derived from the mode.
    pub fn background(self) -> &'static str {
        match self {
            ThemeMode::Light => "#f7f8fb",
            ThemeMode::Dark => "#0b0b0b",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(format!("Unknown theme mode: {other}")),
        }
    }
}

/// The four user-configurable colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ThemeKey {
    Primary,
    Secondary,
    Accent,
    Text,
}

impl ThemeKey {
    pub const ALL: [ThemeKey; 4] = [
        ThemeKey::Primary,
        ThemeKey::Secondary,
        ThemeKey::Accent,
        ThemeKey::Text,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeKey::Primary => "primary",
            ThemeKey::Secondary => "secondary",
            ThemeKey::Accent => "accent",
            ThemeKey::Text => "text",
        }
    }
}

impl FromStr for ThemeKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown theme key: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ThemeConfig {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub text: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary: "#2a2a2a".into(),
            secondary: "#545454".into(),
            accent: "#5ce1e6".into(),
            text: "#ffffff".into(),
        }
    }
}

impl ThemeConfig {
    pub fn get(&self, key: ThemeKey) -> &str {
        match key {
            ThemeKey::Primary => &self.primary,
            ThemeKey::Secondary => &self.secondary,
            ThemeKey::Accent => &self.accent,
            ThemeKey::Text => &self.text,
        }
    }

    pub fn set(&mut self, key: ThemeKey, value: String) {
        match key {
            ThemeKey::Primary => self.primary = value,
            ThemeKey::Secondary => self.secondary = value,
            ThemeKey::Accent => self.accent = value,
            ThemeKey::Text => self.text = value,
        }
    }

    /// Copy every field present in `patch` over this config.
    pub fn overlay(mut self, patch: ThemeConfigPatch) -> Self {
        if let Some(v) = patch.primary {
            self.primary = v;
        }
        if let Some(v) = patch.secondary {
            self.secondary = v;
        }
        if let Some(v) = patch.accent {
            self.accent = v;
        }
        if let Some(v) = patch.text {
            self.text = v;
        }
        self
    }
}

/// A partial theme config as found in imported or stored JSON. Unknown keys
/// are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ThemeConfigPatch {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub secondary: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Colors the UI uses that are not user-configurable.
pub const FIXED_PALETTE: [(&str, &str); 6] = [
    ("header-color", "#171717"),
    ("run-command-btn", "#5e17eb"),
    ("edit-command-btn", "#ff7a00"),
    ("save-command-btn", "#7ed957"),
    ("delete-command-btn", "#ff0000"),
    ("command-accent", "#19898d"),
];

/// Visual variables published to the presentation layer, keyed by variable
/// name without the `--` prefix.
pub type VisualVariables = IndexMap<String, String>;

/// Merge the config, the fixed palette, and the mode background into the
/// variable set the presentation layer consumes.
pub fn visual_variables(mode: ThemeMode, config: &ThemeConfig) -> VisualVariables {
    let mut vars = VisualVariables::with_capacity(ThemeKey::ALL.len() + FIXED_PALETTE.len() + 1);
    for key in ThemeKey::ALL {
        vars.insert(key.as_str().to_string(), config.get(key).to_string());
    }
    for (name, color) in FIXED_PALETTE {
        vars.insert(name.to_string(), color.to_string());
    }
    vars.insert("background".to_string(), mode.background().to_string());
    vars
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_strings() {
        for mode in [ThemeMode::Light, ThemeMode::Dark] {
            assert_eq!(mode.as_str().parse::<ThemeMode>().unwrap(), mode);
        }
        assert!("sepia".parse::<ThemeMode>().is_err());
        assert_eq!(ThemeMode::default(), ThemeMode::Dark);
    }

    #[test]
    fn patch_ignores_unknown_keys() {
        let patch: ThemeConfigPatch =
            serde_json::from_str(r##"{"accent":"#123456","glow":"#fff"}"##).unwrap();
        let config = ThemeConfig::default().overlay(patch);
        assert_eq!(config.accent, "#123456");
        assert_eq!(config.primary, "#2a2a2a");
    }

    #[test]
    fn keys_parse_from_lowercase_names() {
        assert_eq!("text".parse::<ThemeKey>().unwrap(), ThemeKey::Text);
        assert!("Text".parse::<ThemeKey>().is_err());
    }

    #[test]
    fn variables_merge_config_palette_and_background() {
        let mut config = ThemeConfig::default();
        config.set(ThemeKey::Primary, "#000000".into());
        let vars = visual_variables(ThemeMode::Light, &config);

        assert_eq!(vars.len(), 11);
        assert_eq!(vars["primary"], "#000000");
        assert_eq!(vars["run-command-btn"], "#5e17eb");
        assert_eq!(vars["background"], "#f7f8fb");
        let names: Vec<&str> = vars.keys().take(4).map(String::as_str).collect();
        assert_eq!(names, ["primary", "secondary", "accent", "text"]);

        let dark = visual_variables(ThemeMode::Dark, &config);
        assert_eq!(dark["background"], "#0b0b0b");
    }
}
