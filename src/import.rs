//! Projection of an external cluster document onto the draft.
//!
//! The document is parsed and validated completely before anything touches the
//! live draft, so a rejected import never leaves a half-applied draft behind.
//! Unknown keys are ignored.

use crate::defaults::{DEFAULT_GAME_PORT, MAX_SERVERS};
use crate::error::ImportError;
use crate::models::{
    GameSettings, Port, PortAllocationMode, SelectedMap, ServerConfig, ServerModOverride,
    WizardData,
};
use crate::mods::validate_mod_id;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportDocument {
    name: Option<String>,
    description: Option<String>,
    server_count: Option<u32>,
    base_port: Option<Port>,
    servers: Option<Vec<ServerConfig>>,
    port_allocation_mode: Option<PortAllocationMode>,
    maps: Option<Vec<String>>,
    custom_dynamic_config_url: Option<String>,
    game_settings: Option<GameSettings>,
    #[serde(default, deserialize_with = "deserialize_mod_ids")]
    global_mods: Option<Vec<String>>,
    server_mods: Option<BTreeMap<String, ImportedServerMods>>,
    game_ini: Option<String>,
    game_user_settings_ini: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedServerMods {
    #[serde(default, deserialize_with = "deserialize_mod_ids")]
    additional_mods: Option<Vec<String>>,
    #[serde(default)]
    exclude_shared_mods: bool,
}

/// The part of the draft an import replaces. Each field overwrites its draft
/// counterpart as a whole; draft fields not listed here are left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardPatch {
    pub cluster_name: String,
    pub description: String,
    pub server_count: u32,
    pub base_port: Port,
    /// `None` when the document carries explicit servers: their ports win over allocation.
    pub port_allocation_mode: Option<PortAllocationMode>,
    pub servers: Vec<ServerConfig>,
    pub selected_maps: Vec<SelectedMap>,
    pub custom_dynamic_config_url: String,
    pub game_settings: GameSettings,
    pub global_mods: Vec<String>,
    pub server_mods: BTreeMap<String, ServerModOverride>,
    pub game_ini: String,
    pub game_user_settings_ini: String,
}

impl WizardPatch {
    /// Writes the patch into `data`. Per-server edits are cleared since they referred
    /// to the previous server list.
    pub fn apply(self, data: &mut WizardData) {
        data.cluster_name = self.cluster_name;
        data.description = self.description;
        data.server_count = self.server_count;
        data.base_port = self.base_port;
        if let Some(mode) = self.port_allocation_mode {
            data.port_allocation_mode = mode;
        }
        data.servers = self.servers;
        data.selected_maps = self.selected_maps;
        data.custom_dynamic_config_url = self.custom_dynamic_config_url;
        data.game_settings = self.game_settings;
        data.global_mods = self.global_mods;
        data.server_mods = self.server_mods;
        data.game_ini = self.game_ini;
        data.game_user_settings_ini = self.game_user_settings_ini;
        data.server_configs.clear();
    }
}

pub fn import_config(text: &str) -> Result<WizardPatch, ImportError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|err| ImportError::ParseFailure(err.to_string()))?;
    import_value(value)
}

pub fn import_value(value: serde_json::Value) -> Result<WizardPatch, ImportError> {
    if !value.is_object() {
        return Err(ImportError::ParseFailure(
            "expected a JSON object at the top level".to_string(),
        ));
    }
    let document: ImportDocument = serde_json::from_value(value)
        .map_err(|err| ImportError::ParseFailure(err.to_string()))?;

    let cluster_name = document
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(ImportError::MissingName)?
        .to_string();

    let servers: Vec<ServerConfig> = document
        .servers
        .unwrap_or_default()
        .into_iter()
        .map(|mut server| {
            server.mods = normalize_mod_ids(std::mem::take(&mut server.mods));
            server
        })
        .collect();
    let has_servers = !servers.is_empty();

    let selected_maps = if has_servers {
        Vec::new()
    } else {
        let mut maps: Vec<SelectedMap> = Vec::new();
        for map in document.maps.unwrap_or_default() {
            let map = map.trim();
            if !map.is_empty() && !maps.iter().any(|entry| entry.map == map) {
                maps.push(SelectedMap::new(map, 1));
            }
        }
        maps
    };

    let port_allocation_mode = if has_servers {
        None
    } else {
        Some(document.port_allocation_mode.unwrap_or_default())
    };

    let server_count = document.server_count.unwrap_or(if has_servers {
        servers.len() as u32
    } else {
        (selected_maps.len() as u32).max(1)
    });

    for requested in [u64::from(server_count), servers.len() as u64] {
        if requested > MAX_SERVERS {
            return Err(ImportError::TooManyServers(requested, MAX_SERVERS));
        }
    }

    let server_mods = document
        .server_mods
        .unwrap_or_default()
        .into_iter()
        .map(|(server, mods)| {
            let additional_mods = normalize_mod_ids(mods.additional_mods.unwrap_or_default());
            (
                server,
                ServerModOverride {
                    additional_mods,
                    exclude_shared_mods: mods.exclude_shared_mods,
                },
            )
        })
        .collect();

    Ok(WizardPatch {
        cluster_name,
        description: document.description.unwrap_or_default(),
        server_count,
        base_port: document.base_port.unwrap_or(DEFAULT_GAME_PORT),
        port_allocation_mode,
        servers,
        selected_maps,
        custom_dynamic_config_url: document.custom_dynamic_config_url.unwrap_or_default(),
        game_settings: document.game_settings.unwrap_or_default(),
        global_mods: normalize_mod_ids(document.global_mods.unwrap_or_default()),
        server_mods,
        game_ini: document.game_ini.unwrap_or_default(),
        game_user_settings_ini: document.game_user_settings_ini.unwrap_or_default(),
    })
}

/// Reads the whole document, then imports it. Nothing is retried.
pub async fn read_import_document(path: &Path) -> Result<WizardPatch, ImportError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| ImportError::Read(format!("{}: {err}", path.display())))?;
    import_config(&contents)
}

fn normalize_mod_ids(ids: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for raw in ids {
        match validate_mod_id(&raw) {
            Ok(id) => {
                if !result.contains(&id) {
                    result.push(id);
                }
            }
            Err(err) => warn!("skipping imported mod: {err}"),
        }
    }
    result
}

/// Mod ids arrive as a list of strings or numbers, or as one comma separated string.
pub fn deserialize_mod_ids<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ModIdsVisitor;

    impl<'de> de::Visitor<'de> for ModIdsVisitor {
        type Value = Option<Vec<String>>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or a list of mod ids")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let values = value
                .split(',')
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(|item| item.to_string())
                .collect::<Vec<_>>();
            Ok(Some(values))
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut values = Vec::new();
            while let Some(item) = seq.next_element::<ModIdEntry>()? {
                let text = match item {
                    ModIdEntry::Text(text) => text.trim().to_string(),
                    ModIdEntry::Number(number) => number.to_string(),
                };
                if !text.is_empty() {
                    values.push(text);
                }
            }
            Ok(Some(values))
        }
    }

    deserializer.deserialize_any(ModIdsVisitor)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModIdEntry {
    Number(u64),
    Text(String),
}
