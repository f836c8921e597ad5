//! Draft store and step machine.
//!
//! All draft edits go through [`WizardStore::dispatch`]. A command is applied to a
//! copy of the draft and only swapped in when it succeeds, so a rejected command
//! leaves the draft exactly as it was. Commands touching maps, counts or ports are
//! followed by [`derive`], which keeps the port configuration and the per-server
//! overrides consistent with the new server list.

use crate::defaults::MAX_SERVERS;
use crate::error::WizardError;
use crate::generation::{
    generate_servers, implied_server_count, planned_server_count, reconcile_server_configs,
};
use crate::import::{import_config, WizardPatch};
use crate::models::{
    Port, PortAllocationMode, SelectedMap, ServerConfig, ServerOverride, SettingValue,
    WizardData, WizardStep,
};
use crate::mods::{add_mod, parse_mod_ids, remove_mod, validate_mod_id};
use crate::plan::{build_plan, DeploymentPlan};
use crate::ports::{preview_ports, PortBases, ServerPorts};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WizardCommand {
    SetClusterName { name: String },
    SetDescription { description: String },
    SetServerCount { count: u32 },
    SetBasePort { port: Port },
    SetQueryPortBase { port: Port },
    SetRconPortBase { port: Port },
    SetPortAllocationMode { mode: PortAllocationMode },
    AddMap {
        map: String,
        #[serde(default)]
        display_name: Option<String>,
        #[serde(default)]
        count: Option<u32>,
    },
    RemoveMap { map: String },
    SetMapEnabled { map: String, enabled: bool },
    SetMapCount { map: String, count: u32 },
    SetCustomMap { map: Option<String> },
    SetMaxPlayers { max_players: u32 },
    SetAdminPassword { password: String },
    SetServerPassword { password: String },
    SetClusterPassword { password: String },
    SetCustomDynamicConfigUrl { url: String },
    SetGameSetting { key: String, value: SettingValue },
    SetGameIni { text: String },
    SetGameUserSettingsIni { text: String },
    AddGlobalMod { id: String },
    RemoveGlobalMod { id: String },
    /// Replaces the shared mod list from comma or newline separated input.
    SetGlobalMods { input: String },
    AddServerMod { server: String, id: String },
    RemoveServerMod { server: String, id: String },
    SetExcludeSharedMods { server: String, exclude: bool },
    /// Merges the given fields into the override at `index`.
    UpdateServer { index: usize, edits: ServerOverride },
    ClearServerOverride { index: usize },
    ResetServerOverrides,
    /// Drops imported explicit servers so the list is generated from maps again.
    ClearImportedServers,
}

impl WizardCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            WizardCommand::SetClusterName { .. } => "setClusterName",
            WizardCommand::SetDescription { .. } => "setDescription",
            WizardCommand::SetServerCount { .. } => "setServerCount",
            WizardCommand::SetBasePort { .. } => "setBasePort",
            WizardCommand::SetQueryPortBase { .. } => "setQueryPortBase",
            WizardCommand::SetRconPortBase { .. } => "setRconPortBase",
            WizardCommand::SetPortAllocationMode { .. } => "setPortAllocationMode",
            WizardCommand::AddMap { .. } => "addMap",
            WizardCommand::RemoveMap { .. } => "removeMap",
            WizardCommand::SetMapEnabled { .. } => "setMapEnabled",
            WizardCommand::SetMapCount { .. } => "setMapCount",
            WizardCommand::SetCustomMap { .. } => "setCustomMap",
            WizardCommand::SetMaxPlayers { .. } => "setMaxPlayers",
            WizardCommand::SetAdminPassword { .. } => "setAdminPassword",
            WizardCommand::SetServerPassword { .. } => "setServerPassword",
            WizardCommand::SetClusterPassword { .. } => "setClusterPassword",
            WizardCommand::SetCustomDynamicConfigUrl { .. } => "setCustomDynamicConfigUrl",
            WizardCommand::SetGameSetting { .. } => "setGameSetting",
            WizardCommand::SetGameIni { .. } => "setGameIni",
            WizardCommand::SetGameUserSettingsIni { .. } => "setGameUserSettingsIni",
            WizardCommand::AddGlobalMod { .. } => "addGlobalMod",
            WizardCommand::RemoveGlobalMod { .. } => "removeGlobalMod",
            WizardCommand::SetGlobalMods { .. } => "setGlobalMods",
            WizardCommand::AddServerMod { .. } => "addServerMod",
            WizardCommand::RemoveServerMod { .. } => "removeServerMod",
            WizardCommand::SetExcludeSharedMods { .. } => "setExcludeSharedMods",
            WizardCommand::UpdateServer { .. } => "updateServer",
            WizardCommand::ClearServerOverride { .. } => "clearServerOverride",
            WizardCommand::ResetServerOverrides => "resetServerOverrides",
            WizardCommand::ClearImportedServers => "clearImportedServers",
        }
    }

    /// Whether the command changes inputs of the derived server list layout.
    fn affects_layout(&self) -> bool {
        matches!(
            self,
            WizardCommand::SetServerCount { .. }
                | WizardCommand::SetBasePort { .. }
                | WizardCommand::SetQueryPortBase { .. }
                | WizardCommand::SetRconPortBase { .. }
                | WizardCommand::SetPortAllocationMode { .. }
                | WizardCommand::AddMap { .. }
                | WizardCommand::RemoveMap { .. }
                | WizardCommand::SetMapEnabled { .. }
                | WizardCommand::SetMapCount { .. }
                | WizardCommand::SetCustomMap { .. }
                | WizardCommand::ClearImportedServers
        )
    }
}

/// Brings derived draft fields in line with their inputs.
pub fn derive(data: &mut WizardData) {
    data.port_configuration.base_port = data.base_port;
    data.port_configuration.increment = data.port_allocation_mode.stride();

    let count = implied_server_count(data);
    let maps_enabled = data.selected_maps.iter().any(|entry| entry.enabled);
    if !data.servers.is_empty() || maps_enabled {
        data.server_count = count as u32;
    }
    if !data.server_configs.is_empty() {
        reconcile_server_configs(&mut data.server_configs, count);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WizardStore {
    step: WizardStep,
    data: WizardData,
}

impl WizardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a store from persisted parts, re-deriving the draft.
    pub fn from_parts(step: WizardStep, mut data: WizardData) -> Self {
        derive(&mut data);
        Self { step, data }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn data(&self) -> &WizardData {
        &self.data
    }

    pub fn into_parts(self) -> (WizardStep, WizardData) {
        (self.step, self.data)
    }

    /// Moves to `step` unconditionally and returns the step that was left.
    pub fn go_to(&mut self, step: WizardStep) -> WizardStep {
        let previous = self.step;
        if previous == WizardStep::Creating && step != WizardStep::Creating {
            warn!(from = %previous, to = %step, "leaving creating step after submission");
        }
        self.step = step;
        info!(from = %previous, to = %step, "wizard step changed");
        previous
    }

    pub fn dispatch(&mut self, command: WizardCommand) -> Result<(), WizardError> {
        let kind = command.kind();
        let affects_layout = command.affects_layout();
        let mut next = self.data.clone();
        let applied = apply_command(&mut next, command).and_then(|()| {
            if affects_layout {
                check_size(&next)
            } else {
                Ok(())
            }
        });
        if let Err(err) = applied {
            debug!(command = kind, error = %err, "wizard command rejected");
            return Err(err);
        }
        if affects_layout {
            derive(&mut next);
        }
        self.data = next;
        debug!(command = kind, "wizard command applied");
        Ok(())
    }

    /// Parses `document` and merges it. On any error the draft is untouched.
    pub fn import_document(&mut self, document: &str) -> Result<(), WizardError> {
        match import_config(document) {
            Ok(patch) => {
                self.apply_import(patch);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "import rejected");
                Err(err.into())
            }
        }
    }

    pub fn apply_import(&mut self, patch: WizardPatch) {
        let name = patch.cluster_name.clone();
        patch.apply(&mut self.data);
        derive(&mut self.data);
        info!(
            cluster = %name,
            servers = implied_server_count(&self.data),
            "import merged into draft"
        );
    }

    pub fn servers(&self) -> Vec<ServerConfig> {
        generate_servers(&self.data)
    }

    pub fn port_preview(&self) -> Vec<ServerPorts> {
        let count = implied_server_count(&self.data).max(self.data.server_count as usize);
        preview_ports(
            PortBases::from_wizard(&self.data),
            self.data.port_allocation_mode,
            count,
        )
    }

    pub fn deployment_plan(&self) -> DeploymentPlan {
        build_plan(&self.data)
    }
}

fn apply_command(data: &mut WizardData, command: WizardCommand) -> Result<(), WizardError> {
    match command {
        WizardCommand::SetClusterName { name } => data.cluster_name = name,
        WizardCommand::SetDescription { description } => data.description = description,
        WizardCommand::SetServerCount { count } => {
            check_count(u64::from(count))?;
            data.server_count = count;
        }
        WizardCommand::SetBasePort { port } => data.base_port = port,
        WizardCommand::SetQueryPortBase { port } => data.port_configuration.query_port_base = port,
        WizardCommand::SetRconPortBase { port } => data.port_configuration.rcon_port_base = port,
        WizardCommand::SetPortAllocationMode { mode } => data.port_allocation_mode = mode,
        WizardCommand::AddMap {
            map,
            display_name,
            count,
        } => {
            let map = map.trim().to_string();
            if map.is_empty() {
                return Err(WizardError::UnknownMap(map));
            }
            if let Some(count) = count {
                check_count(u64::from(count))?;
            }
            match data.selected_map_mut(&map) {
                Some(existing) => {
                    existing.enabled = true;
                    if let Some(count) = count {
                        existing.count = count.max(1);
                    }
                    if display_name.is_some() {
                        existing.display_name = display_name;
                    }
                }
                None => {
                    let mut entry = SelectedMap::new(map, count.unwrap_or(1));
                    if display_name.is_some() {
                        entry.display_name = display_name;
                    }
                    data.selected_maps.push(entry);
                }
            }
        }
        WizardCommand::RemoveMap { map } => {
            let before = data.selected_maps.len();
            data.selected_maps.retain(|entry| entry.map != map);
            if data.selected_maps.len() == before {
                return Err(WizardError::UnknownMap(map));
            }
        }
        WizardCommand::SetMapEnabled { map, enabled } => {
            map_entry(data, &map)?.enabled = enabled;
        }
        WizardCommand::SetMapCount { map, count } => {
            check_count(u64::from(count))?;
            map_entry(data, &map)?.count = count.max(1);
        }
        WizardCommand::SetCustomMap { map } => {
            data.custom_map = map
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
        }
        WizardCommand::SetMaxPlayers { max_players } => data.max_players = max_players,
        WizardCommand::SetAdminPassword { password } => data.admin_password = password,
        WizardCommand::SetServerPassword { password } => data.server_password = password,
        WizardCommand::SetClusterPassword { password } => data.cluster_password = password,
        WizardCommand::SetCustomDynamicConfigUrl { url } => {
            data.custom_dynamic_config_url = url.trim().to_string();
        }
        WizardCommand::SetGameSetting { key, value } => data.game_settings.set(&key, value)?,
        WizardCommand::SetGameIni { text } => data.game_ini = text,
        WizardCommand::SetGameUserSettingsIni { text } => data.game_user_settings_ini = text,
        WizardCommand::AddGlobalMod { id } => {
            add_mod(&mut data.global_mods, &id)?;
        }
        WizardCommand::RemoveGlobalMod { id } => {
            remove_mod(&mut data.global_mods, &id);
        }
        WizardCommand::SetGlobalMods { input } => data.global_mods = parse_mod_ids(&input)?,
        WizardCommand::AddServerMod { server, id } => {
            let id = validate_mod_id(&id)?;
            let entry = data.server_mods.entry(server).or_default();
            add_mod(&mut entry.additional_mods, &id)?;
        }
        WizardCommand::RemoveServerMod { server, id } => {
            if let Some(entry) = data.server_mods.get_mut(&server) {
                remove_mod(&mut entry.additional_mods, &id);
            }
        }
        WizardCommand::SetExcludeSharedMods { server, exclude } => {
            data.server_mods.entry(server).or_default().exclude_shared_mods = exclude;
        }
        WizardCommand::UpdateServer { index, edits } => {
            let count = implied_server_count(data);
            if index >= count {
                return Err(WizardError::UnknownServer(index));
            }
            reconcile_server_configs(&mut data.server_configs, count);
            let target = &mut data.server_configs[index];
            merge_override(target, edits);
        }
        WizardCommand::ClearServerOverride { index } => {
            let target = data
                .server_configs
                .get_mut(index)
                .ok_or(WizardError::UnknownServer(index))?;
            *target = ServerOverride::default();
        }
        WizardCommand::ResetServerOverrides => data.server_configs.clear(),
        WizardCommand::ClearImportedServers => data.servers.clear(),
    }
    Ok(())
}

fn check_count(count: u64) -> Result<(), WizardError> {
    if count > MAX_SERVERS {
        return Err(WizardError::TooManyServers {
            requested: count,
            max: MAX_SERVERS,
        });
    }
    Ok(())
}

fn check_size(data: &WizardData) -> Result<(), WizardError> {
    check_count(planned_server_count(data))
}

fn map_entry<'a>(data: &'a mut WizardData, map: &str) -> Result<&'a mut SelectedMap, WizardError> {
    data.selected_map_mut(map)
        .ok_or_else(|| WizardError::UnknownMap(map.to_string()))
}

fn merge_override(target: &mut ServerOverride, edits: ServerOverride) {
    if edits.name.is_some() {
        target.name = edits.name;
    }
    if edits.game_port.is_some() {
        target.game_port = edits.game_port;
    }
    if edits.query_port.is_some() {
        target.query_port = edits.query_port;
    }
    if edits.rcon_port.is_some() {
        target.rcon_port = edits.rcon_port;
    }
    if edits.max_players.is_some() {
        target.max_players = edits.max_players;
    }
    if edits.admin_password.is_some() {
        target.admin_password = edits.admin_password;
    }
    if edits.server_password.is_some() {
        target.server_password = edits.server_password;
    }
    if edits.session_name.is_some() {
        target.session_name = edits.session_name;
    }
}
