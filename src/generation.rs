use crate::models::{ServerConfig, ServerOverride, WizardData};
use crate::mods::resolve;
use crate::ports::{allocate, PortBases};

/// One server position produced by map expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSlot {
    pub map: String,
    /// Zero-based occurrence of `map` within the expansion.
    pub occurrence: usize,
}

/// Enabled maps repeated `count` times each, in map-list order. With no enabled map a
/// custom map, if set, fills `serverCount` positions.
pub fn expand_maps(data: &WizardData) -> Vec<MapSlot> {
    let mut slots = Vec::new();
    for entry in data.selected_maps.iter().filter(|entry| entry.enabled) {
        for occurrence in 0..entry.effective_count() as usize {
            slots.push(MapSlot {
                map: entry.map.clone(),
                occurrence,
            });
        }
    }

    if slots.is_empty() {
        if let Some(custom) = custom_map(data) {
            for occurrence in 0..data.server_count.max(1) as usize {
                slots.push(MapSlot {
                    map: custom.to_string(),
                    occurrence,
                });
            }
        }
    }

    slots
}

fn custom_map(data: &WizardData) -> Option<&str> {
    data.custom_map
        .as_deref()
        .map(str::trim)
        .filter(|map| !map.is_empty())
}

/// Number of servers the draft currently describes.
pub fn implied_server_count(data: &WizardData) -> usize {
    if data.servers.is_empty() {
        expand_maps(data).len()
    } else {
        data.servers.len()
    }
}

/// Same count as [`implied_server_count`], computed without expanding the maps.
pub fn planned_server_count(data: &WizardData) -> u64 {
    if !data.servers.is_empty() {
        return data.servers.len() as u64;
    }
    let from_maps: u64 = data
        .selected_maps
        .iter()
        .filter(|entry| entry.enabled)
        .map(|entry| u64::from(entry.effective_count()))
        .sum();
    if from_maps == 0 && custom_map(data).is_some() {
        u64::from(data.server_count.max(1))
    } else {
        from_maps
    }
}

/// Keeps operator edits for surviving positions, drops removed ones and appends
/// empty overrides for new ones.
pub fn reconcile_server_configs(configs: &mut Vec<ServerOverride>, count: usize) {
    configs.resize_with(count, ServerOverride::default);
}

/// Canonical ordered server list for the draft. Pure: the same draft always yields
/// the same list.
pub fn generate_servers(data: &WizardData) -> Vec<ServerConfig> {
    let bases = PortBases::from_wizard(data);
    let mode = data.port_allocation_mode;

    let mut servers = if data.servers.is_empty() {
        expand_maps(data)
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                let ports = allocate(bases, mode, index);
                ServerConfig {
                    name: default_server_name(&slot.map, slot.occurrence),
                    map: slot.map,
                    game_port: ports.game_port,
                    query_port: ports.query_port,
                    rcon_port: ports.rcon_port,
                    ..ServerConfig::default()
                }
            })
            .collect::<Vec<_>>()
    } else {
        explicit_servers(data, bases)
    };

    for (index, server) in servers.iter_mut().enumerate() {
        apply_cluster_defaults(server, data);
        if let Some(edits) = data.server_configs.get(index) {
            apply_override(server, edits);
        }
        if server.session_name.trim().is_empty() {
            server.session_name = server.name.clone();
        }
        server.mods = server_mods(data, &server.name, &server.mods);
    }

    servers
}

/// Shared mods plus the per-name extras, with an explicit server's own mods appended
/// as further extras.
fn server_mods(data: &WizardData, name: &str, own: &[String]) -> Vec<String> {
    if own.is_empty() {
        return resolve(&data.global_mods, data.server_mods.get(name));
    }
    let mut extras = data.server_mods.get(name).cloned().unwrap_or_default();
    extras.additional_mods.extend(own.iter().cloned());
    resolve(&data.global_mods, Some(&extras))
}

pub fn default_server_name(map: &str, occurrence: usize) -> String {
    format!("{map}-{}", occurrence + 1)
}

/// Imported servers keep their own ports; missing ones are allocated at their position.
fn explicit_servers(data: &WizardData, bases: PortBases) -> Vec<ServerConfig> {
    let mut seen_maps: Vec<(String, usize)> = Vec::new();
    data.servers
        .iter()
        .enumerate()
        .map(|(index, explicit)| {
            let occurrence = match seen_maps.iter_mut().find(|(map, _)| *map == explicit.map) {
                Some((_, count)) => {
                    *count += 1;
                    *count - 1
                }
                None => {
                    seen_maps.push((explicit.map.clone(), 1));
                    0
                }
            };

            let mut server = explicit.clone();
            if server.name.trim().is_empty() {
                server.name = default_server_name(&server.map, occurrence);
            }
            let ports = allocate(bases, data.port_allocation_mode, index);
            if server.game_port == 0 {
                server.game_port = ports.game_port;
            }
            if server.query_port == 0 {
                server.query_port = ports.query_port;
            }
            if server.rcon_port == 0 {
                server.rcon_port = ports.rcon_port;
            }
            server
        })
        .collect()
}

fn apply_override(server: &mut ServerConfig, edits: &ServerOverride) {
    if let Some(name) = non_empty(&edits.name) {
        server.name = name.to_string();
    }
    if let Some(port) = edits.game_port {
        server.game_port = port;
    }
    if let Some(port) = edits.query_port {
        server.query_port = port;
    }
    if let Some(port) = edits.rcon_port {
        server.rcon_port = port;
    }
    if let Some(max_players) = edits.max_players {
        server.max_players = max_players;
    }
    if let Some(password) = &edits.admin_password {
        server.admin_password = password.clone();
    }
    if let Some(password) = &edits.server_password {
        server.server_password = password.clone();
    }
    if let Some(session) = non_empty(&edits.session_name) {
        server.session_name = session.to_string();
    }
}

fn apply_cluster_defaults(server: &mut ServerConfig, data: &WizardData) {
    if server.admin_password.is_empty() {
        server.admin_password = data.admin_password.clone();
    }
    if server.server_password.is_empty() {
        server.server_password = data.server_password.clone();
    }
    if server.max_players == 0 {
        server.max_players = data.max_players;
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
