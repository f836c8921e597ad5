use crate::defaults::{
    DEFAULT_GAME_PORT, DEFAULT_QUERY_PORT, DEFAULT_RCON_PORT, EVEN_BLOCK_SIZE, PORT_PREVIEW_LIMIT,
};
use crate::models::{Port, PortAllocationMode, ServerConfig, WizardData};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const EVEN_QUERY_OFFSET: u32 = 2;
const EVEN_RCON_OFFSET: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortBases {
    pub game: Port,
    pub query: Port,
    pub rcon: Port,
}

impl Default for PortBases {
    fn default() -> Self {
        Self {
            game: DEFAULT_GAME_PORT,
            query: DEFAULT_QUERY_PORT,
            rcon: DEFAULT_RCON_PORT,
        }
    }
}

impl PortBases {
    pub fn from_wizard(data: &WizardData) -> Self {
        Self {
            game: data.base_port,
            query: data.port_configuration.query_port_base,
            rcon: data.port_configuration.rcon_port_base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPorts {
    pub game_port: Port,
    pub query_port: Port,
    pub rcon_port: Port,
}

/// Ports for the server at `index`. Total over every index; values past 65535 are
/// returned as computed and left for the caller to flag.
pub fn allocate(bases: PortBases, mode: PortAllocationMode, index: usize) -> ServerPorts {
    let index = u32::try_from(index).unwrap_or(u32::MAX);
    match mode {
        PortAllocationMode::Sequential => ServerPorts {
            game_port: bases.game.saturating_add(index),
            query_port: bases.query.saturating_add(index),
            rcon_port: bases.rcon.saturating_add(index),
        },
        PortAllocationMode::Even => {
            let game_port = bases
                .game
                .saturating_add(index.saturating_mul(EVEN_BLOCK_SIZE));
            ServerPorts {
                game_port,
                query_port: game_port.saturating_add(EVEN_QUERY_OFFSET),
                rcon_port: game_port.saturating_add(EVEN_RCON_OFFSET),
            }
        }
    }
}

/// Ports of the first few servers, for display next to the port inputs.
pub fn preview_ports(
    bases: PortBases,
    mode: PortAllocationMode,
    server_count: usize,
) -> Vec<ServerPorts> {
    (0..server_count.min(PORT_PREVIEW_LIMIT))
        .map(|index| allocate(bases, mode, index))
        .collect()
}

pub fn is_valid_port(port: Port) -> bool {
    (1..=u32::from(u16::MAX)).contains(&port)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortFamily {
    Game,
    Query,
    Rcon,
}

impl std::fmt::Display for PortFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortFamily::Game => f.write_str("game"),
            PortFamily::Query => f.write_str("query"),
            PortFamily::Rcon => f.write_str("rcon"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortUse {
    pub server: String,
    pub family: PortFamily,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConflict {
    pub port: Port,
    pub users: Vec<PortUse>,
}

/// Every port claimed more than once across the finished server list, in port order.
pub fn find_port_conflicts(servers: &[ServerConfig]) -> Vec<PortConflict> {
    let mut claims: BTreeMap<Port, Vec<PortUse>> = BTreeMap::new();
    for server in servers {
        for (port, family) in [
            (server.game_port, PortFamily::Game),
            (server.query_port, PortFamily::Query),
            (server.rcon_port, PortFamily::Rcon),
        ] {
            claims.entry(port).or_default().push(PortUse {
                server: server.name.clone(),
                family,
            });
        }
    }

    claims
        .into_iter()
        .filter(|(_, users)| users.len() > 1)
        .map(|(port, users)| PortConflict { port, users })
        .collect()
}
