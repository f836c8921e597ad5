//! Policy defaults shared by the engines and the import path.

use crate::models::Port;

pub const DEFAULT_GAME_PORT: Port = 7777;
pub const DEFAULT_QUERY_PORT: Port = 27015;
pub const DEFAULT_RCON_PORT: Port = 32330;

/// Ports reserved per server in `even` mode: game, query and rcon at offsets 0, 2 and 4.
pub const EVEN_BLOCK_SIZE: u32 = 6;

pub const DEFAULT_MAX_PLAYERS: u32 = 70;

/// Number of servers shown by the port preview.
pub const PORT_PREVIEW_LIMIT: usize = 5;

/// Largest cluster the wizard will describe.
pub const MAX_SERVERS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownMap {
    pub id: &'static str,
    pub display_name: &'static str,
}

const KNOWN_MAPS: &[KnownMap] = &[
    KnownMap { id: "TheIsland", display_name: "The Island" },
    KnownMap { id: "TheCenter", display_name: "The Center" },
    KnownMap { id: "ScorchedEarth", display_name: "Scorched Earth" },
    KnownMap { id: "Aberration", display_name: "Aberration" },
    KnownMap { id: "Extinction", display_name: "Extinction" },
    KnownMap { id: "Ragnarok", display_name: "Ragnarok" },
    KnownMap { id: "Valguero", display_name: "Valguero" },
    KnownMap { id: "LostIsland", display_name: "Lost Island" },
    KnownMap { id: "Fjordur", display_name: "Fjordur" },
    KnownMap { id: "CrystalIsles", display_name: "Crystal Isles" },
    KnownMap { id: "Genesis", display_name: "Genesis: Part 1" },
    KnownMap { id: "Genesis2", display_name: "Genesis: Part 2" },
];

pub fn known_maps() -> &'static [KnownMap] {
    KNOWN_MAPS
}

pub fn map_display_name(map: &str) -> Option<&'static str> {
    KNOWN_MAPS
        .iter()
        .find(|entry| entry.id.eq_ignore_ascii_case(map))
        .map(|entry| entry.display_name)
}
