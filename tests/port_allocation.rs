use cluster_planner::models::PortAllocationMode;
use cluster_planner::ports::{
    allocate, find_port_conflicts, is_valid_port, preview_ports, PortBases, PortFamily,
    ServerPorts,
};
use cluster_planner::models::ServerConfig;
use proptest::prelude::*;

fn ports(game_port: u32, query_port: u32, rcon_port: u32) -> ServerPorts {
    ServerPorts {
        game_port,
        query_port,
        rcon_port,
    }
}

#[test]
fn sequential_uses_three_counters() {
    let bases = PortBases::default();
    assert_eq!(
        allocate(bases, PortAllocationMode::Sequential, 0),
        ports(7777, 27015, 32330)
    );
    assert_eq!(
        allocate(bases, PortAllocationMode::Sequential, 1),
        ports(7778, 27016, 32331)
    );
}

#[test]
fn even_packs_six_port_blocks() {
    let bases = PortBases::default();
    assert_eq!(
        allocate(bases, PortAllocationMode::Even, 0),
        ports(7777, 7779, 7781)
    );
    assert_eq!(
        allocate(bases, PortAllocationMode::Even, 1),
        ports(7783, 7785, 7787)
    );
}

#[test]
fn huge_index_saturates_instead_of_wrapping() {
    let result = allocate(PortBases::default(), PortAllocationMode::Even, usize::MAX);
    assert_eq!(result.game_port, u32::MAX);
    assert!(!is_valid_port(result.game_port));
}

#[test]
fn preview_is_capped_at_five() {
    let preview = preview_ports(PortBases::default(), PortAllocationMode::Sequential, 12);
    assert_eq!(preview.len(), 5);
    assert_eq!(preview[4].game_port, 7781);

    let preview = preview_ports(PortBases::default(), PortAllocationMode::Sequential, 2);
    assert_eq!(preview.len(), 2);
}

#[test]
fn conflicts_are_reported_per_port() {
    let servers = vec![
        ServerConfig {
            name: "a".to_string(),
            game_port: 7777,
            query_port: 27015,
            rcon_port: 32330,
            ..ServerConfig::default()
        },
        ServerConfig {
            name: "b".to_string(),
            game_port: 7778,
            query_port: 7777,
            rcon_port: 32331,
            ..ServerConfig::default()
        },
    ];

    let conflicts = find_port_conflicts(&servers);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].port, 7777);
    assert_eq!(conflicts[0].users[0].family, PortFamily::Game);
    assert_eq!(conflicts[0].users[1].server, "b");
    assert_eq!(conflicts[0].users[1].family, PortFamily::Query);
}

#[test]
fn port_range_check() {
    assert!(!is_valid_port(0));
    assert!(is_valid_port(1));
    assert!(is_valid_port(65535));
    assert!(!is_valid_port(65536));
}

proptest! {
    #[test]
    fn sequential_offsets_are_constant(index in 0usize..100_000, game in 1u32..40_000) {
        let bases = PortBases { game, query: 27015, rcon: 32330 };
        let first = allocate(bases, PortAllocationMode::Sequential, 0);
        let other = allocate(bases, PortAllocationMode::Sequential, index);
        prop_assert_eq!(
            other.query_port as i64 - other.game_port as i64,
            first.query_port as i64 - first.game_port as i64
        );
        prop_assert_eq!(
            other.rcon_port as i64 - other.game_port as i64,
            first.rcon_port as i64 - first.game_port as i64
        );
    }

    #[test]
    fn even_blocks_never_overlap(index in 0usize..100_000, game in 1u32..40_000) {
        let bases = PortBases { game, query: 27015, rcon: 32330 };
        let current = allocate(bases, PortAllocationMode::Even, index);
        let next = allocate(bases, PortAllocationMode::Even, index + 1);
        prop_assert_eq!(current.query_port, current.game_port + 2);
        prop_assert_eq!(current.rcon_port, current.game_port + 4);
        prop_assert_eq!(next.game_port - current.game_port, 6);
    }

    #[test]
    fn allocation_is_deterministic(index in 0usize..100_000, even in any::<bool>()) {
        let mode = if even { PortAllocationMode::Even } else { PortAllocationMode::Sequential };
        let bases = PortBases::default();
        prop_assert_eq!(allocate(bases, mode, index), allocate(bases, mode, index));
    }
}
