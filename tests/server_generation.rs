use cluster_planner::generation::{expand_maps, generate_servers, implied_server_count};
use cluster_planner::models::{
    PortAllocationMode, SelectedMap, ServerConfig, ServerModOverride, ServerOverride, WizardData,
};

fn island_draft(mode: PortAllocationMode) -> WizardData {
    WizardData {
        cluster_name: "Tribe Cluster".to_string(),
        selected_maps: vec![SelectedMap::new("TheIsland", 2)],
        port_allocation_mode: mode,
        ..WizardData::default()
    }
}

fn port_triples(servers: &[ServerConfig]) -> Vec<(u32, u32, u32)> {
    servers
        .iter()
        .map(|server| (server.game_port, server.query_port, server.rcon_port))
        .collect()
}

#[test]
fn sequential_island_pair() {
    let servers = generate_servers(&island_draft(PortAllocationMode::Sequential));
    let names: Vec<&str> = servers.iter().map(|server| server.name.as_str()).collect();
    assert_eq!(names, vec!["TheIsland-1", "TheIsland-2"]);
    assert_eq!(
        port_triples(&servers),
        vec![(7777, 27015, 32330), (7778, 27016, 32331)]
    );
    assert!(servers.iter().all(|server| server.map == "TheIsland"));
}

#[test]
fn even_island_pair() {
    let servers = generate_servers(&island_draft(PortAllocationMode::Even));
    assert_eq!(
        port_triples(&servers),
        vec![(7777, 7779, 7781), (7783, 7785, 7787)]
    );
}

#[test]
fn generation_is_idempotent() {
    let mut draft = island_draft(PortAllocationMode::Even);
    draft.global_mods = vec!["111".to_string()];
    draft.server_configs = vec![ServerOverride {
        name: Some("Main".to_string()),
        ..ServerOverride::default()
    }];
    assert_eq!(generate_servers(&draft), generate_servers(&draft));
}

#[test]
fn expansion_keeps_map_order_and_skips_disabled_maps() {
    let mut draft = WizardData::default();
    draft.selected_maps = vec![
        SelectedMap::new("Ragnarok", 1),
        SelectedMap {
            enabled: false,
            ..SelectedMap::new("Aberration", 3)
        },
        SelectedMap::new("TheIsland", 2),
    ];

    let servers = generate_servers(&draft);
    let names: Vec<&str> = servers.iter().map(|server| server.name.as_str()).collect();
    assert_eq!(names, vec!["Ragnarok-1", "TheIsland-1", "TheIsland-2"]);
    assert_eq!(servers[2].game_port, 7779);
    assert_eq!(implied_server_count(&draft), 3);
}

#[test]
fn zero_count_places_one_server() {
    let mut draft = WizardData::default();
    draft.selected_maps = vec![SelectedMap::new("TheCenter", 0)];
    assert_eq!(expand_maps(&draft).len(), 1);
}

#[test]
fn empty_selection_yields_no_servers() {
    let draft = WizardData::default();
    assert!(generate_servers(&draft).is_empty());
}

#[test]
fn custom_map_fills_server_count_when_no_map_is_selected() {
    let mut draft = WizardData::default();
    draft.custom_map = Some("MyMap".to_string());
    draft.server_count = 3;
    let servers = generate_servers(&draft);
    let names: Vec<&str> = servers.iter().map(|server| server.name.as_str()).collect();
    assert_eq!(names, vec!["MyMap-1", "MyMap-2", "MyMap-3"]);
}

#[test]
fn cluster_defaults_fill_passwords_and_session_names() {
    let mut draft = island_draft(PortAllocationMode::Sequential);
    draft.admin_password = "admin".to_string();
    draft.server_password = "join".to_string();
    draft.max_players = 20;

    let servers = generate_servers(&draft);
    assert_eq!(servers[0].session_name, "TheIsland-1");
    assert_eq!(servers[1].admin_password, "admin");
    assert_eq!(servers[1].server_password, "join");
    assert_eq!(servers[1].max_players, 20);
}

#[test]
fn operator_edits_stay_sticky() {
    let mut draft = island_draft(PortAllocationMode::Sequential);
    draft.admin_password = "admin".to_string();
    draft.server_configs = vec![
        ServerOverride::default(),
        ServerOverride {
            name: Some("Island PvP".to_string()),
            game_port: Some(7900),
            admin_password: Some(String::new()),
            ..ServerOverride::default()
        },
    ];

    let servers = generate_servers(&draft);
    assert_eq!(servers[0].name, "TheIsland-1");
    assert_eq!(servers[1].name, "Island PvP");
    assert_eq!(servers[1].session_name, "Island PvP");
    assert_eq!(servers[1].game_port, 7900);
    assert_eq!(servers[1].query_port, 27016);
    assert_eq!(servers[1].admin_password, "");

    draft.base_port = 8000;
    let servers = generate_servers(&draft);
    assert_eq!(servers[0].game_port, 8000);
    assert_eq!(servers[1].game_port, 7900);
}

#[test]
fn session_name_override_wins() {
    let mut draft = island_draft(PortAllocationMode::Sequential);
    draft.server_configs = vec![ServerOverride {
        session_name: Some("Tribe Island".to_string()),
        ..ServerOverride::default()
    }];
    let servers = generate_servers(&draft);
    assert_eq!(servers[0].session_name, "Tribe Island");
    assert_eq!(servers[0].name, "TheIsland-1");
}

#[test]
fn mods_are_resolved_per_server_name() {
    let mut draft = island_draft(PortAllocationMode::Sequential);
    draft.global_mods = vec!["111".to_string(), "222".to_string()];
    draft.server_mods.insert(
        "TheIsland-2".to_string(),
        ServerModOverride {
            additional_mods: vec!["333".to_string()],
            exclude_shared_mods: true,
        },
    );

    let servers = generate_servers(&draft);
    assert_eq!(servers[0].mods, vec!["111", "222"]);
    assert_eq!(servers[1].mods, vec!["333"]);
}

#[test]
fn explicit_servers_replace_map_expansion() {
    let mut draft = island_draft(PortAllocationMode::Even);
    draft.servers = vec![
        ServerConfig {
            name: "Hub".to_string(),
            map: "TheIsland".to_string(),
            game_port: 9000,
            query_port: 9001,
            rcon_port: 9002,
            ..ServerConfig::default()
        },
        ServerConfig {
            map: "Ragnarok".to_string(),
            ..ServerConfig::default()
        },
    ];

    let servers = generate_servers(&draft);
    assert_eq!(servers.len(), 2);
    assert_eq!(port_triples(&servers)[0], (9000, 9001, 9002));
    assert_eq!(servers[1].name, "Ragnarok-1");
    assert_eq!(port_triples(&servers)[1], (7783, 7785, 7787));
    assert_eq!(implied_server_count(&draft), 2);
}

#[test]
fn explicit_server_mods_respect_exclusion() {
    let mut draft = island_draft(PortAllocationMode::Sequential);
    draft.global_mods = vec!["111".to_string()];
    draft.server_mods.insert(
        "Hub".to_string(),
        ServerModOverride {
            additional_mods: vec!["333".to_string()],
            exclude_shared_mods: true,
        },
    );
    draft.servers = vec![ServerConfig {
        name: "Hub".to_string(),
        map: "TheIsland".to_string(),
        mods: vec!["444".to_string(), "333".to_string()],
        ..ServerConfig::default()
    }];

    let servers = generate_servers(&draft);
    assert_eq!(servers[0].mods, vec!["333", "444"]);
}
