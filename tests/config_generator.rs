use cluster_planner::config_gen::{
    baseline_game_user_settings, cluster_id, launch_arguments, render_artifacts,
    render_game_user_settings,
};
use cluster_planner::models::{SelectedMap, ServerConfig, SettingValue, WizardData};

fn sample_server() -> ServerConfig {
    ServerConfig {
        name: "TheIsland-1".to_string(),
        map: "TheIsland".to_string(),
        game_port: 7779,
        query_port: 27016,
        rcon_port: 32331,
        max_players: 40,
        admin_password: "adminpw".to_string(),
        server_password: String::new(),
        session_name: "Island One".to_string(),
        mods: vec!["928102".to_string(), "731604991".to_string()],
    }
}

fn ini_value<'a>(ini: &'a str, section: &str, key: &str) -> Option<&'a str> {
    let mut current = "";
    for line in ini.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            current = name;
            continue;
        }
        if current == section {
            if let Some((k, v)) = line.split_once('=') {
                if k == key {
                    return Some(v);
                }
            }
        }
    }
    None
}

#[test]
fn session_values_overwrite_baseline() {
    let data = WizardData::default();
    let ini = render_game_user_settings(&data, &sample_server());

    assert_eq!(ini_value(&ini, "SessionSettings", "SessionName"), Some("Island One"));
    assert_eq!(ini_value(&ini, "SessionSettings", "Port"), Some("7779"));
    assert_eq!(ini_value(&ini, "SessionSettings", "QueryPort"), Some("27016"));
    assert_eq!(ini_value(&ini, "/Script/Engine.GameSession", "MaxPlayers"), Some("40"));
    assert_eq!(ini_value(&ini, "ServerSettings", "RCONPort"), Some("32331"));
    assert_eq!(ini_value(&ini, "ServerSettings", "ServerAdminPassword"), Some("adminpw"));
    assert_eq!(ini_value(&ini, "MessageOfTheDay", "Duration"), Some("20"));
    assert!(baseline_game_user_settings().contains("SessionName=ARK Server"));
    assert!(!ini.contains("ARK Server"));
}

#[test]
fn game_settings_are_rendered_in_server_settings() {
    let mut data = WizardData::default();
    data.game_settings
        .set("xpMultiplier", SettingValue::Number(2.5))
        .expect("xp");
    data.game_settings
        .set("serverPVE", SettingValue::Bool(true))
        .expect("pve");
    let ini = render_game_user_settings(&data, &sample_server());

    assert_eq!(ini_value(&ini, "ServerSettings", "XPMultiplier"), Some("2.5"));
    assert_eq!(ini_value(&ini, "ServerSettings", "ServerPVE"), Some("True"));
    assert_eq!(ini_value(&ini, "ServerSettings", "MaxTamedDinos"), Some("5000"));
    assert_eq!(ini_value(&ini, "ServerSettings", "DifficultyOffset"), Some("1"));
    assert_eq!(ini_value(&ini, "ServerSettings", "CustomDynamicConfigUrl"), None);
}

#[test]
fn operator_ini_is_layered_between_baseline_and_settings() {
    let mut data = WizardData::default();
    data.game_user_settings_ini = "[ServerSettings]\nServerCrosshair=False\nXPMultiplier=9\n\n[MessageOfTheDay]\nMessage=Welcome\n".to_string();
    data.custom_dynamic_config_url = "http://example.invalid/dyn.ini".to_string();
    let ini = render_game_user_settings(&data, &sample_server());

    assert_eq!(ini_value(&ini, "ServerSettings", "ServerCrosshair"), Some("False"));
    assert_eq!(ini_value(&ini, "ServerSettings", "XPMultiplier"), Some("1"));
    assert_eq!(ini_value(&ini, "MessageOfTheDay", "Message"), Some("Welcome"));
    assert_eq!(ini_value(&ini, "MessageOfTheDay", "Duration"), Some("20"));
    assert_eq!(
        ini_value(&ini, "ServerSettings", "CustomDynamicConfigUrl"),
        Some("\"http://example.invalid/dyn.ini\"")
    );
    assert_eq!(ini.matches("[ServerSettings]").count(), 1);
}

#[test]
fn launch_arguments_carry_ports_and_mods() {
    let mut data = WizardData::default();
    data.cluster_name = "My Tribe's Cluster!".to_string();
    data.cluster_password = "transfer".to_string();
    let args = launch_arguments(&data, &sample_server());

    assert!(args.starts_with(
        "TheIsland?listen?SessionName=Island One?Port=7779?QueryPort=27016?RCONEnabled=True?RCONPort=32331?MaxPlayers=40?ServerAdminPassword=adminpw "
    ));
    assert!(!args.contains("ServerPassword="));
    assert!(args.contains(" -clusterid=my-tribe-s-cluster "));
    assert!(args.contains(" -clusterpassword=transfer "));
    assert!(args.contains(" -mods=928102,731604991 "));
    assert!(args.ends_with("-NoTransferFromFiltering -log"));
}

#[test]
fn launch_arguments_skip_empty_mods() {
    let data = WizardData::default();
    let mut server = sample_server();
    server.mods.clear();
    let args = launch_arguments(&data, &server);
    assert!(!args.contains("-mods="));
    assert!(!args.contains("-clusterpassword="));
    assert!(args.contains("-clusterid=cluster"));
}

#[test]
fn cluster_ids_are_slugs() {
    assert_eq!(cluster_id("PvE Weekend"), "pve-weekend");
    assert_eq!(cluster_id("  --Ark__Cluster--  "), "ark-cluster");
    assert_eq!(cluster_id("!!!"), "cluster");
    assert_eq!(cluster_id(""), "cluster");
}

#[test]
fn artifacts_bundle_every_file() {
    let mut data = WizardData::default();
    data.selected_maps.push(SelectedMap::new("TheIsland", 1));
    data.game_ini = "[/script/shootergame.shootergamemode]\nbUseCorpseLocator=true\n".to_string();
    let server = sample_server();
    let artifacts = render_artifacts(&data, &server);

    assert_eq!(artifacts.server, "TheIsland-1");
    assert_eq!(artifacts.game_ini, data.game_ini);
    assert_eq!(artifacts.launch_arguments, launch_arguments(&data, &server));
    assert_eq!(
        artifacts.game_user_settings_ini,
        render_game_user_settings(&data, &server)
    );
}

#[test]
fn headerless_operator_keys_belong_to_server_settings() {
    let mut data = WizardData::default();
    data.game_user_settings_ini = "ServerCrosshair=False\nKickIdlePlayersPeriod=3600\n\n[MessageOfTheDay]\nMessage=Hi\n".to_string();
    let ini = render_game_user_settings(&data, &sample_server());

    assert_eq!(ini_value(&ini, "ServerSettings", "ServerCrosshair"), Some("False"));
    assert_eq!(ini_value(&ini, "ServerSettings", "KickIdlePlayersPeriod"), Some("3600"));
    assert_eq!(ini_value(&ini, "MessageOfTheDay", "ServerCrosshair"), None);
    assert_eq!(ini_value(&ini, "MessageOfTheDay", "Message"), Some("Hi"));
    assert!(ini.starts_with("[ServerSettings]\n"));
}
