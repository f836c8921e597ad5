use cluster_planner::error::ModError;
use cluster_planner::models::ServerModOverride;
use cluster_planner::mods::{
    add_mod, extract_mod_id_from_url, parse_mod_id_input, parse_mod_ids, remove_mod, resolve,
    validate_mod_id,
};
use proptest::prelude::*;

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn extras(additional: &[&str], exclude_shared_mods: bool) -> ServerModOverride {
    ServerModOverride {
        additional_mods: ids(additional),
        exclude_shared_mods,
    }
}

#[test]
fn shared_mods_come_first_without_duplicates() {
    let global = ids(&["111", "222"]);
    let resolved = resolve(&global, Some(&extras(&["333", "111"], false)));
    assert_eq!(resolved, ids(&["111", "222", "333"]));
}

#[test]
fn excluding_shared_mods_keeps_only_server_mods() {
    let global = ids(&["111", "222"]);
    let resolved = resolve(&global, Some(&extras(&["333"], true)));
    assert_eq!(resolved, ids(&["333"]));
}

#[test]
fn missing_override_uses_shared_mods() {
    let global = ids(&["111", "222", "111"]);
    assert_eq!(resolve(&global, None), ids(&["111", "222"]));
}

#[test]
fn add_is_idempotent() {
    let mut mods = ids(&["111"]);
    assert_eq!(add_mod(&mut mods, "222"), Ok(true));
    assert_eq!(add_mod(&mut mods, " 222 "), Ok(false));
    assert_eq!(mods, ids(&["111", "222"]));
}

#[test]
fn malformed_ids_are_rejected_without_mutation() {
    let mut mods = ids(&["111"]);
    assert_eq!(
        add_mod(&mut mods, "12a"),
        Err(ModError::InvalidId("12a".to_string()))
    );
    assert!(add_mod(&mut mods, "").is_err());
    assert!(add_mod(&mut mods, "-5").is_err());
    assert_eq!(mods, ids(&["111"]));
}

#[test]
fn validate_trims_whitespace() {
    assert_eq!(validate_mod_id("  928102 "), Ok("928102".to_string()));
}

#[test]
fn remove_reports_change() {
    let mut mods = ids(&["111", "222"]);
    assert!(remove_mod(&mut mods, "111"));
    assert!(!remove_mod(&mut mods, "999"));
    assert_eq!(mods, ids(&["222"]));
}

#[test]
fn extracts_mod_id_from_urls() {
    assert_eq!(
        extract_mod_id_from_url("https://steamcommunity.com/sharedfiles/filedetails/?id=731604991"),
        Some("731604991".to_string())
    );
    assert_eq!(
        extract_mod_id_from_url("https://www.curseforge.com/projects/928102"),
        Some("928102".to_string())
    );
    assert_eq!(
        extract_mod_id_from_url("https://www.curseforge.com/ark-survival-ascended/mods/structures-plus"),
        None
    );
}

#[test]
fn parses_mod_id_input() {
    assert_eq!(parse_mod_id_input(" 928102 "), Some("928102".to_string()));
    assert_eq!(parse_mod_id_input("abc"), None);
}

#[test]
fn bulk_input_is_all_or_nothing() {
    assert_eq!(
        parse_mod_ids("111, 222\n333,111\n\n"),
        Ok(ids(&["111", "222", "333"]))
    );
    assert_eq!(
        parse_mod_ids("111, nope"),
        Err(ModError::InvalidId("nope".to_string()))
    );
}

fn mod_id() -> impl Strategy<Value = String> {
    (1u32..500).prop_map(|value| value.to_string())
}

proptest! {
    #[test]
    fn shared_resolution_keeps_every_mod_once(
        global in proptest::collection::vec(mod_id(), 0..12),
        extra in mod_id(),
    ) {
        let server = ServerModOverride { additional_mods: vec![extra.clone()], exclude_shared_mods: false };
        let resolved = resolve(&global, Some(&server));

        for id in global.iter().chain(std::iter::once(&extra)) {
            prop_assert_eq!(resolved.iter().filter(|candidate| *candidate == id).count(), 1);
        }

        let mut expected_prefix = Vec::new();
        for id in &global {
            if !expected_prefix.contains(id) {
                expected_prefix.push(id.clone());
            }
        }
        prop_assert_eq!(&resolved[..expected_prefix.len()], &expected_prefix[..]);
    }

    #[test]
    fn exclusive_resolution_ignores_shared_mods(
        global in proptest::collection::vec(mod_id(), 0..12),
        extra in mod_id(),
    ) {
        let server = ServerModOverride { additional_mods: vec![extra.clone()], exclude_shared_mods: true };
        prop_assert_eq!(resolve(&global, Some(&server)), vec![extra]);
    }
}
