//! Checks the HTTP surface runs before moving forward from a step. The store
//! itself accepts every transition.

use crate::generation::{generate_servers, implied_server_count};
use crate::models::{WizardData, WizardStep};
use crate::ports::{find_port_conflicts, is_valid_port};
use std::collections::HashSet;

/// Problems that block leaving `step` forward. Empty means the step is complete.
pub fn step_issues(step: WizardStep, data: &WizardData) -> Vec<String> {
    match step {
        WizardStep::Welcome | WizardStep::GameSettings | WizardStep::Mods => Vec::new(),
        WizardStep::ClusterBasic => cluster_issues(data),
        WizardStep::MapSelection => map_issues(data),
        WizardStep::ServerConfig | WizardStep::IndividualServers => server_issues(data),
        WizardStep::Review => {
            let mut issues = cluster_issues(data);
            issues.extend(map_issues(data));
            issues.extend(server_issues(data));
            issues
        }
        WizardStep::Creating => vec!["cluster creation already submitted".to_string()],
    }
}

fn cluster_issues(data: &WizardData) -> Vec<String> {
    let mut issues = Vec::new();
    if data.cluster_name.trim().is_empty() {
        issues.push("cluster name is required".to_string());
    }
    if !is_valid_port(data.base_port) {
        issues.push(format!("base port {} is outside 1-65535", data.base_port));
    }
    if data.server_count == 0 {
        issues.push("server count must be at least 1".to_string());
    }
    issues
}

fn map_issues(data: &WizardData) -> Vec<String> {
    if implied_server_count(data) == 0 {
        vec!["select at least one map".to_string()]
    } else {
        Vec::new()
    }
}

fn server_issues(data: &WizardData) -> Vec<String> {
    let servers = generate_servers(data);
    let mut issues = Vec::new();
    let mut names = HashSet::new();

    for server in &servers {
        if !names.insert(server.name.as_str()) {
            issues.push(format!("server name {} is used more than once", server.name));
        }
        for (label, port) in [
            ("game", server.game_port),
            ("query", server.query_port),
            ("rcon", server.rcon_port),
        ] {
            if !is_valid_port(port) {
                issues.push(format!(
                    "{} {label} port {port} is outside 1-65535",
                    server.name
                ));
            }
        }
    }

    for conflict in find_port_conflicts(&servers) {
        let users = conflict
            .users
            .iter()
            .map(|user| format!("{} ({})", user.server, user.family))
            .collect::<Vec<_>>()
            .join(", ");
        issues.push(format!("port {} is claimed by {users}", conflict.port));
    }

    issues
}

/// Step reached by moving forward from `step`. `creating` is only entered by
/// submitting, never by stepping.
pub fn next_step(step: WizardStep, data: &WizardData) -> Result<WizardStep, Vec<String>> {
    let issues = step_issues(step, data);
    if !issues.is_empty() {
        return Err(issues);
    }
    match step.next() {
        None => Err(vec![format!("{step} is the last step")]),
        Some(WizardStep::Creating) => {
            Err(vec!["submit the cluster to start creating it".to_string()])
        }
        Some(next) => Ok(next),
    }
}
