use crate::config_gen::{render_artifacts, ServerArtifacts};
use crate::generation::generate_servers;
use crate::models::{ServerConfig, WizardData};
use crate::ports::{find_port_conflicts, is_valid_port, PortConflict};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Draft plus its derived servers, as handed to the provisioning job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPlan {
    pub cluster: WizardData,
    pub servers: Vec<ServerConfig>,
    pub artifacts: Vec<ServerArtifacts>,
    pub conflicts: Vec<PortConflict>,
}

impl DeploymentPlan {
    pub fn is_conflict_free(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Names of servers with a port outside 1-65535.
    pub fn servers_with_invalid_ports(&self) -> Vec<String> {
        self.servers
            .iter()
            .filter(|server| {
                ![server.game_port, server.query_port, server.rcon_port]
                    .into_iter()
                    .all(is_valid_port)
            })
            .map(|server| server.name.clone())
            .collect()
    }
}

pub fn build_plan(data: &WizardData) -> DeploymentPlan {
    let servers = generate_servers(data);
    let artifacts = servers
        .iter()
        .map(|server| render_artifacts(data, server))
        .collect();
    let conflicts = find_port_conflicts(&servers);
    DeploymentPlan {
        cluster: data.clone(),
        servers,
        artifacts,
        conflicts,
    }
}

/// A plan accepted for provisioning under an opaque job id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedPlan {
    pub job_id: String,
    pub submitted_at: String,
    pub plan: DeploymentPlan,
}

impl SubmittedPlan {
    pub fn new(plan: DeploymentPlan) -> Self {
        Self {
            job_id: new_job_id(),
            submitted_at: current_datetime(),
            plan,
        }
    }
}

pub fn new_job_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: u64 = rng.gen();
    format!("job-{suffix:016x}")
}

pub fn current_datetime() -> String {
    let format = match time::format_description::parse(
        "[year]-[month]-[day] [hour]:[minute]:[second]",
    ) {
        Ok(format) => format,
        Err(_) => return "n/a".to_string(),
    };
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&format).unwrap_or_else(|_| "n/a".to_string())
}
