use crate::routes::AppState;
use cluster_planner::{
    models::{ServerConfig, WizardData, WizardStep},
    plan::SubmittedPlan,
    storage::{save_draft, write_plan},
    validation::step_issues,
    wizard::WizardStore,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub step: WizardStep,
    pub data: WizardData,
    pub servers: Vec<ServerConfig>,
    pub issues: Vec<String>,
}

pub fn snapshot(store: &WizardStore) -> WizardSnapshot {
    WizardSnapshot {
        step: store.step(),
        data: store.data().clone(),
        servers: store.servers(),
        issues: step_issues(store.step(), store.data()),
    }
}

/// Saves the draft; a failed write is logged and does not fail the request.
pub async fn persist_draft(state: &AppState, store: &WizardStore) {
    let path = PathBuf::from(&state.settings.draft_path);
    if let Err(err) = save_draft(&path, store).await {
        warn!(error = %err, "failed to persist draft");
    }
}

#[derive(Debug)]
pub enum SubmitRejection {
    Incomplete(Vec<String>),
    Storage(String),
}

/// Builds the plan, writes it for the provisioning job and moves the store to `creating`.
pub async fn submit_plan(
    state: &AppState,
    store: &mut WizardStore,
) -> Result<SubmittedPlan, SubmitRejection> {
    let issues = step_issues(WizardStep::Review, store.data());
    if !issues.is_empty() {
        return Err(SubmitRejection::Incomplete(issues));
    }

    let plan = store.deployment_plan();
    let mut problems: Vec<String> = plan
        .servers_with_invalid_ports()
        .into_iter()
        .map(|name| format!("{name} has a port outside 1-65535"))
        .collect();
    if !plan.is_conflict_free() {
        problems.push(format!("{} port conflicts remain", plan.conflicts.len()));
    }
    if !problems.is_empty() {
        return Err(SubmitRejection::Incomplete(problems));
    }

    let submitted = SubmittedPlan::new(plan);
    write_plan(&PathBuf::from(&state.settings.plans_dir), &submitted)
        .await
        .map_err(|err| SubmitRejection::Storage(err.to_string()))?;

    state.progress.register(&submitted.job_id).await;
    store.go_to(WizardStep::Creating);
    persist_draft(state, store).await;
    info!(
        job_id = %submitted.job_id,
        servers = submitted.plan.servers.len(),
        "cluster submitted for provisioning"
    );
    Ok(submitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_planner::{
        progress::ProgressHub,
        storage::{load_draft, load_plan, AppSettings},
        wizard::WizardCommand,
    };
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn test_state(dir: &std::path::Path) -> AppState {
        AppState {
            store: Arc::new(Mutex::new(WizardStore::new())),
            settings: AppSettings {
                bind_address: "127.0.0.1:0".to_string(),
                plans_dir: dir.join("plans").to_string_lossy().to_string(),
                draft_path: dir.join("draft.json").to_string_lossy().to_string(),
            },
            progress: ProgressHub::new(),
        }
    }

    fn ready_store() -> WizardStore {
        let mut store = WizardStore::new();
        for command in [
            WizardCommand::SetClusterName {
                name: "Weekend".to_string(),
            },
            WizardCommand::AddMap {
                map: "TheIsland".to_string(),
                display_name: None,
                count: Some(2),
            },
        ] {
            store.dispatch(command).expect("command");
        }
        store.go_to(WizardStep::Review);
        store
    }

    #[tokio::test]
    async fn submit_writes_plan_and_enters_creating() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let state = test_state(dir.path());
        let mut store = ready_store();

        let submitted = submit_plan(&state, &mut store)
            .await
            .map_err(|rejection| format!("{rejection:?}"))?;

        assert_eq!(store.step(), WizardStep::Creating);
        assert!(submitted.job_id.starts_with("job-"));
        assert_eq!(submitted.plan.servers.len(), 2);
        assert!(state.progress.is_known(&submitted.job_id).await);

        let stored = load_plan(&dir.path().join("plans"), &submitted.job_id)
            .await?
            .ok_or("plan not written")?;
        assert_eq!(stored, submitted);

        let draft = load_draft(&dir.path().join("draft.json")).await?;
        assert_eq!(draft.step(), WizardStep::Creating);
        Ok(())
    }

    #[tokio::test]
    async fn submit_rejects_incomplete_drafts() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let state = test_state(dir.path());
        let mut store = WizardStore::new();
        store.go_to(WizardStep::Review);

        match submit_plan(&state, &mut store).await {
            Err(SubmitRejection::Incomplete(issues)) => {
                assert!(issues.contains(&"cluster name is required".to_string()));
                assert!(issues.contains(&"select at least one map".to_string()));
            }
            other => panic!("unexpected submit result: {other:?}"),
        }
        assert_eq!(store.step(), WizardStep::Review);
        assert!(!dir.path().join("plans").exists());
        Ok(())
    }

    #[tokio::test]
    async fn submit_rejects_port_problems() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let state = test_state(dir.path());

        let mut store = ready_store();
        store.dispatch(WizardCommand::UpdateServer {
            index: 1,
            edits: cluster_planner::models::ServerOverride {
                game_port: Some(7777),
                ..Default::default()
            },
        })?;
        assert!(matches!(
            submit_plan(&state, &mut store).await,
            Err(SubmitRejection::Incomplete(_))
        ));

        let mut store = ready_store();
        store.dispatch(WizardCommand::SetBasePort { port: 65535 })?;
        match submit_plan(&state, &mut store).await {
            Err(SubmitRejection::Incomplete(issues)) => {
                assert!(issues.iter().any(|issue| issue.contains("TheIsland-2")));
            }
            other => panic!("unexpected submit result: {other:?}"),
        }
        assert_eq!(store.step(), WizardStep::Review);
        assert!(!dir.path().join("plans").exists());
        Ok(())
    }
}
