use crate::error::StorageError;
use crate::models::{WizardData, WizardStep};
use crate::plan::SubmittedPlan;
use crate::wizard::WizardStore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

const BIND_ENV: &str = "CLUSTER_PLANNER_BIND";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub bind_address: String,
    pub plans_dir: String,
    pub draft_path: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        let base = base_dir();
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            plans_dir: base.join("plans").to_string_lossy().to_string(),
            draft_path: base.join("draft.json").to_string_lossy().to_string(),
        }
    }
}

impl AppSettings {
    pub fn validate(&self) -> Result<(), StorageError> {
        for (field, value) in [
            ("bind_address", &self.bind_address),
            ("plans_dir", &self.plans_dir),
            ("draft_path", &self.draft_path),
        ] {
            if value.trim().is_empty() {
                return Err(StorageError::Invalid(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    /// Applies environment overrides on top of the stored values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(bind) = std::env::var(BIND_ENV) {
            if !bind.trim().is_empty() {
                self.bind_address = bind.trim().to_string();
            }
        }
        self
    }
}

pub fn base_dir() -> PathBuf {
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata).join("cluster-planner");
    }
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("cluster-planner");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join("cluster-planner");
    }
    PathBuf::from("cluster-planner-data")
}

pub fn settings_path() -> PathBuf {
    base_dir().join("settings.json")
}

pub async fn load_settings(path: &Path) -> Result<AppSettings, StorageError> {
    Ok(read_json(path, "settings").await?.unwrap_or_default())
}

pub async fn save_settings(path: &Path, settings: &AppSettings) -> Result<(), StorageError> {
    write_json_atomic(path, settings, "settings").await
}

/// Persisted form of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub step: WizardStep,
    pub data: WizardData,
}

impl DraftSnapshot {
    pub fn of(store: &WizardStore) -> Self {
        Self {
            step: store.step(),
            data: store.data().clone(),
        }
    }

    pub fn into_store(self) -> WizardStore {
        WizardStore::from_parts(self.step, self.data)
    }
}

pub async fn load_draft(path: &Path) -> Result<WizardStore, StorageError> {
    let snapshot: Option<DraftSnapshot> = read_json(path, "draft").await?;
    Ok(snapshot
        .map(DraftSnapshot::into_store)
        .unwrap_or_default())
}

pub async fn save_draft(path: &Path, store: &WizardStore) -> Result<(), StorageError> {
    write_json_atomic(path, &DraftSnapshot::of(store), "draft").await
}

pub fn plan_path(plans_dir: &Path, job_id: &str) -> PathBuf {
    plans_dir.join(format!("{job_id}.json"))
}

pub async fn write_plan(plans_dir: &Path, submitted: &SubmittedPlan) -> Result<PathBuf, StorageError> {
    let path = plan_path(plans_dir, &submitted.job_id);
    write_json_atomic(&path, submitted, "plan").await?;
    info!(
        job_id = %submitted.job_id,
        servers = submitted.plan.servers.len(),
        path = %path.display(),
        "deployment plan written"
    );
    Ok(path)
}

pub async fn load_plan(plans_dir: &Path, job_id: &str) -> Result<Option<SubmittedPlan>, StorageError> {
    read_json(&plan_path(plans_dir, job_id), "plan").await
}

async fn read_json<T: DeserializeOwned>(
    path: &Path,
    what: &'static str,
) -> Result<Option<T>, StorageError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => serde_json::from_str(&contents)
            .map(Some)
            .map_err(|err| StorageError::Parse {
                what,
                message: err.to_string(),
            }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(StorageError::Io(format!("failed to read {what}: {err}"))),
    }
}

async fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
    what: &'static str,
) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| StorageError::Io(format!("failed to create {what} dir: {err}")))?;
    }

    let data = serde_json::to_string_pretty(value).map_err(|err| StorageError::Serialize {
        what,
        message: err.to_string(),
    })?;

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, data)
        .await
        .map_err(|err| StorageError::Io(format!("failed to write temp {what}: {err}")))?;

    if tokio::fs::metadata(path).await.is_ok() {
        tokio::fs::remove_file(path)
            .await
            .map_err(|err| StorageError::Io(format!("failed to remove old {what}: {err}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|err| StorageError::Io(format!("failed to move {what} into place: {err}")))
}
