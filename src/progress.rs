use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::catalog::Mission;
use crate::design::RobotDesign;
use crate::ethics::EthicsResult;
use crate::store::{ProgressStore, StorageKey};

const STEP_PERCENT: u32 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionChoice {
    pub id: String,
    pub title: String,
    pub robot_type: String,
}

impl From<&Mission> for MissionChoice {
    fn from(mission: &Mission) -> Self {
        Self {
            id: mission.id.to_string(),
            title: mission.title.to_string(),
            robot_type: mission.robot_type.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub mission: bool,
    pub design: bool,
    pub ethics: bool,
    pub progress: u32,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub user_name: String,
    pub mission: Option<MissionChoice>,
    pub robot_design: Option<RobotDesign>,
    pub ethics_result: Option<EthicsResult>,
    pub progress: ProgressSnapshot,
    pub created_at: DateTime<Utc>,
}

/// One lesson result as sent to the class results sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResult {
    pub name: String,
    pub number: String,
    pub mission_id: String,
    pub score: u32,
    pub summary: String,
}

/// Typed view of one student's saved work.
pub struct ProgressTracker<S> {
    store: S,
}

impl<S: ProgressStore> ProgressTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn load_json<T: DeserializeOwned>(&self, key: StorageKey) -> anyhow::Result<Option<T>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("stored {} is not valid", key.as_str()))?;
        Ok(Some(value))
    }

    async fn save_json<T: Serialize>(&self, key: StorageKey, value: &T) -> anyhow::Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw).await
    }

    pub async fn save_mission(&self, mission: &MissionChoice) -> anyhow::Result<ProgressSnapshot> {
        self.save_json(StorageKey::Mission, mission).await?;
        self.update_progress().await
    }

    pub async fn mission(&self) -> anyhow::Result<Option<MissionChoice>> {
        self.load_json(StorageKey::Mission).await
    }

    pub async fn save_robot_design(&self, design: &RobotDesign) -> anyhow::Result<ProgressSnapshot> {
        self.save_json(StorageKey::RobotDesign, design).await?;
        self.update_progress().await
    }

    pub async fn robot_design(&self) -> anyhow::Result<Option<RobotDesign>> {
        self.load_json(StorageKey::RobotDesign).await
    }

    pub async fn save_ethics_result(&self, result: &EthicsResult) -> anyhow::Result<ProgressSnapshot> {
        self.save_json(StorageKey::EthicsResult, result).await?;
        self.update_progress().await
    }

    pub async fn ethics_result(&self) -> anyhow::Result<Option<EthicsResult>> {
        self.load_json(StorageKey::EthicsResult).await
    }

    /// Saving a name replaces any name left under the older key.
    pub async fn save_user_name(&self, name: &str) -> anyhow::Result<()> {
        self.store.remove(StorageKey::StudentName).await?;
        self.store.set(StorageKey::UserName, name).await
    }

    pub async fn user_name(&self) -> anyhow::Result<String> {
        for key in [StorageKey::StudentName, StorageKey::UserName] {
            if let Some(name) = self.store.get(key).await? {
                if !name.is_empty() {
                    return Ok(name);
                }
            }
        }
        Ok(String::new())
    }

    pub async fn save_student_number(&self, number: &str) -> anyhow::Result<()> {
        self.store.set(StorageKey::StudentNumber, number).await
    }

    pub async fn student_number(&self) -> anyhow::Result<String> {
        Ok(self
            .store
            .get(StorageKey::StudentNumber)
            .await?
            .unwrap_or_default())
    }

    pub async fn activity_results(&self) -> anyhow::Result<Vec<ActivityResult>> {
        Ok(self
            .load_json(StorageKey::ActivityResults)
            .await?
            .unwrap_or_default())
    }

    /// Appends to the local history of lesson submissions.
    pub async fn record_activity_result(
        &self,
        result: ActivityResult,
    ) -> anyhow::Result<Vec<ActivityResult>> {
        let mut history = self.activity_results().await?;
        history.push(result);
        self.save_json(StorageKey::ActivityResults, &history).await?;
        tracing::debug!(entries = history.len(), "activity result recorded");
        Ok(history)
    }

    async fn completed_steps(&self) -> anyhow::Result<(bool, bool, bool)> {
        Ok((
            self.store.get(StorageKey::Mission).await?.is_some(),
            self.store.get(StorageKey::RobotDesign).await?.is_some(),
            self.store.get(StorageKey::EthicsResult).await?.is_some(),
        ))
    }

    pub async fn update_progress(&self) -> anyhow::Result<ProgressSnapshot> {
        let (mission, design, ethics) = self.completed_steps().await?;
        let snapshot = ProgressSnapshot {
            mission,
            design,
            ethics,
            progress: progress_percent(mission, design, ethics),
            last_updated: Utc::now(),
        };
        self.save_json(StorageKey::Progress, &snapshot).await?;
        tracing::debug!(progress = snapshot.progress, "progress updated");
        Ok(snapshot)
    }

    pub async fn progress(&self) -> anyhow::Result<ProgressSnapshot> {
        match self.load_json(StorageKey::Progress).await? {
            Some(snapshot) => Ok(snapshot),
            None => self.update_progress().await,
        }
    }

    pub async fn clear_all(&self) -> anyhow::Result<()> {
        for key in StorageKey::ALL {
            self.store.remove(key).await?;
        }
        Ok(())
    }

    pub async fn portfolio(&self) -> anyhow::Result<Portfolio> {
        Ok(Portfolio {
            user_name: self.user_name().await?,
            mission: self.mission().await?,
            robot_design: self.robot_design().await?,
            ethics_result: self.ethics_result().await?,
            progress: self.progress().await?,
            created_at: Utc::now(),
        })
    }
}

/// A saved design also counts as the blueprint step.
fn progress_percent(mission: bool, design: bool, ethics: bool) -> u32 {
    let blueprint = design;
    [mission, design, ethics, blueprint]
        .into_iter()
        .filter(|done| *done)
        .count() as u32
        * STEP_PERCENT
}
