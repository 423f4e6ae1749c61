use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::models::Roster;

pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/1haRcmsXtyZucVhO8ypSuRR3E5UkPCkm8aYQc0LzW1sw/export?format=csv&gid=0";
pub const DEFAULT_FORM_URL: &str = "https://docs.google.com/forms/d/e/1FAIpQLScyoX2Y0oLjkouCDuxv9ecqfp0c0rb0h3aIvRZt3HKsmXp6eQ/formResponse";

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Published CSV export of the results sheet
    #[arg(long, env = "ROBOT_MISSION_SHEET_URL", default_value = DEFAULT_SHEET_URL, global = true)]
    pub sheet_url: String,

    /// Form endpoint that appends rows to the results sheet
    #[arg(long, env = "ROBOT_MISSION_FORM_URL", default_value = DEFAULT_FORM_URL, global = true)]
    pub form_url: String,

    /// Students in the class roster
    #[arg(long, env = "ROBOT_MISSION_TOTAL_STUDENTS", default_value_t = 25, global = true)]
    pub total_students: u32,

    /// Activities each student is expected to submit
    #[arg(long, env = "ROBOT_MISSION_TOTAL_ACTIVITIES", default_value_t = 3, global = true)]
    pub total_activities: u32,

    /// Progress database file
    #[arg(long, env = "ROBOT_MISSION_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "ROBOT_MISSION_LOG_JSON", global = true)]
    pub log_json: bool,
}

impl Settings {
    pub fn roster(&self) -> Roster {
        Roster {
            total_students: self.total_students,
            total_activities: self.total_activities,
        }
    }

    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.store {
            return Ok(path.clone());
        }
        let base = dirs::data_dir().context("cannot locate a data directory; pass --store")?;
        Ok(base.join("eco-robot-mission").join("progress.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        settings: Settings,
    }

    #[test]
    fn defaults_match_the_classroom() {
        let harness = Harness::try_parse_from(["robot-mission"]).unwrap();
        assert_eq!(harness.settings.roster(), Roster::default());
        assert_eq!(harness.settings.sheet_url, DEFAULT_SHEET_URL);
        assert!(!harness.settings.log_json);
    }

    #[test]
    fn explicit_store_wins() {
        let harness = Harness::try_parse_from([
            "robot-mission",
            "--store",
            "/tmp/progress.db",
            "--total-students",
            "30",
        ])
        .unwrap();
        assert_eq!(
            harness.settings.store_path().unwrap(),
            PathBuf::from("/tmp/progress.db")
        );
        assert_eq!(harness.settings.roster().total_students, 30);
    }
}
