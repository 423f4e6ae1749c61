use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Mission,
    RobotDesign,
    EthicsResult,
    UserName,
    StudentNumber,
    Progress,
    /// Name written by older clients; read before `UserName`.
    StudentName,
    ActivityResults,
}

impl StorageKey {
    pub const ALL: [StorageKey; 8] = [
        StorageKey::Mission,
        StorageKey::RobotDesign,
        StorageKey::EthicsResult,
        StorageKey::UserName,
        StorageKey::StudentNumber,
        StorageKey::Progress,
        StorageKey::StudentName,
        StorageKey::ActivityResults,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Mission => "selectedMission",
            StorageKey::RobotDesign => "robotDesign",
            StorageKey::EthicsResult => "ethicsResult",
            StorageKey::UserName => "userName",
            StorageKey::StudentNumber => "studentNumber",
            StorageKey::Progress => "learningProgress",
            StorageKey::StudentName => "studentName",
            StorageKey::ActivityResults => "robotResults",
        }
    }
}

/// String key-value persistence for a single student's progress.
/// Writes are last-write-wins.
#[allow(async_fn_in_trait)]
pub trait ProgressStore {
    async fn get(&self, key: StorageKey) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: StorageKey, value: &str) -> anyhow::Result<()>;
    async fn remove(&self, key: StorageKey) -> anyhow::Result<()>;
}

/// Process-local store for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: std::sync::Mutex<std::collections::HashMap<StorageKey, String>>,
}

#[cfg(test)]
impl MemoryStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, std::collections::HashMap<StorageKey, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
impl ProgressStore for MemoryStore {
    async fn get(&self, key: StorageKey) -> anyhow::Result<Option<String>> {
        Ok(self.entries().get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: &str) -> anyhow::Result<()> {
        self.entries().insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> anyhow::Result<()> {
        self.entries().remove(&key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect_with(options)
            .await
            .with_context(|| format!("failed to open progress store {}", path.display()))
    }

    #[cfg(test)]
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = <SqliteConnectOptions as std::str::FromStr>::from_str("sqlite::memory:")?;
        Self::connect_with(options).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> anyhow::Result<Self> {
        // One connection: an in-memory database lives only as long as it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

impl ProgressStore for SqliteStore {
    async fn get(&self, key: StorageKey) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM progress_entries WHERE key = ?1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read {}", key.as_str()))?;
        Ok(row.map(|row| row.get::<String, _>("value")))
    }

    async fn set(&self, key: StorageKey, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO progress_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE
            SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key.as_str())
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write {}", key.as_str()))?;
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM progress_entries WHERE key = ?1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove {}", key.as_str()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise(store: &impl ProgressStore) {
        assert_eq!(store.get(StorageKey::UserName).await.unwrap(), None);

        store.set(StorageKey::UserName, "민준").await.unwrap();
        store.set(StorageKey::UserName, "서연").await.unwrap();
        assert_eq!(
            store.get(StorageKey::UserName).await.unwrap().as_deref(),
            Some("서연")
        );

        store.remove(StorageKey::UserName).await.unwrap();
        store.remove(StorageKey::UserName).await.unwrap();
        assert_eq!(store.get(StorageKey::UserName).await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_is_last_write_wins() {
        exercise(&MemoryStore::default()).await;
    }

    #[tokio::test]
    async fn sqlite_store_is_last_write_wins() {
        exercise(&SqliteStore::in_memory().await.unwrap()).await;
    }

    #[tokio::test]
    async fn sqlite_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.db");

        let store = SqliteStore::open(&path).await.unwrap();
        store.set(StorageKey::StudentNumber, "12").await.unwrap();
        store.pool.close().await;

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get(StorageKey::StudentNumber).await.unwrap().as_deref(),
            Some("12")
        );
    }

    #[test]
    fn keys_keep_browser_names() {
        let names: Vec<_> = StorageKey::ALL.iter().map(|key| key.as_str()).collect();
        assert_eq!(
            names,
            [
                "selectedMission",
                "robotDesign",
                "ethicsResult",
                "userName",
                "studentNumber",
                "learningProgress",
                "studentName",
                "robotResults"
            ]
        );
    }
}
