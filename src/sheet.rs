use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::Url;

use crate::models::{DashboardStats, Roster};
use crate::stats;

/// Where the results export comes from.
#[allow(async_fn_in_trait)]
pub trait SheetSource {
    async fn fetch_csv(&self) -> anyhow::Result<String>;
}

pub struct HttpSheet {
    client: reqwest::Client,
    url: Url,
}

impl HttpSheet {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid sheet URL {url:?}"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            url,
        })
    }
}

/// Appends `t=<unix millis>` so caches never serve a stale export.
pub fn cache_busted(url: &Url, now: DateTime<Utc>) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut()
        .append_pair("t", &now.timestamp_millis().to_string());
    url
}

impl SheetSource for HttpSheet {
    async fn fetch_csv(&self) -> anyhow::Result<String> {
        let url = cache_busted(&self.url, Utc::now());
        tracing::info!(%url, "fetching results sheet");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("results sheet request failed")?
            .error_for_status()
            .context("results sheet returned an error status")?;
        response
            .text()
            .await
            .context("failed to read results sheet body")
    }
}

pub struct FileSheet {
    pub path: PathBuf,
}

impl SheetSource for FileSheet {
    async fn fetch_csv(&self) -> anyhow::Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardLoad {
    pub state: LoadState,
    pub error: Option<String>,
    pub stats: DashboardStats,
}

impl DashboardLoad {
    pub fn loading(roster: &Roster) -> Self {
        Self {
            state: LoadState::Loading,
            error: None,
            stats: DashboardStats::empty(roster),
        }
    }

    fn finish(self, outcome: anyhow::Result<DashboardStats>, roster: &Roster) -> Self {
        match outcome {
            Ok(stats) => Self {
                state: LoadState::Ready,
                error: None,
                stats,
            },
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "dashboard load failed");
                Self {
                    state: LoadState::Failed,
                    error: Some(format!("{err:#}")),
                    stats: DashboardStats::empty(roster),
                }
            }
        }
    }
}

/// Fetches and aggregates once. Failures never escape: they come back as
/// `LoadState::Failed` with empty statistics.
pub async fn load_dashboard(source: &impl SheetSource, roster: &Roster) -> DashboardLoad {
    let load = DashboardLoad::loading(roster);
    let outcome = match source.fetch_csv().await {
        Ok(text) => stats::aggregate_csv(&text, roster),
        Err(err) => Err(err),
    };
    load.finish(outcome, roster)
}
