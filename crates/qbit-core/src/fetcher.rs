//! Torrent snapshot fetching.

use async_trait::async_trait;
use qbit_models::{QbitTorrent, TorrentRecord};
use tracing::{debug, error};

use crate::error::FetchResult;

/// Source of raw torrent jobs, implemented by the qBittorrent client.
#[async_trait]
pub trait TorrentSource: Send + Sync {
    /// List all current jobs.
    async fn list_jobs(&self) -> FetchResult<Vec<QbitTorrent>>;
}

/// Turns the torrent client's job list into display records.
///
/// A failed fetch is logged and reported as an empty snapshot, so callers
/// see "nothing downloading" rather than an error.
pub struct SnapshotFetcher<S> {
    source: S,
}

impl<S: TorrentSource> SnapshotFetcher<S> {
    /// Creates a fetcher over the given source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and normalize the current torrent list.
    pub async fn fetch(&self) -> Vec<TorrentRecord> {
        match self.source.list_jobs().await {
            Ok(jobs) => {
                debug!(count = jobs.len(), "Snapshot fetched");
                jobs.into_iter().map(TorrentRecord::from).collect()
            }
            Err(e) => {
                error!(error = %e, "Error getting torrent list");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use qbit_models::{Eta, LogicalState};

    struct StaticSource(Vec<QbitTorrent>);

    #[async_trait]
    impl TorrentSource for StaticSource {
        async fn list_jobs(&self) -> FetchResult<Vec<QbitTorrent>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl TorrentSource for FailingSource {
        async fn list_jobs(&self) -> FetchResult<Vec<QbitTorrent>> {
            Err(FetchError::Http("connection refused".to_string()))
        }
    }

    fn job(name: &str, state: &str, eta: i64) -> QbitTorrent {
        QbitTorrent {
            name: name.to_string(),
            category: "radarr".to_string(),
            progress: 0.5,
            state: state.to_string(),
            eta,
            size: 2048,
            dlspeed: 512,
        }
    }

    #[tokio::test]
    async fn test_fetch_normalizes_jobs() {
        let fetcher = SnapshotFetcher::new(StaticSource(vec![
            job("a", "stalledUP", 0),
            job("b", "metaDL", 8_640_000),
            job("c", "weird", 30),
        ]));

        let records = fetcher.fetch().await;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].state, LogicalState::Completed);
        assert_eq!(records[1].state, LogicalState::Starting);
        assert_eq!(records[1].eta, Eta::Infinite);
        assert_eq!(records[2].state, LogicalState::Unknown);
        assert_eq!(records[2].progress, 50.0);
    }

    #[tokio::test]
    async fn test_fetch_error_yields_empty_snapshot() {
        let fetcher = SnapshotFetcher::new(FailingSource);
        assert!(fetcher.fetch().await.is_empty());
    }
}
