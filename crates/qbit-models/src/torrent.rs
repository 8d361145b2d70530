//! Torrent types for qbit-status.
//!
//! [`QbitTorrent`] is the raw job record returned by the qBittorrent Web API.
//! [`TorrentRecord`] is the normalized view built from it on every refresh.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// qBittorrent reports this ETA when the remaining time is unknown.
pub const INFINITE_ETA_SECS: i64 = 8_640_000;

/// A job as returned by `GET /api/v2/torrents/info`.
///
/// Only the fields the status report needs are kept; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QbitTorrent {
    /// Torrent name.
    #[serde(default)]
    pub name: String,

    /// Category assigned in the client (may be empty).
    #[serde(default)]
    pub category: String,

    /// Fractional progress in `0.0..=1.0`.
    #[serde(default)]
    pub progress: f64,

    /// Client-specific state code (e.g. `downloading`, `stalledUP`).
    #[serde(default)]
    pub state: String,

    /// Remaining seconds, or [`INFINITE_ETA_SECS`].
    #[serde(default)]
    pub eta: i64,

    /// Total size in bytes.
    #[serde(default)]
    pub size: i64,

    /// Download rate in bytes per second.
    #[serde(default)]
    pub dlspeed: i64,
}

/// Normalized torrent status used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicalState {
    /// Fully downloaded (seeding, checking or paused after completion).
    Completed,
    /// Actively downloading.
    Downloading,
    /// Data files are missing on disk.
    FilesMissing,
    /// Downloading but no peers are sending data.
    Stalled,
    /// Fetching metadata or checking before the download starts.
    Starting,
    /// Waiting in the download queue.
    Queued,
    /// Paused before completion.
    Paused,
    /// Any state code not known to this bot.
    #[default]
    Unknown,
}

impl LogicalState {
    /// Maps a qBittorrent state code onto a logical state.
    pub fn from_qbit(code: &str) -> Self {
        match code {
            "uploading" | "pausedUP" | "stoppedUP" | "checkingUP" | "stalledUP" | "forcedUP"
            | "queuedUP" => Self::Completed,
            "downloading" | "forcedDL" => Self::Downloading,
            "missingFiles" => Self::FilesMissing,
            "stalledDL" => Self::Stalled,
            "metaDL" | "forcedMetaDL" | "checkingDL" => Self::Starting,
            "queuedDL" => Self::Queued,
            "pausedDL" | "stoppedDL" => Self::Paused,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label shown in the status report.
    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Downloading => "Downloading",
            Self::FilesMissing => "Files missing",
            Self::Stalled => "Stalled",
            Self::Starting => "Attempting to start",
            Self::Queued => "Queued",
            Self::Paused => "Paused",
            Self::Unknown => "Unknown status",
        }
    }

    /// Whether the torrent has finished downloading.
    pub fn is_complete(self) -> bool {
        self == Self::Completed
    }
}

impl fmt::Display for LogicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Estimated time remaining for a torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    /// The client cannot estimate the remaining time.
    Infinite,
    /// Nothing left to download.
    Done,
    /// Seconds left until completion.
    Remaining(u64),
}

impl Eta {
    /// Interprets a raw qBittorrent ETA value.
    pub fn from_qbit(seconds: i64) -> Self {
        if seconds == INFINITE_ETA_SECS {
            Self::Infinite
        } else if seconds <= 0 {
            Self::Done
        } else {
            Self::Remaining(seconds as u64)
        }
    }
}

/// A torrent prepared for display, rebuilt on every refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct TorrentRecord {
    /// Torrent name.
    pub name: String,
    /// Client category.
    pub category: String,
    /// Progress in percent, rounded to two decimals.
    pub progress: f64,
    /// Normalized state.
    pub state: LogicalState,
    /// Estimated time remaining.
    pub eta: Eta,
    /// Total size in bytes.
    pub size: u64,
    /// Download speed in bytes per second.
    pub download_speed: u64,
}

impl TorrentRecord {
    /// Creates a record with zeroed size and speed (mainly for tests).
    pub fn new(name: impl Into<String>, category: impl Into<String>, progress: f64, state: LogicalState) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            progress,
            state,
            eta: Eta::Done,
            size: 0,
            download_speed: 0,
        }
    }
}

impl From<QbitTorrent> for TorrentRecord {
    fn from(raw: QbitTorrent) -> Self {
        Self {
            state: LogicalState::from_qbit(&raw.state),
            eta: Eta::from_qbit(raw.eta),
            progress: (raw.progress * 100.0 * 100.0).round() / 100.0,
            size: raw.size.max(0) as u64,
            download_speed: raw.dlspeed.max(0) as u64,
            name: raw.name,
            category: raw.category,
        }
    }
}

/// Which torrents a status report includes by completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    /// Every torrent.
    #[default]
    All,
    /// Only torrents in the [`LogicalState::Completed`] state.
    Completed,
    /// Everything that is not yet complete.
    Downloading,
}

impl StatusFilter {
    /// Returns the keyword used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Downloading => "downloading",
        }
    }

    /// Whether a torrent in `state` passes this filter.
    pub fn matches(self, state: LogicalState) -> bool {
        match self {
            Self::All => true,
            Self::Completed => state.is_complete(),
            Self::Downloading => !state.is_complete(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" | "complete" | "done" => Ok(Self::Completed),
            "downloading" | "active" => Ok(Self::Downloading),
            other => Err(format!("unknown status filter: {}", other)),
        }
    }
}
