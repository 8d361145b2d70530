//! Core data models for qbit-status.
//!
//! This crate provides the data types shared by the refresh core and the chat
//! front-end: raw and normalized torrent records, logical states, filters and
//! opaque chat handles.

pub mod ids;
pub mod torrent;

// Re-export main types
pub use ids::{ChatRef, MessageRef};
pub use torrent::{
    Eta, LogicalState, QbitTorrent, StatusFilter, TorrentRecord, INFINITE_ETA_SECS,
};
