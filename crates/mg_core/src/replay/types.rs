//! Replay frame and snapshot data types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::CharacterId;

/// Per-character display summary embedded in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub alive: bool,
    pub brief: String,
    pub name: String,
}

/// A cheap, pure view of the game: derivable at any point without mutating
/// state. Used for live display and embedded into every replay frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub turn: u32,
    /// Ordered alive character ids (index 0 = rank 1).
    pub rank: Vec<CharacterId>,
    pub status: BTreeMap<CharacterId, StatusSummary>,
}

/// One frame per emitted log line: the line itself, the full snapshot at
/// that moment, and the ids mentioned in the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub text: String,
    pub snapshot: Snapshot,
    pub highlights: Vec<CharacterId>,
}
