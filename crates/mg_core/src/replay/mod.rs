//! Replay/log recorder.
//!
//! One frame is appended per log line: the text, a full snapshot, and the
//! list of character ids the text mentions. The frame buffer holds only
//! the current turn's lines (reset at turn start); the full log is an
//! unbounded append-only list for non-replay consumers.

mod types;

pub use types::{ReplayFrame, Snapshot, StatusSummary};

use std::collections::BTreeMap;

use crate::models::{Character, CharacterId};

/// Recorder owned by the game; presentation layers read, never write.
#[derive(Debug, Clone, Default)]
pub struct ReplayLog {
    lines: Vec<String>,
    frames: Vec<ReplayFrame>,
}

impl ReplayLog {
    /// Drop everything (new game).
    pub(crate) fn reset(&mut self) {
        self.lines.clear();
        self.frames.clear();
    }

    /// Drop the previous turn's frames; the full log is kept.
    pub(crate) fn begin_turn(&mut self) {
        self.frames.clear();
    }

    pub(crate) fn record(
        &mut self,
        text: String,
        snapshot: Snapshot,
        highlights: Vec<CharacterId>,
    ) {
        self.lines.push(text.clone());
        self.frames.push(ReplayFrame { text, snapshot, highlights });
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn frames(&self) -> &[ReplayFrame] {
        &self.frames
    }
}

/// Extract the character ids a log line mentions, by scanning for the
/// `(id)` markers the `Character::tag` format embeds. De-duplicated,
/// order-preserving.
pub(crate) fn scan_highlights(
    text: &str,
    known: &BTreeMap<CharacterId, Character>,
) -> Vec<CharacterId> {
    let mut out: Vec<CharacterId> = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'(' {
            let mut j = i + 1;
            let mut value: u64 = 0;
            let mut digits = 0;
            while j < bytes.len() && bytes[j].is_ascii_digit() && digits < 5 {
                value = value * 10 + u64::from(bytes[j] - b'0');
                digits += 1;
                j += 1;
            }
            if digits > 0 && j < bytes.len() && bytes[j] == b')' {
                let id = CharacterId(value as u32);
                if known.contains_key(&id) && !out.contains(&id) {
                    out.push(id);
                }
                i = j;
            }
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> BTreeMap<CharacterId, Character> {
        let mut map = BTreeMap::new();
        map.insert(CharacterId(3), Character::new(CharacterId(3), "Skyblade"));
        map.insert(CharacterId(15), Character::new(CharacterId(15), "Headhunter"));
        map.insert(CharacterId(1001), Character::new(CharacterId(1001), "Patron"));
        map
    }

    #[test]
    fn test_scan_extracts_known_ids_in_order() {
        let ids =
            scan_highlights("  - Headhunter(15) executes Skyblade(3), again (15)", &known());
        assert_eq!(ids, vec![CharacterId(15), CharacterId(3)]);
    }

    #[test]
    fn test_scan_ignores_unknown_ids_and_non_numeric() {
        let ids = scan_highlights("Unknown(99) acted (again) on Patron(1001)", &known());
        assert_eq!(ids, vec![CharacterId(1001)]);
    }
}
