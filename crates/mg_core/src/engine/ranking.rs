//! Ranking primitives.
//!
//! Every rank mutation funnels through these four operations. On an actual
//! position change they invoke the cross-cutting hooks (the mover's
//! own-status reaction is driven from status writes; position changes
//! drive the majesty-loss check), and all of them no-op silently on dead
//! or absent characters.

use crate::ability::passive;
use crate::models::CharacterId;

use super::Game;

impl Game {
    /// Remove dead entries from the ranking. Ability code between an
    /// elimination and this pass must tolerate present-but-dead ids.
    pub(crate) fn compact(&mut self) {
        let alive: Vec<CharacterId> =
            self.rank.iter().copied().filter(|&c| self.is_alive(c)).collect();
        self.rank = alive;
    }

    /// Shift `cid` by `delta` ranks (negative = toward rank 1), clamped to
    /// the sequence bounds. A held doubled-move flag doubles the delta
    /// once, before clamping.
    pub(crate) fn move_by(
        &mut self,
        cid: CharacterId,
        delta: i32,
        source: Option<CharacterId>,
        note: &str,
    ) {
        if !self.is_alive(cid) {
            return;
        }
        if self.null_field_blocks(source, cid, "reposition") {
            return;
        }
        // Bulwark eats the first downward move of its lifetime.
        if delta > 0 {
            let blocks = self
                .status_of(cid)
                .map_or(false, |st| st.bulwark > 0 && !st.bulwark_spent);
            if blocks {
                if let Some(st) = self.status_mut(cid) {
                    st.bulwark_spent = true;
                }
                self.log(format!("  · Bulwark: {} shrugs off a downward move", self.tag(cid)));
                return;
            }
        }
        if !self.apply_selection(source, cid, "reposition") {
            return;
        }
        let Some(p) = self.position(cid) else {
            return;
        };
        let mut delta = delta;
        let doubled = self.status_of(cid).map_or(false, |st| st.doubled_move);
        if doubled {
            delta *= 2;
            if let Some(st) = self.status_mut(cid) {
                st.doubled_move = false;
            }
            self.log(format!("  · Doom doubles the move: {} shifts twice as far", self.tag(cid)));
        }
        let len = self.rank.len() as i32;
        let newp = (p as i32 + delta).clamp(0, len - 1) as usize;
        if newp == p {
            return;
        }
        self.rank.remove(p);
        self.rank.insert(newp, cid);
        let suffix = if note.is_empty() { String::new() } else { format!(" [{}]", note) };
        self.log(format!("  · Reposition: {} {}→{}{}", self.tag(cid), p + 1, newp + 1, suffix));
        passive::check_majesty_loss(self);
    }

    /// Exchange two characters' positions. No-op if either is dead.
    pub(crate) fn swap_ranks(
        &mut self,
        a: CharacterId,
        b: CharacterId,
        source: Option<CharacterId>,
        note: &str,
    ) {
        if !(self.is_alive(a) && self.is_alive(b)) {
            return;
        }
        if self.null_field_blocks(source, a, "swap") || self.null_field_blocks(source, b, "swap") {
            return;
        }
        if !self.apply_selection(source, a, "swap") {
            return;
        }
        if !self.apply_selection(source, b, "swap") {
            return;
        }
        let (Some(pa), Some(pb)) = (self.position(a), self.position(b)) else {
            return;
        };
        self.rank.swap(pa, pb);
        let suffix = if note.is_empty() { String::new() } else { format!(" [{}]", note) };
        self.log(format!("  · Swap: {} ⇄ {}{}", self.tag(a), self.tag(b), suffix));
        passive::check_majesty_loss(self);
    }

    /// Remove `cid` and reinsert at the clamped 1-based target rank.
    pub(crate) fn insert_rank(
        &mut self,
        cid: CharacterId,
        new_rank: usize,
        source: Option<CharacterId>,
        note: &str,
    ) {
        if !self.is_alive(cid) {
            return;
        }
        if self.null_field_blocks(source, cid, "insert") {
            return;
        }
        if !self.apply_selection(source, cid, "insert") {
            return;
        }
        let Some(p) = self.position(cid) else {
            return;
        };
        let new_rank = new_rank.clamp(1, self.rank.len());
        self.rank.remove(p);
        self.rank.insert(new_rank - 1, cid);
        let suffix = if note.is_empty() { String::new() } else { format!(" [{}]", note) };
        self.log(format!("  · Insert: {} → rank {}{}", self.tag(cid), new_rank, suffix));
        passive::check_majesty_loss(self);
    }

    /// Convenience for `insert_rank(cid, 1)` without a selection gate:
    /// used by self-motivated and environmental promotions.
    pub(crate) fn move_to_first(&mut self, cid: CharacterId, note: &str) {
        if !self.is_alive(cid) {
            return;
        }
        let Some(p) = self.position(cid) else {
            return;
        };
        if p == 0 {
            return;
        }
        self.rank.remove(p);
        self.rank.insert(0, cid);
        let suffix = if note.is_empty() { String::new() } else { format!(" [{}]", note) };
        self.log(format!("  · Reposition: {} → rank 1{}", self.tag(cid), suffix));
        passive::check_majesty_loss(self);
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{Game, GameConfig};

    fn game() -> Game {
        Game::new(GameConfig { seed: Some(7), ..Default::default() })
    }

    #[test]
    fn test_move_by_clamps_at_bounds() {
        let mut g = game();
        let first = g.alive_ids()[0];
        g.move_by(first, -10, None, "");
        assert_eq!(g.rank_no(first), Some(1));
        let last = *g.alive_ids().last().unwrap();
        g.move_by(last, 10, None, "");
        assert_eq!(g.rank_no(last), Some(g.alive_ids().len()));
    }

    #[test]
    fn test_doubled_move_applies_once_before_clamp() {
        let mut g = game();
        let ids_now = g.alive_ids();
        let mover = ids_now[5];
        g.status_mut(mover).unwrap().doubled_move = true;
        g.move_by(mover, -2, None, "");
        assert_eq!(g.rank_no(mover), Some(2));
        assert!(!g.status_of(mover).unwrap().doubled_move);
        // The flag is one-shot: the next move is normal.
        g.move_by(mover, -1, None, "");
        assert_eq!(g.rank_no(mover), Some(1));
    }

    #[test]
    fn test_swap_noops_when_either_is_dead() {
        let mut g = game();
        let ids_now = g.alive_ids();
        let (a, b) = (ids_now[0], ids_now[1]);
        g.chr_mut(b).unwrap().alive = false;
        g.swap_ranks(a, b, None, "");
        assert_eq!(g.rank_no(a), Some(1));
    }

    #[test]
    fn test_insert_rank_is_clamped() {
        let mut g = game();
        let mover = g.alive_ids()[3];
        g.insert_rank(mover, 999, None, "");
        assert_eq!(g.rank_no(mover), Some(g.alive_ids().len()));
        g.insert_rank(mover, 0, None, "");
        assert_eq!(g.rank_no(mover), Some(1));
    }

    mod properties {
        use std::collections::HashSet;

        use proptest::prelude::*;

        use crate::engine::{Game, GameConfig};

        proptest! {
            /// No sequence of rank primitives can lose or duplicate an
            /// alive id.
            #[test]
            fn prop_primitives_preserve_the_alive_set(
                seed in 0u64..256,
                ops in proptest::collection::vec((0u8..4u8, 0usize..64, 0usize..64), 1..32),
            ) {
                let mut g = Game::new(GameConfig {
                    seed: Some(seed),
                    fast_mode: true,
                    joke_mode: false,
                });
                let expected: HashSet<_> = g.alive_ids().into_iter().collect();
                for (op, i, j) in ops {
                    let alive = g.alive_ids();
                    let a = alive[i % alive.len()];
                    let b = alive[j % alive.len()];
                    match op {
                        0 => g.move_by(a, j as i32 - 32, None, "prop"),
                        1 => g.swap_ranks(a, b, None, "prop"),
                        2 => g.insert_rank(a, j + 1, None, "prop"),
                        _ => g.move_to_first(a, "prop"),
                    }
                    let now = g.alive_ids();
                    let unique: HashSet<_> = now.iter().copied().collect();
                    prop_assert_eq!(unique.len(), now.len());
                    prop_assert_eq!(&unique, &expected);
                }
            }
        }
    }

    #[test]
    fn test_bulwark_blocks_first_downward_move_only() {
        let mut g = game();
        let mover = g.alive_ids()[2];
        {
            let st = g.status_mut(mover).unwrap();
            st.bulwark = 2;
        }
        g.move_by(mover, 3, None, "");
        assert_eq!(g.rank_no(mover), Some(3), "first drop is absorbed");
        g.move_by(mover, 3, None, "");
        assert_eq!(g.rank_no(mover), Some(6), "second drop lands");
    }
}
