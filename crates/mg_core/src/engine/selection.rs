//! Selection and immunity layer.
//!
//! `apply_selection` is the single mandatory gate every skill-driven
//! effect passes before touching a target. Environmental effects (source
//! = None) bypass all of it.

use rand::seq::SliceRandom;

use crate::models::{ids, CharacterId};

use super::elimination::REASON_RIPOSTE;
use super::Game;

impl Game {
    /// Returns true if the effect may proceed against `target`.
    ///
    /// Checked in order: environmental bypass, dead/unknown target,
    /// invisibility, then the duelist's riposte (the second selection by
    /// the same source this game eliminates the source instead).
    pub(crate) fn apply_selection(
        &mut self,
        source: Option<CharacterId>,
        target: CharacterId,
        effect: &str,
    ) -> bool {
        if !self.is_alive(target) {
            return false;
        }
        let Some(source) = source else {
            return true;
        };

        if self.status_of(target).map_or(false, |st| st.invisible) {
            self.log(format!(
                "  · Invisibility: {} evades {}'s effect ({})",
                self.tag(target),
                self.tag(source),
                effect
            ));
            return false;
        }

        if target == ids::DUELIST && !self.status_of(target).map_or(true, |st| st.disabled) {
            let count = {
                let mem = match self.chr_mut(ids::DUELIST) {
                    Some(ch) => &mut ch.memory,
                    None => return false,
                };
                let entry = mem.duel_hits.entry(source).or_insert(0);
                *entry += 1;
                *entry
            };
            if count >= 2 && self.is_alive(source) {
                self.log(format!(
                    "  · Riposte: {} is targeted a second time by {} → the attacker is eliminated",
                    self.tag(ids::DUELIST),
                    self.tag(source)
                ));
                self.kill(source, Some(ids::DUELIST), REASON_RIPOSTE, true, true);
            } else {
                self.log(format!(
                    "  · Riposte: {} shrugs off {}'s effect (hit {})",
                    self.tag(ids::DUELIST),
                    self.tag(source),
                    count
                ));
            }
            return false;
        }

        true
    }

    /// Uniform random pick from `pool`, with two carve-outs: invisible
    /// candidates are filtered (the actor is never filtered by its own
    /// invisibility), and an actor holding the forced-self-target flag
    /// must pick itself if it is in the filtered pool (consuming the
    /// flag).
    pub(crate) fn pick_random(
        &mut self,
        actor: CharacterId,
        pool: Vec<CharacterId>,
        desc: &str,
    ) -> Option<CharacterId> {
        if pool.is_empty() {
            return None;
        }
        let pool: Vec<CharacterId> = pool
            .into_iter()
            .filter(|&c| c == actor || !self.status_of(c).map_or(false, |st| st.invisible))
            .collect();
        if pool.is_empty() {
            return None;
        }
        let focused = self.status_of(actor).map_or(false, |st| st.focused);
        if focused && pool.contains(&actor) {
            if let Some(st) = self.status_mut(actor) {
                st.focused = false;
            }
            self.log(format!(
                "  · Focus backfire: {}'s random roll lands on itself ({}); the focus fades",
                self.tag(actor),
                desc
            ));
            return Some(actor);
        }
        pool.choose(&mut self.rng).copied()
    }

    /// Field-wide invariant: at most one character holds the forced
    /// self-target flag. Setting it clears every other holder first.
    pub(crate) fn set_unique_focus(&mut self, target: CharacterId, note: &str) {
        for ch in self.characters.values_mut() {
            if ch.id != target {
                ch.status.focused = false;
            }
        }
        if let Some(st) = self.status_mut(target) {
            st.focused = true;
        }
        if !note.is_empty() {
            self.log(note.to_string());
        }
    }

    /// The null-field counter-debuff: if the source carries a charge and
    /// the target is the Bladedancer, the charge is consumed and the
    /// effect voided.
    pub(crate) fn null_field_blocks(
        &mut self,
        source: Option<CharacterId>,
        target: CharacterId,
        effect: &str,
    ) -> bool {
        if target != ids::BLADEDANCER {
            return false;
        }
        let Some(source) = source else {
            return false;
        };
        let charged = match self.chr(source) {
            Some(ch) => ch.alive && !ch.status.disabled && ch.status.null_field > 0,
            None => false,
        };
        if !charged {
            return false;
        }
        if let Some(st) = self.status_mut(source) {
            st.null_field = 0;
        }
        self.log(format!(
            "  · Null field: {} is immune to {}'s effect ({}); the charge is spent",
            self.tag(ids::BLADEDANCER),
            self.tag(source),
            effect
        ));
        true
    }

    /// The Bulwark's absolute domain: skill-driven immunity, up to three
    /// times per game and once per turn, rising one rank on each use.
    pub(crate) fn domain_try_immune(&mut self, effect: &str) -> bool {
        let usable = match self.chr(ids::BULWARK) {
            Some(ch) => {
                !ch.status.disabled
                    && ch.memory.domain_uses < 3
                    && !ch.memory.domain_used_this_turn
            }
            None => false,
        };
        if !usable {
            return false;
        }
        let uses = {
            let mem = match self.chr_mut(ids::BULWARK) {
                Some(ch) => &mut ch.memory,
                None => return false,
            };
            mem.domain_used_this_turn = true;
            mem.domain_uses += 1;
            mem.domain_uses
        };
        self.log(format!(
            "  · Absolute domain: {} ignores one skill effect ({}); rises a rank ({}/3 used)",
            self.tag(ids::BULWARK),
            effect,
            uses
        ));
        self.move_by(ids::BULWARK, -1, None, "absolute domain");
        true
    }

    /// The Bulwark can never be chosen by an active execution.
    pub(crate) fn is_domain_unkillable(&self, target: CharacterId) -> bool {
        target == ids::BULWARK
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{Game, GameConfig};
    use crate::models::ids;

    fn game(seed: u64) -> Game {
        Game::new(GameConfig { seed: Some(seed), ..Default::default() })
    }

    #[test]
    fn test_environmental_effects_bypass_invisibility() {
        let mut g = game(1);
        let target = g.alive_ids()[0];
        g.status_mut(target).unwrap().invisible = true;
        assert!(g.apply_selection(None, target, "world rule"));
        let source = g.alive_ids()[1];
        assert!(!g.apply_selection(Some(source), target, "skill"));
    }

    #[test]
    fn test_dead_target_is_never_selectable() {
        let mut g = game(2);
        let target = g.alive_ids()[0];
        g.chr_mut(target).unwrap().alive = false;
        assert!(!g.apply_selection(None, target, "anything"));
    }

    #[test]
    fn test_duelist_riposte_kills_repeat_attacker() {
        let mut g = game(3);
        let attacker = g.alive_ids().into_iter().find(|&c| c != ids::DUELIST).unwrap();
        assert!(!g.apply_selection(Some(attacker), ids::DUELIST, "first"));
        assert!(g.is_alive(attacker), "first hit only blocks");
        assert!(!g.apply_selection(Some(attacker), ids::DUELIST, "second"));
        assert!(!g.is_alive(attacker), "second hit triggers the riposte");
    }

    #[test]
    fn test_forced_self_target_overrides_rng_and_clears() {
        for seed in 0..20 {
            let mut g = game(seed);
            let actor = g.alive_ids()[4];
            g.set_unique_focus(actor, "");
            let pool = g.alive_ids();
            let picked = g.pick_random(actor, pool, "test roll");
            assert_eq!(picked, Some(actor), "seed {} must pick the actor", seed);
            assert!(!g.status_of(actor).unwrap().focused, "flag is consumed");
        }
    }

    #[test]
    fn test_unique_focus_has_at_most_one_holder() {
        let mut g = game(5);
        let ids_now = g.alive_ids();
        g.set_unique_focus(ids_now[0], "");
        g.set_unique_focus(ids_now[1], "");
        let holders: Vec<_> = g
            .alive_ids()
            .into_iter()
            .filter(|&c| g.status_of(c).map_or(false, |st| st.focused))
            .collect();
        assert_eq!(holders, vec![ids_now[1]]);
    }

    #[test]
    fn test_pick_random_filters_invisible_candidates() {
        let mut g = game(6);
        let actor = g.alive_ids()[0];
        let others: Vec<_> = g.alive_ids().into_iter().filter(|&c| c != actor).collect();
        for &c in &others {
            g.status_mut(c).unwrap().invisible = true;
        }
        assert_eq!(g.pick_random(actor, others, "all hidden"), None);
    }
}
