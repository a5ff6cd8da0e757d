//! Per-character ability scratch memory.
//!
//! The counters and one-shot gates individual abilities keep across turns.
//! Every field has a meaningful default so "unset" reads as zero/false,
//! and nothing here is touched by status purges.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::CharacterId;

#[derive(Debug, Clone)]
pub struct AbilityMemory {
    /// Consecutive turns alive (maintained by `tick_alive_turns`).
    pub alive_turns: u32,
    /// Turn of the most recent death, if any.
    pub dead_turn: Option<u32>,

    /// Generic every-Nth-activation counter.
    pub activation_count: u32,
    pub execute_cd: u8,
    pub kill_cd: u8,
    pub warp_cd: u8,
    pub aegis_cd: u8,
    pub aegis_uses: u8,
    pub flip_cd: u8,
    pub drought_cd: u8,
    pub chaos_cd: u8,
    pub purify_cd: u8,
    pub frontline_cd: u8,

    pub seal_used: bool,
    pub revive_used: bool,
    pub rebirth_used: bool,
    pub fish_soul_used: bool,
    /// Splitmind revival charges. Starts at 2.
    pub revives_left: u8,

    pub domain_uses: u8,
    pub domain_used_this_turn: bool,
    pub immune_next: bool,

    pub father_boosts: u8,
    pub father_world_immune_used: bool,

    pub matron_triggers: u8,
    pub blessing: u8,

    pub death_times: u8,
    pub solar_revive_used: bool,

    pub candle_used: bool,
    pub attached_uses: u8,
    /// Set on the character carrying an attached life, naming its origin.
    pub attached_life_of: Option<CharacterId>,

    /// Archivist: status marks recorded so far.
    pub recorded_marks: BTreeSet<String>,
    /// Archivist: survivors recorded so far.
    pub recorded_alive: BTreeSet<CharacterId>,
    pub record_layers: u8,
    pub immune_gained_this_turn: bool,

    pub pending_wrath: bool,
    pub last_rank: Option<usize>,

    /// Duelist: selections suffered per source this game.
    pub duel_hits: BTreeMap<CharacterId, u32>,
    pub witness_block_turn: Option<u32>,

    /// Phantom: creeping top-rank chance. Starts at 0.05.
    pub phantom_chance: f64,
    /// Prankster: creeping first-place pick chance. Starts at 0.01.
    pub first_pick_chance: f64,
    pub strider_last_kill_turn: Option<u32>,

    /// Echo: turn the detour mark was last handed out.
    pub detour_turn: Option<u32>,
    /// Adjudicator: status signature captured at turn start.
    pub start_status_sig: Option<String>,
    /// Rank held at the start of the current turn.
    pub start_rank: Option<usize>,

    pub npc_casts: u8,
    pub mates_picked: bool,
    pub mates: Vec<CharacterId>,
}

impl Default for AbilityMemory {
    fn default() -> Self {
        Self {
            alive_turns: 0,
            dead_turn: None,
            activation_count: 0,
            execute_cd: 0,
            kill_cd: 0,
            warp_cd: 0,
            aegis_cd: 0,
            aegis_uses: 0,
            flip_cd: 0,
            drought_cd: 0,
            chaos_cd: 0,
            purify_cd: 0,
            frontline_cd: 0,
            seal_used: false,
            revive_used: false,
            rebirth_used: false,
            fish_soul_used: false,
            revives_left: 2,
            domain_uses: 0,
            domain_used_this_turn: false,
            immune_next: false,
            father_boosts: 0,
            father_world_immune_used: false,
            matron_triggers: 0,
            blessing: 0,
            death_times: 0,
            solar_revive_used: false,
            candle_used: false,
            attached_uses: 0,
            attached_life_of: None,
            recorded_marks: BTreeSet::new(),
            recorded_alive: BTreeSet::new(),
            record_layers: 0,
            immune_gained_this_turn: false,
            pending_wrath: false,
            last_rank: None,
            duel_hits: BTreeMap::new(),
            witness_block_turn: None,
            phantom_chance: 0.05,
            first_pick_chance: 0.01,
            strider_last_kill_turn: None,
            detour_turn: None,
            start_status_sig: None,
            start_rank: None,
            npc_casts: 0,
            mates_picked: false,
            mates: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unset() {
        let mem = AbilityMemory::default();
        assert_eq!(mem.alive_turns, 0);
        assert_eq!(mem.revives_left, 2);
        assert!((mem.phantom_chance - 0.05).abs() < f64::EPSILON);
        assert!(mem.duel_hits.is_empty());
    }
}
