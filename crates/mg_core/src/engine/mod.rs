//! The game engine: caller-owned state plus the once-per-turn pipeline.
//!
//! One `Game` value holds the whole simulation (roster, ranking, log, RNG).
//! There are no process-wide singletons: hosts that want several concurrent
//! games simply own several values. A single `next_turn` call runs the
//! entire pipeline to completion before returning; all timing/playback
//! belongs to the presentation layer.

mod cleanup;
mod elimination;
mod events;
mod ranking;
mod selection;
mod shield;
mod world;

pub use elimination::DeathRecord;
pub(crate) use elimination::REASON_VENGEANCE;

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::ability;
use crate::error::{AbilityError, Result};
use crate::models::{
    ids, roster, Character, CharacterId, PATRON_NPC_ID, STORMCALLER_NPC_ID,
};
use crate::replay::{self, ReplayFrame, ReplayLog, Snapshot, StatusSummary};

/// Host-controlled configuration. `fast_mode` skips log and replay-frame
/// construction for headless bulk runs; `joke_mode` is the debug
/// invincibility toggle for the reserved collector id.
#[derive(Debug, Clone, Default)]
pub struct GameConfig {
    pub seed: Option<u64>,
    pub fast_mode: bool,
    pub joke_mode: bool,
}

/// A recorded ability fault (the ability misfired; the turn went on).
#[derive(Debug, Clone)]
pub struct SkillFault {
    pub id: CharacterId,
    pub turn: u32,
    pub message: String,
}

/// Upper bound on retained fault examples.
const MAX_FAULT_EXAMPLES: usize = 20;

#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) config: GameConfig,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) turn: u32,
    pub(crate) characters: BTreeMap<CharacterId, Character>,
    /// The total order: index 0 is rank 1. Dead entries may linger between
    /// an elimination and the next compaction pass.
    pub(crate) rank: Vec<CharacterId>,
    pub(crate) replay: ReplayLog,
    pub(crate) game_over: bool,
    pub(crate) no_death_streak: u32,
    pub(crate) pending_final_stand: bool,
    pub(crate) elimination_order: Vec<CharacterId>,
    pub(crate) elimination_turn: HashMap<CharacterId, u32>,
    pub(crate) deaths_this_turn: Vec<DeathRecord>,
    deaths_processed: usize,
    /// The slipstream twin bond, fixed for the whole game.
    pub(crate) twin_partner: Option<CharacterId>,
    pub(crate) start_rank_snapshot: HashMap<CharacterId, usize>,
    /// Fixed-for-the-game active-skill dispatch order.
    pub(crate) skill_order: Vec<CharacterId>,
    active_logged: HashSet<CharacterId>,
    skill_faults: u32,
    fault_examples: Vec<SkillFault>,
}

impl Game {
    /// Build a game from the fixed roster and start it.
    pub fn new(config: GameConfig) -> Self {
        let characters = roster()
            .iter()
            .map(|(&id, &name)| (id, Character::new(id, name)))
            .collect();
        let mut game = Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(0),
            turn: 0,
            characters,
            rank: Vec::new(),
            replay: ReplayLog::default(),
            game_over: false,
            no_death_streak: 0,
            pending_final_stand: false,
            elimination_order: Vec::new(),
            elimination_turn: HashMap::new(),
            deaths_this_turn: Vec::new(),
            deaths_processed: 0,
            twin_partner: None,
            start_rank_snapshot: HashMap::new(),
            skill_order: Vec::new(),
            active_logged: HashSet::new(),
            skill_faults: 0,
            fault_examples: Vec::new(),
        };
        game.new_game();
        game
    }

    /// Reset all state, re-randomize the initial ranking and the fixed
    /// per-game dispatch order.
    pub fn new_game(&mut self) {
        // Transient NPCs from a previous game must not leak into this one.
        self.characters.remove(&PATRON_NPC_ID);
        self.characters.remove(&STORMCALLER_NPC_ID);

        self.rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.turn = 0;
        self.game_over = false;
        self.no_death_streak = 0;
        self.pending_final_stand = false;
        self.replay.reset();
        self.elimination_order.clear();
        self.elimination_turn.clear();
        self.deaths_this_turn.clear();
        self.deaths_processed = 0;
        self.start_rank_snapshot.clear();
        self.active_logged.clear();
        self.skill_faults = 0;
        self.fault_examples.clear();

        for ch in self.characters.values_mut() {
            ch.alive = true;
            ch.status = Default::default();
            ch.memory = Default::default();
        }
        if self.config.joke_mode {
            if let Some(ch) = self.characters.get_mut(&ids::COLLECTOR) {
                ch.status.joke_overlay = true;
            }
        }

        self.rank = self.characters.keys().copied().collect();
        self.rank.shuffle(&mut self.rng);

        // One random permutation per game; every turn dispatches in this
        // order (dead characters are skipped, never re-shuffled).
        self.skill_order = self.rank.clone();
        self.skill_order.shuffle(&mut self.rng);

        // Bind the slipstream twin for the whole game.
        let candidates: Vec<CharacterId> =
            self.characters.keys().copied().filter(|&c| c != ids::SLIPSTREAM).collect();
        self.twin_partner = candidates.choose(&mut self.rng).copied();

        self.log("[New game] initial ranking generated");
    }

    // ========================
    // Accessors
    // ========================

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Ordered alive ids (rank order).
    pub fn alive_ids(&self) -> Vec<CharacterId> {
        self.rank.iter().copied().filter(|&c| self.is_alive(c)).collect()
    }

    /// Unbounded append-only log; cleared only by `new_game`.
    pub fn full_log(&self) -> &[String] {
        self.replay.lines()
    }

    /// Frames recorded during the most recent `next_turn` call.
    pub fn replay_frames_for_last_turn(&self) -> &[ReplayFrame] {
        self.replay.frames()
    }

    pub fn elimination_order(&self) -> &[CharacterId] {
        &self.elimination_order
    }

    pub fn elimination_turn_of(&self, id: CharacterId) -> Option<u32> {
        self.elimination_turn.get(&id).copied()
    }

    pub fn skill_fault_count(&self) -> u32 {
        self.skill_faults
    }

    pub fn fault_examples(&self) -> &[SkillFault] {
        &self.fault_examples
    }

    pub fn character_name(&self, id: CharacterId) -> Option<&str> {
        self.characters.get(&id).map(|c| c.name.as_str())
    }

    /// Display tag used across the log: `Name(id)`.
    pub fn tag(&self, id: CharacterId) -> String {
        match self.characters.get(&id) {
            Some(ch) => ch.tag(),
            None => format!("Unknown({})", id),
        }
    }

    /// A cheap, pure read of the current state.
    pub fn snapshot(&self) -> Snapshot {
        let status = self
            .characters
            .iter()
            .map(|(&id, ch)| {
                (
                    id,
                    StatusSummary {
                        alive: ch.alive,
                        brief: ch.status.brief(),
                        name: ch.name.clone(),
                    },
                )
            })
            .collect();
        Snapshot { turn: self.turn, rank: self.alive_ids(), status }
    }

    /// Snapshot serialized to JSON, for hosts that speak strings.
    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Bookkeeping the host calls once per turn, typically right before
    /// `next_turn`: maintains each character's consecutive-turns-alive
    /// counter and stamps the death turn of anyone found dead.
    pub fn tick_alive_turns(&mut self) {
        let turn = self.turn;
        for ch in self.characters.values_mut() {
            if ch.alive {
                ch.memory.alive_turns += 1;
            } else if ch.memory.dead_turn.is_none() {
                ch.memory.dead_turn = Some(turn);
            }
        }
    }

    // ========================
    // Internal helpers
    // ========================

    pub(crate) fn chr(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub(crate) fn chr_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    pub(crate) fn status_of(&self, id: CharacterId) -> Option<&crate::models::Status> {
        self.characters.get(&id).map(|c| &c.status)
    }

    pub(crate) fn status_mut(&mut self, id: CharacterId) -> Option<&mut crate::models::Status> {
        self.characters.get_mut(&id).map(|c| &mut c.status)
    }

    pub(crate) fn is_alive(&self, id: CharacterId) -> bool {
        self.characters.get(&id).map_or(false, |c| c.alive)
    }

    pub(crate) fn brief_of(&self, id: CharacterId) -> String {
        self.status_of(id).map(|s| s.brief()).unwrap_or_default()
    }

    /// 0-based position in the ranking (dead entries included until the
    /// next compaction).
    pub(crate) fn position(&self, id: CharacterId) -> Option<usize> {
        self.rank.iter().position(|&c| c == id)
    }

    /// 1-based rank.
    pub(crate) fn rank_no(&self, id: CharacterId) -> Option<usize> {
        self.position(id).map(|p| p + 1)
    }

    /// Whether the character can use its active skill this turn.
    pub(crate) fn can_act(&self, id: CharacterId) -> bool {
        match self.chr(id) {
            Some(ch) => {
                ch.alive
                    && !ch.status.disabled
                    && ch.status.sealed == 0
                    && ch.status.forgotten == 0
                    && ch.status.dying == 0
            }
            None => false,
        }
    }

    /// Append a log line and its replay frame. No-op in fast mode.
    pub(crate) fn log<S: Into<String>>(&mut self, text: S) {
        if self.config.fast_mode {
            return;
        }
        let text = text.into();
        let snapshot = self.snapshot();
        let highlights = replay::scan_highlights(&text, &self.characters);
        self.replay.record(text, snapshot, highlights);
    }

    pub(crate) fn record_fault(&mut self, id: CharacterId, err: AbilityError) {
        self.skill_faults += 1;
        log::warn!("ability fault for {} on turn {}: {}", id, self.turn, err);
        if self.fault_examples.len() < MAX_FAULT_EXAMPLES {
            self.fault_examples.push(SkillFault { id, turn: self.turn, message: err.to_string() });
        }
        self.log(format!("  · [Fault] {}'s active skill misfired: {}", self.tag(id), err));
    }

    // ========================
    // Turn pipeline
    // ========================

    /// Advance exactly one turn. Idempotent no-op with a log notice once
    /// the game is over.
    pub fn next_turn(&mut self) {
        if self.game_over {
            self.log("[Notice] this game is over; start a new game to continue.");
            return;
        }
        self.turn += 1;
        self.active_logged.clear();
        self.replay.begin_turn();

        for ch in self.characters.values_mut() {
            ch.memory.domain_used_this_turn = false;
            ch.memory.immune_gained_this_turn = false;
        }

        let start_ranks: Vec<(CharacterId, usize)> = self
            .alive_ids()
            .into_iter()
            .filter_map(|c| self.rank_no(c).map(|r| (c, r)))
            .collect();
        for &(cid, r) in &start_ranks {
            if let Some(ch) = self.characters.get_mut(&cid) {
                ch.memory.start_rank = Some(r);
            }
        }
        self.start_rank_snapshot = start_ranks.into_iter().collect();
        ability::passive::record_silent_signature(self);

        self.log("");
        self.log(format!("========== [Turn {} begins] ==========", self.turn));

        // Turn-start executions, in the documented global order: majesty
        // first, then the armed final-stand execution, then delayed curses.
        ability::passive::majesty_execution(self);
        self.resolve_final_stand();
        ability::death::resolve_vengeance_curses(self);

        self.deaths_this_turn.clear();
        self.deaths_processed = 0;

        if self.turn == 1 {
            self.log("[World Rule] dormant on the first turn");
        } else {
            self.step_world_rule();
        }
        self.step_random_event();
        self.step_npc_actions();
        self.step_active_skills();
        self.step_death_triggers();
        self.step_cleanup();

        let alive_after = self.alive_ids();
        if alive_after.len() <= 3 {
            if self.deaths_this_turn.is_empty() {
                self.no_death_streak += 1;
            } else {
                self.no_death_streak = 0;
            }
        } else {
            self.no_death_streak = 0;
        }

        self.log(format!(
            "========== [Turn {} ends] {} alive; no-death streak={} ==========",
            self.turn,
            alive_after.len(),
            self.no_death_streak
        ));

        let alive = self.alive_ids();
        if alive.is_empty() {
            self.game_over = true;
            return;
        }
        if alive.len() > 3 {
            self.pending_final_stand = false;
        } else if !self.pending_final_stand && self.no_death_streak >= 3 {
            self.pending_final_stand = true;
            self.log(
                "[Final Stand] 3 or fewer alive and 3 turns without a death: \
                 the last place is executed at the start of next turn",
            );
        }
        if alive.len() == 1 {
            let winner = alive[0];
            self.log(format!("[Victory] {} outlasted everyone!", self.tag(winner)));
            let order = self.elimination_order.clone();
            if let Some(&second) = order.last() {
                self.log(format!("[Second place] {}", self.tag(second)));
            }
            if order.len() >= 2 {
                let third = order[order.len() - 2];
                self.log(format!("[Third place] {}", self.tag(third)));
            }
            self.game_over = true;
        }
    }

    /// Consume the armed stalemate-breaker: execute the last place,
    /// shields void, revivals still allowed.
    fn resolve_final_stand(&mut self) {
        if !self.pending_final_stand {
            return;
        }
        let alive = self.alive_ids();
        if alive.is_empty() || alive.len() > 3 {
            return;
        }
        if let Some(&target) = alive.last() {
            self.log(format!("[Final Stand] executing the last place: {}", self.tag(target)));
            self.kill(target, None, elimination::REASON_FINAL_STAND, true, false);
            self.step_death_triggers();
            self.compact();
        }
        self.pending_final_stand = false;
    }

    /// Dispatch every able character's active skill in the fixed per-game
    /// order, skipping the dead and logging the reason for anyone unable
    /// to act.
    fn step_active_skills(&mut self) {
        if self.skill_order.is_empty() {
            let mut order = self.alive_ids();
            order.shuffle(&mut self.rng);
            self.skill_order = order;
        }
        let alive_set: HashSet<CharacterId> = self.alive_ids().into_iter().collect();
        let order: Vec<CharacterId> =
            self.skill_order.iter().copied().filter(|c| alive_set.contains(c)).collect();
        for cid in order {
            if !self.is_alive(cid) {
                continue;
            }
            if !self.can_act(cid) {
                let why = match self.status_of(cid) {
                    Some(st) if st.disabled => "disabled",
                    Some(st) if st.sealed > 0 => "sealed",
                    Some(st) if st.dying > 0 => "dying",
                    _ => "forgotten",
                };
                self.log(format!("  · {} cannot act ({})", self.tag(cid), why));
                continue;
            }
            if self.active_logged.insert(cid) {
                self.log(format!("[{}] uses their active skill...", self.tag(cid)));
            }
            if cid == ids::ARCHIVIST {
                ability::passive::archivist_pre_activation(self);
            }
            if cid == ids::STORMCROWN {
                ability::passive::stormcrown_pre_activation(self);
            }
            ability::run_active(self, cid);
            if self.is_alive(cid) && self.status_of(cid).map_or(0, |s| s.dusk_mark) > 0 {
                self.log(format!("  · Dusk mark: {} slips one rank for acting", self.tag(cid)));
                self.move_by(cid, 1, None, "dusk mark penalty");
            }
        }
    }

    /// Run each victim's own death trigger, in the order deaths occurred.
    /// Records are processed at most once; eliminations caused by a
    /// trigger are not re-processed within the same turn.
    pub(crate) fn step_death_triggers(&mut self) {
        if self.deaths_this_turn.is_empty() {
            self.log("[Death Triggers] no deaths this turn");
            return;
        }
        let end = self.deaths_this_turn.len();
        if self.deaths_processed >= end {
            return;
        }
        self.log("[Death Triggers] processing in the order deaths occurred:");
        for i in self.deaths_processed..end {
            let rec = self.deaths_this_turn[i].clone();
            match rec.victim {
                ids::GRUDGE => ability::death::grudge_eruption(self, rec.killer),
                ids::AVENGER => ability::death::avenger_rebirth(self, rec.killer),
                ids::RAINMAKER => ability::death::rainmaker_legacy(self),
                _ => {}
            }
        }
        self.deaths_processed = end;
    }
}
