//! Headless Monte-Carlo driver.
//!
//! Runs many independent games to completion (each with its own RNG
//! stream and zero shared mutable state, so the fleet parallelizes
//! trivially) and aggregates placement and survival statistics. Games
//! that hit the safety turn cap or suffered an ability fault are
//! excluded from win/placement statistics; faulted games still feed the
//! fault-rate report.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::engine::{Game, GameConfig};
use crate::models::{roster, CharacterId, PATRON_NPC_ID, STORMCALLER_NPC_ID};

/// Safety cap: the stalemate-breaker guarantees termination long before
/// this for any sane roster; hitting it flags the game as timed out.
pub const DEFAULT_TURN_CAP: u32 = 5000;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub games: u32,
    /// Seed for the per-game seed stream; None draws from entropy.
    pub seed: Option<u64>,
    pub turn_cap: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { games: 500, seed: None, turn_cap: DEFAULT_TURN_CAP }
    }
}

/// Integrity classification of one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameVerdict {
    Completed,
    /// Hit the turn cap without concluding; excluded from statistics.
    TimedOut,
    /// At least one ability fault occurred; the outcome cannot be
    /// trusted, so it is excluded from win/placement statistics.
    SkillFault,
}

#[derive(Debug, Clone)]
struct GameOutcome {
    verdict: GameVerdict,
    champion: Option<CharacterId>,
    second: Option<CharacterId>,
    third: Option<CharacterId>,
    /// 1-based final placement per roster character.
    placements: HashMap<CharacterId, u32>,
    /// Turns survived per roster character.
    survival: HashMap<CharacterId, u32>,
}

/// Aggregated statistics over a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub total_games: u32,
    pub completed_games: u32,
    pub timed_out_games: u32,
    pub skill_fault_games: u32,
    pub champion_wins: HashMap<CharacterId, u32>,
    pub top3_finishes: HashMap<CharacterId, u32>,
    placement_sum: HashMap<CharacterId, u64>,
    placement_count: HashMap<CharacterId, u32>,
    survival_sum: HashMap<CharacterId, u64>,
    survival_count: HashMap<CharacterId, u32>,
}

impl BatchReport {
    pub fn champion_rate(&self, id: CharacterId) -> f64 {
        if self.completed_games == 0 {
            return 0.0;
        }
        f64::from(self.champion_wins.get(&id).copied().unwrap_or(0))
            / f64::from(self.completed_games)
    }

    pub fn top3_rate(&self, id: CharacterId) -> f64 {
        if self.completed_games == 0 {
            return 0.0;
        }
        f64::from(self.top3_finishes.get(&id).copied().unwrap_or(0))
            / f64::from(self.completed_games)
    }

    pub fn average_placement(&self, id: CharacterId) -> Option<f64> {
        let count = self.placement_count.get(&id).copied().unwrap_or(0);
        if count == 0 {
            return None;
        }
        Some(self.placement_sum.get(&id).copied().unwrap_or(0) as f64 / f64::from(count))
    }

    pub fn average_survival_turns(&self, id: CharacterId) -> Option<f64> {
        let count = self.survival_count.get(&id).copied().unwrap_or(0);
        if count == 0 {
            return None;
        }
        Some(self.survival_sum.get(&id).copied().unwrap_or(0) as f64 / f64::from(count))
    }

    fn absorb(&mut self, outcome: &GameOutcome) {
        self.total_games += 1;
        match outcome.verdict {
            GameVerdict::TimedOut => {
                self.timed_out_games += 1;
                return;
            }
            GameVerdict::SkillFault => {
                self.skill_fault_games += 1;
                return;
            }
            GameVerdict::Completed => self.completed_games += 1,
        }
        if let Some(champ) = outcome.champion {
            *self.champion_wins.entry(champ).or_default() += 1;
        }
        for id in [outcome.champion, outcome.second, outcome.third].into_iter().flatten() {
            *self.top3_finishes.entry(id).or_default() += 1;
        }
        for (&id, &place) in &outcome.placements {
            *self.placement_sum.entry(id).or_default() += u64::from(place);
            *self.placement_count.entry(id).or_default() += 1;
        }
        for (&id, &turns) in &outcome.survival {
            *self.survival_sum.entry(id).or_default() += u64::from(turns);
            *self.survival_count.entry(id).or_default() += 1;
        }
    }
}

/// Run the batch, in parallel across independent games.
pub fn run_batch(config: &BatchConfig) -> BatchReport {
    let mut seed_rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let seeds: Vec<u64> = (0..config.games).map(|_| seed_rng.gen()).collect();

    let outcomes: Vec<GameOutcome> = seeds
        .par_iter()
        .map(|&seed| run_single(seed, config.turn_cap))
        .collect();

    let mut report = BatchReport::default();
    for outcome in &outcomes {
        report.absorb(outcome);
    }
    report
}

fn is_npc(id: CharacterId) -> bool {
    id == PATRON_NPC_ID || id == STORMCALLER_NPC_ID
}

fn run_single(seed: u64, turn_cap: u32) -> GameOutcome {
    let mut game = Game::new(GameConfig {
        seed: Some(seed),
        fast_mode: true,
        joke_mode: false,
    });
    for _ in 0..turn_cap {
        if game.game_over() {
            break;
        }
        game.tick_alive_turns();
        game.next_turn();
    }

    let alive = game.alive_ids();
    if !game.game_over() && alive.len() > 1 {
        return GameOutcome {
            verdict: GameVerdict::TimedOut,
            champion: None,
            second: None,
            third: None,
            placements: HashMap::new(),
            survival: HashMap::new(),
        };
    }
    let verdict = if game.skill_fault_count() > 0 {
        GameVerdict::SkillFault
    } else {
        GameVerdict::Completed
    };

    let alive_players: Vec<CharacterId> =
        alive.iter().copied().filter(|&c| !is_npc(c)).collect();
    let eliminated: Vec<CharacterId> = game
        .elimination_order()
        .iter()
        .copied()
        .filter(|&c| !is_npc(c))
        .collect();

    let (champion, second, third) = if alive.len() == 1 && !alive_players.is_empty() {
        (
            Some(alive_players[0]),
            eliminated.last().copied(),
            eliminated.iter().rev().nth(1).copied(),
        )
    } else {
        // No roster champion (everyone fell, or an NPC outlasted them):
        // the podium is the last three to fall.
        (
            eliminated.last().copied(),
            eliminated.iter().rev().nth(1).copied(),
            eliminated.iter().rev().nth(2).copied(),
        )
    };

    let mut placements: HashMap<CharacterId, u32> = HashMap::new();
    let start = if alive.len() == 1 && !alive_players.is_empty() {
        placements.insert(alive_players[0], 1);
        2
    } else {
        1
    };
    for (offset, &id) in eliminated.iter().rev().enumerate() {
        placements.insert(id, start + offset as u32);
    }

    let mut survival: HashMap<CharacterId, u32> = HashMap::new();
    for &id in roster().keys() {
        let turns = if alive_players.contains(&id) {
            game.turn()
        } else {
            game.elimination_turn_of(id).unwrap_or_else(|| game.turn())
        };
        survival.insert(id, turns);
    }

    GameOutcome { verdict, champion, second, third, placements, survival }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_batch_completes_and_balances() {
        let report = run_batch(&BatchConfig { games: 8, seed: Some(99), turn_cap: 5000 });
        assert_eq!(report.total_games, 8);
        assert_eq!(
            report.completed_games + report.timed_out_games + report.skill_fault_games,
            8
        );
        assert_eq!(report.timed_out_games, 0, "the stalemate rule guarantees termination");
    }

    #[test]
    fn test_batches_with_the_same_seed_agree() {
        let config = BatchConfig { games: 4, seed: Some(123), turn_cap: 5000 };
        let a = run_batch(&config);
        let b = run_batch(&config);
        assert_eq!(a.champion_wins, b.champion_wins);
        assert_eq!(a.completed_games, b.completed_games);
    }
}
