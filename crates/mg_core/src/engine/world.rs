//! The world rule: the mandatory environmental step run once per turn
//! (after turn 1) independent of any character's actions.

use crate::ability::passive;
use crate::models::{ids, CharacterId};

use super::elimination::{REASON_THUNDER, REASON_WORLD};
use super::Game;

impl Game {
    /// Executes the current 4th place environmentally, then seeds one
    /// thunder stack onto ranks 5, 6 and 7. Requires at least four alive.
    pub(crate) fn step_world_rule(&mut self) {
        let alive = self.alive_ids();
        if alive.len() < 4 {
            self.log("[World Rule] fewer than 4 alive; nothing happens");
            return;
        }
        // The archivist rides out any world event it is immune to at the
        // very top of the ranking.
        let archivist_immune = self
            .chr(ids::ARCHIVIST)
            .map_or(false, |ch| ch.alive && ch.status.spec_immune > 0);
        if archivist_immune {
            self.log(format!(
                "[{}] immune while the world stirs → claims rank 1",
                self.tag(ids::ARCHIVIST)
            ));
            self.insert_rank(ids::ARCHIVIST, 1, None, "immune amid the world event");
        }

        let alive = self.alive_ids();
        let target = alive[3];
        self.log(format!("[World Rule] executes 4th place: {}", self.tag(target)));
        let father_spared = target == ids::FATHER
            && !self.is_alive(ids::HEIR)
            && self.chr(ids::FATHER).map_or(false, |ch| {
                !ch.status.disabled && !ch.memory.father_world_immune_used
            });
        if father_spared {
            if let Some(ch) = self.chr_mut(ids::FATHER) {
                ch.memory.father_world_immune_used = true;
            }
            self.log(
                "  · A father's resolve: shrugs off one world-rule execution (once per game)",
            );
        } else {
            self.kill(target, None, REASON_WORLD, false, false);
        }

        // Losing the heir hardens the father: a small climb on every
        // world-rule execution, three times at most.
        let father_boosted = !self.is_alive(ids::HEIR)
            && self.chr(ids::FATHER).map_or(false, |ch| {
                ch.alive && !ch.status.disabled && ch.memory.father_boosts < 3
            });
        if father_boosted {
            if let Some(ch) = self.chr_mut(ids::FATHER) {
                ch.memory.father_boosts += 1;
            }
            self.log("  · A father's resolve: climbs one rank as the world rule strikes");
            self.move_by(ids::FATHER, -1, None, "a father's resolve");
        }
        self.compact();

        let alive = self.alive_ids();
        if alive.is_empty() {
            return;
        }
        let targets: Vec<CharacterId> =
            [4usize, 5, 6].iter().filter_map(|&i| alive.get(i).copied()).collect();
        if !targets.is_empty() {
            self.log("[World Rule] thunder falls on ranks 5/6/7");
            for t in targets {
                self.add_thunder(t, 1, None);
            }
        }
        self.compact();
    }

    /// Add thunder stacks and apply the execution threshold: at 3 stacks
    /// the holder dies at once, shields notwithstanding (revival abilities
    /// may still intercept).
    pub(crate) fn add_thunder(&mut self, target: CharacterId, n: u8, source: Option<CharacterId>) {
        if !self.is_alive(target) {
            return;
        }
        let before = self.brief_of(target);
        let stacks = {
            let Some(st) = self.status_mut(target) else {
                return;
            };
            st.thunder = st.thunder.saturating_add(n);
            st.thunder
        };
        passive::on_status_change(self, target, &before);
        self.log(format!("  · {} thunder stacks = {}", self.tag(target), stacks));
        if stacks >= 3 {
            self.log(format!(
                "  · Thunder at 3: {} is executed on the spot",
                self.tag(target)
            ));
            self.kill(target, source, REASON_THUNDER, true, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{Game, GameConfig};

    fn game(seed: u64) -> Game {
        Game::new(GameConfig { seed: Some(seed), ..Default::default() })
    }

    #[test]
    fn test_thunder_executes_at_three_despite_shields() {
        let mut g = game(31);
        let target = g.alive_ids()[0];
        g.give_shield(target, 2, 3, false, "");
        g.add_thunder(target, 2, None);
        assert!(g.is_alive(target));
        g.add_thunder(target, 1, None);
        // Shields do not stop a thunder execution; only a revival-style
        // interceptor could, and rank-1 holders here have none.
        if ![
            crate::models::ids::CALLIGRAPHER,
            crate::models::ids::SPLITMIND,
            crate::models::ids::TIDECALLER,
            crate::models::ids::ARCHIVIST,
            crate::models::ids::COLLECTOR,
        ]
        .contains(&target)
        {
            assert!(!g.is_alive(target));
        }
    }

    #[test]
    fn test_world_rule_requires_four_alive() {
        let mut g = game(32);
        let alive = g.alive_ids();
        for &c in alive.iter().skip(3) {
            g.chr_mut(c).unwrap().alive = false;
        }
        g.compact();
        let before = g.alive_ids().len();
        g.step_world_rule();
        assert_eq!(g.alive_ids().len(), before, "no execution below 4 alive");
    }
}
