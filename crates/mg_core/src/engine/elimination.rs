//! The unified elimination pipeline.
//!
//! Every way a character can leave the game funnels through `kill`.
//! Interception order: joke-mode short-circuit → timed special immunity →
//! null-field consumption → the selection gate → hard one-time revivals →
//! shield consumption → capacity-limited revivals → true death plus the
//! unconditional on-death cascade.

use serde::{Deserialize, Serialize};

use crate::ability::passive;
use crate::models::{ids, CharacterId, PATRON_NPC_ID, STORMCALLER_NPC_ID};

use super::Game;

pub(crate) const REASON_WORLD: &str = "world rule execution";
pub(crate) const REASON_THUNDER: &str = "thunder overload execution";
pub(crate) const REASON_FINAL_STAND: &str = "final stand execution";
pub(crate) const REASON_VENGEANCE: &str = "vengeance eruption (shields void)";
pub(crate) const REASON_RIPOSTE: &str = "riposte counter-kill";

/// One successful elimination this turn. Consumed by the death-trigger
/// phase in the order deaths occurred; the list is cleared each turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathRecord {
    pub victim: CharacterId,
    /// None = environmental/world-rule cause.
    pub killer: Option<CharacterId>,
    pub reason: String,
}

impl Game {
    /// Attempt to eliminate `victim`. Returns true iff the character is
    /// actually dead as a result of this call.
    pub(crate) fn kill(
        &mut self,
        victim: CharacterId,
        killer: Option<CharacterId>,
        reason: &str,
        bypass_shield: bool,
        bypass_revive: bool,
    ) -> bool {
        if !self.is_alive(victim) {
            return false;
        }

        // 1. Joke-mode invincibility for the reserved collector id. Only
        //    the final-stand execution cuts through it.
        if self.config.joke_mode && victim == ids::COLLECTOR && reason != REASON_FINAL_STAND {
            self.log(format!("  · {} is invincible: the elimination fizzles", self.tag(victim)));
            return false;
        }

        // 2. The archivist's timed immunity blocks everything except the
        //    final-stand execution.
        if victim == ids::ARCHIVIST
            && self.status_of(victim).map_or(false, |st| st.spec_immune > 0)
            && reason != REASON_FINAL_STAND
        {
            self.log(format!(
                "  · Special immunity: {} cannot die ({})",
                self.tag(victim),
                reason
            ));
            return false;
        }

        // 3. A null-field charge on the killer voids the attempt.
        if self.null_field_blocks(killer, victim, reason) {
            return false;
        }

        // 4. The universal selection gate. Its riposte rule may eliminate
        //    the killer as a side effect while still voiding this attempt.
        if !self.apply_selection(killer, victim, reason) {
            return false;
        }

        // 5a. The calligrapher's rebirth: nullify the first elimination,
        //     at the price of a permanent disable, and claim rank 1.
        if victim == ids::CALLIGRAPHER && !bypass_revive {
            let triggers = self.chr(victim).map_or(false, |ch| {
                !ch.status.disabled && !ch.memory.rebirth_used
            });
            if triggers {
                if let Some(ch) = self.chr_mut(victim) {
                    ch.memory.rebirth_used = true;
                    ch.alive = true;
                    ch.status.disabled = true;
                    ch.status.thunder = 0;
                    ch.status.dying = 0;
                }
                self.log(format!(
                    "  · Rebirth in ink: {} shrugs off death, permanently disabled, and claims rank 1 (once per game)",
                    self.tag(victim)
                ));
                self.insert_rank(victim, 1, None, "rebirth in ink");
                return false;
            }
        }

        // 5b. The tidecaller's pearl: a killer-sourced death becomes a
        //     three-turn dying stupor instead. Environmental causes are
        //     not covered.
        if victim == ids::TIDECALLER && killer.is_some() && !bypass_revive {
            let triggers = self.chr(victim).map_or(false, |ch| {
                !ch.status.disabled && !ch.memory.fish_soul_used
            });
            if triggers {
                let before = self.brief_of(victim);
                if let Some(ch) = self.chr_mut(victim) {
                    ch.memory.fish_soul_used = true;
                    ch.status.dying = 3;
                }
                self.log(format!(
                    "  · Pearl of returning: {} sinks into Dying for 3 turns instead (once per game)",
                    self.tag(victim)
                ));
                passive::on_status_change(self, victim, &before);
                return false;
            }
        }

        // 6. Shields and one-shot absorbs.
        if !bypass_shield && self.status_of(victim).map_or(false, |st| st.can_absorb()) {
            self.consume_shield_once(victim);
            self.log(format!("  · Shield absorbs the hit: {} ({})", self.tag(victim), reason));
            return false;
        }

        // 7. Capacity-limited revival: the splitmind's two extra lives.
        if !bypass_revive && victim == ids::SPLITMIND {
            let charges = self.chr(victim).map_or(0, |ch| {
                if ch.status.disabled {
                    0
                } else {
                    ch.memory.revives_left
                }
            });
            if charges > 0 {
                let cleared_thunder = {
                    let Some(ch) = self.chr_mut(victim) else {
                        return false;
                    };
                    ch.memory.revives_left -= 1;
                    let cleared = ch.status.thunder >= 3;
                    ch.status.thunder = 0;
                    (cleared, ch.memory.revives_left)
                };
                self.log(format!(
                    "  · Twofold life: {} springs back at once ({} left)",
                    self.tag(victim),
                    cleared_thunder.1
                ));
                if cleared_thunder.0 {
                    self.log(format!(
                        "  · Thunder cleared: {} restarts at zero stacks",
                        self.tag(victim)
                    ));
                }
                return false;
            }
        }

        // 8. True death.
        let current_turn = self.turn;
        if let Some(ch) = self.chr_mut(victim) {
            ch.alive = false;
            ch.status.thunder = 0;
            ch.memory.dead_turn = Some(current_turn);
        }
        self.deaths_this_turn.push(DeathRecord {
            victim,
            killer,
            reason: reason.to_string(),
        });
        self.on_death_cascade(victim, killer, reason);
        true
    }

    /// Unconditional on-death side effects. These fire synchronously; the
    /// death-trigger phase is reserved for the victim's own reactive
    /// ability.
    fn on_death_cascade(&mut self, victim: CharacterId, killer: Option<CharacterId>, reason: &str) {
        self.echo_marks_on_death();
        self.truthseer_on_death(victim, killer);
        self.redeemer_on_death(victim, killer);

        self.elimination_order.push(victim);
        self.elimination_turn.insert(victim, self.turn);

        // Felling an event NPC grants its bounty.
        if victim == PATRON_NPC_ID {
            if let Some(killer) = killer.filter(|&k| self.is_alive(k)) {
                let before = self.brief_of(killer);
                if let Some(st) = self.status_mut(killer) {
                    st.patron_gift = true;
                }
                self.log(format!(
                    "  · The patron falls: {} receives the Patron's Gift (absorbs one blow; rises 2 ranks per turn)",
                    self.tag(killer)
                ));
                passive::on_status_change(self, killer, &before);
            }
        }
        if victim == STORMCALLER_NPC_ID {
            if let Some(killer) = killer.filter(|&k| self.is_alive(k)) {
                let before = self.brief_of(killer);
                if let Some(st) = self.status_mut(killer) {
                    st.storm_bracelet = true;
                }
                self.log(format!(
                    "  · The stormcaller falls: {} receives the Storm Bracelet (absorbs one blow; thunders the rank above each turn)",
                    self.tag(killer)
                ));
                passive::on_status_change(self, killer, &before);
            }
        }

        passive::lonewolf_check(self);
        self.candlekeeper_on_death(victim, killer, reason);
        self.collector_blessing_on_death(victim);
        self.solar_on_death(victim, killer);
        passive::on_twin_death(self, victim);
    }

    /// The echo marks one higher-ranked character with a detour whenever
    /// anyone is eliminated, once per turn.
    fn echo_marks_on_death(&mut self) {
        let active = self.chr(ids::ECHO).map_or(false, |ch| {
            ch.alive && !ch.status.disabled && ch.memory.detour_turn != Some(self.turn)
        });
        if !active {
            return;
        }
        let turn = self.turn;
        if let Some(ch) = self.chr_mut(ids::ECHO) {
            ch.memory.detour_turn = Some(turn);
        }
        let Some(own_rank) = self.rank_no(ids::ECHO) else {
            return;
        };
        let candidates: Vec<CharacterId> = self
            .alive_ids()
            .into_iter()
            .filter(|&c| c != ids::ECHO && self.rank_no(c).map_or(false, |r| r < own_rank))
            .collect();
        use rand::seq::SliceRandom;
        if let Some(&target) = candidates.choose(&mut self.rng) {
            if let Some(st) = self.status_mut(target) {
                st.detour = st.detour.max(2);
            }
            self.log(format!(
                "  · Echo pursuit: {} saddles {} with a Detour (2 turns)",
                self.tag(ids::ECHO),
                self.tag(target)
            ));
        }
    }

    fn truthseer_on_death(&mut self, victim: CharacterId, killer: Option<CharacterId>) {
        // An armed witness drags the killer down with the truthseer.
        if victim == ids::TRUTHSEER {
            let armed = self.status_of(victim).map_or(false, |st| st.witness);
            if armed {
                if let Some(killer) = killer.filter(|&k| self.is_alive(k)) {
                    self.log(format!(
                        "  · Truth decoded: {} falls holding a Witness → the culprit {} is dragged down",
                        self.tag(victim),
                        self.tag(killer)
                    ));
                    self.kill(killer, Some(ids::TRUTHSEER), "truth decoded joint fall", true, false);
                }
            }
            return;
        }
        // Watching a lower-ranked character fall: first sighting arms the
        // witness, the second consumes it and counter-kills the culprit.
        let Some(killer) = killer else {
            return;
        };
        if killer == victim {
            return;
        }
        let watching = self
            .chr(ids::TRUTHSEER)
            .map_or(false, |ch| ch.alive && !ch.status.disabled);
        if !watching {
            return;
        }
        let (Some(own_rank), Some(victim_rank)) =
            (self.rank_no(ids::TRUTHSEER), self.rank_no(victim))
        else {
            return;
        };
        if victim_rank <= own_rank {
            return;
        }
        let armed = self.status_of(ids::TRUTHSEER).map_or(false, |st| st.witness);
        if !armed {
            let blocked = self
                .chr(ids::TRUTHSEER)
                .map_or(true, |ch| ch.memory.witness_block_turn == Some(self.turn));
            if !blocked {
                if let Some(st) = self.status_mut(ids::TRUTHSEER) {
                    st.witness = true;
                }
                self.log(format!(
                    "  · Flaw insight: {} gains a Witness",
                    self.tag(ids::TRUTHSEER)
                ));
            }
        } else {
            let turn = self.turn;
            if let Some(ch) = self.chr_mut(ids::TRUTHSEER) {
                ch.status.witness = false;
                ch.memory.witness_block_turn = Some(turn);
            }
            let killer_rank = self.rank_no(killer);
            self.log(format!(
                "  · Flaw insight: {}'s Witness triggers → counter-eliminates the culprit {}",
                self.tag(ids::TRUTHSEER),
                self.tag(killer)
            ));
            let felled =
                self.kill(killer, Some(ids::TRUTHSEER), "flaw insight counter", true, false);
            if felled {
                if let Some(kr) = killer_rank {
                    let diff = own_rank.abs_diff(kr);
                    if diff > 0 {
                        self.log(format!("  · Flaw insight: rises by the gap of {} ranks", diff));
                        self.move_by(
                            ids::TRUTHSEER,
                            -(diff as i32),
                            Some(ids::TRUTHSEER),
                            "flaw insight climb",
                        );
                    }
                }
            }
        }
    }

    /// The redeemer revives an adjacent victim (while at least four are
    /// alive) and shelters both under Advocacy.
    fn redeemer_on_death(&mut self, victim: CharacterId, killer: Option<CharacterId>) {
        if killer.is_none() {
            return;
        }
        let active = self
            .chr(ids::REDEEMER)
            .map_or(false, |ch| ch.alive && !ch.status.disabled);
        if !active || self.alive_ids().len() < 4 {
            return;
        }
        let Some(p) = self.position(ids::REDEEMER) else {
            return;
        };
        let mut revived = false;
        for offset in [-1i32, 1] {
            let q = p as i32 + offset;
            if q < 0 || q as usize >= self.rank.len() {
                continue;
            }
            let neighbor = self.rank[q as usize];
            if neighbor == victim && !self.is_alive(neighbor) {
                if let Some(ch) = self.chr_mut(neighbor) {
                    ch.alive = true;
                    ch.status.dying = 0;
                }
                revived = true;
            }
        }
        if revived {
            for cid in [ids::REDEEMER, victim] {
                if let Some(st) = self.status_mut(cid) {
                    st.advocacy = st.advocacy.max(3);
                }
            }
            self.log(format!(
                "  · Redemption prayer: {} raises the adjacent {} and grants both Advocacy (3 turns)",
                self.tag(ids::REDEEMER),
                self.tag(victim)
            ));
        }
    }

    fn candlekeeper_on_death(
        &mut self,
        victim: CharacterId,
        killer: Option<CharacterId>,
        reason: &str,
    ) {
        // A world-rule death hands the attached life to a random survivor.
        if victim == ids::CANDLEKEEPER && killer.is_none() && reason == REASON_WORLD {
            let unused = self.chr(victim).map_or(false, |ch| !ch.memory.candle_used);
            if unused {
                if let Some(ch) = self.chr_mut(victim) {
                    ch.memory.candle_used = true;
                }
                let candidates: Vec<CharacterId> = self
                    .alive_ids()
                    .into_iter()
                    .filter(|&c| {
                        c != ids::CANDLEKEEPER && c != PATRON_NPC_ID && c != STORMCALLER_NPC_ID
                    })
                    .collect();
                use rand::seq::SliceRandom;
                if let Some(&target) = candidates.choose(&mut self.rng) {
                    let before = self.brief_of(target);
                    if let Some(ch) = self.chr_mut(target) {
                        ch.status.attached_life = true;
                        ch.memory.attached_life_of = Some(ids::CANDLEKEEPER);
                    }
                    self.log(format!(
                        "  · Last candle: the world rule snuffs {} → {} carries the Attached Life",
                        self.tag(victim),
                        self.tag(target)
                    ));
                    passive::on_status_change(self, target, &before);
                } else {
                    self.log("  · Last candle: no one left to carry the Attached Life");
                }
            }
        } else if victim == ids::CANDLEKEEPER {
            // A killer-sourced death attaches the candlekeeper's life to
            // the killer instead.
            let unused = self.chr(victim).map_or(false, |ch| !ch.memory.candle_used);
            if unused {
                if let Some(ch) = self.chr_mut(victim) {
                    ch.memory.candle_used = true;
                }
                if let Some(killer) = killer.filter(|&k| self.is_alive(k)) {
                    let uses = self.chr(victim).map_or(0, |ch| ch.memory.attached_uses);
                    if uses >= 2 {
                        self.log("  · Last candle: already granted twice this game");
                    } else {
                        let before = self.brief_of(killer);
                        if let Some(ch) = self.chr_mut(killer) {
                            ch.status.attached_life = true;
                            ch.memory.attached_life_of = Some(ids::CANDLEKEEPER);
                        }
                        if let Some(ch) = self.chr_mut(victim) {
                            ch.memory.attached_uses = uses + 1;
                        }
                        self.log(format!(
                            "  · Last candle: {} carries the Attached Life",
                            self.tag(killer)
                        ));
                        passive::on_status_change(self, killer, &before);
                    }
                }
            }
        }

        // The holder of an attached life falling brings the candlekeeper
        // back in its place.
        let holds = self.chr(victim).map_or(false, |ch| {
            ch.status.attached_life && ch.memory.attached_life_of == Some(ids::CANDLEKEEPER)
        });
        if holds && self.chr(ids::CANDLEKEEPER).map_or(false, |ch| !ch.alive) {
            let pos = self.position(victim);
            if let Some(ch) = self.chr_mut(ids::CANDLEKEEPER) {
                ch.alive = true;
                ch.status.thunder = 0;
            }
            self.rank.retain(|&c| c != ids::CANDLEKEEPER);
            match pos {
                Some(p) => self.rank.insert(p.min(self.rank.len()), ids::CANDLEKEEPER),
                None => self.rank.push(ids::CANDLEKEEPER),
            }
            self.compact();
            self.log(format!(
                "  · Last candle: the carrier {} falls → {} returns in their place",
                self.tag(victim),
                self.tag(ids::CANDLEKEEPER)
            ));
        }
    }

    /// The collector gathers a blessing from every foreign death; eight
    /// blessings convert into a shield layer.
    fn collector_blessing_on_death(&mut self, victim: CharacterId) {
        if victim == ids::COLLECTOR {
            return;
        }
        let active = self
            .chr(ids::COLLECTOR)
            .map_or(false, |ch| ch.alive && !ch.status.disabled);
        if !active {
            return;
        }
        let blessings = {
            let Some(ch) = self.chr_mut(ids::COLLECTOR) else {
                return;
            };
            ch.memory.blessing += 1;
            ch.memory.blessing
        };
        self.log(format!(
            "  · {} gathers a blessing ({} held)",
            self.tag(ids::COLLECTOR),
            blessings
        ));
        if blessings >= 8 {
            self.log(format!(
                "  · {} trades 8 blessings for a shield layer",
                self.tag(ids::COLLECTOR)
            ));
            self.give_shield(ids::COLLECTOR, 1, 1, false, "blessings cashed in");
            if let Some(ch) = self.chr_mut(ids::COLLECTOR) {
                ch.memory.blessing = 0;
            }
        }
    }

    /// The solar's first death corrupts the killer.
    fn solar_on_death(&mut self, victim: CharacterId, killer: Option<CharacterId>) {
        if victim != ids::SOLAR {
            return;
        }
        let deaths = {
            let Some(ch) = self.chr_mut(ids::SOLAR) else {
                return;
            };
            ch.memory.death_times += 1;
            ch.memory.death_times
        };
        if deaths == 1 {
            if let Some(killer) = killer.filter(|&k| self.is_alive(k)) {
                let fresh = self.status_of(killer).map_or(false, |st| !st.corrupted);
                if fresh {
                    if let Some(st) = self.status_mut(killer) {
                        st.corrupted = true;
                    }
                    self.log(format!(
                        "  · Destiny's toll: {} is Corrupted",
                        self.tag(killer)
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::elimination::REASON_FINAL_STAND;
    use crate::engine::{Game, GameConfig};
    use crate::models::ids;

    fn game(seed: u64) -> Game {
        Game::new(GameConfig { seed: Some(seed), ..Default::default() })
    }

    /// Pick a victim with no death-side ability of its own.
    fn plain_victim(g: &Game) -> crate::models::CharacterId {
        g.alive_ids()
            .into_iter()
            .find(|&c| {
                ![
                    ids::CALLIGRAPHER,
                    ids::TIDECALLER,
                    ids::SPLITMIND,
                    ids::COLLECTOR,
                    ids::ARCHIVIST,
                    ids::GRUDGE,
                    ids::AVENGER,
                    ids::RAINMAKER,
                    ids::SOLAR,
                    ids::CANDLEKEEPER,
                    ids::TRUTHSEER,
                    ids::DUELIST,
                ]
                .contains(&c)
            })
            .unwrap()
    }

    #[test]
    fn test_shield_intercepts_and_is_consumed() {
        let mut g = game(21);
        let victim = plain_victim(&g);
        g.give_shield(victim, 1, 2, false, "");
        assert_eq!(g.status_of(victim).unwrap().total_shields(), 1);
        let died = g.kill(victim, None, "test blow", false, false);
        assert!(!died);
        assert!(g.is_alive(victim));
        assert_eq!(g.status_of(victim).unwrap().total_shields(), 0);
    }

    #[test]
    fn test_bypass_shield_ignores_layers() {
        let mut g = game(22);
        let victim = plain_victim(&g);
        g.give_shield(victim, 2, 2, false, "");
        let died = g.kill(victim, None, "piercing blow", true, false);
        assert!(died);
        assert!(!g.is_alive(victim));
    }

    #[test]
    fn test_elimination_history_survives_revival() {
        let mut g = game(23);
        // First death, revival, second death: the history keeps both.
        assert!(g.kill(ids::SPLITMIND, None, "first blow", true, false) == false);
        assert!(g.is_alive(ids::SPLITMIND), "first charge intercepts");
        assert!(!g.kill(ids::SPLITMIND, None, "second blow", true, false));
        assert!(g.kill(ids::SPLITMIND, None, "third blow", true, false));
        assert_eq!(
            g.elimination_order().iter().filter(|&&c| c == ids::SPLITMIND).count(),
            1
        );
        // Revive manually and fell again: a second history entry appears,
        // the first is never erased.
        g.compact();
        g.chr_mut(ids::SPLITMIND).unwrap().alive = true;
        g.rank.push(ids::SPLITMIND);
        assert!(g.kill(ids::SPLITMIND, None, "fourth blow", true, false));
        assert_eq!(
            g.elimination_order().iter().filter(|&&c| c == ids::SPLITMIND).count(),
            2
        );
    }

    #[test]
    fn test_calligrapher_rebirth_claims_rank_one() {
        let mut g = game(24);
        let died = g.kill(ids::CALLIGRAPHER, None, "test blow", false, false);
        assert!(!died);
        assert!(g.is_alive(ids::CALLIGRAPHER));
        assert!(g.status_of(ids::CALLIGRAPHER).unwrap().disabled);
        assert_eq!(g.rank_no(ids::CALLIGRAPHER), Some(1));
        // The gate is once per game.
        let died = g.kill(ids::CALLIGRAPHER, None, "second blow", false, false);
        assert!(died);
    }

    #[test]
    fn test_archivist_immunity_yields_to_final_stand() {
        let mut g = game(25);
        g.status_mut(ids::ARCHIVIST).unwrap().spec_immune = 2;
        assert!(!g.kill(ids::ARCHIVIST, None, "ordinary blow", true, true));
        assert!(g.kill(ids::ARCHIVIST, None, REASON_FINAL_STAND, true, true));
    }

    #[test]
    fn test_solar_first_death_corrupts_killer() {
        let mut g = game(26);
        let killer = plain_victim(&g);
        assert!(g.kill(ids::SOLAR, Some(killer), "test blow", true, true));
        assert!(g.status_of(killer).unwrap().corrupted);
    }
}
