//! End-of-turn cleanup: compaction, corruption spread, timed-status decay
//! with per-tick positional effects, and the per-ability end-of-turn
//! passives.

use std::collections::BTreeSet;

use crate::ability::passive;
use crate::models::{ids, CharacterId};

use super::Game;

impl Game {
    pub(crate) fn step_cleanup(&mut self) {
        self.compact();
        self.spread_corruption_and_check();
        passive::purifier_burst_check(self);

        let roster_now = self.alive_ids();
        for cid in roster_now {
            if !self.is_alive(cid) {
                continue;
            }
            let before_brief = self.brief_of(cid);

            passive::adjudicator_endcheck(self, cid);
            passive::rampart_endcheck(self, cid);

            // Plain duration decay.
            if let Some(st) = self.status_mut(cid) {
                if st.shield_ttl > 0 {
                    st.shield_ttl -= 1;
                    if st.shield_ttl == 0 {
                        st.shields = 0;
                    }
                }
                if st.sealed > 0 {
                    st.sealed -= 1;
                }
                if st.forgotten > 0 {
                    st.forgotten -= 1;
                }
                if st.null_field > 0 {
                    st.null_field -= 1;
                }
                if st.dying > 0 {
                    st.dying -= 1;
                }
                if st.spec_immune > 0 {
                    st.spec_immune -= 1;
                }
            }

            // Statuses with a positional effect on every tick.
            if self.status_of(cid).map_or(0, |s| s.detour) > 0 {
                self.move_by(cid, 1, None, "detour drags down");
                if let Some(st) = self.status_mut(cid) {
                    st.detour -= 1;
                }
            }
            if self.status_of(cid).map_or(0, |s| s.bulwark) > 0 {
                self.move_by(cid, -1, None, "bulwark holds the line");
                if let Some(st) = self.status_mut(cid) {
                    st.bulwark -= 1;
                    if st.bulwark == 0 {
                        st.bulwark_spent = false;
                    }
                }
            }
            if self.status_of(cid).map_or(0, |s| s.advocacy) > 0 {
                self.move_by(cid, -1, None, "advocacy lifts");
                if let Some(st) = self.status_mut(cid) {
                    st.advocacy -= 1;
                }
            }
            if self.status_of(cid).map_or(0, |s| s.radiance) > 0 {
                self.move_by(cid, -1, None, "radiance lifts");
                if let Some(st) = self.status_mut(cid) {
                    st.radiance -= 1;
                }
            }
            // Galvanize bursts at full stacks, draining one per turn.
            if self.status_of(cid).map_or(0, |s| s.galvanize) >= 3 {
                self.move_by(cid, -3, None, "galvanic burst");
                if let Some(st) = self.status_mut(cid) {
                    st.galvanize = st.galvanize.saturating_sub(1);
                }
            }
            // Momentum at full stacks keeps lifting without draining.
            if self.status_of(cid).map_or(0, |s| s.momentum) >= 3 {
                self.move_by(cid, -3, None, "momentum carries");
            }
            if self.status_of(cid).map_or(0, |s| s.oxidize) > 0 {
                self.move_by(cid, -1, None, "oxidize lifts");
                if let Some(st) = self.status_mut(cid) {
                    st.oxidize -= 1;
                }
            }
            if self.status_of(cid).map_or(0, |s| s.reduce) > 0 {
                self.move_by(cid, 1, None, "reduce drags down");
                if let Some(st) = self.status_mut(cid) {
                    st.reduce -= 1;
                }
            }
            // The NPC bounties work until their absorb is spent.
            if self.status_of(cid).map_or(false, |s| s.patron_gift) {
                self.move_by(cid, -2, None, "patron's gift lifts");
            }
            if self.status_of(cid).map_or(false, |s| s.storm_bracelet) {
                if let Some(r) = self.rank_no(cid) {
                    if r > 1 {
                        let above = self.rank[r - 2];
                        if self.is_alive(above) {
                            self.log(format!(
                                "  · Storm bracelet: {} thunders the rank above, {}",
                                self.tag(cid),
                                self.tag(above)
                            ));
                            self.add_thunder(above, 1, None);
                            self.compact();
                        }
                    }
                }
            }
            if self.status_of(cid).map_or(false, |s| s.lone_wolf)
                && cid == ids::LONEWOLF
                && !self.status_of(cid).map_or(true, |s| s.disabled)
            {
                self.move_by(cid, -1, None, "the lone wolf strides");
            }

            passive::beacon_endcheck(self, cid);
            passive::diehard_endcheck(self, cid);
            passive::stormcrown_arm(self, cid);

            // Cooldown counters tick once per turn, acted or not.
            if let Some(ch) = self.chr_mut(cid) {
                let mem = &mut ch.memory;
                for cd in [
                    &mut mem.execute_cd,
                    &mut mem.kill_cd,
                    &mut mem.warp_cd,
                    &mut mem.aegis_cd,
                    &mut mem.flip_cd,
                    &mut mem.drought_cd,
                    &mut mem.chaos_cd,
                    &mut mem.purify_cd,
                    &mut mem.frontline_cd,
                ] {
                    *cd = cd.saturating_sub(1);
                }
            }

            passive::on_status_change(self, cid, &before_brief);
        }

        passive::matron_endcheck(self);
        passive::heir_endcheck(self);
        passive::undertow_endcheck(self);
        passive::lonewolf_check(self);
    }

    /// Corruption seeps into rank neighbors; the moment every survivor
    /// carries it, it burns away field-wide and the solar's revival
    /// bonus fires (once per game).
    fn spread_corruption_and_check(&mut self) {
        let alive = self.alive_ids();
        if alive.is_empty() {
            return;
        }
        let sources: Vec<CharacterId> = alive
            .iter()
            .copied()
            .filter(|&c| self.status_of(c).map_or(false, |s| s.corrupted))
            .collect();
        if !sources.is_empty() {
            let mut to_infect: BTreeSet<CharacterId> = BTreeSet::new();
            for cid in sources {
                let Some(p) = self.position(cid) else {
                    continue;
                };
                if p > 0 {
                    to_infect.insert(self.rank[p - 1]);
                }
                if p + 1 < self.rank.len() {
                    to_infect.insert(self.rank[p + 1]);
                }
            }
            let newly: Vec<CharacterId> = to_infect
                .into_iter()
                .filter(|&x| {
                    self.is_alive(x) && !self.status_of(x).map_or(false, |s| s.corrupted)
                })
                .collect();
            for &x in &newly {
                let before = self.brief_of(x);
                if let Some(st) = self.status_mut(x) {
                    st.corrupted = true;
                }
                passive::on_status_change(self, x, &before);
            }
            if !newly.is_empty() {
                let names: Vec<String> = newly.iter().map(|&c| self.tag(c)).collect();
                self.log(format!("[Corruption] spreads to: {}", names.join(", ")));
            }
        }

        let alive = self.alive_ids();
        let all_corrupted = !alive.is_empty()
            && alive
                .iter()
                .all(|&c| self.status_of(c).map_or(false, |s| s.corrupted));
        if !all_corrupted {
            return;
        }
        self.log("[Corruption] total corruption achieved: all of it burns away");
        let everyone: Vec<CharacterId> = self.characters.keys().copied().collect();
        for cid in everyone {
            let before = self.brief_of(cid);
            if let Some(st) = self.status_mut(cid) {
                st.corrupted = false;
            }
            passive::on_status_change(self, cid, &before);
        }
        let bonus_unused = self
            .chr(ids::SOLAR)
            .map_or(false, |ch| !ch.memory.solar_revive_used);
        if bonus_unused {
            if let Some(ch) = self.chr_mut(ids::SOLAR) {
                ch.memory.solar_revive_used = true;
            }
            if !self.is_alive(ids::SOLAR) {
                let cleared = {
                    let Some(ch) = self.chr_mut(ids::SOLAR) else {
                        return;
                    };
                    ch.alive = true;
                    let cleared = ch.status.thunder >= 3;
                    ch.status.thunder = 0;
                    cleared
                };
                if cleared {
                    self.log("  · Thunder cleared: the solar returns at zero stacks");
                }
                self.compact();
                self.rank.insert(0, ids::SOLAR);
                self.compact();
                self.log(format!(
                    "[Out of nothing] {} revives at rank 1",
                    self.tag(ids::SOLAR)
                ));
            } else {
                self.log("[Out of nothing] the revival would fire, but the solar still stands (once per game)");
            }
        }
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
    fn test_timed_statuses_decay_each_cleanup() {
        let mut g = game(61);
        let cid = g.alive_ids()[0];
        {
            let st = g.status_mut(cid).unwrap();
            st.sealed = 2;
            st.forgotten = 1;
            st.spec_immune = 1;
        }
        g.step_cleanup();
        let st = g.status_of(cid).unwrap();
        assert_eq!(st.sealed, 1);
        assert_eq!(st.forgotten, 0);
        assert_eq!(st.spec_immune, 0);
    }

    #[test]
    fn test_temporary_shields_expire_with_their_ttl() {
        let mut g = game(62);
        let cid = g.alive_ids()[0];
        g.give_shield(cid, 1, 1, false, "");
        g.step_cleanup();
        assert_eq!(g.status_of(cid).unwrap().total_shields(), 0);
    }

    #[test]
    fn test_corruption_spreads_to_neighbors() {
        let mut g = game(63);
        let alive = g.alive_ids();
        let mid = alive[5];
        g.status_mut(mid).unwrap().corrupted = true;
        g.spread_corruption_and_check();
        let corrupted = g
            .alive_ids()
            .into_iter()
            .filter(|&c| g.status_of(c).map_or(false, |s| s.corrupted))
            .count();
        assert!(corrupted >= 3, "at least both original neighbors caught it");
    }

    #[test]
    fn test_total_corruption_burns_away_and_revives_solar() {
        let mut g = game(64);
        g.kill(ids::SOLAR, None, "setup", true, true);
        g.compact();
        for c in g.alive_ids() {
            g.status_mut(c).unwrap().corrupted = true;
        }
        g.spread_corruption_and_check();
        assert!(g.is_alive(ids::SOLAR), "the solar returns");
        assert_eq!(g.rank_no(ids::SOLAR), Some(1));
        assert!(g
            .alive_ids()
            .into_iter()
            .all(|c| !g.status_of(c).map_or(false, |s| s.corrupted)));
    }
}
