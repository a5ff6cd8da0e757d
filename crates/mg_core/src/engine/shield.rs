//! Shield grant and consumption.

use crate::ability::passive;
use crate::models::{ids, CharacterId};

use super::Game;

impl Game {
    /// Grant up to `n` shield layers, clamped so the displayed total never
    /// exceeds 2. Logs only the delta actually applied; a grant that has
    /// no effect still leaves an audit line.
    pub(crate) fn give_shield(
        &mut self,
        cid: CharacterId,
        n: u8,
        ttl: u8,
        permanent: bool,
        note: &str,
    ) {
        if !self.is_alive(cid) {
            return;
        }
        let before_brief = self.brief_of(cid);
        let (before, after) = {
            let Some(st) = self.status_mut(cid) else {
                return;
            };
            let before = st.total_shields();
            let room = 2u8.saturating_sub(before);
            let add = n.min(room);
            if add > 0 {
                if permanent {
                    st.shield_perm += add;
                } else {
                    st.shields += add;
                    st.shield_ttl = st.shield_ttl.max(ttl);
                }
            }
            (before, st.total_shields())
        };
        let suffix = if note.is_empty() { String::new() } else { format!(" [{}]", note) };
        if after > before {
            self.log(format!("  · {} gains shield +{}{}", self.tag(cid), after - before, suffix));
            passive::on_status_change(self, cid, &before_brief);
        } else {
            self.log(format!("  · {} is already at the shield cap{}", self.tag(cid), suffix));
        }
    }

    /// Consume exactly one absorption: temporary layer first, then
    /// permanent, then the event-granted one-shot absorbs (patron's gift
    /// before storm bracelet). Returns whether something absorbed the hit.
    pub(crate) fn consume_shield_once(&mut self, cid: CharacterId) -> bool {
        let before_brief = self.brief_of(cid);
        enum Consumed {
            Temp,
            Perm,
            Gift,
            Bracelet,
            Nothing,
        }
        let consumed = {
            let Some(st) = self.status_mut(cid) else {
                return false;
            };
            if st.shields > 0 {
                st.shields -= 1;
                Consumed::Temp
            } else if st.shield_perm > 0 {
                st.shield_perm -= 1;
                Consumed::Perm
            } else if st.patron_gift {
                st.patron_gift = false;
                Consumed::Gift
            } else if st.storm_bracelet {
                st.storm_bracelet = false;
                Consumed::Bracelet
            } else {
                Consumed::Nothing
            }
        };
        match consumed {
            Consumed::Temp => {
                // The collector surges when its last temporary layer breaks.
                let surges = cid == ids::COLLECTOR
                    && self.is_alive(cid)
                    && self.status_of(cid).map_or(false, |st| {
                        st.shields == 0 && !st.disabled
                    });
                if surges {
                    self.move_by(ids::COLLECTOR, -5, None, "shield-break surge");
                }
                passive::on_status_change(self, cid, &before_brief);
                true
            }
            Consumed::Perm => {
                passive::on_status_change(self, cid, &before_brief);
                true
            }
            Consumed::Gift => {
                self.log(format!("  · Patron's gift absorbs the blow: {} (spent)", self.tag(cid)));
                passive::on_status_change(self, cid, &before_brief);
                true
            }
            Consumed::Bracelet => {
                self.log(format!("  · Storm bracelet absorbs the blow: {} (spent)", self.tag(cid)));
                passive::on_status_change(self, cid, &before_brief);
                true
            }
            Consumed::Nothing => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{Game, GameConfig};

    fn game() -> Game {
        Game::new(GameConfig { seed: Some(11), ..Default::default() })
    }

    #[test]
    fn test_shield_cap_holds_across_pools() {
        let mut g = game();
        let cid = g.alive_ids()[0];
        g.give_shield(cid, 1, 2, false, "");
        g.give_shield(cid, 2, 2, true, "");
        assert_eq!(g.status_of(cid).unwrap().total_shields(), 2);
        // A further grant is a logged no-op.
        g.give_shield(cid, 1, 1, false, "");
        assert_eq!(g.status_of(cid).unwrap().total_shields(), 2);
    }

    #[test]
    fn test_consumption_prefers_temporary_layers() {
        let mut g = game();
        let cid = g.alive_ids()[0];
        g.give_shield(cid, 1, 2, false, "");
        g.give_shield(cid, 1, 0, true, "");
        assert!(g.consume_shield_once(cid));
        let st = g.status_of(cid).unwrap();
        assert_eq!(st.shields, 0, "temporary layer goes first");
        assert_eq!(st.shield_perm, 1);
    }

    #[test]
    fn test_one_shot_absorbs_are_single_use() {
        let mut g = game();
        let cid = g.alive_ids()[0];
        g.status_mut(cid).unwrap().patron_gift = true;
        assert!(g.consume_shield_once(cid));
        assert!(!g.status_of(cid).unwrap().patron_gift);
        assert!(!g.consume_shield_once(cid));
    }
}
