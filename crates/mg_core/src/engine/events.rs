//! The random-event layer: a flat per-turn chance of exactly one event
//! from a fixed catalog, plus the auto-acting transient NPCs two of the
//! events leave behind.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::ability::passive;
use crate::models::{ids, Character, CharacterId, PATRON_NPC_ID, STORMCALLER_NPC_ID};

use super::Game;

const EVENT_CHANCE: f64 = 0.25;
const NPC_CASTS: u8 = 3;

impl Game {
    /// Roll the per-turn event chance (never on turn 1) and run one
    /// uniformly chosen event.
    pub(crate) fn step_random_event(&mut self) {
        if self.turn <= 1 {
            return;
        }
        if !self.rng.gen_bool(EVENT_CHANCE) {
            return;
        }
        let picks: [(&str, fn(&mut Game) -> String); 6] = [
            ("The Patron Descends", Game::event_spawn_patron),
            ("The Stormcaller Descends", Game::event_spawn_stormcaller),
            ("Sunlight Under the Ice", Game::event_mass_revival),
            ("Heaven Overturned", Game::event_reverse_ranking),
            ("Redox Reaction", Game::event_redox),
            ("The Dice", Game::event_shuffle_ranking),
        ];
        let Some(&(name, handler)) = picks.choose(&mut self.rng) else {
            return;
        };
        let desc = handler(self);
        if desc.is_empty() {
            self.log(format!("✦ Random event: [{}]!", name));
        } else {
            self.log(format!("✦ Random event: [{}]! {}", name, desc));
        }
        self.compact();
    }

    fn ensure_npc(&mut self, cid: CharacterId, name: &str) {
        if let Some(ch) = self.characters.get_mut(&cid) {
            ch.alive = true;
            if self.position(cid).is_none() {
                let pos = self.rng.gen_range(0..=self.rank.len());
                self.rank.insert(pos, cid);
            }
            return;
        }
        self.characters.insert(cid, Character::new(cid, name));
        let pos = self.rng.gen_range(0..=self.rank.len());
        self.rank.insert(pos, cid);
    }

    fn event_spawn_patron(&mut self) -> String {
        self.ensure_npc(PATRON_NPC_ID, "Patron");
        if let Some(ch) = self.chr_mut(PATRON_NPC_ID) {
            ch.memory.npc_casts = 0;
        }
        "The patron joins the game and will cast for the next 3 turns.".into()
    }

    fn event_spawn_stormcaller(&mut self) -> String {
        self.ensure_npc(STORMCALLER_NPC_ID, "Stormcaller");
        if let Some(ch) = self.chr_mut(STORMCALLER_NPC_ID) {
            ch.memory.npc_casts = 0;
        }
        "The stormcaller joins the game and will cast for the next 3 turns.".into()
    }

    /// Revive up to three of the fallen, under exclusion rules that keep
    /// chain-reaction statuses out of play.
    fn event_mass_revival(&mut self) -> String {
        let dead: Vec<CharacterId> = self
            .characters
            .values()
            .filter(|ch| {
                !ch.alive
                    && ch.id != PATRON_NPC_ID
                    && ch.id != STORMCALLER_NPC_ID
                    && !(ch.id == ids::SOLAR && ch.status.corrupted)
                    && !(ch.id == ids::CANDLEKEEPER && ch.memory.candle_used)
            })
            .map(|ch| ch.id)
            .collect();
        if dead.is_empty() {
            return "But no one could be brought back.".into();
        }
        let k = dead.len().min(3);
        let picks: Vec<CharacterId> =
            dead.choose_multiple(&mut self.rng, k).copied().collect();
        for &cid in &picks {
            // Removed from history so final-placement math stays sane.
            self.elimination_order.retain(|&c| c != cid);
            if let Some(ch) = self.chr_mut(cid) {
                ch.alive = true;
                ch.status.thunder = 0;
                ch.status.dying = 0;
            }
            if self.position(cid).is_none() {
                let pos = self.rng.gen_range(0..=self.rank.len());
                self.rank.insert(pos, cid);
            }
        }
        let names: Vec<String> = picks.iter().map(|&c| self.tag(c)).collect();
        format!("Revived {}.", names.join(", "))
    }

    fn event_reverse_ranking(&mut self) -> String {
        self.rank.reverse();
        "The entire ranking flips upside down.".into()
    }

    fn event_shuffle_ranking(&mut self) -> String {
        let mut rank = std::mem::take(&mut self.rank);
        rank.shuffle(&mut self.rng);
        self.rank = rank;
        "The entire ranking is thrown to chance.".into()
    }

    /// Two disjoint random pairs of survivors: one pair oxidizes (rises a
    /// rank per turn), the other reduces (sinks a rank per turn), three
    /// turns each.
    fn event_redox(&mut self) -> String {
        let mut pool: Vec<CharacterId> = self
            .alive_ids()
            .into_iter()
            .filter(|&c| c != PATRON_NPC_ID && c != STORMCALLER_NPC_ID)
            .collect();
        if pool.is_empty() {
            return "But no one was affected.".into();
        }
        pool.shuffle(&mut self.rng);
        let oxid: Vec<CharacterId> = pool.iter().copied().take(2).collect();
        let reduc: Vec<CharacterId> = pool.iter().copied().skip(2).take(2).collect();
        for &cid in &oxid {
            let before = self.brief_of(cid);
            if let Some(st) = self.status_mut(cid) {
                st.oxidize = st.oxidize.max(3);
            }
            passive::on_status_change(self, cid, &before);
        }
        for &cid in &reduc {
            let before = self.brief_of(cid);
            if let Some(st) = self.status_mut(cid) {
                st.reduce = st.reduce.max(3);
            }
            passive::on_status_change(self, cid, &before);
        }
        let fmt = |list: &[CharacterId]| {
            list.iter().map(|&c| self.tag(c)).collect::<Vec<_>>().join(", ")
        };
        format!(
            "{} take Oxidize for 3 turns; {} take Reduce for 3 turns.",
            fmt(&oxid),
            fmt(&reduc)
        )
    }

    /// Any present event NPC acts once per turn: reinserts itself at a
    /// random rank, blesses or curses both rank neighbors, and departs
    /// for good after its third cast.
    pub(crate) fn step_npc_actions(&mut self) {
        if self.chr(PATRON_NPC_ID).map_or(false, |ch| ch.alive) {
            self.npc_cast_patron();
        }
        if self.chr(STORMCALLER_NPC_ID).map_or(false, |ch| ch.alive) {
            self.npc_cast_stormcaller();
        }
        self.compact();
    }

    fn npc_reinsert(&mut self, cid: CharacterId) {
        self.rank.retain(|&c| c != cid);
        let pos = self.rng.gen_range(0..=self.rank.len());
        self.rank.insert(pos, cid);
    }

    fn npc_neighbors(&self, cid: CharacterId) -> Vec<CharacterId> {
        let Some(i) = self.position(cid) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if i > 0 {
            out.push(self.rank[i - 1]);
        }
        if i + 1 < self.rank.len() {
            out.push(self.rank[i + 1]);
        }
        out
    }

    fn npc_depart(&mut self, cid: CharacterId, name: &str) {
        if let Some(ch) = self.chr_mut(cid) {
            ch.alive = false;
        }
        self.rank.retain(|&c| c != cid);
        self.log(format!("  · The {} departs", name));
    }

    fn npc_cast_patron(&mut self) {
        let casts = self.chr(PATRON_NPC_ID).map_or(0, |ch| ch.memory.npc_casts);
        if casts >= NPC_CASTS {
            self.npc_depart(PATRON_NPC_ID, "patron");
            return;
        }
        self.npc_reinsert(PATRON_NPC_ID);
        for t in self.npc_neighbors(PATRON_NPC_ID) {
            if self.is_alive(t) {
                self.give_shield(t, 1, 0, true, "the patron's favor");
            }
        }
        if let Some(ch) = self.chr_mut(PATRON_NPC_ID) {
            ch.memory.npc_casts = casts + 1;
        }
        self.log(format!(
            "  · The patron casts: shifts at random and shields both neighbors ({}/{})",
            casts + 1,
            NPC_CASTS
        ));
        if casts + 1 >= NPC_CASTS {
            self.npc_depart(PATRON_NPC_ID, "patron");
        }
    }

    fn npc_cast_stormcaller(&mut self) {
        let casts = self.chr(STORMCALLER_NPC_ID).map_or(0, |ch| ch.memory.npc_casts);
        if casts >= NPC_CASTS {
            self.npc_depart(STORMCALLER_NPC_ID, "stormcaller");
            return;
        }
        self.npc_reinsert(STORMCALLER_NPC_ID);
        for t in self.npc_neighbors(STORMCALLER_NPC_ID) {
            if self.is_alive(t) {
                self.add_thunder(t, 1, None);
            }
        }
        if let Some(ch) = self.chr_mut(STORMCALLER_NPC_ID) {
            ch.memory.npc_casts = casts + 1;
        }
        self.log(format!(
            "  · The stormcaller casts: shifts at random and thunders both neighbors ({}/{})",
            casts + 1,
            NPC_CASTS
        ));
        if casts + 1 >= NPC_CASTS {
            self.npc_depart(STORMCALLER_NPC_ID, "stormcaller");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{Game, GameConfig};
    use crate::models::PATRON_NPC_ID;

    fn game(seed: u64) -> Game {
        Game::new(GameConfig { seed: Some(seed), ..Default::default() })
    }

    #[test]
    fn test_npc_departs_after_three_casts() {
        let mut g = game(41);
        g.event_spawn_patron();
        assert!(g.is_alive(PATRON_NPC_ID));
        for _ in 0..3 {
            g.step_npc_actions();
        }
        assert!(!g.is_alive(PATRON_NPC_ID));
        assert!(g.position(PATRON_NPC_ID).is_none());
    }

    #[test]
    fn test_mass_revival_restores_up_to_three() {
        let mut g = game(42);
        let victims: Vec<_> = g.alive_ids().into_iter().take(5).collect();
        for &v in &victims {
            g.chr_mut(v).unwrap().alive = false;
            g.elimination_order.push(v);
        }
        g.compact();
        let before = g.alive_ids().len();
        g.event_mass_revival();
        assert_eq!(g.alive_ids().len(), before + 3);
    }

    #[test]
    fn test_reverse_event_flips_the_order() {
        let mut g = game(43);
        let before = g.alive_ids();
        g.event_reverse_ranking();
        let mut flipped = before.clone();
        flipped.reverse();
        assert_eq!(g.alive_ids(), flipped);
    }
}
