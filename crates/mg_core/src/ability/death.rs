//! Death-triggered reactive abilities, resolved in the order deaths
//! occurred, plus the delayed-curse resolution they can leave behind.

use rand::seq::SliceRandom;

use crate::engine::{Game, REASON_VENGEANCE};
use crate::models::{ids, CharacterId, VengeanceCurse};

/// The grudge's eruption: brand the killer with a curse anchored to the
/// grudge's start-of-turn rank. Checked before the killer acts next turn.
pub(crate) fn grudge_eruption(game: &mut Game, killer: Option<CharacterId>) {
    let Some(killer) = killer.filter(|&k| game.is_alive(k)) else {
        game.log("  · Grudge eruption: no living culprit to brand");
        return;
    };
    let threshold = game
        .start_rank_snapshot
        .get(&ids::GRUDGE)
        .copied()
        .unwrap_or(usize::MAX);
    if let Some(st) = game.status_mut(killer) {
        st.vengeance = Some(VengeanceCurse { threshold_rank: threshold });
    }
    game.log(format!(
        "  · Grudge eruption: brands the culprit {}; next turn, standing above rank {} means death (shields void)",
        game.tag(killer),
        threshold
    ));
}

/// Resolve pending curses at the start of a turn, before the cursed
/// characters get to act.
pub(crate) fn resolve_vengeance_curses(game: &mut Game) {
    for cid in game.alive_ids() {
        let Some(curse) = game.status_of(cid).and_then(|st| st.vengeance) else {
            continue;
        };
        match game.rank_no(cid) {
            Some(cur) if cur < curse.threshold_rank => {
                game.log(format!(
                    "[Vengeance] {} stands above the branded threshold → struck down (shields void)",
                    game.tag(cid)
                ));
                game.kill(cid, Some(ids::GRUDGE), REASON_VENGEANCE, true, true);
            }
            _ => {}
        }
        if let Some(st) = game.status_mut(cid) {
            st.vengeance = None;
        }
    }
    game.compact();
}

/// Blood calls for blood: the avenger's first elimination revives it,
/// counter-kills the killer, and drops the avenger to the back.
pub(crate) fn avenger_rebirth(game: &mut Game, killer: Option<CharacterId>) {
    let me = ids::AVENGER;
    let triggers = game
        .chr(me)
        .map_or(false, |ch| !ch.status.disabled && !ch.memory.revive_used);
    if !triggers {
        game.log("  · Blood for blood: already spent, nothing stirs");
        return;
    }
    if let Some(ch) = game.chr_mut(me) {
        ch.memory.revive_used = true;
        ch.alive = true;
    }
    game.log(format!("  · Blood for blood: {} rises from its first fall", game.tag(me)));
    match killer.filter(|&k| game.is_alive(k)) {
        Some(killer) => {
            game.log(format!("    ↳ strikes back at {}", game.tag(killer)));
            game.kill(killer, Some(me), "blood for blood", false, false);
        }
        None => game.log("    ↳ no living culprit; no reprisal"),
    }
    // Back of the line after the reprisal.
    game.rank.retain(|&c| c != me);
    game.rank.push(me);
    game.compact();
}

/// The rainmaker's legacy: bring back someone dead for more than three
/// turns, into the middle of the ranking.
pub(crate) fn rainmaker_legacy(game: &mut Game) {
    let turn = game.turn();
    let cand: Vec<CharacterId> = game
        .characters
        .values()
        .filter(|ch| {
            ch.id != ids::RAINMAKER
                && !ch.alive
                && ch.memory.dead_turn.map_or(false, |t| turn.saturating_sub(t) > 3)
        })
        .map(|ch| ch.id)
        .collect();
    let Some(&t) = cand.choose(&mut game.rng) else {
        return;
    };
    if let Some(ch) = game.chr_mut(t) {
        ch.alive = true;
    }
    game.log(format!(
        "  · The rainmaker's legacy: {} returns (dead for more than 3 turns)",
        game.tag(t)
    ));
    game.compact();
    let mid = (game.rank.len() / 2 + 1).max(1);
    if game.position(t).is_none() {
        game.rank.insert(mid - 1, t);
    }
    game.compact();
}

#[cfg(test)]
mod tests {
    use crate::engine::{Game, GameConfig};
    use crate::models::ids;

    fn game(seed: u64) -> Game {
        Game::new(GameConfig { seed: Some(seed), ..Default::default() })
    }

    #[test]
    fn test_avenger_revives_once_and_strikes_back() {
        let mut g = game(51);
        let killer = g
            .alive_ids()
            .into_iter()
            .find(|&c| {
                ![ids::AVENGER, ids::CALLIGRAPHER, ids::SPLITMIND, ids::TIDECALLER, ids::DUELIST]
                    .contains(&c)
            })
            .unwrap();
        assert!(g.kill(ids::AVENGER, Some(killer), "test blow", true, true));
        crate::ability::death::avenger_rebirth(&mut g, Some(killer));
        assert!(g.is_alive(ids::AVENGER));
        let n = g.alive_ids().len();
        assert_eq!(g.rank_no(ids::AVENGER), Some(n), "rises at the back of the line");
        // Second death stays a death.
        assert!(g.kill(ids::AVENGER, Some(killer), "again", true, true));
        crate::ability::death::avenger_rebirth(&mut g, Some(killer));
        assert!(!g.is_alive(ids::AVENGER));
    }

    #[test]
    fn test_vengeance_curse_spares_those_below_threshold() {
        let mut g = game(52);
        let victim = g
            .alive_ids()
            .into_iter()
            .find(|&c| c != ids::GRUDGE && c != ids::ARCHIVIST)
            .unwrap();
        g.status_mut(victim).unwrap().vengeance =
            Some(crate::models::VengeanceCurse { threshold_rank: 1 });
        crate::ability::death::resolve_vengeance_curses(&mut g);
        assert!(g.is_alive(victim), "nobody outranks threshold 1");
        assert!(g.status_of(victim).unwrap().vengeance.is_none(), "the curse is spent");
    }
}
