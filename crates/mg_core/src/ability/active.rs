//! Active skills, one function per character, dispatched once per turn
//! from the active-skills phase.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::ability::passive::{self, TwinEffect};
use crate::engine::Game;
use crate::error::{AbilityError, AbilityResult};
use crate::models::{ids, CharacterId};

/// Counter surge: every 3rd activation, if stuck in the back 60%, swap
/// with a random front-half character — then execute whoever occupies the
/// old rank.
pub(super) fn vanguard(game: &mut Game) -> AbilityResult {
    let me = ids::VANGUARD;
    let count = {
        let ch = game.chr_mut(me).ok_or(AbilityError::MissingCharacter(me))?;
        ch.memory.activation_count += 1;
        ch.memory.activation_count
    };
    if count % 3 != 0 {
        game.log("  · Counter surge: still charging (fires every 3rd activation)");
        return Ok(());
    }
    let alive = game.alive_ids();
    let Some(myr) = game.rank_no(me) else {
        return Ok(());
    };
    if myr <= alive.len() * 2 / 5 {
        game.log("  · Counter surge: not in the back 60%, nothing to overturn");
        return Ok(());
    }
    let front: Vec<CharacterId> = alive
        .iter()
        .copied()
        .take((alive.len() / 2).max(1))
        .filter(|&x| x != me)
        .collect();
    let Some(target) = game.pick_random(me, front, "counter surge swap") else {
        return Ok(());
    };
    let old_rank = myr;
    game.swap_ranks(me, target, Some(me), "counter surge");
    game.compact();
    if old_rank <= game.rank.len() {
        let v = game.rank[old_rank - 1];
        if v != me {
            game.log(format!(
                "  · Light verdict: executes {} holding the old rank {}",
                game.tag(v),
                old_rank
            ));
            game.kill(v, Some(me), "light verdict follow-up", false, false);
        }
    }
    Ok(())
}

/// Skyfall: execute a random higher-ranked character; a blocked or
/// botched attempt costs two ranks. Cooldown 2 on success.
pub(super) fn skyblade(game: &mut Game) -> AbilityResult {
    let me = ids::SKYBLADE;
    let Some(myr) = game.rank_no(me) else {
        return Ok(());
    };
    let cd = game.chr(me).map_or(0, |ch| ch.memory.execute_cd);
    if cd > 0 {
        game.log(format!("  · Skyfall: execution cooling down ({} turns left)", cd));
        return Ok(());
    }
    let higher: Vec<CharacterId> = game
        .alive_ids()
        .into_iter()
        .filter(|&x| game.rank_no(x).map_or(false, |r| r < myr))
        .collect();
    if higher.is_empty() {
        game.log("  · Skyfall: no one ranked higher");
        return Ok(());
    }
    let Some(target) = game.pick_random(me, higher, "skyfall target") else {
        return Ok(());
    };
    if game.is_domain_unkillable(target) {
        game.log("  · Skyfall: the target's absolute domain holds → fails, self drops 2");
        game.move_by(me, 2, Some(me), "skyfall recoil");
        return Ok(());
    }
    if target == ids::UNDERTOW
        && game.chr(ids::UNDERTOW).map_or(false, |ch| ch.memory.immune_next)
    {
        if let Some(ch) = game.chr_mut(ids::UNDERTOW) {
            ch.memory.immune_next = false;
        }
        game.log("  · Skyfall: the undertow slips the blow → fails, self drops 2");
        game.move_by(me, 2, Some(me), "skyfall recoil");
        return Ok(());
    }
    game.log(format!("  · Skyfall: executes the higher-ranked {}", game.tag(target)));
    let died = game.kill(target, Some(me), "skyfall execution", false, false);
    if died {
        if let Some(ch) = game.chr_mut(me) {
            ch.memory.execute_cd = 2;
        }
    } else {
        game.log("  · Skyfall: the blow is absorbed → self drops 2");
        game.move_by(me, 2, Some(me), "skyfall recoil");
    }
    Ok(())
}

/// Null edge: on even turns, execute the character exactly four ranks
/// above, step into its position, and brand the three bystanders on the
/// path with a one-turn null field.
pub(super) fn bladedancer(game: &mut Game) -> AbilityResult {
    let me = ids::BLADEDANCER;
    if game.turn() % 2 != 0 {
        game.log("  · Null edge: off-turn (fires every second turn)");
        return Ok(());
    }
    let Some(myr) = game.rank_no(me) else {
        return Ok(());
    };
    if myr <= 4 {
        game.log("  · Null edge: no one exactly four ranks above");
        return Ok(());
    }
    let target_rank = myr - 4;
    let target = game.rank[target_rank - 1];
    if !game.is_alive(target) {
        game.log("  · Null edge: the marked position is already vacant");
        return Ok(());
    }
    if game.is_domain_unkillable(target) {
        game.log("  · Null edge: the target's absolute domain holds → cannot fire");
        return Ok(());
    }
    let path: Vec<CharacterId> = (target_rank + 1..myr)
        .filter_map(|rk| game.rank.get(rk - 1).copied())
        .filter(|&c| c != me && game.is_alive(c))
        .take(3)
        .collect();
    game.log(format!(
        "  · Null edge: executes rank {} ({}) and steps into its place",
        target_rank,
        game.tag(target)
    ));
    let died = game.kill(target, Some(me), "null edge execution", false, false);
    if !died {
        game.log("  · Null edge: the blow is absorbed → no advance, no null field");
        return Ok(());
    }
    game.compact();
    game.insert_rank(me, target_rank, None, "null edge advance");
    if !path.is_empty() {
        let names: Vec<String> = path.iter().map(|&c| game.tag(c)).collect();
        game.log(format!("  · Null field settles on the path: {}", names.join(", ")));
        for x in path {
            if game.apply_selection(Some(me), x, "null field") {
                let before = game.brief_of(x);
                if let Some(st) = game.status_mut(x) {
                    st.null_field = st.null_field.max(1);
                }
                passive::on_status_change(game, x, &before);
            }
        }
    }
    Ok(())
}

pub(super) fn undertow(game: &mut Game) -> AbilityResult {
    game.log("  · no active skill (the undertow stirs at end of turn)");
    Ok(())
}

/// Lowlight focus: brand a random other character with the unique
/// backfire focus.
pub(super) fn grudge(game: &mut Game) -> AbilityResult {
    let me = ids::GRUDGE;
    let pool: Vec<CharacterId> = game.alive_ids().into_iter().filter(|&x| x != me).collect();
    if pool.is_empty() {
        game.log("  · Lowlight focus: no target");
        return Ok(());
    }
    let Some(target) = game.pick_random(me, pool, "lowlight focus target") else {
        return Ok(());
    };
    let note = format!(
        "  · Lowlight focus: {} is Focused (the brand displaces any other focus on the field)",
        game.tag(target)
    );
    game.set_unique_focus(target, &note);
    Ok(())
}

/// Striding: climb one rank on odd turns, two on even; then cut down an
/// unshielded character left at the old position (3-turn kill lockout).
pub(super) fn strider(game: &mut Game) -> AbilityResult {
    let me = ids::STRIDER;
    let step = if game.turn() % 2 == 1 { 1 } else { 2 };
    let old = game.position(me);
    game.move_by(me, -step, Some(me), "striding");
    let Some(old) = old else {
        return Ok(());
    };
    let can_kill = match game.chr(me).and_then(|ch| ch.memory.strider_last_kill_turn) {
        None => true,
        Some(t) => game.turn().saturating_sub(t) >= 3,
    };
    let alive_now = game.alive_ids();
    if old + 1 < alive_now.len() {
        let target = alive_now[old + 1];
        if game.status_of(target).map_or(0, |s| s.total_shields()) == 0 {
            if can_kill {
                game.log(format!(
                    "  · Momentum strike: cuts down the unshielded {}",
                    game.tag(target)
                ));
                game.kill(target, Some(me), "momentum strike", false, false);
                let turn = game.turn();
                if let Some(ch) = game.chr_mut(me) {
                    ch.memory.strider_last_kill_turn = Some(turn);
                }
            } else {
                game.log("  · Momentum strike: lockout (at most once every 3 turns)");
            }
        } else {
            game.log("  · Momentum strike: the target is shielded");
        }
    }
    Ok(())
}

/// Sealing stroke (once per game) plus the ink execution on a random
/// lower-ranked character, rising two ranks after each stroke.
pub(super) fn calligrapher(game: &mut Game) -> AbilityResult {
    let me = ids::CALLIGRAPHER;
    let seal_used = game.chr(me).map_or(true, |ch| ch.memory.seal_used);
    if !seal_used {
        let others: Vec<CharacterId> = game.alive_ids().into_iter().filter(|&x| x != me).collect();
        if others.len() >= 2 {
            let picks: Vec<CharacterId> =
                others.choose_multiple(&mut game.rng, 2).copied().collect();
            for &t in &picks {
                let before = game.brief_of(t);
                if let Some(st) = game.status_mut(t) {
                    st.sealed = st.sealed.max(1);
                }
                passive::on_status_change(game, t, &before);
            }
            if let Some(ch) = game.chr_mut(me) {
                ch.memory.seal_used = true;
            }
            game.log(format!(
                "  · Sealing stroke: {} and {} lose next turn's active",
                game.tag(picks[0]),
                game.tag(picks[1])
            ));
            for &t in &picks {
                passive::twin_share(game, t, TwinEffect::Seal);
            }
        }
    }
    let cd = game.chr(me).map_or(0, |ch| ch.memory.kill_cd);
    if cd > 0 {
        game.log("  · Ink execution: cooling down");
        return Ok(());
    }
    let Some(myr) = game.rank_no(me) else {
        return Ok(());
    };
    let lower: Vec<CharacterId> = game
        .alive_ids()
        .into_iter()
        .filter(|&x| game.rank_no(x).map_or(false, |r| r > myr))
        .collect();
    if lower.is_empty() {
        game.log("  · Ink execution: no one ranked lower");
        return Ok(());
    }
    let Some(target) = game.pick_random(me, lower, "ink execution target") else {
        return Ok(());
    };
    if game.is_domain_unkillable(target) {
        game.log("  · Ink execution: the roll lands on an absolute domain → fails");
    } else {
        game.log(format!("  · Ink execution: strikes down {}", game.tag(target)));
        game.kill(target, Some(me), "ink execution", false, false);
    }
    if let Some(ch) = game.chr_mut(me) {
        ch.memory.kill_cd = 1;
    }
    game.move_by(me, -2, Some(me), "after the stroke");
    Ok(())
}

pub(super) fn bulwark(game: &mut Game) -> AbilityResult {
    game.log("  · no active skill (the absolute domain is passive)");
    Ok(())
}

pub(super) fn heir(game: &mut Game) -> AbilityResult {
    game.log("  · no active skill (destiny's favor is passive)");
    Ok(())
}

/// Grand displacement: swap with a random character once per elapsed
/// turn, with a creeping chance of snatching the very first place.
pub(super) fn prankster(game: &mut Game) -> AbilityResult {
    let me = ids::PRANKSTER;
    let times = game.turn().max(1);
    let mut p_first = game
        .chr(me)
        .map_or(0.01, |ch| ch.memory.first_pick_chance)
        .clamp(0.0, 1.0);
    game.log(format!(
        "  · Grand displacement: casts {} times this turn (first-place chance starts at {:.0}%)",
        times,
        p_first * 100.0
    ));
    for k in 0..times {
        let alive_all = game.alive_ids();
        let pool: Vec<CharacterId> = alive_all.iter().copied().filter(|&x| x != me).collect();
        if pool.is_empty() {
            game.log("  · Grand displacement: no swap targets left, stopping");
            break;
        }
        let first = alive_all.first().copied();
        let mut target: Option<CharacterId> = None;
        if let Some(f) = first {
            if pool.contains(&f) && game.rng.gen::<f64>() < p_first {
                target = Some(f);
            }
        }
        if target.is_none() {
            let others: Vec<CharacterId> =
                pool.iter().copied().filter(|&x| Some(x) != first).collect();
            target = others.choose(&mut game.rng).copied().or(match first {
                Some(f) if pool.contains(&f) => Some(f),
                _ => None,
            });
        }
        p_first = (p_first + 0.01).min(1.0);
        if let Some(ch) = game.chr_mut(me) {
            ch.memory.first_pick_chance = p_first;
        }
        let Some(mut target) = target else {
            return Ok(());
        };
        if target == ids::BULWARK
            && game.domain_try_immune(&format!("grand displacement, cast {}", k + 1))
        {
            let pool2: Vec<CharacterId> =
                pool.iter().copied().filter(|&x| x != ids::BULWARK).collect();
            match pool2.choose(&mut game.rng).copied() {
                Some(t) => target = t,
                None => {
                    game.log("  · Grand displacement: only the domain remains → the cast fizzles");
                    continue;
                }
            }
        }
        game.log(format!(
            "  · Grand displacement (cast {}): swaps with {} (first-place chance now {:.0}%)",
            k + 1,
            game.tag(target),
            p_first * 100.0
        ));
        game.swap_ranks(me, target, Some(me), "grand displacement");
    }
    Ok(())
}

/// Shadowmelt: toggle invisibility each turn.
pub(super) fn slipstream(game: &mut Game) -> AbilityResult {
    let me = ids::SLIPSTREAM;
    let before = game.brief_of(me);
    let now_invisible = {
        let Some(st) = game.status_mut(me) else {
            return Ok(());
        };
        st.invisible = !st.invisible;
        st.invisible
    };
    if now_invisible {
        game.log("  · Shadowmelt: fades from sight (Invisible)");
    } else {
        game.log("  · Shadowmelt: steps back into the light");
    }
    passive::on_status_change(game, me, &before);
    Ok(())
}

pub(super) fn avenger(game: &mut Game) -> AbilityResult {
    game.log("  · no active skill (blood calls for blood on death)");
    Ok(())
}

/// High purge: execute a random higher-ranked character; a confirmed fell
/// earns a second strike.
pub(super) fn headhunter(game: &mut Game) -> AbilityResult {
    let me = ids::HEADHUNTER;
    let Some(myr) = game.rank_no(me) else {
        return Ok(());
    };
    if myr == 1 {
        game.log("  · High purge: no one stands higher");
        return Ok(());
    }
    let higher: Vec<CharacterId> = game
        .alive_ids()
        .into_iter()
        .filter(|&x| game.rank_no(x).map_or(false, |r| r < myr))
        .collect();
    if higher.is_empty() {
        game.log("  · High purge: no one stands higher");
        return Ok(());
    }
    let Some(t1) = game.pick_random(me, higher, "high purge first strike") else {
        return Ok(());
    };
    if game.is_domain_unkillable(t1) {
        game.log("  · High purge: the roll lands on an absolute domain → fails");
        return Ok(());
    }
    game.log(format!("  · High purge: strikes down {}", game.tag(t1)));
    let died = game.kill(t1, Some(me), "high purge first strike", false, false);
    if died {
        let Some(myr2) = game.rank_no(me) else {
            return Ok(());
        };
        let higher2: Vec<CharacterId> = game
            .alive_ids()
            .into_iter()
            .filter(|&x| game.rank_no(x).map_or(false, |r| r < myr2))
            .collect();
        if !higher2.is_empty() {
            if let Some(t2) = game.pick_random(me, higher2, "high purge second strike") {
                if !game.is_domain_unkillable(t2) {
                    game.log(format!("  · Follow-up purge: strikes down {}", game.tag(t2)));
                    game.kill(t2, Some(me), "high purge second strike", false, false);
                }
            }
        }
    }
    Ok(())
}

/// Popular verdict: while in the back 60%, force the first place to swap
/// with a random tail-40% character.
pub(super) fn tribunal(game: &mut Game) -> AbilityResult {
    let me = ids::TRIBUNAL;
    let alive = game.alive_ids();
    let Some(myr) = game.rank_no(me) else {
        return Ok(());
    };
    if myr <= alive.len() * 2 / 5 {
        game.log("  · Popular verdict: not in the back 60%, nothing to contest");
        return Ok(());
    }
    let Some(&first) = alive.first() else {
        return Ok(());
    };
    let tail: Vec<CharacterId> =
        alive.iter().copied().skip(alive.len() * 2 / 5).filter(|&x| x != first).collect();
    let Some(target) = game.pick_random(me, tail, "popular verdict swap") else {
        return Ok(());
    };
    game.log(format!(
        "  · Popular verdict: forces {} and {} to trade places",
        game.tag(first),
        game.tag(target)
    ));
    game.swap_ranks(first, target, Some(me), "popular verdict");
    Ok(())
}

/// Rift step: reinsert at a random rank (cooldown 2), shelter two sworn
/// allies behind permanent shields (cooldown 5, twice per game), and
/// punish a drop with a strike at the formerly higher ranks.
pub(super) fn riftwalker(game: &mut Game) -> AbilityResult {
    let me = ids::RIFTWALKER;
    let cd = game.chr(me).map_or(0, |ch| ch.memory.warp_cd);
    if cd > 0 {
        game.log("  · Rift step: cooling down");
        return Ok(());
    }
    let alive = game.alive_ids();
    let oldr = game.rank_no(me);
    let n = alive.len();
    if n == 0 {
        return Ok(());
    }
    let new_rank = game.rng.gen_range(1..=n);
    game.log(format!("  · Rift step: re-enters at rank {}", new_rank));
    game.insert_rank(me, new_rank, Some(me), "rift step");

    let aegis_cd = game.chr(me).map_or(0, |ch| ch.memory.aegis_cd);
    if aegis_cd > 0 {
        game.log(format!("  · Warding aegis: cooling down ({} turns left)", aegis_cd));
    } else {
        let uses = game.chr(me).map_or(0, |ch| ch.memory.aegis_uses);
        if uses >= 2 {
            game.log("  · Warding aegis: both charges spent this game");
        } else {
            let sworn = [
                ids::RIFTWALKER,
                ids::AVENGER,
                ids::TRIBUNAL,
                ids::GRUDGE,
                ids::UNDERTOW,
                ids::FATHER,
                ids::HEIR,
                ids::MIMIC,
            ];
            let cand: Vec<CharacterId> =
                sworn.iter().copied().filter(|&x| game.is_alive(x)).collect();
            if cand.len() >= 2 {
                let picks: Vec<CharacterId> =
                    cand.choose_multiple(&mut game.rng, 2).copied().collect();
                for &t in &picks {
                    game.give_shield(t, 1, 0, true, "warding aegis (lasting)");
                }
                if let Some(ch) = game.chr_mut(me) {
                    ch.memory.aegis_cd = 5;
                    ch.memory.aegis_uses = uses + 1;
                }
            }
        }
    }

    let nowr = game.rank_no(me);
    if let (Some(oldr), Some(nowr)) = (oldr, nowr) {
        if nowr > oldr {
            let higher_before: Vec<CharacterId> = alive
                .iter()
                .copied()
                .filter(|&x| x != me && game.rank_no(x).map_or(false, |r| r < oldr))
                .collect();
            if let Some(t) = game.pick_random(me, higher_before, "rift strike target") {
                if game.is_domain_unkillable(t) {
                    game.log("  · Rift strike: the roll lands on an absolute domain → fails");
                } else {
                    game.log(format!(
                        "  · Rift strike: fell after the step → cuts down the formerly higher {}",
                        game.tag(t)
                    ));
                    game.kill(t, Some(me), "rift strike follow-up", false, false);
                }
            }
        }
    }
    if let Some(ch) = game.chr_mut(me) {
        ch.memory.warp_cd = 2;
    }
    Ok(())
}

/// Order overturned: swap the first place with a random back-half
/// character; deep in the pack, a shield can be spent to finish the old
/// leader off.
pub(super) fn usurper(game: &mut Game) -> AbilityResult {
    let me = ids::USURPER;
    let cd = game.chr(me).map_or(0, |ch| ch.memory.flip_cd);
    if cd > 0 {
        game.log("  · Order overturned: cooling down");
        return Ok(());
    }
    let alive = game.alive_ids();
    let Some(&first) = alive.first() else {
        return Ok(());
    };
    let back: Vec<CharacterId> =
        alive.iter().copied().skip(alive.len() / 2).filter(|&x| x != first).collect();
    let Some(target) = game.pick_random(me, back, "order overturned swap") else {
        return Ok(());
    };
    game.log(format!(
        "  · Order overturned: swaps {} with {}",
        game.tag(first),
        game.tag(target)
    ));
    game.swap_ranks(first, target, Some(me), "order overturned");
    let myr = game.rank_no(me);
    if myr.map_or(false, |r| r > 10)
        && game.status_of(me).map_or(0, |s| s.total_shields()) > 0
    {
        game.consume_shield_once(me);
        game.log(format!(
            "  · Last exile: spends a shield layer to finish the old leader {}",
            game.tag(first)
        ));
        game.kill(first, Some(me), "last exile follow-up", false, false);
    }
    if let Some(ch) = game.chr_mut(me) {
        ch.memory.flip_cd = 2;
    }
    Ok(())
}

/// Thousand faces: copy a random living character's active and run it.
pub(super) fn mimic(game: &mut Game) -> AbilityResult {
    let me = ids::MIMIC;
    let pool: Vec<CharacterId> = game.alive_ids().into_iter().filter(|&x| x != me).collect();
    let Some(pick) = game.pick_random(me, pool, "mimicry target") else {
        game.log("  · Thousand faces: no kit to copy");
        return Ok(());
    };
    game.log(format!(
        "  · Thousand faces: copies {}'s active (cast by the mimic)",
        game.tag(pick)
    ));
    super::invoke(game, pick)
}

/// Father and heir: with the heir alive and below, a rank-gap-scaled
/// gamble to cut down a random lower character and trade places with the
/// heir.
pub(super) fn father(game: &mut Game) -> AbilityResult {
    let me = ids::FATHER;
    if !game.is_alive(ids::HEIR) {
        game.log("  · Of one blood: the heir is gone; the resolve turns passive");
        return Ok(());
    }
    let (Some(myr), Some(son)) = (game.rank_no(me), game.rank_no(ids::HEIR)) else {
        return Ok(());
    };
    if myr >= son {
        game.log("  · Of one blood: not ranked above the heir, nothing stirs");
        return Ok(());
    }
    let lower: Vec<CharacterId> = game
        .alive_ids()
        .into_iter()
        .filter(|&x| x != me && game.rank_no(x).map_or(false, |r| r > myr))
        .collect();
    if lower.is_empty() {
        game.log("  · Of one blood: no one ranked lower");
        return Ok(());
    }
    let Some(t) = game.pick_random(me, lower, "of one blood strike") else {
        return Ok(());
    };
    if game.is_domain_unkillable(t) {
        game.log("  · Of one blood: the roll lands on an absolute domain → fails");
        return Ok(());
    }
    let p = (0.50 + (son - myr) as f64 * 0.05).clamp(0.0, 0.80);
    if game.rng.gen::<f64>() <= p {
        game.log(format!(
            "  · Of one blood: the {}% gamble lands → cuts down {} and trades places with the heir",
            (p * 100.0) as u32,
            game.tag(t)
        ));
        game.kill(t, Some(me), "of one blood strike", false, false);
        if game.is_alive(ids::HEIR) {
            game.swap_ranks(me, ids::HEIR, Some(me), "of one blood");
        }
    } else {
        game.log(format!("  · Of one blood: the {}% gamble misses", (p * 100.0) as u32));
    }
    Ok(())
}

/// Dust of old days: every 3rd activation, make a random character forget
/// its active for a turn.
pub(super) fn matron(game: &mut Game) -> AbilityResult {
    let me = ids::MATRON;
    let count = {
        let ch = game.chr_mut(me).ok_or(AbilityError::MissingCharacter(me))?;
        ch.memory.activation_count += 1;
        ch.memory.activation_count
    };
    if count % 3 != 0 {
        game.log("  · Dust of old days: still settling (fires every 3rd activation)");
        return Ok(());
    }
    let pool: Vec<CharacterId> = game.alive_ids().into_iter().filter(|&x| x != me).collect();
    let Some(target) = game.pick_random(me, pool, "dust of old days target") else {
        return Ok(());
    };
    let wasted = game
        .status_of(target)
        .map_or(false, |st| st.sealed > 0 || st.forgotten > 0);
    if wasted {
        game.log("  · Dust of old days: the target is already sealed or forgotten");
        return Ok(());
    }
    let before = game.brief_of(target);
    if let Some(st) = game.status_mut(target) {
        st.forgotten = st.forgotten.max(1);
    }
    passive::on_status_change(game, target, &before);
    game.log(format!(
        "  · Dust of old days: {} forgets their active for a turn",
        game.tag(target)
    ));
    passive::twin_share(game, target, TwinEffect::Forget);
    Ok(())
}

/// Long drought: execute a random character that has stayed alive for at
/// least two consecutive turns. Cooldown 2.
pub(super) fn rainmaker(game: &mut Game) -> AbilityResult {
    let me = ids::RAINMAKER;
    let cd = game.chr(me).map_or(0, |ch| ch.memory.drought_cd);
    if cd > 0 {
        game.log("  · Long drought: cooling down");
        return Ok(());
    }
    let cand: Vec<CharacterId> = game
        .alive_ids()
        .into_iter()
        .filter(|&x| x != me && game.chr(x).map_or(0, |ch| ch.memory.alive_turns) >= 2)
        .collect();
    if cand.is_empty() {
        game.log("  · Long drought: no one has endured two straight turns");
        if let Some(ch) = game.chr_mut(me) {
            ch.memory.drought_cd = 2;
        }
        return Ok(());
    }
    let Some(target) = game.pick_random(me, cand, "long drought target") else {
        return Ok(());
    };
    if game.is_domain_unkillable(target) {
        game.log("  · Long drought: the roll lands on an absolute domain → fails");
    } else {
        game.log(format!("  · Long drought: strikes down {}", game.tag(target)));
        game.kill(target, Some(me), "long drought strike", false, false);
    }
    if let Some(ch) = game.chr_mut(me) {
        ch.memory.drought_cd = 2;
    }
    Ok(())
}

/// Pandemonium: swap two random other characters. Cooldown 2.
pub(super) fn splitmind(game: &mut Game) -> AbilityResult {
    let me = ids::SPLITMIND;
    let cd = game.chr(me).map_or(0, |ch| ch.memory.chaos_cd);
    if cd > 0 {
        game.log("  · Pandemonium: cooling down");
        return Ok(());
    }
    let cand: Vec<CharacterId> = game.alive_ids().into_iter().filter(|&x| x != me).collect();
    if cand.len() < 2 {
        game.log("  · Pandemonium: too few targets");
        return Ok(());
    }
    let picks: Vec<CharacterId> = cand.choose_multiple(&mut game.rng, 2).copied().collect();
    game.log(format!(
        "  · Pandemonium: {} and {} trade places",
        game.tag(picks[0]),
        game.tag(picks[1])
    ));
    game.swap_ranks(picks[0], picks[1], Some(me), "pandemonium");
    if let Some(ch) = game.chr_mut(me) {
        ch.memory.chaos_cd = 2;
    }
    Ok(())
}

/// The collector's blessings accrue passively; the active only matters in
/// joke mode, where it goes on an invincible rampage.
pub(super) fn collector(game: &mut Game) -> AbilityResult {
    let me = ids::COLLECTOR;
    if !game.config().joke_mode {
        game.log("  · no active skill (blessings accrue passively)");
        return Ok(());
    }
    game.log(format!("  · {} is invincible: shield 99999", game.tag(me)));
    if let Some(st) = game.status_mut(me) {
        st.joke_overlay = true;
    }
    for i in 0..10 {
        let targets: Vec<CharacterId> = game
            .alive_ids()
            .into_iter()
            .filter(|&c| {
                c != me
                    && c != crate::models::PATRON_NPC_ID
                    && c != crate::models::STORMCALLER_NPC_ID
            })
            .collect();
        let Some(&v) = targets.choose(&mut game.rng) else {
            break;
        };
        game.log(format!("    - strike {}: removes {} at random", i + 1, game.tag(v)));
        game.kill(v, Some(me), "joke-mode purge", true, true);
        game.move_by(me, -1, None, "joke-mode climb");
    }
    Ok(())
}

/// Self-exile: on turn 6 exactly, the solar removes itself.
pub(super) fn solar(game: &mut Game) -> AbilityResult {
    let me = ids::SOLAR;
    if game.turn() == 6 {
        game.log(format!("  · Self-exile: {} walks out of the game (turn 6)", game.tag(me)));
        game.kill(me, None, "self-exile", true, true);
    } else {
        game.log("  · no active skill (self-exile waits for turn 6)");
    }
    Ok(())
}

/// Relentless pursuit: every second turn, remove a random character and
/// climb by the rank gap.
pub(super) fn chaser(game: &mut Game) -> AbilityResult {
    let me = ids::CHASER;
    if game.turn() % 2 != 0 {
        game.log("  · Relentless pursuit: off-turn (fires every second turn)");
        return Ok(());
    }
    let Some(myr) = game.rank_no(me) else {
        return Ok(());
    };
    let pool: Vec<CharacterId> = game
        .alive_ids()
        .into_iter()
        .filter(|&x| x != me && !game.is_domain_unkillable(x))
        .collect();
    if pool.is_empty() {
        game.log("  · Relentless pursuit: no removable target");
        return Ok(());
    }
    let Some(target) = game.pick_random(me, pool, "relentless pursuit target") else {
        return Ok(());
    };
    let Some(tr) = game.rank_no(target) else {
        return Ok(());
    };
    game.log(format!(
        "  · Relentless pursuit: removes {} (self at rank {}, target at rank {})",
        game.tag(target),
        myr,
        tr
    ));
    let died = game.kill(target, Some(me), "relentless pursuit", false, false);
    if !died {
        game.log("  · Relentless pursuit: the blow is absorbed → no climb");
        return Ok(());
    }
    let diff = tr.abs_diff(myr);
    if diff > 0 {
        game.log(format!("  · Relentless pursuit: climbs the gap of {} ranks", diff));
        game.move_by(me, -(diff as i32), Some(me), "relentless pursuit climb");
    }
    Ok(())
}

/// Cleansing light: bathe self and both neighbors in Purify for two
/// turns (the adjacent-triple burst resolves in cleanup).
pub(super) fn purifier(game: &mut Game) -> AbilityResult {
    let me = ids::PURIFIER;
    let cd = game.chr(me).map_or(0, |ch| ch.memory.purify_cd);
    if cd > 0 {
        game.log(format!("  · Cleansing light: cooling down ({})", cd));
        return Ok(());
    }
    let Some(p) = game.position(me) else {
        return Ok(());
    };
    let mut targets: Vec<CharacterId> = Vec::new();
    for q in [p.wrapping_sub(1), p, p + 1] {
        if q < game.rank.len() {
            let t = game.rank[q];
            if game.is_alive(t) && !targets.contains(&t) {
                targets.push(t);
            }
        }
    }
    if targets.is_empty() {
        return Ok(());
    }
    for &t in &targets {
        let before = game.brief_of(t);
        if let Some(st) = game.status_mut(t) {
            st.purify = st.purify.max(2);
        }
        passive::on_status_change(game, t, &before);
    }
    let names: Vec<String> = targets.iter().map(|&c| game.tag(c)).collect();
    game.log(format!("  · Cleansing light: {} bathe in Purify (2 turns)", names.join(", ")));
    Ok(())
}

pub(super) fn archivist(game: &mut Game) -> AbilityResult {
    game.log("  · no active skill (the archive records passively)");
    Ok(())
}

pub(super) fn diehard(game: &mut Game) -> AbilityResult {
    game.log("  · no active skill (grit settles at end of turn)");
    Ok(())
}

pub(super) fn stormcrown(game: &mut Game) -> AbilityResult {
    game.log("  · no active skill (wrath and majesty resolve passively)");
    Ok(())
}

/// Fleeting shadow: a creeping chance to leap straight to rank 1.
pub(super) fn phantom(game: &mut Game) -> AbilityResult {
    let me = ids::PHANTOM;
    let p = game
        .chr(me)
        .map_or(0.05, |ch| ch.memory.phantom_chance)
        .clamp(0.05, 0.80);
    if game.rng.gen::<f64>() < p {
        game.log(format!(
            "  · Fleeting shadow: the {}% leap lands → straight to rank 1",
            (p * 100.0) as u32
        ));
        game.insert_rank(me, 1, Some(me), "fleeting shadow");
        if let Some(ch) = game.chr_mut(me) {
            ch.memory.phantom_chance = 0.05;
        }
    } else {
        let p2 = (p + 0.05).min(0.80);
        if let Some(ch) = game.chr_mut(me) {
            ch.memory.phantom_chance = p2;
        }
        game.log(format!(
            "  · Fleeting shadow: the {}% leap misses → next turn {}%",
            (p * 100.0) as u32,
            (p2 * 100.0) as u32
        ));
    }
    Ok(())
}

/// Conductivity: hand every thunder stack to a random higher-ranked
/// character, gaining a Galvanize stack in the bargain.
pub(super) fn conductor(game: &mut Game) -> AbilityResult {
    let me = ids::CONDUCTOR;
    let stacks = game.status_of(me).map_or(0, |s| s.thunder);
    if stacks == 0 {
        game.log("  · Conductivity: no thunder to pass along");
        return Ok(());
    }
    let Some(myr) = game.rank_no(me) else {
        return Ok(());
    };
    let higher: Vec<CharacterId> = game
        .alive_ids()
        .into_iter()
        .filter(|&x| game.rank_no(x).map_or(false, |r| r < myr))
        .collect();
    if higher.is_empty() {
        game.log("  · Conductivity: no one ranked higher");
        return Ok(());
    }
    let Some(target) = game.pick_random(me, higher, "conductivity target") else {
        game.log("  · Conductivity: no reachable target");
        return Ok(());
    };
    if let Some(st) = game.status_mut(me) {
        st.thunder = 0;
    }
    game.log(format!(
        "  · Conductivity: passes {} thunder stack(s) to {}",
        stacks,
        game.tag(target)
    ));
    game.add_thunder(target, stacks, None);
    let gained = {
        let Some(st) = game.status_mut(me) else {
            return Ok(());
        };
        st.galvanize = (st.galvanize + 1).min(3);
        st.galvanize
    };
    game.log(format!(
        "  · Conductivity: {} gains a Galvanize stack ({}/3)",
        game.tag(me),
        gained
    ));
    Ok(())
}

/// Flame bomb: plant it when the field is clear; detonate it when it is
/// not, claiming a higher holder's rank.
pub(super) fn pyromancer(game: &mut Game) -> AbilityResult {
    let me = ids::PYROMANCER;
    let alive = game.alive_ids();
    if alive.is_empty() {
        return Ok(());
    }
    let holders: Vec<CharacterId> = alive
        .iter()
        .copied()
        .filter(|&c| game.status_of(c).map_or(false, |s| s.bomb))
        .collect();
    if holders.is_empty() {
        let pool: Vec<CharacterId> = alive.into_iter().filter(|&c| c != me).collect();
        if pool.is_empty() {
            game.log("  · Flame bomb: no one to plant it on");
            return Ok(());
        }
        let Some(target) = game.pick_random(me, pool, "flame bomb plant") else {
            game.log("  · Flame bomb: no reachable target (all hidden?)");
            return Ok(());
        };
        let before = game.brief_of(target);
        if let Some(st) = game.status_mut(target) {
            st.bomb = true;
        }
        game.log(format!("  · Flame bomb: plants the Bomb on {}", game.tag(target)));
        passive::on_status_change(game, target, &before);
        return Ok(());
    }
    let holder = holders[0];
    let (Some(holder_rank), Some(my_rank)) = (game.rank_no(holder), game.rank_no(me)) else {
        return Ok(());
    };
    game.log(format!("  · Flame bomb: detonates on {}", game.tag(holder)));
    let died = game.kill(holder, Some(me), "flame bomb detonation", false, false);
    // The bomb is spent whether or not the holder survives.
    let before = game.brief_of(holder);
    if let Some(st) = game.status_mut(holder) {
        st.bomb = false;
    }
    passive::on_status_change(game, holder, &before);
    if !died {
        game.log("  · Flame bomb: the blast is absorbed → the bomb is gone");
        return Ok(());
    }
    if holder_rank < my_rank && game.is_alive(me) {
        game.compact();
        game.log(format!(
            "  · Flame bomb: the holder ranked higher → {} claims rank {}",
            game.tag(me),
            holder_rank
        ));
        game.insert_rank(me, holder_rank, None, "flame bomb advance");
    }
    Ok(())
}

/// Closing ranks: pick a random higher character; self up one, target
/// down one. Cooldown 2.
pub(super) fn spearhead(game: &mut Game) -> AbilityResult {
    let me = ids::SPEARHEAD;
    let active = game.chr(me).map_or(false, |ch| ch.alive && !ch.status.disabled);
    if !active {
        return Ok(());
    }
    if game.chr(me).map_or(0, |ch| ch.memory.frontline_cd) > 0 {
        return Ok(());
    }
    let Some(myr) = game.rank_no(me) else {
        return Ok(());
    };
    let cand: Vec<CharacterId> = game
        .alive_ids()
        .into_iter()
        .filter(|&x| x != me && game.rank_no(x).map_or(false, |r| r < myr))
        .collect();
    let Some(&t) = cand.choose(&mut game.rng) else {
        return Ok(());
    };
    game.log(format!(
        "  · Closing ranks: picks {}; both sides converge one rank",
        game.tag(t)
    ));
    game.move_by(me, -1, Some(me), "closing ranks");
    game.move_by(t, 1, Some(me), "closing ranks");
    if let Some(ch) = game.chr_mut(me) {
        ch.memory.frontline_cd = 2;
    }
    Ok(())
}

/// Hook and undertow: hook a Fish onto someone when none is afield, then
/// let it drag the holder and its neighbors down one rank.
pub(super) fn tidecaller(game: &mut Game) -> AbilityResult {
    let me = ids::TIDECALLER;
    let alive = game.alive_ids();
    if alive.is_empty() {
        return Ok(());
    }
    let fish_exists = alive
        .iter()
        .any(|&c| game.status_of(c).map_or(false, |s| s.fish));
    if !fish_exists {
        let pool: Vec<CharacterId> = alive.iter().copied().filter(|&c| c != me).collect();
        if pool.is_empty() {
            game.log("  · Sunken hook: no one to hook");
        } else if let Some(target) = game.pick_random(me, pool, "sunken hook target") {
            if game.apply_selection(Some(me), target, "sunken hook") {
                let before = game.brief_of(target);
                if let Some(st) = game.status_mut(target) {
                    st.fish = true;
                }
                game.log(format!("  · Sunken hook: {} carries the Fish", game.tag(target)));
                passive::on_status_change(game, target, &before);
            }
        } else {
            game.log("  · Sunken hook: no reachable target (all hidden?)");
        }
    }

    let alive_now = game.alive_ids();
    let holders: Vec<CharacterId> = alive_now
        .iter()
        .copied()
        .filter(|&c| game.status_of(c).map_or(false, |s| s.fish))
        .collect();
    let Some(&holder) = holders.first() else {
        game.log("  · Undertow pull: no fish afield");
        return Ok(());
    };
    let Some(p) = game.position(holder) else {
        return Ok(());
    };
    let mut affected: Vec<CharacterId> = Vec::new();
    for q in [p.wrapping_sub(1), p, p + 1] {
        if q < game.rank.len() {
            let c = game.rank[q];
            if game.is_alive(c) && c != me && !affected.contains(&c) {
                affected.push(c);
            }
        }
    }
    if affected.is_empty() {
        game.log("  · Undertow pull: no one within reach");
        return Ok(());
    }
    let names: Vec<String> = affected.iter().map(|&c| game.tag(c)).collect();
    game.log(format!("  · Undertow pull: the fish drags {} down a rank", names.join(", ")));
    // Move from the bottom up so the shifts do not cancel each other.
    affected.sort_by_key(|&c| std::cmp::Reverse(game.rank_no(c).unwrap_or(0)));
    for c in affected {
        game.move_by(c, 1, Some(me), "undertow pull");
    }
    Ok(())
}

/// On the first turn, mark two mates; everything else is the lone-wolf
/// passive.
pub(super) fn lonewolf(game: &mut Game) -> AbilityResult {
    let me = ids::LONEWOLF;
    let picked = game.chr(me).map_or(true, |ch| ch.memory.mates_picked);
    if game.turn() == 1 && !picked {
        let pool: Vec<CharacterId> = game.alive_ids().into_iter().filter(|&x| x != me).collect();
        if pool.len() >= 2 {
            let picks: Vec<CharacterId> =
                pool.choose_multiple(&mut game.rng, 2).copied().collect();
            let line = format!(
                "  · Band of three: marks {} and {} as mates",
                game.tag(picks[0]),
                game.tag(picks[1])
            );
            if let Some(ch) = game.chr_mut(me) {
                ch.memory.mates_picked = true;
                ch.memory.mates = picks;
            }
            game.log(line);
        }
    }
    Ok(())
}
