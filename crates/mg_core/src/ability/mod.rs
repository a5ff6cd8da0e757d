//! The per-character ability catalog and its dispatch boundary.
//!
//! Each active skill is an independent function keyed by character id.
//! Dispatch is a single match; any error an ability raises is converted
//! into a counted fault at the boundary and the pipeline moves on — one
//! misbehaving ability must never halt the simulation.

pub(crate) mod active;
pub(crate) mod death;
pub(crate) mod passive;

use crate::engine::Game;
use crate::error::AbilityResult;
use crate::models::{ids, CharacterId};

/// The fault boundary around a single active-skill dispatch.
pub(crate) fn run_active(game: &mut Game, cid: CharacterId) {
    if let Err(err) = invoke(game, cid) {
        game.record_fault(cid, err);
    }
}

/// Raw dispatch. The mimic re-enters here when copying another kit.
pub(crate) fn invoke(game: &mut Game, cid: CharacterId) -> AbilityResult {
    match cid {
        ids::VANGUARD => active::vanguard(game),
        ids::SKYBLADE => active::skyblade(game),
        ids::BLADEDANCER => active::bladedancer(game),
        ids::UNDERTOW => active::undertow(game),
        ids::GRUDGE => active::grudge(game),
        ids::STRIDER => active::strider(game),
        ids::CALLIGRAPHER => active::calligrapher(game),
        ids::BULWARK => active::bulwark(game),
        ids::HEIR => active::heir(game),
        ids::PRANKSTER => active::prankster(game),
        ids::SLIPSTREAM => active::slipstream(game),
        ids::AVENGER => active::avenger(game),
        ids::HEADHUNTER => active::headhunter(game),
        ids::TRIBUNAL => active::tribunal(game),
        ids::RIFTWALKER => active::riftwalker(game),
        ids::USURPER => active::usurper(game),
        ids::MIMIC => active::mimic(game),
        ids::FATHER => active::father(game),
        ids::MATRON => active::matron(game),
        ids::RAINMAKER => active::rainmaker(game),
        ids::SPLITMIND => active::splitmind(game),
        ids::COLLECTOR => active::collector(game),
        ids::SOLAR => active::solar(game),
        ids::CHASER => active::chaser(game),
        ids::PURIFIER => active::purifier(game),
        ids::ARCHIVIST => active::archivist(game),
        ids::DIEHARD => active::diehard(game),
        ids::STORMCROWN => active::stormcrown(game),
        ids::PHANTOM => active::phantom(game),
        ids::CONDUCTOR => active::conductor(game),
        ids::PYROMANCER => active::pyromancer(game),
        ids::SPEARHEAD => active::spearhead(game),
        ids::TIDECALLER => active::tidecaller(game),
        ids::LONEWOLF => active::lonewolf(game),
        _ => {
            game.log("  · no active skill");
            Ok(())
        }
    }
}
