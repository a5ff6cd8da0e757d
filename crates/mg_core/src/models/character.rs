//! Character identity and the fixed roster table.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{AbilityMemory, Status};

/// Stable character identifier. Roster ids are assigned once at
/// construction; event NPCs live in a reserved high range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct CharacterId(pub u32);

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transient event NPC: the shield-granting patron.
pub const PATRON_NPC_ID: CharacterId = CharacterId(1001);
/// Transient event NPC: the thunder-seeding stormcaller.
pub const STORMCALLER_NPC_ID: CharacterId = CharacterId(1002);

/// Well-known roster ids, named after the characters that hold them.
/// Ability code reads far better with these than with bare numbers.
pub mod ids {
    use super::CharacterId;

    pub const VANGUARD: CharacterId = CharacterId(1);
    pub const SKYBLADE: CharacterId = CharacterId(3);
    pub const BLADEDANCER: CharacterId = CharacterId(4);
    pub const UNDERTOW: CharacterId = CharacterId(6);
    pub const GRUDGE: CharacterId = CharacterId(7);
    pub const STRIDER: CharacterId = CharacterId(8);
    pub const CALLIGRAPHER: CharacterId = CharacterId(9);
    pub const BULWARK: CharacterId = CharacterId(10);
    pub const HEIR: CharacterId = CharacterId(11);
    pub const PRANKSTER: CharacterId = CharacterId(12);
    pub const SLIPSTREAM: CharacterId = CharacterId(13);
    pub const AVENGER: CharacterId = CharacterId(14);
    pub const HEADHUNTER: CharacterId = CharacterId(15);
    pub const TRIBUNAL: CharacterId = CharacterId(16);
    pub const RIFTWALKER: CharacterId = CharacterId(17);
    pub const USURPER: CharacterId = CharacterId(18);
    pub const MIMIC: CharacterId = CharacterId(19);
    pub const FATHER: CharacterId = CharacterId(20);
    pub const MATRON: CharacterId = CharacterId(21);
    pub const RAINMAKER: CharacterId = CharacterId(23);
    pub const SPLITMIND: CharacterId = CharacterId(24);
    pub const COLLECTOR: CharacterId = CharacterId(25);
    pub const SOLAR: CharacterId = CharacterId(26);
    pub const CHASER: CharacterId = CharacterId(27);
    pub const ADJUDICATOR: CharacterId = CharacterId(28);
    pub const PURIFIER: CharacterId = CharacterId(29);
    pub const ECHO: CharacterId = CharacterId(30);
    pub const CANDLEKEEPER: CharacterId = CharacterId(31);
    pub const BEACON: CharacterId = CharacterId(32);
    pub const ARCHIVIST: CharacterId = CharacterId(33);
    pub const DIEHARD: CharacterId = CharacterId(34);
    pub const DUELIST: CharacterId = CharacterId(35);
    pub const STORMCROWN: CharacterId = CharacterId(36);
    pub const TRUTHSEER: CharacterId = CharacterId(37);
    pub const PHANTOM: CharacterId = CharacterId(38);
    pub const CONDUCTOR: CharacterId = CharacterId(39);
    pub const PYROMANCER: CharacterId = CharacterId(40);
    pub const SPEARHEAD: CharacterId = CharacterId(41);
    pub const TIDECALLER: CharacterId = CharacterId(42);
    pub const REDEEMER: CharacterId = CharacterId(43);
    pub const UNBROKEN: CharacterId = CharacterId(44);
    pub const RAMPART: CharacterId = CharacterId(45);
    pub const LONEWOLF: CharacterId = CharacterId(46);
}

static ROSTER: Lazy<BTreeMap<CharacterId, &'static str>> = Lazy::new(|| {
    use ids::*;
    BTreeMap::from([
        (VANGUARD, "Vanguard"),
        (SKYBLADE, "Skyblade"),
        (BLADEDANCER, "Bladedancer"),
        (UNDERTOW, "Undertow"),
        (GRUDGE, "Grudge"),
        (STRIDER, "Strider"),
        (CALLIGRAPHER, "Calligrapher"),
        (BULWARK, "Bulwark"),
        (HEIR, "Heir"),
        (PRANKSTER, "Prankster"),
        (SLIPSTREAM, "Slipstream"),
        (AVENGER, "Avenger"),
        (HEADHUNTER, "Headhunter"),
        (TRIBUNAL, "Tribunal"),
        (RIFTWALKER, "Riftwalker"),
        (USURPER, "Usurper"),
        (MIMIC, "Mimic"),
        (FATHER, "Father"),
        (MATRON, "Matron"),
        (RAINMAKER, "Rainmaker"),
        (SPLITMIND, "Splitmind"),
        (COLLECTOR, "Collector"),
        (SOLAR, "Solar"),
        (CHASER, "Chaser"),
        (ADJUDICATOR, "Adjudicator"),
        (PURIFIER, "Purifier"),
        (ECHO, "Echo"),
        (CANDLEKEEPER, "Candlekeeper"),
        (BEACON, "Beacon"),
        (ARCHIVIST, "Archivist"),
        (DIEHARD, "Diehard"),
        (DUELIST, "Duelist"),
        (STORMCROWN, "Stormcrown"),
        (TRUTHSEER, "Truthseer"),
        (PHANTOM, "Phantom"),
        (CONDUCTOR, "Conductor"),
        (PYROMANCER, "Pyromancer"),
        (SPEARHEAD, "Spearhead"),
        (TIDECALLER, "Tidecaller"),
        (REDEEMER, "Redeemer"),
        (UNBROKEN, "Unbroken"),
        (RAMPART, "Rampart"),
        (LONEWOLF, "Lonewolf"),
    ])
});

/// The fixed roster: id to display name.
pub fn roster() -> &'static BTreeMap<CharacterId, &'static str> {
    &ROSTER
}

/// One participant. Created once at game construction (transient NPCs may
/// join mid-game and are marked dead on departure); `alive` is flipped by
/// the elimination pipeline and, for explicitly gated revival abilities,
/// flipped back.
#[derive(Debug, Clone)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub alive: bool,
    pub status: Status,
    pub memory: AbilityMemory,
}

impl Character {
    pub fn new(id: CharacterId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            alive: true,
            status: Status::default(),
            memory: AbilityMemory::default(),
        }
    }

    /// Display tag used in log lines: `Name(id)`. The replay recorder
    /// scans for the `(id)` marker to derive highlighted entities.
    pub fn tag(&self) -> String {
        format!("{}({})", self.name, self.id)
    }
}
