//! Typed status effects.
//!
//! Every field is either a boolean flag, a remaining-duration counter
//! (ticked down once per turn in cleanup), or a stacking counter with a
//! cap. Ability-specific scratch that does not fit this shape lives in
//! [`super::AbilityMemory`] instead.

use serde::{Deserialize, Serialize};

/// A delayed lethal curse left behind by the Grudge's death trigger.
/// Checked against the rank threshold before the cursed character acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VengeanceCurse {
    /// Rank the victim held at the start of the turn it died.
    pub threshold_rank: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// Temporary shield layers (counts toward the 2-layer display cap).
    pub shields: u8,
    /// Turns the temporary layers persist; at 0 they evaporate.
    pub shield_ttl: u8,
    /// Permanent shield layers; decay only by consumption.
    pub shield_perm: u8,
    /// Thunder stacks; an execution fires at 3 (shields do not help).
    pub thunder: u8,
    /// Active skill suppressed for this many turns.
    pub sealed: u8,
    /// Active skill forgotten for this many turns.
    pub forgotten: u8,
    /// Permanently unable to act or react. Survives purges.
    pub disabled: bool,
    /// Forced self-target: the holder's next random target roll that
    /// includes itself lands on itself. At most one holder field-wide.
    pub focused: bool,
    /// Not selectable by any skill (world rule still applies).
    pub invisible: bool,
    pub bomb: bool,
    pub grit: bool,
    /// Held only while at rank 1; grants the turn-start execution.
    pub majesty: bool,
    pub fish: bool,
    /// Incapacitated; cannot act while > 0.
    pub dying: u8,
    pub attached_life: bool,
    pub lone_wolf: bool,
    /// Timed full immunity (final-stand execution still lands).
    pub spec_immune: u8,
    /// Penalty marker: one rank lost after every activation.
    pub dusk_mark: u8,
    /// One-shot: the next rank movement applied to the holder is doubled.
    pub doubled_move: bool,
    pub corrupted: bool,
    /// Charges of the counter-debuff that voids one effect against the
    /// Bladedancer, consumed from the *source*.
    pub null_field: u8,
    /// One-shot absorb granted for felling the patron NPC.
    pub patron_gift: bool,
    /// One-shot absorb granted for felling the stormcaller NPC.
    pub storm_bracelet: bool,
    pub oxidize: u8,
    pub reduce: u8,
    pub witness: bool,
    pub advocacy: u8,
    pub silence: u8,
    pub detour: u8,
    pub bulwark: u8,
    /// Whether the current bulwark already absorbed a downward move.
    pub bulwark_spent: bool,
    pub purify: u8,
    pub radiance: u8,
    pub galvanize: u8,
    pub momentum: u8,
    pub vengeance: Option<VengeanceCurse>,
    /// Joke-mode display overlay. Survives purges.
    pub joke_overlay: bool,
}

impl Status {
    /// Displayed shield layers: capped at 2 across both pools.
    pub fn total_shields(&self) -> u8 {
        (self.shield_perm + self.shields).min(2)
    }

    /// Whether one more elimination attempt can be absorbed, counting the
    /// event-granted one-shot absorbs.
    pub fn can_absorb(&self) -> bool {
        self.total_shields() > 0 || self.patron_gift || self.storm_bracelet
    }

    /// One-line status summary shown in snapshots and the ranking panel.
    pub fn brief(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.total_shields() > 0 {
            parts.push(format!("Shield {}", self.total_shields()));
        }
        if self.joke_overlay {
            parts.push("Shield 99999".into());
        }
        if self.thunder > 0 {
            parts.push(format!("Thunder {}", self.thunder));
        }
        if self.sealed > 0 {
            parts.push("Sealed".into());
        }
        if self.forgotten > 0 {
            parts.push(format!("Forgotten {}", self.forgotten));
        }
        if self.focused {
            parts.push("Focused".into());
        }
        if self.invisible {
            parts.push("Invisible".into());
        }
        if self.bomb {
            parts.push("Bomb".into());
        }
        if self.grit {
            parts.push("Grit".into());
        }
        if self.majesty {
            parts.push("Majesty".into());
        }
        if self.fish {
            parts.push("Fish".into());
        }
        if self.dying > 0 {
            parts.push(format!("Dying {}", self.dying));
        }
        if self.attached_life {
            parts.push("Attached Life".into());
        }
        if self.lone_wolf {
            parts.push("Lone Wolf".into());
        }
        if self.spec_immune > 0 {
            parts.push("Spec Immune".into());
        }
        if self.purify > 0 {
            parts.push(format!("Purify {}", self.purify));
        }
        if self.radiance > 0 {
            parts.push(format!("Radiance {}", self.radiance));
        }
        if self.galvanize > 0 {
            parts.push(format!("Galvanize {}", self.galvanize));
        }
        if self.momentum > 0 {
            parts.push(format!("Momentum {}", self.momentum));
        }
        if self.witness {
            parts.push("Witness".into());
        }
        if self.advocacy > 0 {
            parts.push(format!("Advocacy {}", self.advocacy));
        }
        if self.silence > 0 {
            parts.push(format!("Silence {}", self.silence));
        }
        if self.detour > 0 {
            parts.push(format!("Detour {}", self.detour));
        }
        if self.bulwark > 0 {
            parts.push(format!("Bulwark {}", self.bulwark));
        }
        if self.disabled {
            parts.push("Disabled".into());
        }
        if self.dusk_mark > 0 {
            parts.push(format!("Dusk {}", self.dusk_mark));
        }
        if self.doubled_move {
            parts.push("Doomed".into());
        }
        if self.corrupted {
            parts.push("Corrupted".into());
        }
        if self.vengeance.is_some() {
            parts.push("Vengeance".into());
        }
        if self.null_field > 0 {
            parts.push(format!("Null Field {}", self.null_field));
        }
        if self.patron_gift {
            parts.push("Patron's Gift".into());
        }
        if self.storm_bracelet {
            parts.push("Storm Bracelet".into());
        }
        if self.oxidize > 0 {
            parts.push("Oxidize".into());
        }
        if self.reduce > 0 {
            parts.push("Reduce".into());
        }
        parts.join("; ")
    }

    /// Wipe all effects. The permanent-disable flag and the joke-mode
    /// overlay survive a purge.
    pub fn purge(&mut self) {
        let disabled = self.disabled;
        let joke_overlay = self.joke_overlay;
        *self = Status { disabled, joke_overlay, ..Status::default() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shield_cap_is_two() {
        let mut st = Status::default();
        st.shields = 2;
        st.shield_perm = 2;
        assert_eq!(st.total_shields(), 2);
    }

    #[test]
    fn test_purge_preserves_hard_fields() {
        let mut st = Status::default();
        st.thunder = 2;
        st.sealed = 1;
        st.disabled = true;
        st.joke_overlay = true;
        st.purge();
        assert_eq!(st.thunder, 0);
        assert_eq!(st.sealed, 0);
        assert!(st.disabled);
        assert!(st.joke_overlay);
    }

    #[test]
    fn test_brief_lists_active_effects() {
        let mut st = Status::default();
        st.shields = 1;
        st.thunder = 2;
        st.invisible = true;
        let brief = st.brief();
        assert!(brief.contains("Shield 1"));
        assert!(brief.contains("Thunder 2"));
        assert!(brief.contains("Invisible"));
    }
}
