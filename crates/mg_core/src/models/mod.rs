//! Entity and status model: character identity, typed status effects and
//! per-ability scratch memory.

mod character;
mod memory;
mod status;

pub use character::{ids, roster, Character, CharacterId, PATRON_NPC_ID, STORMCALLER_NPC_ID};
pub use memory::AbilityMemory;
pub use status::{Status, VengeanceCurse};
