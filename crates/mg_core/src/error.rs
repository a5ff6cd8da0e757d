//! Engine error types.

use thiserror::Error;

use crate::models::CharacterId;

/// Errors surfaced by the public engine API.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised inside a single ability function.
///
/// These never escape the dispatch boundary: the dispatcher converts them
/// into counted fault records and the turn continues (a misbehaving ability
/// must never halt the simulation).
#[derive(Debug, Error)]
pub enum AbilityError {
    #[error("character {0} is missing from the roster")]
    MissingCharacter(CharacterId),
    #[error("character {0} is not present in the ranking")]
    NotRanked(CharacterId),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Result type returned by every ability function.
pub type AbilityResult = std::result::Result<(), AbilityError>;
