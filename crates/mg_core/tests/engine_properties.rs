//! Engine-level properties exercised through the public contract only.

use std::collections::HashSet;

use mg_core::{Game, GameConfig};

fn seeded(seed: u64) -> Game {
    Game::new(GameConfig { seed: Some(seed), ..Default::default() })
}

/// The alive-ranking sequence holds each alive id exactly once after any
/// number of turns.
#[test]
fn test_ranking_invariant_holds_across_turns() {
    let mut game = seeded(1001);
    for _ in 0..60 {
        if game.game_over() {
            break;
        }
        game.tick_alive_turns();
        game.next_turn();
        let alive = game.alive_ids();
        let unique: HashSet<_> = alive.iter().copied().collect();
        assert_eq!(unique.len(), alive.len(), "no duplicates in the alive ranking");
        let snap = game.snapshot();
        assert_eq!(snap.rank, alive, "snapshot rank mirrors the live ranking");
        for id in alive {
            assert!(snap.status.get(&id).map_or(false, |s| s.alive));
        }
    }
}

/// Shield layers stay within [0, 2] everywhere the engine can take them.
#[test]
fn test_shield_cap_is_never_exceeded() {
    let mut game = seeded(1002);
    for _ in 0..60 {
        if game.game_over() {
            break;
        }
        game.tick_alive_turns();
        game.next_turn();
        for (_, summary) in game.snapshot().status {
            if let Some(rest) = summary.brief.strip_prefix("Shield ") {
                let layers: u32 = rest
                    .split(';')
                    .next()
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(0);
                assert!(layers <= 2 || layers == 99999, "displayed layers in cap: {}", layers);
            }
        }
    }
}

/// Scenario A: the world rule is dormant on turn 1.
#[test]
fn test_world_rule_is_dormant_on_the_first_turn() {
    let mut game = Game::new(GameConfig { seed: Some(42), ..Default::default() });
    game.tick_alive_turns();
    game.next_turn();
    assert_eq!(game.turn(), 1);
    let dormant = game
        .full_log()
        .iter()
        .any(|line| line.contains("[World Rule] dormant on the first turn"));
    assert!(dormant, "turn 1 must log the dormant world rule");
    assert!(
        !game.full_log().iter().any(|line| line.contains("[World Rule] executes 4th place")),
        "no 4th-place execution may happen on turn 1"
    );
}

/// The world rule claims the 4th place from turn 2 onward (whenever at
/// least four characters are alive).
#[test]
fn test_world_rule_executes_fourth_place_from_turn_two() {
    let mut game = seeded(43);
    game.tick_alive_turns();
    game.next_turn();
    game.tick_alive_turns();
    game.next_turn();
    assert!(game
        .full_log()
        .iter()
        .any(|line| line.contains("[World Rule] executes 4th place")));
}

/// Snapshots are pure reads: two in a row are structurally identical.
#[test]
fn test_snapshot_is_idempotent() {
    let mut game = seeded(1003);
    for _ in 0..3 {
        game.tick_alive_turns();
        game.next_turn();
    }
    assert_eq!(game.snapshot(), game.snapshot());
}

/// Round-trip replay: applying frames in order ends on exactly the state
/// `snapshot()` reports after the turn.
#[test]
fn test_replay_frames_reconstruct_the_final_state() {
    let mut game = seeded(1004);
    for _ in 0..5 {
        if game.game_over() {
            break;
        }
        game.tick_alive_turns();
        game.next_turn();
        let frames = game.replay_frames_for_last_turn();
        assert!(!frames.is_empty(), "every turn emits at least its markers");
        let mut display_state = None;
        for frame in frames {
            display_state = Some(frame.snapshot.clone());
        }
        assert_eq!(display_state.unwrap(), game.snapshot());
    }
}

/// Every frame's highlighted ids appear in its text.
#[test]
fn test_frame_highlights_are_derived_from_the_text() {
    let mut game = seeded(1005);
    for _ in 0..4 {
        game.tick_alive_turns();
        game.next_turn();
        for frame in game.replay_frames_for_last_turn() {
            for id in &frame.highlights {
                assert!(
                    frame.text.contains(&format!("({})", id)),
                    "highlight {} not present in {:?}",
                    id,
                    frame.text
                );
            }
        }
    }
}

/// Scenario D: games terminate well under the safety cap; the stalemate
/// rule guarantees it.
#[test]
fn test_games_terminate_under_the_turn_cap() {
    for seed in [7u64, 1337, 90210] {
        let mut game = seeded(seed);
        let mut turns = 0u32;
        while !game.game_over() && turns < 5000 {
            game.tick_alive_turns();
            game.next_turn();
            turns += 1;
        }
        assert!(game.game_over(), "seed {} failed to conclude within the cap", seed);
    }
}

/// The elimination history never shrinks while a game runs.
#[test]
fn test_elimination_history_is_monotonic_absent_revival_events() {
    let mut game = seeded(1006);
    let mut last_len = 0usize;
    for _ in 0..30 {
        if game.game_over() {
            break;
        }
        game.tick_alive_turns();
        game.next_turn();
        let history = game.elimination_order();
        // The mass-revival event is the single sanctioned exception; it
        // removes ids but never reorders the remainder.
        if history.len() >= last_len {
            last_len = history.len();
        } else {
            let revived = game
                .full_log()
                .iter()
                .any(|line| line.contains("Sunlight Under the Ice"));
            assert!(revived, "history shrank without the mass-revival event");
            last_len = history.len();
        }
    }
}

/// The game-over notice is an idempotent no-op.
#[test]
fn test_next_turn_after_game_over_is_a_noop() {
    let mut game = seeded(1007);
    let mut guard = 0u32;
    while !game.game_over() && guard < 5000 {
        game.tick_alive_turns();
        game.next_turn();
        guard += 1;
    }
    assert!(game.game_over());
    let snapshot = game.snapshot();
    let turn = game.turn();
    game.next_turn();
    assert_eq!(game.turn(), turn);
    assert_eq!(game.snapshot(), snapshot);
    assert!(game
        .full_log()
        .last()
        .map_or(false, |line| line.contains("this game is over")));
}

/// Fast mode records nothing but still concludes identically.
#[test]
fn test_fast_mode_skips_the_log() {
    let mut game = Game::new(GameConfig {
        seed: Some(1008),
        fast_mode: true,
        joke_mode: false,
    });
    for _ in 0..10 {
        game.tick_alive_turns();
        game.next_turn();
    }
    assert!(game.full_log().is_empty());
    assert!(game.replay_frames_for_last_turn().is_empty());
}
