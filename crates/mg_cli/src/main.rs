//! Headless driver for the elimination-game engine: watch a single game
//! unfold turn by turn, or run a batch and print placement statistics.

use anyhow::Result;
use clap::{Parser, Subcommand};

use mg_core::{roster, run_batch, BatchConfig, CharacterId, Game, GameConfig};

#[derive(Parser)]
#[command(name = "mg_cli", about = "Elimination-game simulator", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play one game to completion, printing the transcript.
    Play {
        /// RNG seed; omit for a random game.
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many turns even if the game is still going.
        #[arg(long, default_value_t = 500)]
        max_turns: u32,
        /// Print only the final standings, not the transcript.
        #[arg(long)]
        quiet: bool,
    },
    /// Run many headless games and print placement statistics.
    Batch {
        /// Number of games to simulate.
        #[arg(long, default_value_t = 500)]
        games: u32,
        /// Seed for the per-game seed stream; omit for entropy.
        #[arg(long)]
        seed: Option<u64>,
        /// Safety cap per game.
        #[arg(long, default_value_t = 5000)]
        turn_cap: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Play { seed, max_turns, quiet } => play(seed, max_turns, quiet),
        Command::Batch { games, seed, turn_cap } => batch(games, seed, turn_cap),
    }
}

fn play(seed: Option<u64>, max_turns: u32, quiet: bool) -> Result<()> {
    let mut game = Game::new(GameConfig { seed, fast_mode: false, joke_mode: false });
    let mut printed = 0usize;
    for _ in 0..max_turns {
        if game.game_over() {
            break;
        }
        game.tick_alive_turns();
        game.next_turn();
        if !quiet {
            for line in &game.full_log()[printed..] {
                println!("{}", line);
            }
        }
        printed = game.full_log().len();
    }
    println!();
    println!("turns played: {}", game.turn());
    println!("ability faults: {}", game.skill_fault_count());
    let survivors = game.alive_ids();
    match survivors.as_slice() {
        [winner] => println!("champion: {}", tag(&game, *winner)),
        [] => println!("no survivors"),
        rest => {
            println!("still standing after the cap:");
            for &id in rest {
                println!("  {}", tag(&game, id));
            }
        }
    }
    Ok(())
}

fn batch(games: u32, seed: Option<u64>, turn_cap: u32) -> Result<()> {
    let report = run_batch(&BatchConfig { games, seed, turn_cap });

    println!("games:        {}", report.total_games);
    println!("completed:    {}", report.completed_games);
    println!("timed out:    {}", report.timed_out_games);
    println!("skill faults: {}", report.skill_fault_games);
    println!();

    let mut by_champion: Vec<CharacterId> = roster().keys().copied().collect();
    by_champion.sort_by(|&a, &b| {
        report
            .champion_rate(b)
            .partial_cmp(&report.champion_rate(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    println!("{:<16} {:>9} {:>9} {:>10} {:>10}", "character", "win %", "top-3 %", "avg place", "avg turns");
    println!("{}", "-".repeat(58));
    for id in by_champion {
        let name = roster().get(&id).copied().unwrap_or("?");
        println!(
            "{:<16} {:>8.2}% {:>8.2}% {:>10} {:>10}",
            format!("{}({})", name, id),
            report.champion_rate(id) * 100.0,
            report.top3_rate(id) * 100.0,
            report
                .average_placement(id)
                .map_or_else(|| "-".to_string(), |v| format!("{:.2}", v)),
            report
                .average_survival_turns(id)
                .map_or_else(|| "-".to_string(), |v| format!("{:.1}", v)),
        );
    }
    Ok(())
}

fn tag(game: &Game, id: CharacterId) -> String {
    match game.character_name(id) {
        Some(name) => format!("{}({})", name, id),
        None => format!("Unknown({})", id),
    }
}
