// Colored terminal output for the CLI.

use colored::Colorize;

use crate::db::models::{GameDislikes, GameTally};

/// How a CLI click burst ended, per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurstOutcome {
    Sent,
    Failed { accumulated: u64, reason: String },
    /// No flush callback arrived before the CLI stopped waiting.
    TimedOut,
}

/// Display the most disliked games.
pub fn display_top(games: &[GameDislikes]) {
    if games.is_empty() {
        println!("No dislikes recorded yet.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Most Disliked ({} games) ===", games.len()).bold()
    );
    println!();
    println!(
        "  {:>4}  {:<36} {:>9}",
        "Rank".dimmed(),
        "Game".dimmed(),
        "Dislikes".dimmed(),
    );
    println!("  {}", "-".repeat(52).dimmed());

    for (i, game) in games.iter().enumerate() {
        let rank = format!("{:>4}.", i + 1);
        let rank = if i == 0 { rank.red().bold() } else { rank.normal() };
        println!(
            "  {} {:<36} {:>9}",
            rank,
            super::truncate_chars(&game.game_id, 33),
            game.dislikes,
        );
    }
    println!();
}

/// Display one game's dislikes and reactions.
pub fn display_tally(tally: &GameTally) {
    println!("\n{}", format!("=== {} ===", tally.game_id).bold());
    println!("  Dislikes: {}", tally.dislikes.to_string().red());

    if tally.reactions.is_empty() {
        println!("  Reactions: {}", "none".dimmed());
        return;
    }

    println!("  Reactions:");
    for reaction in &tally.reactions {
        println!("    :{}:  {}", reaction.emoji, reaction.count);
    }
}

/// One line per flushed key after a click burst.
pub fn display_burst_result(label: &str, clicks: u64, outcome: &BurstOutcome) {
    match outcome {
        BurstOutcome::Sent => println!(
            "  {} {label}: {clicks} clicks sent",
            "ok".green().bold()
        ),
        BurstOutcome::Failed {
            accumulated,
            reason,
        } => println!(
            "  {} {label}: {accumulated} clicks dropped ({reason})",
            "failed".red().bold()
        ),
        BurstOutcome::TimedOut => println!(
            "  {} {label}: no response from the server",
            "?".yellow()
        ),
    }
}
