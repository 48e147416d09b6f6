// Database queries: every SQL statement the app runs lives here.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{GameDislikes, GameTally, ReactionCount};

// --- Dislikes ---

/// Add `increment` to a game's dislike total and return the new total.
pub fn add_dislikes(conn: &Connection, game_id: &str, increment: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO game_dislikes (game_id, dislikes, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(game_id) DO UPDATE SET
            dislikes = dislikes + ?2,
            updated_at = datetime('now')",
        params![game_id, increment],
    )?;

    let total = conn.query_row(
        "SELECT dislikes FROM game_dislikes WHERE game_id = ?1",
        params![game_id],
        |row| row.get(0),
    )?;
    Ok(total)
}

/// Games ranked by dislike total, highest first.
pub fn top_disliked(conn: &Connection, limit: u32) -> Result<Vec<GameDislikes>> {
    let mut stmt = conn.prepare(
        "SELECT game_id, dislikes FROM game_dislikes
         ORDER BY dislikes DESC, game_id ASC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(GameDislikes {
            game_id: row.get(0)?,
            dislikes: row.get(1)?,
        })
    })?;

    let mut games = Vec::new();
    for row in rows {
        games.push(row?);
    }
    Ok(games)
}

// --- Reactions ---

/// Add `increment` to one emoji reaction on a game and return its new count.
pub fn add_reaction(conn: &Connection, game_id: &str, emoji: &str, increment: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO game_reactions (game_id, emoji, count, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(game_id, emoji) DO UPDATE SET
            count = count + ?3,
            updated_at = datetime('now')",
        params![game_id, emoji, increment],
    )?;

    let count = conn.query_row(
        "SELECT count FROM game_reactions WHERE game_id = ?1 AND emoji = ?2",
        params![game_id, emoji],
        |row| row.get(0),
    )?;
    Ok(count)
}

// --- Tally ---

/// Dislikes plus every reaction for one game. Unknown games come back zeroed.
pub fn get_tally(conn: &Connection, game_id: &str) -> Result<GameTally> {
    let dislikes: Option<i64> = conn
        .query_row(
            "SELECT dislikes FROM game_dislikes WHERE game_id = ?1",
            params![game_id],
            |row| row.get(0),
        )
        .optional()?;

    let mut stmt = conn.prepare(
        "SELECT emoji, count FROM game_reactions
         WHERE game_id = ?1
         ORDER BY count DESC, emoji ASC",
    )?;
    let rows = stmt.query_map(params![game_id], |row| {
        Ok(ReactionCount {
            emoji: row.get(0)?,
            count: row.get(1)?,
        })
    })?;

    let mut reactions = Vec::new();
    for row in rows {
        reactions.push(row?);
    }

    Ok(GameTally {
        game_id: game_id.to_string(),
        dislikes: dislikes.unwrap_or(0),
        reactions,
    })
}
