// Database trait: async interface the HTTP handlers and CLI go through.
//
// Methods are async so the rusqlite backend (sync, behind a Mutex) and any
// future native-async backend fit behind the same `Arc<dyn Database>`.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{GameDislikes, GameTally};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Writes ---

    /// Add to a game's dislike total; returns the new total.
    async fn add_dislikes(&self, game_id: &str, increment: i64) -> Result<i64>;

    /// Add to one emoji reaction on a game; returns the new count.
    async fn add_reaction(&self, game_id: &str, emoji: &str, increment: i64) -> Result<i64>;

    // --- Reads ---

    /// Dislikes and reactions for one game (zeroed if never seen).
    async fn get_tally(&self, game_id: &str) -> Result<GameTally>;

    /// Most disliked games, highest first.
    async fn top_disliked(&self, limit: u32) -> Result<Vec<GameDislikes>>;
}
