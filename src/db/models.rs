// Data models: rows of the tally tables as they flow through the API.

use serde::{Deserialize, Serialize};

/// Dislike total for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDislikes {
    pub game_id: String,
    pub dislikes: i64,
}

/// Count for one emoji reaction on a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCount {
    pub emoji: String,
    pub count: i64,
}

/// Everything recorded for a single game. Unknown games have a zero tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTally {
    pub game_id: String,
    pub dislikes: i64,
    /// Sorted by count descending, then emoji name.
    pub reactions: Vec<ReactionCount>,
}
