// Input rules for the mutation endpoints.
//
// The batcher trusts its caller and sends whatever it accumulated; the
// server is where increments and identifiers get bounded.

use std::sync::LazyLock;

use anyhow::Result;
use regex_lite::Regex;

/// Largest increment a single flush may carry.
pub const MAX_INCREMENT: i64 = 100;

static GAME_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid game id pattern"));

static EMOJI_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]{1,32}$").expect("valid emoji pattern"));

/// Game ids are slugs: letters, digits, '-' and '_', at most 64 chars.
/// No ':' so they can be joined with an emoji name into one batching key.
pub fn is_valid_game_id(game_id: &str) -> bool {
    GAME_ID.is_match(game_id)
}

/// [`is_valid_game_id`] as an error for the CLI.
pub fn require_game_id(game_id: &str) -> Result<()> {
    if !is_valid_game_id(game_id) {
        anyhow::bail!("Invalid game id: {game_id:?}");
    }
    Ok(())
}

/// Emoji names are lowercase shortcodes like `skull` or `thumbs_down`.
pub fn is_valid_emoji(emoji: &str) -> bool {
    EMOJI_NAME.is_match(emoji)
}

pub fn is_valid_increment(increment: i64) -> bool {
    (1..=MAX_INCREMENT).contains(&increment)
}
