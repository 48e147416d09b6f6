// Ready-made batchers for the two throttled game actions.
//
// Dislikes are keyed by game id. Emoji reactions use a composite
// "gameId:emoji" key so each (game, emoji) pair batches independently.

use serde_json::{json, Value};

use super::throttled::{ThrottledMutation, ThrottledMutationBuilder};

pub const DISLIKE_PATH: &str = "/api/games/dislike";
pub const REACTION_PATH: &str = "/api/games/reactions";

/// Payload for a dislike flush.
pub fn dislike_payload(game_id: &str, increment: u64) -> Value {
    json!({ "gameId": game_id, "increment": increment })
}

/// Payload for a reaction flush; `key` is a [`reaction_key`].
pub fn reaction_payload(key: &str, increment: u64) -> Value {
    let (game_id, emoji) = split_reaction_key(key).unwrap_or((key, ""));
    json!({ "gameId": game_id, "emoji": emoji, "increment": increment })
}

/// Build the composite batching key for a reaction.
pub fn reaction_key(game_id: &str, emoji: &str) -> String {
    format!("{game_id}:{emoji}")
}

/// Split a composite reaction key back into `(game_id, emoji)`.
///
/// Emoji names never contain ':', so the split is on the last one.
pub fn split_reaction_key(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once(':')
}

/// Builder for a dislike batcher against `api_base`.
pub fn dislike_batcher(api_base: &str) -> ThrottledMutationBuilder {
    ThrottledMutation::builder(endpoint(api_base, DISLIKE_PATH), dislike_payload)
}

/// Builder for a reaction batcher against `api_base`. Call `mutate` with
/// keys from [`reaction_key`].
pub fn reaction_batcher(api_base: &str) -> ThrottledMutationBuilder {
    ThrottledMutation::builder(endpoint(api_base, REACTION_PATH), reaction_payload)
}

fn endpoint(api_base: &str, path: &str) -> String {
    format!("{}{}", api_base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_key_round_trip() {
        let key = reaction_key("elden-ring", "clown");
        assert_eq!(key, "elden-ring:clown");
        assert_eq!(split_reaction_key(&key), Some(("elden-ring", "clown")));
    }

    #[test]
    fn test_reaction_payload_fields() {
        let payload = reaction_payload("anthem:skull", 7);
        assert_eq!(payload["gameId"], "anthem");
        assert_eq!(payload["emoji"], "skull");
        assert_eq!(payload["increment"], 7);
    }

    #[test]
    fn test_dislike_payload_fields() {
        let payload = dislike_payload("concord", 3);
        assert_eq!(payload, json!({ "gameId": "concord", "increment": 3 }));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            endpoint("http://localhost:3000/", DISLIKE_PATH),
            "http://localhost:3000/api/games/dislike"
        );
    }
}
