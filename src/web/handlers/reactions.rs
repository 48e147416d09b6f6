// POST /api/games/reactions: record a batch of one emoji reaction.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{error, info};

use crate::validate::{is_valid_emoji, is_valid_game_id, is_valid_increment, MAX_INCREMENT};
use crate::web::limit::{enforce, ClientId};
use crate::web::{api_error, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    pub game_id: String,
    pub emoji: String,
    pub increment: i64,
}

pub async fn add_reaction(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    body: Result<Json<ReactionRequest>, JsonRejection>,
) -> Response {
    if let Err(rejected) = enforce(&state.limits.reaction, &client) {
        return rejected;
    }

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return api_error(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };

    if !is_valid_game_id(&body.game_id) {
        return api_error(StatusCode::BAD_REQUEST, "Invalid gameId");
    }
    if !is_valid_emoji(&body.emoji) {
        return api_error(StatusCode::BAD_REQUEST, "Invalid emoji");
    }
    if !is_valid_increment(body.increment) {
        return api_error(
            StatusCode::BAD_REQUEST,
            &format!("increment must be between 1 and {MAX_INCREMENT}"),
        );
    }

    match state
        .db
        .add_reaction(&body.game_id, &body.emoji, body.increment)
        .await
    {
        Ok(count) => {
            info!(
                game_id = %body.game_id,
                emoji = %body.emoji,
                increment = body.increment,
                count,
                "Recorded reaction"
            );
            Json(serde_json::json!({
                "success": true,
                "gameId": body.game_id,
                "emoji": body.emoji,
                "count": count,
            }))
            .into_response()
        }
        Err(e) => {
            error!(error = %e, game_id = %body.game_id, "Failed to record reaction");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to record reaction")
        }
    }
}
