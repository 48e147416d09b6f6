// POST /api/games/dislike: record a batch of dislikes for one game.
//
// The client batches clicks and sends the accumulated count as
// `increment`; one request may carry 1..=100 dislikes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{error, info};

use crate::validate::{is_valid_game_id, is_valid_increment, MAX_INCREMENT};
use crate::web::limit::{enforce, ClientId};
use crate::web::{api_error, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DislikeRequest {
    pub game_id: String,
    pub increment: i64,
}

pub async fn add_dislike(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    body: Result<Json<DislikeRequest>, JsonRejection>,
) -> Response {
    if let Err(rejected) = enforce(&state.limits.dislike, &client) {
        return rejected;
    }

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return api_error(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };

    if !is_valid_game_id(&body.game_id) {
        return api_error(StatusCode::BAD_REQUEST, "Invalid gameId");
    }
    if !is_valid_increment(body.increment) {
        return api_error(
            StatusCode::BAD_REQUEST,
            &format!("increment must be between 1 and {MAX_INCREMENT}"),
        );
    }

    match state.db.add_dislikes(&body.game_id, body.increment).await {
        Ok(total) => {
            info!(
                game_id = %body.game_id,
                increment = body.increment,
                total,
                "Recorded dislikes"
            );
            Json(serde_json::json!({
                "success": true,
                "gameId": body.game_id,
                "totalDislikes": total,
            }))
            .into_response()
        }
        Err(e) => {
            error!(error = %e, game_id = %body.game_id, "Failed to record dislikes");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to record dislike")
        }
    }
}
