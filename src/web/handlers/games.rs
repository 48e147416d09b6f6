// Read endpoints: a single game's tally and the dislike leaderboard.
//
// GET /api/games/{game_id}
// GET /api/games/top?limit=N

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;

use crate::validate::is_valid_game_id;
use crate::web::limit::{enforce, ClientId};
use crate::web::{api_error, AppState};

const DEFAULT_TOP_LIMIT: u32 = 10;
const MAX_TOP_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<u32>,
}

pub async fn get_game(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Path(game_id): Path<String>,
) -> Response {
    if let Err(rejected) = enforce(&state.limits.read, &client) {
        return rejected;
    }
    if !is_valid_game_id(&game_id) {
        return api_error(StatusCode::BAD_REQUEST, "Invalid gameId");
    }

    match state.db.get_tally(&game_id).await {
        Ok(tally) => Json(tally).into_response(),
        Err(e) => {
            error!(error = %e, game_id = %game_id, "Failed to load tally");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load game")
        }
    }
}

pub async fn top_games(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> Response {
    if let Err(rejected) = enforce(&state.limits.read, &client) {
        return rejected;
    }

    let limit = match query {
        Ok(Query(q)) => q.limit.unwrap_or(DEFAULT_TOP_LIMIT),
        Err(rejection) => return api_error(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    if !(1..=MAX_TOP_LIMIT).contains(&limit) {
        return api_error(
            StatusCode::BAD_REQUEST,
            &format!("limit must be between 1 and {MAX_TOP_LIMIT}"),
        );
    }

    match state.db.top_disliked(limit).await {
        Ok(games) => Json(serde_json::json!({ "games": games })).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load leaderboard");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load leaderboard")
        }
    }
}
