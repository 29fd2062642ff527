use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::questions::board::{self, VoteDirection};
use crate::state::AppState;

/// POST /event/{event_id}/question
pub async fn ask(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let obj = body
        .as_object()
        .ok_or_else(|| AppError::Validation("Extra field(s) present".into()))?;
    if obj.keys().any(|k| k != "question") {
        return Err(AppError::Validation("Extra field(s) present".into()));
    }

    // A malformed event id on this route is a 400, not a 404
    let event_id: i64 = event_id
        .parse()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::Validation("Invalid event id".into()))?;

    let text = obj
        .get("question")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Question text is required".into()))?;

    let question_id = board::ask(&state.db, &state.word_filter, event_id, user.user_id, text)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "question_id": question_id })),
    ))
}

/// DELETE /question/{question_id}
pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(question_id): Path<String>,
) -> AppResult<StatusCode> {
    let question_id = parse_question_id(&question_id)?;
    board::remove(&state.db, question_id, user.user_id)?;
    Ok(StatusCode::OK)
}

/// POST /question/{question_id}/vote
pub async fn vote_up(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(question_id): Path<String>,
) -> AppResult<StatusCode> {
    let question_id = parse_question_id(&question_id)?;
    board::vote(&state.db, question_id, user.user_id, VoteDirection::Up)?;
    Ok(StatusCode::OK)
}

/// DELETE /question/{question_id}/vote
pub async fn vote_down(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(question_id): Path<String>,
) -> AppResult<StatusCode> {
    let question_id = parse_question_id(&question_id)?;
    board::vote(&state.db, question_id, user.user_id, VoteDirection::Down)?;
    Ok(StatusCode::OK)
}

fn parse_question_id(raw: &str) -> AppResult<i64> {
    raw.parse()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(AppError::NotFound)
}
