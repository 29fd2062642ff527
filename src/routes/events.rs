use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::db::models::{Category, CreatorProfile, UserPublic};
use crate::error::{AppError, AppResult};
use crate::events::store::{self, EventPatch, NewEvent};
use crate::events::{attendance, validate};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::questions::board::{self, QuestionEntry};
use crate::state::AppState;

const EVENT_FIELDS: &[&str] = &[
    "name",
    "description",
    "location",
    "start",
    "close_registration",
    "max_attendees",
    "categories",
];

#[derive(Serialize)]
struct EventDetail {
    event_id: i64,
    creator: CreatorProfile,
    name: String,
    description: String,
    location: String,
    start: i64,
    close_registration: i64,
    max_attendees: i64,
    number_attending: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    attendees: Option<Vec<UserPublic>>,
    questions: Vec<QuestionEntry>,
    categories: Vec<Category>,
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok().filter(|id| *id > 0)
}

/// POST /events
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let obj = body
        .as_object()
        .ok_or_else(|| AppError::Validation("Invalid field(s) in request body".into()))?;
    validate::reject_unknown_keys(obj, EVENT_FIELDS)?;

    let required_string = |key: &str| {
        obj.get(key)
            .and_then(validate::as_trimmed)
            .ok_or_else(|| validate::field_error(key))
    };
    let required_int = |key: &str| {
        obj.get(key)
            .and_then(validate::as_int)
            .ok_or_else(|| validate::field_error(key))
    };

    let name = required_string("name")?;
    let description = required_string("description")?;
    let location = required_string("location")?;
    let start = required_int("start")?;
    let close_registration = required_int("close_registration")?;
    let max_attendees = required_int("max_attendees")?;

    if start < 0 {
        return Err(validate::field_error("start"));
    }
    if close_registration < 0 {
        return Err(validate::field_error("close_registration"));
    }
    if max_attendees <= 0 {
        return Err(validate::field_error("max_attendees"));
    }

    let now = chrono::Utc::now().timestamp();
    if start <= now {
        return Err(AppError::Validation(
            "Start time must be in the future".into(),
        ));
    }
    if close_registration > start {
        return Err(AppError::Validation(
            "Registration cannot close after event start".into(),
        ));
    }

    let categories = match obj.get("categories") {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => validate::as_category_ids(v).ok_or_else(|| validate::field_error("categories"))?,
    };

    let event = NewEvent {
        name,
        description,
        location,
        start,
        close_registration,
        max_attendees,
        categories,
    };
    let event_id = store::create_event(&state.db, user.user_id, &event)?;

    Ok((StatusCode::CREATED, Json(json!({ "event_id": event_id }))))
}

/// GET /event/{event_id}
pub async fn detail(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    MaybeUser(user): MaybeUser,
) -> AppResult<impl IntoResponse> {
    let event_id = parse_id(&event_id).ok_or(AppError::NotFound)?;
    let event = store::event_details(&state.db, event_id)?.ok_or(AppError::NotFound)?;

    let (number_attending, attendees) = {
        let conn = state.db.get()?;
        let count = attendance::attendee_count(&conn, event_id)?;
        // The attendee list is private to the creator
        let listing = match &user {
            Some(u) if u.user_id == event.creator_id => {
                Some(attendance::list_attendees(&conn, event_id)?)
            }
            _ => None,
        };
        (count, listing)
    };

    let questions = board::list_for_event(&state.db, event_id)?;
    let mut categories = store::event_categories(&state.db, event_id)?;
    if categories.is_empty() {
        categories.push(Category {
            category_id: 0,
            name: "Undefined".into(),
        });
    }

    Ok(Json(EventDetail {
        event_id: event.event_id,
        creator: event.creator,
        name: event.name,
        description: event.description,
        location: event.location,
        start: event.start_date,
        close_registration: event.close_registration,
        max_attendees: event.max_attendees,
        number_attending,
        attendees,
        questions,
        categories,
    }))
}

/// PATCH /event/{event_id}
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    Json(body): Json<Value>,
) -> AppResult<StatusCode> {
    let event_id = parse_id(&event_id).ok_or(AppError::NotFound)?;
    let event = store::event_details(&state.db, event_id)?.ok_or(AppError::NotFound)?;
    if event.creator_id != user.user_id {
        return Err(AppError::Forbidden(
            "You can only update your own events".into(),
        ));
    }

    let obj = body
        .as_object()
        .ok_or_else(|| AppError::Validation("Invalid field(s) in request body".into()))?;
    validate::reject_unknown_keys(obj, EVENT_FIELDS)?;

    let mut patch = EventPatch::default();
    let now = chrono::Utc::now().timestamp();

    if let Some(v) = obj.get("name") {
        patch.name = Some(validate::as_trimmed(v).ok_or_else(|| validate::field_error("name"))?);
    }
    if let Some(v) = obj.get("description") {
        patch.description =
            Some(validate::as_trimmed(v).ok_or_else(|| validate::field_error("description"))?);
    }
    if let Some(v) = obj.get("location") {
        patch.location =
            Some(validate::as_trimmed(v).ok_or_else(|| validate::field_error("location"))?);
    }
    if let Some(v) = obj.get("start") {
        let start = validate::as_int(v)
            .filter(|s| *s >= 0)
            .ok_or_else(|| validate::field_error("start"))?;
        if start <= now {
            return Err(AppError::Validation(
                "Start time must be in the future".into(),
            ));
        }
        patch.start = Some(start);
    }
    if let Some(v) = obj.get("close_registration") {
        let close = validate::as_int(v)
            .filter(|c| *c >= 0)
            .ok_or_else(|| validate::field_error("close_registration"))?;
        // Compare against the start that will hold after this update
        let effective_start = patch.start.unwrap_or(event.start_date);
        if close > effective_start {
            return Err(AppError::Validation(
                "Registration cannot close after event start".into(),
            ));
        }
        patch.close_registration = Some(close);
    }
    if let Some(v) = obj.get("max_attendees") {
        let max = validate::as_int(v)
            .filter(|m| *m > 0)
            .ok_or_else(|| validate::field_error("max_attendees"))?;
        patch.max_attendees = Some(max);
    }
    if let Some(v) = obj.get("categories") {
        patch.categories =
            Some(validate::as_category_ids(v).ok_or_else(|| validate::field_error("categories"))?);
    }

    if patch.is_empty() {
        return Ok(StatusCode::OK);
    }

    store::update_event(&state.db, event_id, &patch)?;
    Ok(StatusCode::OK)
}

/// DELETE /event/{event_id} — sentinel cancellation, not a row delete.
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> AppResult<StatusCode> {
    let event_id = parse_id(&event_id).ok_or(AppError::NotFound)?;
    let event = store::event_details(&state.db, event_id)?.ok_or(AppError::NotFound)?;
    if event.creator_id != user.user_id {
        return Err(AppError::Forbidden(
            "You can only delete your own events".into(),
        ));
    }

    store::cancel_event(&state.db, event_id)?;
    Ok(StatusCode::OK)
}

/// POST /event/{event_id} — register the requester as an attendee.
pub async fn register_attendee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> AppResult<StatusCode> {
    let event_id = parse_id(&event_id).ok_or(AppError::NotFound)?;
    let now = chrono::Utc::now().timestamp();
    attendance::register(&state.db, event_id, user.user_id, now)?;
    Ok(StatusCode::OK)
}
