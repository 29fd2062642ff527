use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use rusqlite::{params, OptionalExtension};
use serde_json::{json, Value};

use crate::auth::{password, session};
use crate::error::{AppError, AppResult};
use crate::extractors::AUTH_HEADER;
use crate::state::AppState;

/// POST /users — account registration.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let obj = body
        .as_object()
        .ok_or_else(|| AppError::Validation("Invalid field".into()))?;

    const ALLOWED: [&str; 4] = ["first_name", "last_name", "email", "password"];
    let exact_keys = obj.len() == ALLOWED.len() && ALLOWED.iter().all(|k| obj.contains_key(*k));
    if !exact_keys {
        return Err(AppError::Validation("Invalid field".into()));
    }

    let field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    };
    let (first_name, last_name, email, pw) = match (
        field("first_name"),
        field("last_name"),
        field("email"),
        field("password"),
    ) {
        (Some(f), Some(l), Some(e), Some(p)) => (f, l, e, p),
        _ => return Err(AppError::Validation("Invalid field".into())),
    };

    password::validate_policy(pw)?;
    let hashed = password::hash(pw)?;

    let conn = state.db.get()?;
    let inserted = conn.execute(
        "INSERT INTO users (first_name, last_name, email, password_hash) VALUES (?1, ?2, ?3, ?4)",
        params![first_name, last_name, email, hashed],
    );
    if inserted.is_err() {
        return Err(AppError::Validation(
            "The email address you entered is duplicated.".into(),
        ));
    }

    let user_id = conn.last_insert_rowid();
    Ok((StatusCode::CREATED, Json(json!({ "user_id": user_id }))))
}

/// POST /login — verify credentials and hand out the session token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let invalid = || AppError::Validation("The login field is invalid".into());

    let obj = body.as_object().ok_or_else(invalid)?;
    if obj.len() != 2 || !obj.contains_key("email") || !obj.contains_key("password") {
        return Err(invalid());
    }
    let email = obj
        .get("email")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(invalid)?;
    let pw = obj
        .get("password")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(invalid)?;

    let row = {
        let conn = state.db.get()?;
        conn.query_row(
            "SELECT user_id, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?
    };

    // Unknown email and wrong password are indistinguishable to the caller
    let Some((user_id, hashed)) = row else {
        return Err(AppError::Validation(
            "The input password is incorrect".into(),
        ));
    };
    if !password::verify(pw, &hashed) {
        return Err(AppError::Validation(
            "The input password is incorrect".into(),
        ));
    }

    let token = session::create_or_reuse(&state.db, user_id)?;
    Ok(Json(
        json!({ "user_id": user_id, "session_token": token }),
    ))
}

/// POST /logout — drop the session behind the presented token.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let token = headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    if !session::delete(&state.db, token)? {
        return Err(AppError::Unauthorized);
    }
    Ok(StatusCode::OK)
}
