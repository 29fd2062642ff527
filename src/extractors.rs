use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rusqlite::params;

use crate::error::AppError;
use crate::state::AppState;

/// Session tokens travel in this header on every authenticated request.
pub const AUTH_HEADER: &str = "X-Authorization";

/// Represents the currently authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Extractor that requires authentication.
/// Returns 401 if no valid session found.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = auth_token(parts).ok_or(AppError::Unauthorized)?;

        let conn = state.db.get().map_err(AppError::Pool)?;
        conn.query_row(
            "SELECT u.user_id, u.first_name, u.last_name, u.email FROM sessions s \
             JOIN users u ON u.user_id = s.user_id \
             WHERE s.token = ?1",
            params![token],
            |row| {
                Ok(CurrentUser {
                    user_id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    email: row.get(3)?,
                })
            },
        )
        .map_err(|_| AppError::Unauthorized)
    }
}

/// Optional user extractor — returns None instead of 401 when not authenticated.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(_) => Ok(MaybeUser(None)),
        }
    }
}

fn auth_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
