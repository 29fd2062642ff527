use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::error::AppResult;
use crate::state::DbPool;

/// Return the user's active session token, creating one if none exists.
/// A user holds at most one session at a time; repeated logins share it.
pub fn create_or_reuse(pool: &DbPool, user_id: i64) -> AppResult<String> {
    let conn = pool.get()?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT token FROM sessions WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(token) = existing {
        return Ok(token);
    }

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token) VALUES (?1, ?2, ?3)",
        params![id, user_id, token],
    )?;

    Ok(token)
}

/// Delete a session by token. Returns false when the token was unknown.
pub fn delete(pool: &DbPool, token: &str) -> AppResult<bool> {
    let conn = pool.get()?;
    let rows = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(rows > 0)
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
