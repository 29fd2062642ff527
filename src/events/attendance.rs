use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::db::models::UserPublic;
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

/// Size of the attendee union: the creator plus every attendance row,
/// deduplicated. This is the count capacity checks run against.
pub fn attendee_count(conn: &Connection, event_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*)
         FROM (
            SELECT a.user_id FROM attendees a WHERE a.event_id = ?1
            UNION
            SELECT e.creator_id AS user_id FROM events e WHERE e.event_id = ?1
         ) AS members",
        params![event_id],
        |row| row.get(0),
    )
}

/// The attendee union as profiles, ordered by user id ascending.
pub fn list_attendees(conn: &Connection, event_id: i64) -> rusqlite::Result<Vec<UserPublic>> {
    let mut stmt = conn.prepare(
        "SELECT u.user_id, u.first_name, u.last_name, u.email
         FROM users u
         WHERE u.user_id IN (
            SELECT a.user_id FROM attendees a WHERE a.event_id = ?1
            UNION
            SELECT e.creator_id FROM events e WHERE e.event_id = ?1
         )
         ORDER BY u.user_id ASC",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            Ok(UserPublic {
                user_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn is_attendee(conn: &Connection, event_id: i64, user_id: i64) -> rusqlite::Result<bool> {
    let row = conn
        .query_row(
            "SELECT 1 FROM attendees WHERE event_id = ?1 AND user_id = ?2",
            params![event_id, user_id],
            |_row| Ok(()),
        )
        .optional()?;
    Ok(row.is_some())
}

/// Register a user for an event. Every check and the insert run inside one
/// immediate transaction, so two concurrent registrations cannot both pass
/// the capacity check. Check order is fixed: ownership, registration
/// window, capacity, duplicate.
pub fn register(pool: &DbPool, event_id: i64, user_id: i64, now: i64) -> AppResult<()> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let event = tx
        .query_row(
            "SELECT creator_id, close_registration, max_attendees FROM events WHERE event_id = ?1",
            params![event_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )
        .optional()?;
    let (creator_id, close_registration, max_attendees) = event.ok_or(AppError::NotFound)?;

    if creator_id == user_id {
        return Err(AppError::Forbidden("You are already registered".into()));
    }
    if now > close_registration {
        return Err(AppError::Forbidden("Registration is closed".into()));
    }
    if attendee_count(&tx, event_id)? >= max_attendees {
        return Err(AppError::Forbidden("Event is at capacity".into()));
    }
    if is_attendee(&tx, event_id, user_id)? {
        return Err(AppError::Forbidden("You are already registered".into()));
    }

    tx.execute(
        "INSERT INTO attendees (event_id, user_id) VALUES (?1, ?2)",
        params![event_id, user_id],
    )?;
    tx.commit()?;
    Ok(())
}
