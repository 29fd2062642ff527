use rusqlite::{params, OptionalExtension, TransactionBehavior};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::events::attendance;
use crate::questions::moderation::WordFilter;
use crate::state::DbPool;

#[derive(Debug, Serialize)]
pub struct AskedBy {
    pub user_id: i64,
    pub first_name: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionEntry {
    pub question_id: i64,
    pub question: String,
    pub votes: i64,
    pub asked_by: Option<AskedBy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

/// Questions for an event, newest first.
pub fn list_for_event(pool: &DbPool, event_id: i64) -> AppResult<Vec<QuestionEntry>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT q.question_id, q.question, q.votes, q.asked_by, u.first_name
         FROM questions q
         LEFT JOIN users u ON u.user_id = q.asked_by
         WHERE q.event_id = ?1
         ORDER BY q.question_id DESC",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            let asked_by: Option<i64> = row.get(3)?;
            let first_name: Option<String> = row.get(4)?;
            Ok(QuestionEntry {
                question_id: row.get(0)?,
                question: row.get(1)?,
                votes: row.get(2)?,
                asked_by: asked_by.map(|user_id| AskedBy {
                    user_id,
                    first_name: first_name.unwrap_or_default(),
                }),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Ask a question on an event. The creator is excluded; the asker must be a
/// registered attendee. Text is run through the moderation filter before
/// storage.
pub fn ask(
    pool: &DbPool,
    filter: &WordFilter,
    event_id: i64,
    user_id: i64,
    text: &str,
) -> AppResult<i64> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let creator_id: Option<i64> = tx
        .query_row(
            "SELECT creator_id FROM events WHERE event_id = ?1",
            params![event_id],
            |row| row.get(0),
        )
        .optional()?;
    let creator_id =
        creator_id.ok_or_else(|| AppError::Validation("Event does not exist".into()))?;

    if creator_id == user_id {
        return Err(AppError::Forbidden(
            "You cannot ask questions on your own event".into(),
        ));
    }
    if !attendance::is_attendee(&tx, event_id, user_id)? {
        return Err(AppError::Forbidden(
            "Only registered attendees can ask questions".into(),
        ));
    }

    let clean = filter.censor(text);
    tx.execute(
        "INSERT INTO questions (question, asked_by, event_id, votes) VALUES (?1, ?2, ?3, 0)",
        params![clean, user_id, event_id],
    )?;
    let question_id = tx.last_insert_rowid();
    tx.commit()?;

    Ok(question_id)
}

/// Delete a question. Allowed for its author and for the owning event's
/// creator; vote rows go with it via the foreign-key cascade.
pub fn remove(pool: &DbPool, question_id: i64, user_id: i64) -> AppResult<()> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let row = tx
        .query_row(
            "SELECT q.asked_by, e.creator_id
             FROM questions q
             LEFT JOIN events e ON e.event_id = q.event_id
             WHERE q.question_id = ?1",
            params![question_id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?)),
        )
        .optional()?;
    let (asked_by, creator_id) = row.ok_or(AppError::NotFound)?;

    if asked_by != user_id && creator_id != Some(user_id) {
        return Err(AppError::Forbidden(
            "You can only delete your own questions or questions on your own events".into(),
        ));
    }

    tx.execute(
        "DELETE FROM questions WHERE question_id = ?1",
        params![question_id],
    )?;
    tx.commit()?;
    Ok(())
}

/// Cast a vote. One vote record per (question, voter) pair — once it exists
/// no further vote is accepted in either direction. An up-vote increments
/// the counter, a down-vote decrements it (it may go negative).
pub fn vote(
    pool: &DbPool,
    question_id: i64,
    voter_id: i64,
    direction: VoteDirection,
) -> AppResult<()> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let exists = tx
        .query_row(
            "SELECT question_id FROM questions WHERE question_id = ?1",
            params![question_id],
            |_row| Ok(()),
        )
        .optional()?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let voted = tx
        .query_row(
            "SELECT 1 FROM votes WHERE question_id = ?1 AND voter_id = ?2",
            params![question_id, voter_id],
            |_row| Ok(()),
        )
        .optional()?;
    if voted.is_some() {
        return Err(AppError::Forbidden(
            "You have already voted on this question".into(),
        ));
    }

    tx.execute(
        "INSERT INTO votes (question_id, voter_id) VALUES (?1, ?2)",
        params![question_id, voter_id],
    )?;
    let update = match direction {
        VoteDirection::Up => "UPDATE questions SET votes = votes + 1 WHERE question_id = ?1",
        VoteDirection::Down => "UPDATE questions SET votes = votes - 1 WHERE question_id = ?1",
    };
    tx.execute(update, params![question_id])?;
    tx.commit()?;
    Ok(())
}
