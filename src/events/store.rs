use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::db::models::{Category, CreatorProfile};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

/// A fully validated creation payload.
#[derive(Debug)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub location: String,
    pub start: i64,
    pub close_registration: i64,
    pub max_attendees: i64,
    pub categories: Vec<i64>,
}

/// A validated partial update. `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<i64>,
    pub close_registration: Option<i64>,
    pub max_attendees: Option<i64>,
    pub categories: Option<Vec<i64>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.start.is_none()
            && self.close_registration.is_none()
            && self.max_attendees.is_none()
            && self.categories.is_none()
    }
}

/// An event row joined with its creator's profile.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event_id: i64,
    pub name: String,
    pub description: String,
    pub location: String,
    pub start_date: i64,
    pub close_registration: i64,
    pub max_attendees: i64,
    pub creator_id: i64,
    pub creator: CreatorProfile,
}

/// Persist a new event and its category associations in one transaction.
pub fn create_event(pool: &DbPool, creator_id: i64, event: &NewEvent) -> AppResult<i64> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if !categories_exist(&tx, &event.categories)? {
        return Err(AppError::Validation("Invalid categories".into()));
    }

    tx.execute(
        "INSERT INTO events (name, description, location, start_date, close_registration, max_attendees, creator_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.name,
            event.description,
            event.location,
            event.start,
            event.close_registration,
            event.max_attendees,
            creator_id
        ],
    )?;
    let event_id = tx.last_insert_rowid();

    replace_categories(&tx, event_id, &event.categories)?;
    tx.commit()?;

    Ok(event_id)
}

pub fn event_details(pool: &DbPool, event_id: i64) -> AppResult<Option<EventRecord>> {
    let conn = pool.get()?;
    let record = conn
        .query_row(
            "SELECT e.event_id, e.name, e.description, e.location, e.start_date,
                    e.close_registration, e.max_attendees, e.creator_id,
                    u.first_name, u.last_name, u.email
             FROM events e
             LEFT JOIN users u ON u.user_id = e.creator_id
             WHERE e.event_id = ?1",
            params![event_id],
            |row| {
                Ok(EventRecord {
                    event_id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    location: row.get(3)?,
                    start_date: row.get(4)?,
                    close_registration: row.get(5)?,
                    max_attendees: row.get(6)?,
                    creator_id: row.get(7)?,
                    creator: CreatorProfile {
                        creator_id: row.get(7)?,
                        first_name: row.get(8)?,
                        last_name: row.get(9)?,
                        email: row.get(10)?,
                    },
                })
            },
        )
        .optional()?;
    Ok(record)
}

/// Apply a partial update. Category replacement is wholesale:
/// existing associations are deleted and the supplied set reinserted.
pub fn update_event(pool: &DbPool, event_id: i64, patch: &EventPatch) -> AppResult<()> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if let Some(ids) = &patch.categories {
        if !categories_exist(&tx, ids)? {
            return Err(AppError::Validation("Invalid categories".into()));
        }
    }

    let mut sets: Vec<&str> = Vec::new();
    let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    if let Some(name) = &patch.name {
        sets.push("name = ?");
        args.push(Box::new(name.clone()));
    }
    if let Some(description) = &patch.description {
        sets.push("description = ?");
        args.push(Box::new(description.clone()));
    }
    if let Some(location) = &patch.location {
        sets.push("location = ?");
        args.push(Box::new(location.clone()));
    }
    if let Some(start) = patch.start {
        sets.push("start_date = ?");
        args.push(Box::new(start));
    }
    if let Some(close_registration) = patch.close_registration {
        sets.push("close_registration = ?");
        args.push(Box::new(close_registration));
    }
    if let Some(max_attendees) = patch.max_attendees {
        sets.push("max_attendees = ?");
        args.push(Box::new(max_attendees));
    }

    if !sets.is_empty() {
        let sql = format!("UPDATE events SET {} WHERE event_id = ?", sets.join(", "));
        args.push(Box::new(event_id));
        let refs: Vec<&dyn rusqlite::types::ToSql> = args.iter().map(|a| a.as_ref()).collect();
        tx.execute(&sql, refs.as_slice())?;
    }

    if let Some(ids) = &patch.categories {
        replace_categories(&tx, event_id, ids)?;
    }

    tx.commit()?;
    Ok(())
}

/// Soft-delete: close_registration = -1 marks the event cancelled.
pub fn cancel_event(pool: &DbPool, event_id: i64) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "UPDATE events SET close_registration = -1 WHERE event_id = ?1",
        params![event_id],
    )?;
    Ok(())
}

pub fn event_categories(pool: &DbPool, event_id: i64) -> AppResult<Vec<Category>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT c.category_id, c.name
         FROM event_categories ec
         JOIN categories c ON c.category_id = ec.category_id
         WHERE ec.event_id = ?1
         ORDER BY c.category_id ASC",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            Ok(Category {
                category_id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_categories(pool: &DbPool) -> AppResult<Vec<Category>> {
    let conn = pool.get()?;
    let mut stmt =
        conn.prepare("SELECT category_id, name FROM categories ORDER BY category_id ASC")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Category {
                category_id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn categories_exist(conn: &Connection, ids: &[i64]) -> AppResult<bool> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM categories WHERE category_id = ?1")?;
    for id in ids {
        let found: i64 = stmt.query_row(params![id], |row| row.get(0))?;
        if found == 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

fn replace_categories(conn: &Connection, event_id: i64, ids: &[i64]) -> AppResult<()> {
    conn.execute(
        "DELETE FROM event_categories WHERE event_id = ?1",
        params![event_id],
    )?;
    let mut stmt =
        conn.prepare("INSERT INTO event_categories (event_id, category_id) VALUES (?1, ?2)")?;
    for id in ids {
        stmt.execute(params![event_id, id])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn test_pool() -> (tempfile::TempDir, DbPool) {
        let tmp = tempfile::tempdir().unwrap();
        let pool = db::create_pool(&tmp.path().join("test.db")).unwrap();
        db::run_migrations(&pool).unwrap();
        (tmp, pool)
    }

    fn seed_user(pool: &DbPool, email: &str) -> i64 {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (first_name, last_name, email, password_hash) VALUES ('A', 'B', ?1, 'x')",
            params![email],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    fn sample_event(categories: Vec<i64>) -> NewEvent {
        NewEvent {
            name: "Launch party".into(),
            description: "An evening of demos".into(),
            location: "Main hall".into(),
            start: 2_000_000_000,
            close_registration: 1_999_999_000,
            max_attendees: 10,
            categories,
        }
    }

    #[test]
    fn create_and_fetch_roundtrip() {
        let (_tmp, pool) = test_pool();
        let creator = seed_user(&pool, "a@b.c");

        let event_id = create_event(&pool, creator, &sample_event(vec![1, 2])).unwrap();
        let record = event_details(&pool, event_id).unwrap().unwrap();

        assert_eq!(record.name, "Launch party");
        assert_eq!(record.creator_id, creator);
        assert_eq!(record.creator.email, "a@b.c");

        let cats = event_categories(&pool, event_id).unwrap();
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].category_id, 1);
    }

    #[test]
    fn create_rejects_unknown_category() {
        let (_tmp, pool) = test_pool();
        let creator = seed_user(&pool, "a@b.c");

        let err = create_event(&pool, creator, &sample_event(vec![999])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // The whole insert rolled back
        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn missing_event_is_none() {
        let (_tmp, pool) = test_pool();
        assert!(event_details(&pool, 42).unwrap().is_none());
    }

    #[test]
    fn update_touches_only_supplied_fields() {
        let (_tmp, pool) = test_pool();
        let creator = seed_user(&pool, "a@b.c");
        let event_id = create_event(&pool, creator, &sample_event(vec![])).unwrap();

        let patch = EventPatch {
            name: Some("Renamed".into()),
            max_attendees: Some(3),
            ..Default::default()
        };
        update_event(&pool, event_id, &patch).unwrap();

        let record = event_details(&pool, event_id).unwrap().unwrap();
        assert_eq!(record.name, "Renamed");
        assert_eq!(record.max_attendees, 3);
        assert_eq!(record.description, "An evening of demos");
        assert_eq!(record.start_date, 2_000_000_000);
    }

    #[test]
    fn update_replaces_categories_wholesale() {
        let (_tmp, pool) = test_pool();
        let creator = seed_user(&pool, "a@b.c");
        let event_id = create_event(&pool, creator, &sample_event(vec![1, 2])).unwrap();

        let patch = EventPatch {
            categories: Some(vec![3]),
            ..Default::default()
        };
        update_event(&pool, event_id, &patch).unwrap();
        let cats = event_categories(&pool, event_id).unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].category_id, 3);

        // Empty list clears associations
        let patch = EventPatch {
            categories: Some(vec![]),
            ..Default::default()
        };
        update_event(&pool, event_id, &patch).unwrap();
        assert!(event_categories(&pool, event_id).unwrap().is_empty());
    }

    #[test]
    fn cancel_sets_the_sentinel() {
        let (_tmp, pool) = test_pool();
        let creator = seed_user(&pool, "a@b.c");
        let event_id = create_event(&pool, creator, &sample_event(vec![])).unwrap();

        cancel_event(&pool, event_id).unwrap();
        let record = event_details(&pool, event_id).unwrap().unwrap();
        assert_eq!(record.close_registration, -1);
    }

    #[test]
    fn seeded_categories_are_listed_in_id_order() {
        let (_tmp, pool) = test_pool();
        let cats = list_categories(&pool).unwrap();
        assert!(!cats.is_empty());
        assert!(cats.windows(2).all(|w| w[0].category_id < w[1].category_id));
    }
}
