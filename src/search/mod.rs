pub mod filters;

use rusqlite::types::ToSql;
use serde::Serialize;

use crate::db::models::CreatorProfile;
use crate::error::{AppError, AppResult};
use crate::search::filters::{EventQuery, Predicate};
use crate::state::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    MyEvents,
    Attending,
    Open,
    Archive,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MY_EVENTS" => Some(Self::MyEvents),
            "ATTENDING" => Some(Self::Attending),
            "OPEN" => Some(Self::Open),
            "ARCHIVE" => Some(Self::Archive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    Id(i64),
    /// Events with no category association at all.
    Unassigned,
}

#[derive(Debug, Default)]
pub struct SearchFilters {
    pub query: Option<String>,
    pub status: Option<StatusFilter>,
    pub category: Option<CategoryFilter>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub event_id: i64,
    pub creator: CreatorProfile,
    pub name: String,
    pub description: String,
    pub location: String,
    pub start: i64,
    pub close_registration: i64,
    pub max_attendees: i64,
}

/// Run the filtered listing. `requester` feeds the user-scoped status
/// buckets; those fail with 401 when it is absent.
pub fn search_events(
    pool: &DbPool,
    filters: &SearchFilters,
    requester: Option<i64>,
    now: i64,
) -> AppResult<Vec<EventSummary>> {
    let mut query = EventQuery::new();

    if let Some(q) = &filters.query {
        query.and(Predicate::new("e.name LIKE ?").bind(format!("%{}%", q)));
    }

    match filters.status {
        Some(StatusFilter::MyEvents) => {
            let user_id = requester.ok_or(AppError::Unauthorized)?;
            query.and(Predicate::new("e.creator_id = ?").bind(user_id));
        }
        Some(StatusFilter::Attending) => {
            let user_id = requester.ok_or(AppError::Unauthorized)?;
            query.and(
                Predicate::new("e.event_id IN (SELECT event_id FROM attendees WHERE user_id = ?)")
                    .bind(user_id),
            );
            query.and(Predicate::new("e.close_registration != -1"));
            query.and(Predicate::new("e.start_date >= ?").bind(now));
        }
        Some(StatusFilter::Open) => {
            query.and(Predicate::new("e.close_registration > ?").bind(now));
        }
        Some(StatusFilter::Archive) => {
            query.and(Predicate::new("(e.close_registration = -1 OR e.start_date < ?)").bind(now));
        }
        None => {}
    }

    match filters.category {
        Some(CategoryFilter::Id(category_id)) => {
            query.and(
                Predicate::new(
                    "e.event_id IN (SELECT event_id FROM event_categories WHERE category_id = ?)",
                )
                .bind(category_id),
            );
        }
        Some(CategoryFilter::Unassigned) => {
            query.and(Predicate::new(
                "e.event_id NOT IN (SELECT event_id FROM event_categories)",
            ));
        }
        None => {}
    }

    let (sql, args) = query.into_sql(filters.limit, filters.offset);
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref()).collect();
    let rows = stmt
        .query_map(refs.as_slice(), |row| {
            Ok(EventSummary {
                event_id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                location: row.get(3)?,
                start: row.get(4)?,
                close_registration: row.get(5)?,
                max_attendees: row.get(6)?,
                creator: CreatorProfile {
                    creator_id: row.get(7)?,
                    first_name: row.get(8)?,
                    last_name: row.get(9)?,
                    email: row.get(10)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
