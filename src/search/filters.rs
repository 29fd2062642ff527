//! Conjunctive predicate assembly for event listing queries.
//!
//! Each filter criterion becomes a [`Predicate`] carrying its own bound
//! parameters; [`EventQuery`] combines them with AND and owns parameter
//! ordering, so handlers never splice SQL strings by hand.

use rusqlite::types::ToSql;

pub struct Predicate {
    clause: String,
    args: Vec<Box<dyn ToSql>>,
}

impl Predicate {
    pub fn new(clause: impl Into<String>) -> Self {
        Self {
            clause: clause.into(),
            args: Vec::new(),
        }
    }

    /// Attach a parameter for the next `?` placeholder in the clause.
    pub fn bind(mut self, arg: impl ToSql + 'static) -> Self {
        self.args.push(Box::new(arg));
        self
    }
}

#[derive(Default)]
pub struct EventQuery {
    predicates: Vec<Predicate>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    /// Render the final SELECT: event columns joined with the creator
    /// profile, ordered by start time descending, paginated last.
    pub fn into_sql(self, limit: i64, offset: i64) -> (String, Vec<Box<dyn ToSql>>) {
        let mut sql = String::from(
            "SELECT e.event_id, e.name, e.description, e.location, e.start_date, \
             e.close_registration, e.max_attendees, e.creator_id, \
             u.first_name, u.last_name, u.email \
             FROM events e \
             JOIN users u ON u.user_id = e.creator_id",
        );

        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        if !self.predicates.is_empty() {
            let clauses: Vec<String> = self.predicates.iter().map(|p| p.clause.clone()).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        for predicate in self.predicates {
            args.extend(predicate.args);
        }

        sql.push_str(" ORDER BY e.start_date DESC LIMIT ? OFFSET ?");
        args.push(Box::new(limit));
        args.push(Box::new(offset));

        (sql, args)
    }
}
