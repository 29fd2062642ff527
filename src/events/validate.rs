//! Field-level checks shared by the create and partial-update payloads.

use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Integer-convertible per the API contract: JSON integers, or strings that
/// parse as integers. Empty strings and fractional numbers do not qualify.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse().ok()
        }
        _ => None,
    }
}

/// A string field that is non-empty once trimmed.
pub fn as_trimmed(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        _ => None,
    }
}

/// A category list: unique positive integer ids. Existence against the
/// categories table is checked separately, inside the write transaction.
pub fn as_category_ids(value: &Value) -> Option<Vec<i64>> {
    let arr = value.as_array()?;
    let mut ids = Vec::with_capacity(arr.len());
    for v in arr {
        let id = as_int(v)?;
        if id <= 0 || ids.contains(&id) {
            return None;
        }
        ids.push(id);
    }
    Some(ids)
}

/// Reject payloads carrying keys outside the allow-list.
pub fn reject_unknown_keys(obj: &Map<String, Value>, allowed: &[&str]) -> AppResult<()> {
    if obj.keys().any(|k| !allowed.contains(&k.as_str())) {
        return Err(AppError::Validation(
            "Invalid field(s) in request body".into(),
        ));
    }
    Ok(())
}

pub fn field_error(key: &str) -> AppError {
    let message = match key {
        "start" => "Invalid start time".to_string(),
        "close_registration" => "Invalid close registration time".to_string(),
        "max_attendees" => "Invalid max attendees".to_string(),
        "categories" => "Invalid categories".to_string(),
        other => format!("Invalid {}", other),
    };
    AppError::Validation(message)
}
