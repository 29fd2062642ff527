use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::db::models::Category;
use crate::error::{AppError, AppResult};
use crate::events::store;
use crate::extractors::MaybeUser;
use crate::search::{self, CategoryFilter, EventSummary, SearchFilters, StatusFilter};
use crate::state::AppState;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SearchParams {
    q: Option<String>,
    status: Option<String>,
    category: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// GET /search
pub async fn search(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<EventSummary>>> {
    let limit = params.limit.unwrap_or(20);
    let offset = params.offset.unwrap_or(0);
    if !(1..=100).contains(&limit) || offset < 0 {
        return Err(AppError::Validation("Invalid limit or offset".into()));
    }

    let status = match params.status.as_deref() {
        None => None,
        Some(raw) => Some(
            StatusFilter::parse(raw).ok_or_else(|| AppError::Validation("Invalid status".into()))?,
        ),
    };

    let category = match params.category.as_deref() {
        None => None,
        Some("undefined") => Some(CategoryFilter::Unassigned),
        Some(raw) => {
            let id = raw
                .parse()
                .ok()
                .filter(|id| *id > 0)
                .ok_or_else(|| AppError::Validation("Invalid category".into()))?;
            Some(CategoryFilter::Id(id))
        }
    };

    let filters = SearchFilters {
        query: params.q.filter(|q| !q.is_empty()),
        status,
        category,
        limit,
        offset,
    };
    let now = chrono::Utc::now().timestamp();
    let results = search::search_events(&state.db, &filters, user.map(|u| u.user_id), now)?;
    Ok(Json(results))
}

/// GET /categories
pub async fn categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(store::list_categories(&state.db)?))
}
