pub mod events;
pub mod questions;
pub mod search;
pub mod users;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full API surface.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users", post(users::register))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
        .route("/events", post(events::create))
        .route(
            "/event/{event_id}",
            get(events::detail)
                .post(events::register_attendee)
                .patch(events::update)
                .delete(events::cancel),
        )
        .route("/search", get(search::search))
        .route("/categories", get(search::categories))
        .route("/event/{event_id}/question", post(questions::ask))
        .route("/question/{question_id}", delete(questions::remove))
        .route(
            "/question/{question_id}/vote",
            post(questions::vote_up).delete(questions::vote_down),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
