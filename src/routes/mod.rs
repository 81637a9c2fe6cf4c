mod auth;
mod categories;
mod courses;
mod forms;
mod health;
mod lessons;

use axum::Router;

use crate::state::AppState;

/// Build the complete application router.
///
/// Structure:
/// - `GET /health` — lightweight health check
/// - `/api/v1/auth` — signup and signin
/// - `/api/v1/categories` — category catalog, admin-managed
/// - `/api/v1/courses` — course catalog, ownership-managed, plus enrollment
/// - `/api/v1/lessons` — lesson management for course owners
/// - `GET /api/v1/health` — detailed health check with database connectivity
pub fn router() -> Router<AppState> {
    let api_v1 = Router::new()
        .nest("/auth", auth::router())
        .nest("/categories", categories::router())
        .nest("/courses", courses::router())
        .nest("/lessons", lessons::router())
        .merge(health::api_router());

    Router::new()
        .merge(health::root_router())
        .nest("/api/v1", api_v1)
}
