mod handlers;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

pub fn create_router(db: Database) -> Router {
    let api = Router::new()
        // Docsets
        .route("/docsets", get(handlers::list_docsets))
        .route("/docsets", post(handlers::import_docset))
        .route("/docsets/{id}", get(handlers::get_docset))
        .route("/docsets/{id}", delete(handlers::delete_docset))
        .route("/docsets/{id}/stats", get(handlers::get_docset_stats))
        // Entries
        .route("/docsets/{id}/search", get(handlers::search))
        .route("/docsets/{id}/entries/{key}", get(handlers::get_entry))
        .route("/docsets/{id}/fragments/{file}", get(handlers::get_fragment))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
