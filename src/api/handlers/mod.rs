use std::path::PathBuf;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::Database;
use crate::index::codec;
use crate::models::*;

const DEFAULT_LIMIT: usize = 50;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
///
/// Errors caused by the request itself (unknown docset, duplicate name,
/// unreadable search directory) are returned as-is with BAD_REQUEST.
fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    let msg = format!("{:#}", e);

    if msg.contains("not found")
        || msg.contains("already exists")
        || msg.contains("must not be empty")
        || msg.contains("Failed to load search index")
    {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn parse_category(category: Option<&str>) -> Result<Category, (StatusCode, String)> {
    match category {
        None => Ok(Category::All),
        Some(c) => Category::from_str(c)
            .ok_or((StatusCode::BAD_REQUEST, format!("Unknown category: {}", c))),
    }
}

fn docset_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Docset not found".to_string())
}

/// Fail with 404 unless the docset exists.
fn require_docset(db: &Database, id: Uuid) -> Result<DocSet, (StatusCode, String)> {
    db.get_docset(id)
        .map_err(internal_error)?
        .ok_or_else(docset_not_found)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Docsets
// ============================================================

pub async fn list_docsets(
    State(db): State<Database>,
) -> Result<Json<Vec<DocSet>>, (StatusCode, String)> {
    db.list_docsets().map(Json).map_err(internal_error)
}

pub async fn get_docset(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocSet>, (StatusCode, String)> {
    require_docset(&db, id).map(Json)
}

pub async fn import_docset(
    State(db): State<Database>,
    Json(input): Json<ImportDocSetInput>,
) -> Result<(StatusCode, Json<DocSet>), (StatusCode, String)> {
    let existed = db
        .get_docset_by_name(input.name.trim())
        .map_err(internal_error)?
        .is_some();
    let docset = db
        .import_dir(&input.name, &PathBuf::from(&input.path))
        .map_err(internal_error)?;

    let status = if existed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(docset)))
}

pub async fn delete_docset(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_docset(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(docset_not_found())
    }
}

pub async fn get_docset_stats(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocSetStats>, (StatusCode, String)> {
    require_docset(&db, id)?;
    db.stats(id).map(Json).map_err(internal_error)
}

// ============================================================
// Entries
// ============================================================

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

pub async fn search(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Entry>>, (StatusCode, String)> {
    let category = parse_category(query.category.as_deref())?;
    require_docset(&db, id)?;
    db.search(id, &query.q, category, Some(query.limit.unwrap_or(DEFAULT_LIMIT)))
        .map(Json)
        .map_err(internal_error)
}

#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    pub category: Option<String>,
}

pub async fn get_entry(
    State(db): State<Database>,
    Path((id, key)): Path<(Uuid, String)>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<Entry>, (StatusCode, String)> {
    let category = parse_category(query.category.as_deref())?;
    require_docset(&db, id)?;
    db.get_entry(id, category, &key)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Entry not found".to_string()))
}

/// Serve a stored fragment in the layout the documentation site loads.
pub async fn get_fragment(
    State(db): State<Database>,
    Path((id, file)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let name = FragmentName::parse(&file)
        .ok_or((StatusCode::NOT_FOUND, "Fragment not found".to_string()))?;
    require_docset(&db, id)?;
    let entries = db
        .fragment(id, name)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Fragment not found".to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        codec::write(&entries),
    ))
}
