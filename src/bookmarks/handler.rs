//! HTTP handlers for the bookmarks collection

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use super::sanitize::sanitize_for_output;
use super::store::BookmarkStore;
use super::validation::{validate_create, validate_update};
use crate::error::ApiError;
use crate::handler::AppState;
use crate::model::Bookmark;

// Ids that don't parse can't name a stored row.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::NotFound)
}

fn parse_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::error!(error = %rejection, "unreadable request body");
            Err(ApiError::BadRequest(rejection.body_text()))
        }
    }
}

/// Existence check shared by get, delete and update. Not atomic with the statement that
/// follows it: a concurrent delete can still land in between.
async fn find_bookmark(store: &BookmarkStore<'_>, raw_id: &str) -> Result<Bookmark, ApiError> {
    let id = parse_id(raw_id)?;
    match store.get_by_id(id).await? {
        Some(bookmark) => Ok(bookmark),
        None => {
            tracing::info!(bookmark_id = id, "bookmark not found");
            Err(ApiError::NotFound)
        }
    }
}

pub async fn list_bookmarks(State(state): State<AppState>) -> Result<Response, ApiError> {
    let store = BookmarkStore::new(state.db.connection());

    let bookmarks: Vec<Bookmark> = store
        .list_all()
        .await?
        .into_iter()
        .map(sanitize_for_output)
        .collect();

    Ok((StatusCode::OK, Json(bookmarks)).into_response())
}

pub async fn create_bookmark(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = parse_body(payload)?;
    let input = validate_create(&body).inspect_err(|e| tracing::error!("{}", e))?;

    let store = BookmarkStore::new(state.db.connection());
    let bookmark = store.create(input).await?;
    tracing::info!("Bookmark with id {} created.", bookmark.id);

    let location = format!("/bookmark/{}", bookmark.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(sanitize_for_output(bookmark)),
    )
        .into_response())
}

pub async fn get_bookmark(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let store = BookmarkStore::new(state.db.connection());
    let bookmark = find_bookmark(&store, &id).await?;

    Ok((StatusCode::OK, Json(sanitize_for_output(bookmark))).into_response())
}

pub async fn delete_bookmark(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let store = BookmarkStore::new(state.db.connection());
    let bookmark = find_bookmark(&store, &id).await?;

    store.delete_by_id(bookmark.id).await?;
    tracing::info!("Bookmark with id {} deleted.", bookmark.id);

    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn update_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let store = BookmarkStore::new(state.db.connection());
    let bookmark = find_bookmark(&store, &id).await?;

    let body = parse_body(payload)?;
    let patch = validate_update(&body).inspect_err(|e| tracing::error!("{}", e))?;

    store.update_by_id(bookmark.id, patch).await?;
    tracing::info!("Bookmark with id {} updated.", bookmark.id);

    Ok(StatusCode::NO_CONTENT.into_response())
}
