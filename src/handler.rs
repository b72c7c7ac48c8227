use std::sync::Arc;

use axum::{Json, response::IntoResponse};
use tracing::info;

use crate::api::StatusResponse;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub api_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(db: Arc<Database>, api_token: Option<&str>) -> Self {
        AppState {
            db,
            api_token: api_token.map(Arc::from),
        }
    }
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(StatusResponse::new_from_msg("ok"))
}
