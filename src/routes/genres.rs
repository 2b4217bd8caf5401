use axum::Json;
use serde_json::{json, Value};

use crate::services::genres::genre_seeds;

/// Handler for the genre seed list
pub async fn list() -> Json<Value> {
    Json(json!({ "genres": genre_seeds() }))
}
