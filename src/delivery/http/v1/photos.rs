use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::domain::entity::EntityType;
use crate::domain::filters::MAX_PAGE_SIZE;
use crate::domain::review::FieldViolation;
use crate::usecase::error::UsecaseError;
use crate::AppState;

/// Batch photo lookup for one entity type; `entity_ids` is a
/// comma-separated list of ids.
#[derive(Debug, Deserialize)]
pub struct EntityPhotosQuery {
    pub entity_type: String,
    pub entity_ids: String,
}

// Caller-supplied list, capped like a feed page so the lookup stays bounded.
fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .take(MAX_PAGE_SIZE as usize)
        .map(ToString::to_string)
        .collect()
}

#[tracing::instrument(skip(state))]
pub async fn list_entity_photos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EntityPhotosQuery>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling entity photos request");

    let entity_type = query.entity_type.parse::<EntityType>().map_err(|e| {
        UsecaseError::Validation(vec![FieldViolation::new("entity_type", e.to_string())])
    })?;

    let entity_ids = split_ids(&query.entity_ids);
    let photos = state
        .feed_usecase
        .entity_photos(entity_type, entity_ids)
        .await?;

    tracing::debug!(count = photos.len(), "entity photos retrieved");
    Ok((StatusCode::OK, Json(photos)))
}
