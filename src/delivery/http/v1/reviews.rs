use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::delivery::http::v1::middleware::RequestIdentity;
use crate::domain::entity::EntityType;
use crate::domain::filters::{ReviewFilters, SortBy};
use crate::domain::identity::Author;
use crate::domain::review::FieldViolation;
use crate::usecase::error::UsecaseError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListReviewsQuery {
    #[serde(default)]
    pub search: String,
    pub entity_type: Option<String>,
    pub min_rating: Option<i16>,
    pub sort: Option<SortBy>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListReviewsQuery {
    fn into_filters(self) -> Result<ReviewFilters, UsecaseError> {
        let entity_type = match self.entity_type.as_deref() {
            None | Some("all") | Some("") => None,
            Some(raw) => Some(raw.parse::<EntityType>().map_err(|e| {
                UsecaseError::Validation(vec![FieldViolation::new("entity_type", e.to_string())])
            })?),
        };

        let defaults = ReviewFilters::default();
        Ok(ReviewFilters {
            search: self.search,
            entity_type,
            min_rating: self.min_rating.unwrap_or(defaults.min_rating),
            sort: self.sort.unwrap_or(defaults.sort),
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub entity_type: EntityType,
    #[validate(length(min = 1, max = 255))]
    pub entity_id: String,
    pub rating: i16,
    pub title: String,
    pub body: String,
    /// Guest display name; ignored for authenticated callers.
    #[validate(length(max = 100))]
    pub author_name: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: i16,
    pub title: String,
    pub body: String,
}

#[derive(Serialize)]
pub struct ToggleHelpfulResponse {
    pub voted: bool,
}

fn resolve_author(
    identity: &RequestIdentity,
    body_author_name: Option<&str>,
) -> Result<Author, UsecaseError> {
    if let Some(user_id) = identity.user_id {
        return Ok(Author::User(user_id));
    }

    body_author_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Author::Guest(name.to_string()))
        .ok_or_else(|| {
            UsecaseError::Validation(vec![FieldViolation::new(
                "author_name",
                "guest reviews require a display name",
            )])
        })
}

fn require_actor(identity: &RequestIdentity) -> Result<Author, UsecaseError> {
    identity.author().ok_or_else(|| {
        UsecaseError::Forbidden(
            "Authentication or an X-Guest-Name header is required".to_string(),
        )
    })
}

#[tracing::instrument(skip(state, identity))]
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<RequestIdentity>,
    Query(query): Query<ListReviewsQuery>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling list reviews request");

    let filters = query.into_filters()?;
    let page = state
        .feed_usecase
        .list_reviews(filters, identity.voter())
        .await?;

    tracing::debug!(count = page.reviews.len(), total = page.total, "reviews listed successfully");
    Ok((StatusCode::OK, Json(page)))
}

#[tracing::instrument(skip(state, identity, payload))]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<RequestIdentity>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling create review request");

    payload.validate()?;
    let author = resolve_author(&identity, payload.author_name.as_deref())?;

    let review = state
        .reviews_usecase
        .create_review(
            payload.entity_type,
            payload.entity_id,
            payload.rating,
            payload.title,
            payload.body,
            author,
        )
        .await?;

    metrics::counter!("reviews_created_total").increment(1);
    tracing::debug!(review_id = %review.id, "review created successfully");
    Ok((StatusCode::CREATED, Json(review)))
}

#[tracing::instrument(skip(state, identity, payload), fields(review_id = %review_id))]
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(review_id): Path<Uuid>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling update review request");

    let actor = require_actor(&identity)?;
    let review = state
        .reviews_usecase
        .update_review(review_id, actor, payload.rating, payload.title, payload.body)
        .await?;

    tracing::debug!(review_id = %review_id, "review updated successfully");
    Ok((StatusCode::OK, Json(review)))
}

#[tracing::instrument(skip(state, identity), fields(review_id = %review_id))]
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(review_id): Path<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling delete review request");

    let actor = require_actor(&identity)?;
    state.reviews_usecase.delete_review(review_id, actor).await?;

    metrics::counter!("reviews_deleted_total").increment(1);
    tracing::debug!(review_id = %review_id, "review deleted successfully");
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, identity), fields(review_id = %review_id))]
pub async fn toggle_helpful(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(review_id): Path<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling toggle helpful request");

    let voter = identity.voter().ok_or_else(|| {
        UsecaseError::Forbidden(
            "Voting requires authentication or an X-Guest-Token header".to_string(),
        )
    })?;

    let voted = state.votes_usecase.toggle_helpful(review_id, voter).await?;

    metrics::counter!("helpful_votes_toggled_total", "voted" => if voted { "true" } else { "false" })
        .increment(1);
    tracing::debug!(review_id = %review_id, voted, "helpful vote toggled successfully");
    Ok((StatusCode::OK, Json(ToggleHelpfulResponse { voted })))
}
