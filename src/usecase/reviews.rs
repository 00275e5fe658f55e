use uuid::Uuid;

use crate::domain::entity::EntityType;
use crate::domain::identity::Author;
use crate::domain::review::{FieldViolation, Review, ReviewContent};
use crate::usecase::contracts::ReviewRepository;
use crate::usecase::error::UsecaseError;

pub struct ReviewsUseCase<R>
where
    R: ReviewRepository,
{
    review_repository: R,
}

impl<R> ReviewsUseCase<R>
where
    R: ReviewRepository,
{
    pub fn new(review_repository: R) -> Self {
        Self { review_repository }
    }

    #[tracing::instrument(skip(self, title, body), fields(%entity_type, %entity_id, rating))]
    pub async fn create_review(
        &self,
        entity_type: EntityType,
        entity_id: String,
        rating: i16,
        title: String,
        body: String,
        author: Author,
    ) -> Result<Review, UsecaseError> {
        tracing::debug!("creating review");

        let mut violations = Vec::new();

        if entity_id.trim().is_empty() {
            violations.push(FieldViolation::new("entity_id", "entity_id is required"));
        }
        if let Author::Guest(name) = &author {
            if name.trim().is_empty() {
                violations.push(FieldViolation::new(
                    "author_name",
                    "guest reviews require a display name",
                ));
            }
        }

        let content = match ReviewContent::validate(rating, &title, &body) {
            Ok(content) => Some(content),
            Err(mut content_violations) => {
                violations.append(&mut content_violations);
                None
            }
        };

        if !violations.is_empty() {
            return Err(UsecaseError::Validation(violations));
        }

        // violations is empty, so content validation succeeded
        let content = content.ok_or_else(|| {
            UsecaseError::Internal("validated content missing".to_string())
        })?;

        let review = Review::new(entity_type, entity_id, content, author);
        self.review_repository.create(&review).await?;

        tracing::info!(review_id = %review.id, "review created successfully");
        Ok(review)
    }

    #[tracing::instrument(skip(self, actor, title, body), fields(review_id = %id, rating))]
    pub async fn update_review(
        &self,
        id: Uuid,
        actor: Author,
        rating: i16,
        title: String,
        body: String,
    ) -> Result<Review, UsecaseError> {
        tracing::debug!("updating review");

        let mut review = self
            .review_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Review".to_string()))?;

        if !review.is_authored_by(&actor) {
            tracing::warn!(review_id = %id, "unauthorized review update attempt");
            return Err(UsecaseError::Forbidden(
                "Only the author can edit this review".to_string(),
            ));
        }

        let content =
            ReviewContent::validate(rating, &title, &body).map_err(UsecaseError::Validation)?;

        review.apply_edit(content);
        self.review_repository.update_content(&review).await?;

        tracing::info!(review_id = %id, "review updated successfully");
        Ok(review)
    }

    #[tracing::instrument(skip(self, actor), fields(review_id = %id))]
    pub async fn delete_review(&self, id: Uuid, actor: Author) -> Result<(), UsecaseError> {
        tracing::debug!("deleting review");

        let review = self
            .review_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Review".to_string()))?;

        if !review.is_authored_by(&actor) {
            tracing::warn!(review_id = %id, "unauthorized review delete attempt");
            return Err(UsecaseError::Forbidden(
                "Only the author can delete this review".to_string(),
            ));
        }

        self.review_repository.delete(id).await?;

        tracing::info!(review_id = %id, "review deleted successfully");
        Ok(())
    }
}
