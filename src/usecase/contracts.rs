use uuid::Uuid;

use crate::{
    domain::entity::EntityType, domain::filters::ReviewFilters, domain::identity::Identity,
    domain::photo::EntityPhoto, domain::review::Review, domain::vote::HelpfulVote,
    repository::errors::RepositoryError,
};

#[cfg_attr(test, mockall::automock)]
pub trait ReviewRepository: Send + Sync {
    async fn create(&self, review: &Review) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, RepositoryError>;
    async fn update_content(&self, review: &Review) -> Result<(), RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    async fn list_page(&self, filters: ReviewFilters) -> Result<Vec<Review>, RepositoryError>;
    async fn count_matching(&self, filters: ReviewFilters) -> Result<i64, RepositoryError>;
    async fn list_ratings_for_entities(
        &self,
        entity_type: EntityType,
        entity_ids: Vec<String>,
    ) -> Result<Vec<(String, i16)>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait VoteRepository: Send + Sync {
    /// Inserts the vote unless the voter already has one for the review.
    /// Returns whether a row was actually inserted; `false` means an
    /// equivalent row already existed.
    async fn insert_if_absent(&self, vote: &HelpfulVote) -> Result<bool, RepositoryError>;
    /// Deletes the voter's vote on the review if present. Returns whether a
    /// row was deleted.
    async fn delete_by_review_and_voter(
        &self,
        review_id: Uuid,
        voter: Identity,
    ) -> Result<bool, RepositoryError>;
    async fn count_for_reviews(
        &self,
        review_ids: Vec<Uuid>,
    ) -> Result<Vec<(Uuid, i64)>, RepositoryError>;
    async fn voted_review_ids(
        &self,
        review_ids: Vec<Uuid>,
        voter: Identity,
    ) -> Result<Vec<Uuid>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait PhotoRepository: Send + Sync {
    /// Photos for the given entities of one type, newest first.
    async fn find_latest_for_entities(
        &self,
        entity_type: EntityType,
        entity_ids: Vec<String>,
    ) -> Result<Vec<EntityPhoto>, RepositoryError>;
}
