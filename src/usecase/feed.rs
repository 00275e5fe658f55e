use std::collections::HashMap;

use crate::domain::entity::EntityType;
use crate::domain::filters::{ReviewFilters, SortBy};
use crate::domain::identity::Identity;
use crate::domain::review::{EnrichedReview, ReviewFeedPage};
use crate::usecase::contracts::{PhotoRepository, ReviewRepository, VoteRepository};
use crate::usecase::enrichment::EnrichmentBatcher;
use crate::usecase::error::UsecaseError;

/// Assembles one feed page: composes the filtered query, fetches the page
/// and total, batches enrichment and merges it onto each row.
pub struct FeedUseCase<R, V, P>
where
    R: ReviewRepository,
    V: VoteRepository,
    P: PhotoRepository,
{
    review_repository: R,
    batcher: EnrichmentBatcher<R, V, P>,
}

impl<R, V, P> FeedUseCase<R, V, P>
where
    R: ReviewRepository,
    V: VoteRepository,
    P: PhotoRepository,
{
    pub fn new(review_repository: R, batcher: EnrichmentBatcher<R, V, P>) -> Self {
        Self {
            review_repository,
            batcher,
        }
    }

    #[tracing::instrument(skip(self, viewer), fields(?filters))]
    pub async fn list_reviews(
        &self,
        filters: ReviewFilters,
        viewer: Option<Identity>,
    ) -> Result<ReviewFeedPage, UsecaseError> {
        tracing::debug!("assembling review feed page");

        let filters = filters.clamped();

        let rows = self.review_repository.list_page(filters.clone()).await?;
        let total = self.review_repository.count_matching(filters.clone()).await?;

        let enrichment = self.batcher.enrich(&rows, viewer).await;
        let mut reviews: Vec<EnrichedReview> = rows
            .into_iter()
            .map(|review| enrichment.apply(review))
            .collect();

        // Helpful counts only exist after batching, so this sort mode is a
        // stable post-fetch sort over the page; counts spanning multiple
        // pages keep their store order (newest first) as an approximation.
        if filters.sort == SortBy::MostHelpful {
            reviews.sort_by(|a, b| b.helpful_count.cmp(&a.helpful_count));
        }

        let total_pages = if total == 0 {
            0
        } else {
            (total + filters.limit - 1) / filters.limit
        };

        tracing::debug!(count = reviews.len(), total, "feed page assembled");
        Ok(ReviewFeedPage {
            reviews,
            total,
            page: filters.page,
            limit: filters.limit,
            total_pages,
        })
    }

    pub async fn entity_photos(
        &self,
        entity_type: EntityType,
        entity_ids: Vec<String>,
    ) -> Result<HashMap<String, String>, UsecaseError> {
        self.batcher.photos_for_entities(entity_type, entity_ids).await
    }
}
