use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::domain::entity::{EntityAggregate, EntityType};
use crate::domain::identity::Identity;
use crate::domain::photo::EntityPhoto;
use crate::domain::review::{EnrichedReview, Review};
use crate::usecase::contracts::{PhotoRepository, ReviewRepository, VoteRepository};
use crate::usecase::error::UsecaseError;

/// Display data batched for one feed page, keyed by entity pair or review
/// id. Missing keys mean the enrichment was unavailable, not an error.
#[derive(Debug, Default)]
pub struct ReviewEnrichment {
    photos: HashMap<(EntityType, String), String>,
    aggregates: HashMap<(EntityType, String), EntityAggregate>,
    helpful_counts: HashMap<Uuid, i64>,
    voted: HashSet<Uuid>,
}

impl ReviewEnrichment {
    pub fn apply(&self, review: Review) -> EnrichedReview {
        let key = (review.entity_type, review.entity_id.clone());
        let aggregate = self.aggregates.get(&key);

        EnrichedReview {
            helpful_count: self.helpful_counts.get(&review.id).copied().unwrap_or(0),
            user_voted_helpful: self.voted.contains(&review.id),
            place_name: None,
            photo_url: self.photos.get(&key).cloned(),
            average_rating_for_place: aggregate.map(|a| a.average_rating),
            review_count_for_place: aggregate.map(|a| a.review_count),
            review,
        }
    }
}

/// Resolves photos, rating aggregates, helpful counts and the viewer's vote
/// flags for a page of reviews with one query per entity type for photos
/// and aggregates plus two fixed vote queries, never one query per review.
pub struct EnrichmentBatcher<R, V, P>
where
    R: ReviewRepository,
    V: VoteRepository,
    P: PhotoRepository,
{
    review_repository: R,
    vote_repository: V,
    photo_repository: P,
}

impl<R, V, P> EnrichmentBatcher<R, V, P>
where
    R: ReviewRepository,
    V: VoteRepository,
    P: PhotoRepository,
{
    pub fn new(review_repository: R, vote_repository: V, photo_repository: P) -> Self {
        Self {
            review_repository,
            vote_repository,
            photo_repository,
        }
    }

    /// Enrichment is best-effort: a failed sub-query degrades its fields to
    /// defaults instead of failing the feed request.
    #[tracing::instrument(skip(self, reviews, viewer), fields(review_count = reviews.len()))]
    pub async fn enrich(&self, reviews: &[Review], viewer: Option<Identity>) -> ReviewEnrichment {
        tracing::debug!("batching enrichment for feed page");

        let mut enrichment = ReviewEnrichment::default();
        if reviews.is_empty() {
            return enrichment;
        }

        let grouped = group_entities(reviews);
        let review_ids: Vec<Uuid> = reviews.iter().map(|r| r.id).collect();

        for (entity_type, entity_ids) in &grouped {
            match self
                .photo_repository
                .find_latest_for_entities(*entity_type, entity_ids.clone())
                .await
            {
                Ok(photos) => {
                    enrichment
                        .photos
                        .extend(fold_latest_photos(*entity_type, photos));
                }
                Err(e) => {
                    tracing::warn!(error = %e, %entity_type, "photo lookup failed, degrading");
                }
            }

            match self
                .review_repository
                .list_ratings_for_entities(*entity_type, entity_ids.clone())
                .await
            {
                Ok(rows) => {
                    for (entity_id, aggregate) in fold_aggregates(rows) {
                        enrichment
                            .aggregates
                            .insert((*entity_type, entity_id), aggregate);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, %entity_type, "aggregate lookup failed, degrading");
                }
            }
        }

        match self
            .vote_repository
            .count_for_reviews(review_ids.clone())
            .await
        {
            Ok(counts) => enrichment.helpful_counts = counts.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "helpful count lookup failed, degrading");
            }
        }

        if let Some(voter) = viewer {
            match self
                .vote_repository
                .voted_review_ids(review_ids, voter)
                .await
            {
                Ok(ids) => enrichment.voted = ids.into_iter().collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "voted lookup failed, degrading");
                }
            }
        }

        enrichment
    }

    /// Batch photo lookup for the external photos endpoint, keyed by entity
    /// id within the requested type.
    #[tracing::instrument(skip(self, entity_ids), fields(%entity_type, entity_count = entity_ids.len()))]
    pub async fn photos_for_entities(
        &self,
        entity_type: EntityType,
        entity_ids: Vec<String>,
    ) -> Result<HashMap<String, String>, UsecaseError> {
        tracing::debug!("looking up photos for entities");

        let photos = self
            .photo_repository
            .find_latest_for_entities(entity_type, entity_ids)
            .await?;

        Ok(fold_latest_photos(entity_type, photos)
            .into_iter()
            .map(|((_, entity_id), url)| (entity_id, url))
            .collect())
    }
}

/// Deduplicates `(entity_type, entity_id)` pairs and groups the ids by
/// type, so each type needs exactly one photo and one aggregate query.
fn group_entities(reviews: &[Review]) -> HashMap<EntityType, Vec<String>> {
    let mut seen: HashSet<(EntityType, &str)> = HashSet::new();
    let mut grouped: HashMap<EntityType, Vec<String>> = HashMap::new();

    for review in reviews {
        if seen.insert((review.entity_type, review.entity_id.as_str())) {
            grouped
                .entry(review.entity_type)
                .or_default()
                .push(review.entity_id.clone());
        }
    }

    grouped
}

/// Rows arrive newest first, so the first photo per entity id wins.
fn fold_latest_photos(
    entity_type: EntityType,
    photos: Vec<EntityPhoto>,
) -> HashMap<(EntityType, String), String> {
    let mut latest = HashMap::new();
    for photo in photos {
        latest
            .entry((entity_type, photo.entity_id))
            .or_insert(photo.photo_url);
    }
    latest
}

/// Folds raw `(entity_id, rating)` rows into per-entity averages.
fn fold_aggregates(rows: Vec<(String, i16)>) -> HashMap<String, EntityAggregate> {
    let mut sums: HashMap<String, (i64, i64)> = HashMap::new();
    for (entity_id, rating) in rows {
        let entry = sums.entry(entity_id).or_insert((0, 0));
        entry.0 += i64::from(rating);
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(entity_id, (sum, count))| {
            (
                entity_id,
                EntityAggregate {
                    average_rating: sum as f64 / count as f64,
                    review_count: count,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::Author;
    use crate::domain::review::ReviewContent;
    use crate::repository::errors::RepositoryError;
    use crate::usecase::contracts::{
        MockPhotoRepository, MockReviewRepository, MockVoteRepository,
    };
    use chrono::Utc;

    fn make_review(entity_type: EntityType, entity_id: &str) -> Review {
        Review::new(
            entity_type,
            entity_id.to_string(),
            ReviewContent::validate(4, "Solid choice", &"A".repeat(25)).unwrap(),
            Author::Guest("Alex".to_string()),
        )
    }

    fn make_photo(entity_type: EntityType, entity_id: &str, url: &str) -> EntityPhoto {
        EntityPhoto {
            entity_type,
            entity_id: entity_id.to_string(),
            photo_url: url.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_entities_dedupes_pairs() {
        let reviews = vec![
            make_review(EntityType::Restaurant, "r1"),
            make_review(EntityType::Restaurant, "r1"),
            make_review(EntityType::Restaurant, "r2"),
            make_review(EntityType::Destination, "r1"),
        ];

        let grouped = group_entities(&reviews);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&EntityType::Restaurant].len(), 2);
        // Same id under a different type is a different entity.
        assert_eq!(grouped[&EntityType::Destination], vec!["r1".to_string()]);
    }

    #[test]
    fn test_fold_aggregates_averages_ratings() {
        let rows = vec![("e1".to_string(), 4), ("e1".to_string(), 2), ("e2".to_string(), 5)];

        let aggregates = fold_aggregates(rows);

        let e1 = &aggregates["e1"];
        assert_eq!(e1.average_rating, 3.0);
        assert_eq!(e1.review_count, 2);
        let e2 = &aggregates["e2"];
        assert_eq!(e2.average_rating, 5.0);
        assert_eq!(e2.review_count, 1);
    }

    #[test]
    fn test_fold_latest_photos_first_row_wins() {
        let photos = vec![
            make_photo(EntityType::Restaurant, "r1", "new.jpg"),
            make_photo(EntityType::Restaurant, "r1", "old.jpg"),
        ];

        let latest = fold_latest_photos(EntityType::Restaurant, photos);

        assert_eq!(
            latest[&(EntityType::Restaurant, "r1".to_string())],
            "new.jpg"
        );
    }

    #[tokio::test]
    async fn test_enrich_issues_one_query_per_type_plus_two_vote_queries() {
        // Two entity types on the page; mockall verifies the exact call
        // counts: 2 photo lookups, 2 aggregate lookups, 1 count, 1 voted.
        let reviews = vec![
            make_review(EntityType::Restaurant, "r1"),
            make_review(EntityType::Restaurant, "r2"),
            make_review(EntityType::Restaurant, "r2"),
            make_review(EntityType::Destination, "d1"),
        ];

        let mut mock_photos = MockPhotoRepository::new();
        mock_photos
            .expect_find_latest_for_entities()
            .times(2)
            .returning(|_, _| Ok(vec![]));

        let mut mock_reviews = MockReviewRepository::new();
        mock_reviews
            .expect_list_ratings_for_entities()
            .times(2)
            .returning(|_, _| Ok(vec![]));

        let mut mock_votes = MockVoteRepository::new();
        mock_votes
            .expect_count_for_reviews()
            .times(1)
            .returning(|_| Ok(vec![]));
        mock_votes
            .expect_voted_review_ids()
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let batcher = EnrichmentBatcher::new(mock_reviews, mock_votes, mock_photos);
        batcher
            .enrich(&reviews, Some(Identity::Guest("g1".to_string())))
            .await;
    }

    #[tokio::test]
    async fn test_enrich_skips_voted_query_without_viewer() {
        let reviews = vec![make_review(EntityType::Restaurant, "r1")];

        let mut mock_photos = MockPhotoRepository::new();
        mock_photos
            .expect_find_latest_for_entities()
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let mut mock_reviews = MockReviewRepository::new();
        mock_reviews
            .expect_list_ratings_for_entities()
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let mut mock_votes = MockVoteRepository::new();
        mock_votes
            .expect_count_for_reviews()
            .times(1)
            .returning(|_| Ok(vec![]));
        mock_votes.expect_voted_review_ids().times(0);

        let batcher = EnrichmentBatcher::new(mock_reviews, mock_votes, mock_photos);
        let enrichment = batcher.enrich(&reviews, None).await;

        let enriched = enrichment.apply(reviews[0].clone());
        assert!(!enriched.user_voted_helpful);
    }

    #[tokio::test]
    async fn test_enrich_degrades_failed_photo_lookup() {
        let review = make_review(EntityType::Restaurant, "r1");
        let review_id = review.id;
        let reviews = vec![review];

        let mut mock_photos = MockPhotoRepository::new();
        mock_photos
            .expect_find_latest_for_entities()
            .times(1)
            .returning(|_, _| Err(RepositoryError::DatabaseError("down".to_string())));

        let mut mock_reviews = MockReviewRepository::new();
        mock_reviews
            .expect_list_ratings_for_entities()
            .times(1)
            .returning(|_, _| Ok(vec![("r1".to_string(), 4)]));

        let mut mock_votes = MockVoteRepository::new();
        mock_votes
            .expect_count_for_reviews()
            .times(1)
            .returning(move |_| Ok(vec![(review_id, 3)]));

        let batcher = EnrichmentBatcher::new(mock_reviews, mock_votes, mock_photos);
        let enrichment = batcher.enrich(&reviews, None).await;

        // Photo degraded to nothing, the rest still enriches.
        let enriched = enrichment.apply(reviews[0].clone());
        assert!(enriched.photo_url.is_none());
        assert_eq!(enriched.helpful_count, 3);
        assert_eq!(enriched.average_rating_for_place, Some(4.0));
        assert_eq!(enriched.review_count_for_place, Some(1));
    }

    #[tokio::test]
    async fn test_enrich_attaches_photo_and_vote_flag() {
        let review = make_review(EntityType::Restaurant, "r1");
        let review_id = review.id;
        let reviews = vec![review];

        let mut mock_photos = MockPhotoRepository::new();
        mock_photos
            .expect_find_latest_for_entities()
            .times(1)
            .returning(|entity_type, _| {
                Ok(vec![make_photo(entity_type, "r1", "r1.jpg")])
            });

        let mut mock_reviews = MockReviewRepository::new();
        mock_reviews
            .expect_list_ratings_for_entities()
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let mut mock_votes = MockVoteRepository::new();
        mock_votes
            .expect_count_for_reviews()
            .times(1)
            .returning(move |_| Ok(vec![(review_id, 1)]));
        mock_votes
            .expect_voted_review_ids()
            .times(1)
            .returning(move |_, _| Ok(vec![review_id]));

        let batcher = EnrichmentBatcher::new(mock_reviews, mock_votes, mock_photos);
        let enrichment = batcher
            .enrich(&reviews, Some(Identity::Guest("g1".to_string())))
            .await;

        let enriched = enrichment.apply(reviews[0].clone());
        assert_eq!(enriched.photo_url.as_deref(), Some("r1.jpg"));
        assert_eq!(enriched.helpful_count, 1);
        assert!(enriched.user_voted_helpful);
    }

    #[tokio::test]
    async fn test_photos_for_entities_keyed_by_entity_id() {
        let mut mock_photos = MockPhotoRepository::new();
        mock_photos
            .expect_find_latest_for_entities()
            .times(1)
            .returning(|entity_type, _| {
                Ok(vec![
                    make_photo(entity_type, "d1", "new.jpg"),
                    make_photo(entity_type, "d1", "old.jpg"),
                    make_photo(entity_type, "d2", "d2.jpg"),
                ])
            });

        let batcher = EnrichmentBatcher::new(
            MockReviewRepository::new(),
            MockVoteRepository::new(),
            mock_photos,
        );
        let photos = batcher
            .photos_for_entities(
                EntityType::Destination,
                vec!["d1".to_string(), "d2".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(photos["d1"], "new.jpg");
        assert_eq!(photos["d2"], "d2.jpg");
    }
}
