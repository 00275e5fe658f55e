use uuid::Uuid;

use crate::domain::identity::Identity;
use crate::domain::vote::HelpfulVote;
use crate::usecase::contracts::{ReviewRepository, VoteRepository};
use crate::usecase::error::UsecaseError;

pub struct VotesUseCase<V, R>
where
    V: VoteRepository,
    R: ReviewRepository,
{
    vote_repository: V,
    review_repository: R,
}

impl<V, R> VotesUseCase<V, R>
where
    V: VoteRepository,
    R: ReviewRepository,
{
    pub fn new(vote_repository: V, review_repository: R) -> Self {
        Self {
            vote_repository,
            review_repository,
        }
    }

    /// Flips the voter's helpful vote on the review and returns the new
    /// state: `true` means voted. The store is the synchronization point:
    /// delete-if-present followed by insert-if-absent, so two concurrent
    /// toggles from the same identity can never leave more than one row.
    /// Losing an insert race means the vote already exists, which is the
    /// requested final state, not an error.
    #[tracing::instrument(skip(self, voter), fields(review_id = %review_id))]
    pub async fn toggle_helpful(
        &self,
        review_id: Uuid,
        voter: Identity,
    ) -> Result<bool, UsecaseError> {
        tracing::debug!("toggling helpful vote");

        self.review_repository
            .find_by_id(review_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Review".to_string()))?;

        let deleted = self
            .vote_repository
            .delete_by_review_and_voter(review_id, voter.clone())
            .await?;

        if deleted {
            tracing::info!(review_id = %review_id, "helpful vote removed");
            return Ok(false);
        }

        let vote = HelpfulVote::new(review_id, &voter);
        let inserted = self.vote_repository.insert_if_absent(&vote).await?;
        if !inserted {
            tracing::debug!(review_id = %review_id, "vote already present, concurrent insert won");
        } else {
            tracing::info!(review_id = %review_id, "helpful vote added");
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::EntityType;
    use crate::domain::identity::Author;
    use crate::domain::review::{Review, ReviewContent};
    use crate::usecase::contracts::{MockReviewRepository, MockVoteRepository};

    fn make_review() -> Review {
        Review::new(
            EntityType::Restaurant,
            "r1".to_string(),
            ReviewContent::validate(5, "Great food", &"A".repeat(25)).unwrap(),
            Author::Guest("Alex".to_string()),
        )
    }

    fn review_repo_returning(review: Review) -> MockReviewRepository {
        let mut mock = MockReviewRepository::new();
        mock.expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(review.clone())));
        mock
    }

    #[tokio::test]
    async fn test_toggle_adds_vote_when_absent() {
        let review = make_review();
        let review_id = review.id;
        let mut mock_votes = MockVoteRepository::new();

        mock_votes
            .expect_delete_by_review_and_voter()
            .times(1)
            .returning(|_, _| Ok(false));
        mock_votes
            .expect_insert_if_absent()
            .withf(move |v| v.review_id == review_id && v.guest_token.as_deref() == Some("g1"))
            .times(1)
            .returning(|_| Ok(true));

        let usecase = VotesUseCase::new(mock_votes, review_repo_returning(review));
        let voted = usecase
            .toggle_helpful(review_id, Identity::Guest("g1".to_string()))
            .await
            .unwrap();

        assert!(voted);
    }

    #[tokio::test]
    async fn test_toggle_removes_vote_when_present() {
        let review = make_review();
        let review_id = review.id;
        let mut mock_votes = MockVoteRepository::new();

        mock_votes
            .expect_delete_by_review_and_voter()
            .with(
                mockall::predicate::eq(review_id),
                mockall::predicate::eq(Identity::Guest("g1".to_string())),
            )
            .times(1)
            .returning(|_, _| Ok(true));

        let usecase = VotesUseCase::new(mock_votes, review_repo_returning(review));
        let voted = usecase
            .toggle_helpful(review_id, Identity::Guest("g1".to_string()))
            .await
            .unwrap();

        assert!(!voted);
    }

    #[tokio::test]
    async fn test_toggle_treats_lost_insert_race_as_voted() {
        let review = make_review();
        let review_id = review.id;
        let mut mock_votes = MockVoteRepository::new();

        mock_votes
            .expect_delete_by_review_and_voter()
            .times(1)
            .returning(|_, _| Ok(false));
        // A concurrent request inserted between our delete and insert.
        mock_votes
            .expect_insert_if_absent()
            .times(1)
            .returning(|_| Ok(false));

        let usecase = VotesUseCase::new(mock_votes, review_repo_returning(review));
        let voted = usecase
            .toggle_helpful(review_id, Identity::User(Uuid::new_v4()))
            .await
            .unwrap();

        assert!(voted);
    }

    #[tokio::test]
    async fn test_toggle_review_not_found() {
        let mock_votes = MockVoteRepository::new();
        let mut mock_reviews = MockReviewRepository::new();
        mock_reviews
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let usecase = VotesUseCase::new(mock_votes, mock_reviews);
        let result = usecase
            .toggle_helpful(Uuid::new_v4(), Identity::Guest("g1".to_string()))
            .await;

        assert!(matches!(result, Err(UsecaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_twice_returns_to_original_state() {
        let review = make_review();
        let review_id = review.id;

        // First toggle: no row yet, insert succeeds.
        let mut mock_votes = MockVoteRepository::new();
        mock_votes
            .expect_delete_by_review_and_voter()
            .times(1)
            .returning(|_, _| Ok(false));
        mock_votes
            .expect_insert_if_absent()
            .times(1)
            .returning(|_| Ok(true));
        let usecase = VotesUseCase::new(mock_votes, review_repo_returning(review.clone()));
        assert!(usecase
            .toggle_helpful(review_id, Identity::Guest("g1".to_string()))
            .await
            .unwrap());

        // Second toggle: the row from the first toggle is deleted.
        let mut mock_votes = MockVoteRepository::new();
        mock_votes
            .expect_delete_by_review_and_voter()
            .times(1)
            .returning(|_, _| Ok(true));
        let usecase = VotesUseCase::new(mock_votes, review_repo_returning(review));
        assert!(!usecase
            .toggle_helpful(review_id, Identity::Guest("g1".to_string()))
            .await
            .unwrap());
    }
}
