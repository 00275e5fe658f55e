use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    domain::entity::EntityType,
    domain::filters::ReviewFilters,
    domain::identity::Identity,
    domain::photo::EntityPhoto,
    domain::review::Review,
    domain::vote::HelpfulVote,
    repository::errors::RepositoryError,
    usecase::contracts::{PhotoRepository, ReviewRepository, VoteRepository},
};

pub struct PostgresReviewRepository {
    pool: PgPool,
}

impl PostgresReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ReviewRepository for PostgresReviewRepository {
    #[tracing::instrument(skip(self, review), fields(review_id = %review.id, entity_type = %review.entity_type, entity_id = %review.entity_id))]
    async fn create(&self, review: &Review) -> Result<(), RepositoryError> {
        tracing::debug!("creating review");

        sqlx::query(
            r#"
            INSERT INTO reviews (id, entity_type, entity_id, rating, title, body, user_id, author_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(review.id)
        .bind(review.entity_type.as_str())
        .bind(&review.entity_id)
        .bind(review.rating)
        .bind(&review.title)
        .bind(&review.body)
        .bind(review.user_id)
        .bind(&review.author_name)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(review_id = %review.id, "review created successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(review_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, RepositoryError> {
        tracing::debug!("finding review by id");

        let review = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, entity_type, entity_id, rating, title, body, user_id, author_name, created_at, updated_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(review)
    }

    #[tracing::instrument(skip(self, review), fields(review_id = %review.id))]
    async fn update_content(&self, review: &Review) -> Result<(), RepositoryError> {
        tracing::debug!("updating review content");

        let result = sqlx::query(
            r#"
            UPDATE reviews
            SET rating = $2, title = $3, body = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(review.id)
        .bind(review.rating)
        .bind(&review.title)
        .bind(&review.body)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(review_id = %review.id, "review updated successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(review_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        tracing::debug!("deleting review");

        let result = sqlx::query(
            r#"
            DELETE FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(review_id = %id, "review deleted successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(?filters))]
    async fn list_page(&self, filters: ReviewFilters) -> Result<Vec<Review>, RepositoryError> {
        tracing::debug!("listing review page");

        let query = format!(
            r#"
            SELECT id, entity_type, entity_id, rating, title, body, user_id, author_name, created_at, updated_at
            FROM reviews
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%' OR body ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR entity_type = $2)
              AND rating >= $3
            ORDER BY {}
            LIMIT $4 OFFSET $5
            "#,
            filters.sort.order_clause()
        );

        let rows = sqlx::query_as::<_, Review>(&query)
            .bind(filters.search_term())
            .bind(filters.entity_type.map(EntityType::as_str))
            .bind(filters.min_rating)
            .bind(filters.limit)
            .bind(filters.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = rows.len(), "listed review page");
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(?filters))]
    async fn count_matching(&self, filters: ReviewFilters) -> Result<i64, RepositoryError> {
        tracing::debug!("counting matching reviews");

        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM reviews
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%' OR body ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR entity_type = $2)
              AND rating >= $3
            "#,
        )
        .bind(filters.search_term())
        .bind(filters.entity_type.map(EntityType::as_str))
        .bind(filters.min_rating)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = count.0, "counted matching reviews");
        Ok(count.0)
    }

    #[tracing::instrument(skip(self, entity_ids), fields(%entity_type, entity_count = entity_ids.len()))]
    async fn list_ratings_for_entities(
        &self,
        entity_type: EntityType,
        entity_ids: Vec<String>,
    ) -> Result<Vec<(String, i16)>, RepositoryError> {
        tracing::debug!("listing ratings for entities");

        let rows = sqlx::query_as::<_, (String, i16)>(
            r#"
            SELECT entity_id, rating
            FROM reviews
            WHERE entity_type = $1 AND entity_id = ANY($2)
            "#,
        )
        .bind(entity_type.as_str())
        .bind(&entity_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = rows.len(), "listed ratings for entities");
        Ok(rows)
    }
}

pub struct PostgresVoteRepository {
    pool: PgPool,
}

impl PostgresVoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl VoteRepository for PostgresVoteRepository {
    #[tracing::instrument(skip(self, vote), fields(vote_id = %vote.id, review_id = %vote.review_id))]
    async fn insert_if_absent(&self, vote: &HelpfulVote) -> Result<bool, RepositoryError> {
        tracing::debug!("inserting helpful vote if absent");

        // The partial unique indexes on (review_id, user_id) and
        // (review_id, guest_token) arbitrate concurrent inserts; the loser
        // inserts nothing and the existing row stands.
        let result = sqlx::query(
            r#"
            INSERT INTO helpful_votes (id, review_id, user_id, guest_token, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(vote.id)
        .bind(vote.review_id)
        .bind(vote.user_id)
        .bind(&vote.guest_token)
        .bind(vote.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let inserted = result.rows_affected() > 0;
        tracing::debug!(inserted, "helpful vote insert finished");
        Ok(inserted)
    }

    #[tracing::instrument(skip(self), fields(review_id = %review_id))]
    async fn delete_by_review_and_voter(
        &self,
        review_id: Uuid,
        voter: Identity,
    ) -> Result<bool, RepositoryError> {
        tracing::debug!("deleting helpful vote");

        let result = match voter {
            Identity::User(user_id) => {
                sqlx::query(
                    r#"
                    DELETE FROM helpful_votes
                    WHERE review_id = $1 AND user_id = $2
                    "#,
                )
                .bind(review_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
            }
            Identity::Guest(guest_token) => {
                sqlx::query(
                    r#"
                    DELETE FROM helpful_votes
                    WHERE review_id = $1 AND guest_token = $2
                    "#,
                )
                .bind(review_id)
                .bind(guest_token)
                .execute(&self.pool)
                .await
            }
        }
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let deleted = result.rows_affected() > 0;
        tracing::debug!(deleted, "helpful vote delete finished");
        Ok(deleted)
    }

    #[tracing::instrument(skip(self, review_ids), fields(review_count = review_ids.len()))]
    async fn count_for_reviews(
        &self,
        review_ids: Vec<Uuid>,
    ) -> Result<Vec<(Uuid, i64)>, RepositoryError> {
        tracing::debug!("counting helpful votes for reviews");

        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT review_id, COUNT(*)
            FROM helpful_votes
            WHERE review_id = ANY($1)
            GROUP BY review_id
            "#,
        )
        .bind(&review_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = rows.len(), "counted helpful votes");
        Ok(rows)
    }

    #[tracing::instrument(skip(self, review_ids), fields(review_count = review_ids.len()))]
    async fn voted_review_ids(
        &self,
        review_ids: Vec<Uuid>,
        voter: Identity,
    ) -> Result<Vec<Uuid>, RepositoryError> {
        tracing::debug!("finding reviews voted by identity");

        let rows = match voter {
            Identity::User(user_id) => {
                sqlx::query_as::<_, (Uuid,)>(
                    r#"
                    SELECT review_id
                    FROM helpful_votes
                    WHERE review_id = ANY($1) AND user_id = $2
                    "#,
                )
                .bind(&review_ids)
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
            }
            Identity::Guest(guest_token) => {
                sqlx::query_as::<_, (Uuid,)>(
                    r#"
                    SELECT review_id
                    FROM helpful_votes
                    WHERE review_id = ANY($1) AND guest_token = $2
                    "#,
                )
                .bind(&review_ids)
                .bind(guest_token)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = rows.len(), "found voted reviews");
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

pub struct PostgresPhotoRepository {
    pool: PgPool,
}

impl PostgresPhotoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PhotoRepository for PostgresPhotoRepository {
    #[tracing::instrument(skip(self, entity_ids), fields(%entity_type, entity_count = entity_ids.len()))]
    async fn find_latest_for_entities(
        &self,
        entity_type: EntityType,
        entity_ids: Vec<String>,
    ) -> Result<Vec<EntityPhoto>, RepositoryError> {
        tracing::debug!("finding latest photos for entities");

        // Newest first, so the first photo seen per entity id wins.
        let photos = sqlx::query_as::<_, EntityPhoto>(
            r#"
            SELECT entity_type, entity_id, photo_url, created_at
            FROM entity_photos
            WHERE entity_type = $1 AND entity_id = ANY($2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(entity_type.as_str())
        .bind(&entity_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = photos.len(), "found photos for entities");
        Ok(photos)
    }
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
