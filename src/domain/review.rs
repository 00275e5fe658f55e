use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::EntityType;
use crate::domain::identity::Author;

pub const RATING_MIN: i16 = 1;
pub const RATING_MAX: i16 = 5;
pub const TITLE_MIN_CHARS: usize = 4;
pub const TITLE_MAX_CHARS: usize = 80;
pub const BODY_MIN_CHARS: usize = 20;
pub const BODY_MAX_CHARS: usize = 2000;

// Exactly one of user_id / author_name is set; entity_type, entity_id and
// authorship are immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub entity_type: EntityType,
    pub entity_id: String,
    pub rating: i16,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Review {
    pub fn new(
        entity_type: EntityType,
        entity_id: String,
        content: ReviewContent,
        author: Author,
    ) -> Self {
        let (user_id, author_name) = match author {
            Author::User(id) => (Some(id), None),
            Author::Guest(name) => (None, Some(name)),
        };

        Self {
            id: Uuid::new_v4(),
            entity_type,
            entity_id,
            rating: content.rating,
            title: content.title,
            body: content.body,
            user_id,
            author_name,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn is_authored_by(&self, actor: &Author) -> bool {
        match actor {
            Author::User(id) => self.user_id == Some(*id),
            Author::Guest(name) => self.author_name.as_deref() == Some(name.as_str()),
        }
    }

    pub fn apply_edit(&mut self, content: ReviewContent) {
        self.rating = content.rating;
        self.title = content.title;
        self.body = content.body;
        self.updated_at = Some(Utc::now());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// Validated, trimmed review content; only constructed through validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewContent {
    rating: i16,
    title: String,
    body: String,
}

impl ReviewContent {
    // Returns every violated constraint, not only the first.
    pub fn validate(rating: i16, title: &str, body: &str) -> Result<Self, Vec<FieldViolation>> {
        let mut violations = Vec::new();

        if !(RATING_MIN..=RATING_MAX).contains(&rating) {
            violations.push(FieldViolation::new(
                "rating",
                format!("rating must be between {RATING_MIN} and {RATING_MAX}"),
            ));
        }

        let title = title.trim();
        let title_chars = title.chars().count();
        if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&title_chars) {
            violations.push(FieldViolation::new(
                "title",
                format!("title must be {TITLE_MIN_CHARS} to {TITLE_MAX_CHARS} characters"),
            ));
        }

        let body = body.trim();
        let body_chars = body.chars().count();
        if !(BODY_MIN_CHARS..=BODY_MAX_CHARS).contains(&body_chars) {
            violations.push(FieldViolation::new(
                "body",
                format!("body must be {BODY_MIN_CHARS} to {BODY_MAX_CHARS} characters"),
            ));
        }

        if violations.is_empty() {
            Ok(Self {
                rating,
                title: title.to_string(),
                body: body.to_string(),
            })
        } else {
            Err(violations)
        }
    }

    pub fn rating(&self) -> i16 {
        self.rating
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedReview {
    #[serde(flatten)]
    pub review: Review,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub helpful_count: i64,
    pub user_voted_helpful: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating_for_place: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count_for_place: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewFeedPage {
    pub reviews: Vec<EnrichedReview>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}
