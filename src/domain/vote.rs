use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identity::Identity;

// Row presence is the vote; exactly one of user_id / guest_token is set,
// and each voter has at most one row per review.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HelpfulVote {
    pub id: Uuid,
    pub review_id: Uuid,
    pub user_id: Option<Uuid>,
    pub guest_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl HelpfulVote {
    pub fn new(review_id: Uuid, voter: &Identity) -> Self {
        let (user_id, guest_token) = match voter {
            Identity::User(id) => (Some(*id), None),
            Identity::Guest(token) => (None, Some(token.clone())),
        };

        Self {
            id: Uuid::new_v4(),
            review_id,
            user_id,
            guest_token,
            created_at: Utc::now(),
        }
    }
}
