use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::EntityType;

// Owned by the photo subsystem; this service only reads these rows, and
// the most recently inserted photo per entity wins.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EntityPhoto {
    #[sqlx(try_from = "String")]
    pub entity_type: EntityType,
    pub entity_id: String,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
}
