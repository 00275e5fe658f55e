use serde::{Deserialize, Serialize};
use thiserror::Error;

// An entity id is only unique together with its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "destinations")]
    Destination,
    #[serde(rename = "accommodations")]
    Accommodation,
    #[serde(rename = "attractions")]
    Attraction,
    #[serde(rename = "restaurants")]
    Restaurant,
}

#[derive(Debug, Error)]
#[error("unknown entity type: {0}")]
pub struct UnknownEntityType(pub String);

impl EntityType {
    pub const ALL: [EntityType; 4] = [
        EntityType::Destination,
        EntityType::Accommodation,
        EntityType::Attraction,
        EntityType::Restaurant,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Destination => "destinations",
            EntityType::Accommodation => "accommodations",
            EntityType::Attraction => "attractions",
            EntityType::Restaurant => "restaurants",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "destinations" => Ok(EntityType::Destination),
            "accommodations" => Ok(EntityType::Accommodation),
            "attractions" => Ok(EntityType::Attraction),
            "restaurants" => Ok(EntityType::Restaurant),
            other => Err(UnknownEntityType(other.to_string())),
        }
    }
}

impl TryFrom<String> for EntityType {
    type Error = UnknownEntityType;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntityAggregate {
    pub average_rating: f64,
    pub review_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_round_trip() {
        for entity_type in EntityType::ALL {
            let parsed: EntityType = entity_type.as_str().parse().unwrap();
            assert_eq!(parsed, entity_type);
        }
    }

    #[test]
    fn test_entity_type_rejects_unknown() {
        assert!("museums".parse::<EntityType>().is_err());
        assert!("".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_entity_type_serde_uses_plural_strings() {
        let json = serde_json::to_string(&EntityType::Restaurant).unwrap();
        assert_eq!(json, "\"restaurants\"");
    }
}
