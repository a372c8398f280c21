use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type LocationId = i64;

/// A place a post can be attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Location as submitted for creation; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: String,
    pub is_published: bool,
}

impl NewLocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_published: true,
        }
    }
}
