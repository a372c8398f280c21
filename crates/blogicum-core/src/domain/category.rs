use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Validator};

pub type CategoryId = i64;

/// Category entity - groups posts under a unique slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}

impl NewCategory {
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            slug: slug.into(),
            is_published: true,
        }
    }

    pub fn unpublished(mut self) -> Self {
        self.is_published = false;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        Validator::new()
            .check(!self.title.trim().is_empty(), "title", "This field is required.")
            .check(
                is_valid_slug(&self.slug),
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            )
            .finish()
    }
}

/// Slugs are limited to latin letters, digits, hyphen and underscore.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
