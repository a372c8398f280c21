use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CategoryId, LocationId, UserId};
use crate::error::{DomainError, Validator};

pub type PostId = i64;

const TITLE_MAX_CHARS: usize = 256;
const IMAGE_REF_MAX_CHARS: usize = 100;

/// Post entity - a blog publication, possibly scheduled for the future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: UserId,
    pub location_id: Option<LocationId>,
    pub category_id: Option<CategoryId>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Overwrite the editable fields with a submitted draft.
    /// Identity, author and creation time are kept.
    pub fn apply(&mut self, draft: PostDraft) {
        self.title = draft.title;
        self.text = draft.text;
        self.pub_date = draft.pub_date;
        self.location_id = draft.location_id;
        self.category_id = draft.category_id;
        self.image = draft.image;
        self.is_published = draft.is_published;
    }
}

/// The editable part of a post, as submitted through the create/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<LocationId>,
    pub category_id: Option<CategoryId>,
    pub image: Option<String>,
    pub is_published: bool,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, text: impl Into<String>, pub_date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            pub_date,
            location_id: None,
            category_id: None,
            image: None,
            is_published: true,
        }
    }

    pub fn in_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn at_location(mut self, location_id: LocationId) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_published = false;
        self
    }

    /// Field-level checks that need no store lookups.
    pub fn validate(&self) -> Result<(), DomainError> {
        let title = self.title.trim();
        let image_ok = self
            .image
            .as_deref()
            .is_none_or(|i| i.chars().count() <= IMAGE_REF_MAX_CHARS);

        Validator::new()
            .check(!title.is_empty(), "title", "This field is required.")
            .check(
                title.chars().count() <= TITLE_MAX_CHARS,
                "title",
                "Ensure this value has at most 256 characters.",
            )
            .check(!self.text.trim().is_empty(), "text", "This field is required.")
            .check(
                image_ok,
                "image",
                "Ensure this value has at most 100 characters.",
            )
            .finish()
    }

    pub fn into_new(self, author_id: UserId, created_at: DateTime<Utc>) -> NewPost {
        NewPost {
            author_id,
            created_at,
            draft: self,
        }
    }
}

/// A validated draft bound to its author, ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    pub draft: PostDraft,
}

/// A post as listed in a feed, annotated with its number of comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    #[serde(flatten)]
    pub post: Post,
    pub comment_count: u64,
}
