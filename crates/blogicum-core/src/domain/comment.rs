use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PostId, UserId};
use crate::error::{DomainError, Validator};

pub type CommentId = i64;

/// Comment left by a user under a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub post_id: PostId,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
}

impl CommentDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        Validator::new()
            .check(!self.text.trim().is_empty(), "text", "This field is required.")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
