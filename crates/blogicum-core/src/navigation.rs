//! Where a request goes next, and the typed results of guarded operations.

use serde::Serialize;

use crate::domain::PostId;

/// A read-only destination the client is sent to after a mutation or a
/// soft denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Navigation {
    PostDetail { post_id: PostId },
    Profile { username: String },
    Login { next: Option<String> },
}

impl Navigation {
    pub fn post(post_id: PostId) -> Self {
        Navigation::PostDetail { post_id }
    }

    pub fn profile(username: impl Into<String>) -> Self {
        Navigation::Profile {
            username: username.into(),
        }
    }

    pub fn login() -> Self {
        Navigation::Login { next: None }
    }

    /// URL path of the destination.
    pub fn path(&self) -> String {
        match self {
            Navigation::PostDetail { post_id } => format!("/posts/{post_id}"),
            Navigation::Profile { username } => format!("/profile/{username}"),
            Navigation::Login { next: Some(next) } => format!("/auth/login?next={next}"),
            Navigation::Login { next: None } => "/auth/login".to_string(),
        }
    }
}

/// Result of loading a guarded form (the GET side of edit/delete).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access<T> {
    Granted(T),
    Redirect(Navigation),
}

/// Result of a guarded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<T> {
    Applied { value: T, next: Navigation },
    Denied { next: Navigation },
}

impl<T> Mutation<T> {
    pub fn next(&self) -> &Navigation {
        match self {
            Mutation::Applied { next, .. } | Mutation::Denied { next } => next,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied { .. })
    }
}
