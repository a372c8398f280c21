//! Authorization guard - who may mutate what.

use crate::domain::{Comment, Post, UserId, Viewer};
use crate::error::DomainError;

/// Entities with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}

impl Owned for Post {
    fn owner_id(&self) -> UserId {
        self.author_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> UserId {
        self.author_id
    }
}

/// Why a mutation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// No identity at all; the caller must go through login.
    Unauthenticated,
    /// Authenticated, but not the owner of the target.
    NotOwner,
}

impl From<AccessDenied> for DomainError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Unauthenticated => DomainError::Unauthenticated,
            AccessDenied::NotOwner => DomainError::Unauthorized,
        }
    }
}

/// Creation only needs an identity; the creator becomes the author.
pub fn require_login(viewer: &Viewer) -> Result<UserId, AccessDenied> {
    viewer.user_id().ok_or(AccessDenied::Unauthenticated)
}

/// Edit and delete are reserved to the owner of the entity.
pub fn authorize<E: Owned>(viewer: &Viewer, entity: &E) -> Result<UserId, AccessDenied> {
    let user_id = require_login(viewer)?;
    if user_id == entity.owner_id() {
        Ok(user_id)
    } else {
        Err(AccessDenied::NotOwner)
    }
}

pub fn can_mutate<E: Owned>(viewer: &Viewer, entity: &E) -> bool {
    authorize(viewer, entity).is_ok()
}
