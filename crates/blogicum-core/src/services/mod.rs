//! Application services - feed assembly and guarded mutation workflows.

mod accounts;
mod comments;
mod feed;
mod posts;

pub use accounts::{AccountService, IssuedToken, Registration};
pub use comments::CommentService;
pub use feed::{CategoryFeed, CommentView, FeedService, PostDetail, ProfileFeed};
pub use posts::{PostFormChoices, PostService};

use crate::domain::{User, Viewer};
use crate::error::DomainError;
use crate::guard::{self, AccessDenied, Owned};
use crate::ports::UserRepository;

/// Resolve the viewer to their stored record. A handle naming a user that no
/// longer exists counts as no identity.
async fn current_user(users: &dyn UserRepository, viewer: &Viewer) -> Result<User, DomainError> {
    let user_id = guard::require_login(viewer)?;
    users
        .find_by_id(user_id)
        .await?
        .ok_or(DomainError::Unauthenticated)
}

/// Run the ownership check. `Ok(false)` is a soft denial the caller turns
/// into a redirect; anonymous viewers get a hard `Unauthenticated`.
fn is_owner<E: Owned>(viewer: &Viewer, entity: &E) -> Result<bool, DomainError> {
    match guard::authorize(viewer, entity) {
        Ok(_) => Ok(true),
        Err(AccessDenied::NotOwner) => Ok(false),
        Err(denied) => Err(denied.into()),
    }
}
