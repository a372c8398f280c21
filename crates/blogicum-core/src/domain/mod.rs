//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod page;
mod post;
mod user;
mod viewer;

pub use category::{Category, CategoryId, NewCategory, is_valid_slug};
pub use comment::{Comment, CommentDraft, CommentId, NewComment};
pub use location::{Location, LocationId, NewLocation};
pub use page::{PAGE_SIZE, Page, PageRequest, PageWindow};
pub use post::{FeedEntry, NewPost, Post, PostDraft, PostId};
pub use user::{
    NewUser, ProfileUpdate, PublicProfile, User, UserId, is_plausible_email, is_valid_username,
};
pub use viewer::Viewer;
