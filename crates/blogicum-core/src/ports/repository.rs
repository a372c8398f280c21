use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    Category, CategoryId, Comment, CommentId, FeedEntry, Location, LocationId, NewCategory,
    NewComment, NewLocation, NewPost, Post, PostId, User, UserId,
};
use crate::error::RepoError;
use crate::visibility::PostFilter;

/// Generic repository trait defining the operations every entity supports.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Delete an entity by its ID, applying the referential rules of its
    /// dependents (cascade or set-null). Fails with `NotFound` when absent.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository. Deleting a user removes their posts and comments.
#[async_trait]
pub trait UserRepository: BaseRepository<User, UserId> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Insert a new user. A taken username is a `Constraint` error.
    async fn create(&self, user: User) -> Result<User, RepoError>;

    async fn update(&self, user: User) -> Result<User, RepoError>;
}

/// Location repository. Deleting a location nulls it on posts.
#[async_trait]
pub trait LocationRepository: BaseRepository<Location, LocationId> {
    async fn create(&self, location: NewLocation) -> Result<Location, RepoError>;

    async fn list_published(&self) -> Result<Vec<Location>, RepoError>;
}

/// Category repository. Deleting a category nulls it on posts.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, CategoryId> {
    /// Insert a new category. A taken slug is a `Constraint` error.
    async fn create(&self, category: NewCategory) -> Result<Category, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    async fn list_published(&self) -> Result<Vec<Category>, RepoError>;
}

/// Post repository. Deleting a post removes its comments.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, PostId> {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    async fn update(&self, post: Post) -> Result<Post, RepoError>;

    /// Number of posts matching the filter.
    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError>;

    /// Posts matching the filter, newest `pub_date` first with ties broken by
    /// id, each annotated with its comment count.
    async fn list(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<FeedEntry>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, CommentId> {
    /// Insert a comment. Fails with `NotFound` if the post is gone.
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError>;

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError>;

    /// Comments of a post, oldest first.
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepoError>;
}

/// The entity store as seen by the services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    /// Use one store object for every entity.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + LocationRepository
            + CategoryRepository
            + PostRepository
            + CommentRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            locations: store.clone(),
            categories: store.clone(),
            posts: store.clone(),
            comments: store,
        }
    }
}
