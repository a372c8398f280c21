//! A complete entity store on top of `BTreeMap`s behind one async `RwLock`.
//!
//! Every mutation, cascades included, runs under a single write guard, so it
//! is applied entirely or not at all.
//! Note: data is lost on process restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use blogicum_core::domain::{
    Category, CategoryId, Comment, CommentId, FeedEntry, Location, LocationId, NewCategory,
    NewComment, NewLocation, NewPost, Post, PostId, User, UserId,
};
use blogicum_core::error::RepoError;
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use blogicum_core::visibility::{PostFilter, comment_order, feed_order};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    locations: BTreeMap<LocationId, Location>,
    categories: BTreeMap<CategoryId, Category>,
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    seq: Sequences,
}

/// Per-table id sequences; ids grow with insertion order.
#[derive(Default)]
struct Sequences {
    location: i64,
    category: i64,
    post: i64,
    comment: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

impl Tables {
    fn category_of(&self, post: &Post) -> Option<&Category> {
        post.category_id.and_then(|id| self.categories.get(&id))
    }

    fn matching<'a>(&'a self, filter: &'a PostFilter) -> impl Iterator<Item = &'a Post> + 'a {
        self.posts
            .values()
            .filter(move |p| filter.matches(p, self.category_of(p)))
    }

    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn check_references(&self, post: &Post) -> Result<(), RepoError> {
        if !self.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("post author does not exist".into()));
        }
        if let Some(id) = post.category_id {
            if !self.categories.contains_key(&id) {
                return Err(RepoError::Constraint(format!("category {id} does not exist")));
            }
        }
        if let Some(id) = post.location_id {
            if !self.locations.contains_key(&id) {
                return Err(RepoError::Constraint(format!("location {id} does not exist")));
            }
        }
        Ok(())
    }

    fn remove_post(&mut self, post_id: PostId) -> bool {
        let removed = self.posts.remove(&post_id).is_some();
        if removed {
            self.comments.retain(|_, c| c.post_id != post_id);
        }
        removed
    }
}

/// In-memory implementation of every repository port.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<User, UserId> for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepoError> {
        let mut t = self.tables.write().await;
        if t.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let authored: Vec<PostId> = t
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            t.remove_post(post_id);
        }
        t.comments.retain(|_, c| c.author_id != id);

        tracing::debug!(user_id = %id, "User deleted with posts and comments");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut t = self.tables.write().await;
        if t.users.contains_key(&user.id) || t.username_taken(&user.username, None) {
            return Err(RepoError::Constraint("username already exists".into()));
        }
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        if t.username_taken(&user.username, Some(user.id)) {
            return Err(RepoError::Constraint("username already exists".into()));
        }
        t.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl BaseRepository<Location, LocationId> for InMemoryStore {
    async fn find_by_id(&self, id: LocationId) -> Result<Option<Location>, RepoError> {
        Ok(self.tables.read().await.locations.get(&id).cloned())
    }

    async fn delete(&self, id: LocationId) -> Result<(), RepoError> {
        let mut t = self.tables.write().await;
        if t.locations.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in t.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn create(&self, location: NewLocation) -> Result<Location, RepoError> {
        let mut t = self.tables.write().await;
        let location = Location {
            id: next(&mut t.seq.location),
            name: location.name,
            is_published: location.is_published,
            created_at: Utc::now(),
        };
        t.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn list_published(&self) -> Result<Vec<Location>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.locations
            .values()
            .filter(|l| l.is_published)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Category, CategoryId> for InMemoryStore {
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn delete(&self, id: CategoryId) -> Result<(), RepoError> {
        let mut t = self.tables.write().await;
        if t.categories.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in t.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn create(&self, category: NewCategory) -> Result<Category, RepoError> {
        let mut t = self.tables.write().await;
        if t.categories.values().any(|c| c.slug == category.slug) {
            return Err(RepoError::Constraint(format!(
                "category slug '{}' already exists",
                category.slug
            )));
        }
        let category = Category {
            id: next(&mut t.seq.category),
            title: category.title,
            description: category.description,
            slug: category.slug,
            is_published: category.is_published,
            created_at: Utc::now(),
        };
        t.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list_published(&self) -> Result<Vec<Category>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.categories
            .values()
            .filter(|c| c.is_published)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Post, PostId> for InMemoryStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let mut t = self.tables.write().await;
        if t.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let mut t = self.tables.write().await;
        let draft = post.draft;
        let post = Post {
            id: 0,
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date,
            author_id: post.author_id,
            location_id: draft.location_id,
            category_id: draft.category_id,
            image: draft.image,
            is_published: draft.is_published,
            created_at: post.created_at,
        };
        t.check_references(&post)?;

        let post = Post {
            id: next(&mut t.seq.post),
            ..post
        };
        t.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut t = self.tables.write().await;
        if !t.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        t.check_references(&post)?;
        t.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        let t = self.tables.read().await;
        Ok(t.matching(filter).count() as u64)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<FeedEntry>, RepoError> {
        let t = self.tables.read().await;

        let mut posts: Vec<&Post> = t.matching(filter).collect();
        posts.sort_by(|a, b| feed_order(a, b));

        let mut counts: HashMap<PostId, u64> = HashMap::new();
        for comment in t.comments.values() {
            *counts.entry(comment.post_id).or_default() += 1;
        }

        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|post| FeedEntry {
                comment_count: counts.get(&post.id).copied().unwrap_or(0),
                post: post.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Comment, CommentId> for InMemoryStore {
    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn delete(&self, id: CommentId) -> Result<(), RepoError> {
        let mut t = self.tables.write().await;
        t.comments.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let mut t = self.tables.write().await;
        if !t.posts.contains_key(&comment.post_id) {
            return Err(RepoError::NotFound);
        }
        if !t.users.contains_key(&comment.author_id) {
            return Err(RepoError::Constraint("comment author does not exist".into()));
        }
        let comment = Comment {
            id: next(&mut t.seq.comment),
            text: comment.text,
            post_id: comment.post_id,
            author_id: comment.author_id,
            created_at: comment.created_at,
        };
        t.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut t = self.tables.write().await;
        match t.comments.get_mut(&comment.id) {
            Some(existing) => {
                existing.text = comment.text;
                Ok(existing.clone())
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepoError> {
        let t = self.tables.read().await;
        let mut comments: Vec<Comment> = t
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(comment_order);
        Ok(comments)
    }
}
