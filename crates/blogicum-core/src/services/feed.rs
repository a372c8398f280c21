//! Query assembler - the listing views and the post detail view.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{
    Category, Comment, FeedEntry, Location, Page, PageRequest, Post, PostId, PublicProfile,
    UserId, Viewer,
};
use crate::error::DomainError;
use crate::ports::{Clock, Repositories};
use crate::visibility::{self, PostFilter};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryFeed {
    pub category: Category,
    pub posts: Page<FeedEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    pub profile: PublicProfile,
    /// The viewer is looking at their own profile.
    pub is_owner: bool,
    pub posts: Page<FeedEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub author: PublicProfile,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comments: Vec<CommentView>,
    pub comment_count: u64,
    /// The viewer is allowed to submit a comment.
    pub can_comment: bool,
    pub is_author: bool,
}

/// Builds the home, category and profile feeds.
#[derive(Clone)]
pub struct FeedService {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl FeedService {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    /// Publicly visible posts, newest first.
    pub async fn home(&self, page: PageRequest) -> Result<Page<FeedEntry>, DomainError> {
        let filter = visibility::home_feed(self.clock.now());
        self.paginate(&filter, page).await
    }

    /// Publicly visible posts of a published category.
    pub async fn category(
        &self,
        slug: &str,
        page: PageRequest,
    ) -> Result<CategoryFeed, DomainError> {
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| DomainError::not_found("category", slug))?;

        let filter = visibility::category_feed(&category.slug, self.clock.now());
        let posts = self.paginate(&filter, page).await?;

        Ok(CategoryFeed { category, posts })
    }

    /// Posts written by `username`.
    pub async fn profile(
        &self,
        viewer: &Viewer,
        username: &str,
        page: PageRequest,
    ) -> Result<ProfileFeed, DomainError> {
        let user = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let filter = visibility::profile_feed(user.id, viewer);
        let posts = self.paginate(&filter, page).await?;

        Ok(ProfileFeed {
            profile: user.profile(),
            is_owner: viewer.is(user.id),
            posts,
        })
    }

    /// A single post with its comments, oldest first.
    pub async fn post_detail(
        &self,
        viewer: &Viewer,
        post_id: PostId,
    ) -> Result<PostDetail, DomainError> {
        let post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;

        let category = match post.category_id {
            Some(id) => self.repos.categories.find_by_id(id).await?,
            None => None,
        };

        if !visibility::can_view_post(viewer, &post, category.as_ref(), self.clock.now()) {
            return Err(DomainError::not_found("post", post_id));
        }

        let location = match post.location_id {
            Some(id) => self
                .repos
                .locations
                .find_by_id(id)
                .await?
                .filter(|l| l.is_published),
            None => None,
        };

        let author = self
            .repos
            .users
            .find_by_id(post.author_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", post.author_id))?
            .profile();

        let comments = self.repos.comments.list_for_post(post.id).await?;
        let comments = self.with_authors(comments).await?;

        Ok(PostDetail {
            is_author: viewer.is(post.author_id),
            can_comment: viewer.is_authenticated(),
            comment_count: comments.len() as u64,
            author,
            category,
            location,
            comments,
            post,
        })
    }

    async fn paginate(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<FeedEntry>, DomainError> {
        let total = self.repos.posts.count(filter).await?;
        let window = page.resolve(total);
        let items = self
            .repos
            .posts
            .list(filter, window.offset, window.limit)
            .await?;

        tracing::debug!(
            page = window.number,
            total_pages = window.total_pages,
            total_items = total,
            "Feed page assembled"
        );

        Ok(window.fill(items))
    }

    async fn with_authors(&self, comments: Vec<Comment>) -> Result<Vec<CommentView>, DomainError> {
        let mut names: HashMap<UserId, String> = HashMap::new();
        let mut views = Vec::with_capacity(comments.len());

        for comment in comments {
            if !names.contains_key(&comment.author_id) {
                let name = self
                    .repos
                    .users
                    .find_by_id(comment.author_id)
                    .await?
                    .map(|u| u.username)
                    .unwrap_or_default();
                names.insert(comment.author_id, name);
            }
            let author = names.get(&comment.author_id).cloned().unwrap_or_default();
            views.push(CommentView { comment, author });
        }

        Ok(views)
    }
}
