//! Post mutation workflow.

use std::sync::Arc;

use serde::Serialize;

use super::{current_user, is_owner};
use crate::domain::{Category, Location, Post, PostDraft, PostId, Viewer};
use crate::error::{DomainError, FieldError, Validator};
use crate::navigation::{Access, Mutation, Navigation};
use crate::ports::{Clock, Repositories};

/// Categories and locations offered by the post form.
#[derive(Debug, Clone, Serialize)]
pub struct PostFormChoices {
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
}

#[derive(Clone)]
pub struct PostService {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    pub async fn form_choices(&self) -> Result<PostFormChoices, DomainError> {
        Ok(PostFormChoices {
            categories: self.repos.categories.list_published().await?,
            locations: self.repos.locations.list_published().await?,
        })
    }

    /// Publish a new post authored by the viewer, then go to their profile.
    pub async fn create(
        &self,
        viewer: &Viewer,
        draft: PostDraft,
    ) -> Result<Mutation<Post>, DomainError> {
        let author = current_user(self.repos.users.as_ref(), viewer).await?;
        self.validate(&draft).await?;

        let post = self
            .repos
            .posts
            .create(draft.into_new(author.id, self.clock.now()))
            .await?;
        tracing::info!(post_id = post.id, author = %author.username, "Post created");

        Ok(Mutation::Applied {
            value: post,
            next: Navigation::profile(author.username),
        })
    }

    /// Load a post for its edit form.
    pub async fn edit_form(
        &self,
        viewer: &Viewer,
        post_id: PostId,
    ) -> Result<Access<Post>, DomainError> {
        let post = self.load(post_id).await?;
        if is_owner(viewer, &post)? {
            Ok(Access::Granted(post))
        } else {
            Ok(Access::Redirect(Navigation::post(post_id)))
        }
    }

    pub async fn update(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        draft: PostDraft,
    ) -> Result<Mutation<Post>, DomainError> {
        let mut post = self.load(post_id).await?;
        if !is_owner(viewer, &post)? {
            tracing::debug!(post_id, "Post edit by non-author redirected");
            return Ok(Mutation::Denied {
                next: Navigation::post(post_id),
            });
        }

        self.validate(&draft).await?;
        post.apply(draft);
        let post = self.repos.posts.update(post).await?;
        tracing::info!(post_id, "Post updated");

        Ok(Mutation::Applied {
            value: post,
            next: Navigation::post(post_id),
        })
    }

    /// Load a post for its delete confirmation.
    pub async fn delete_form(
        &self,
        viewer: &Viewer,
        post_id: PostId,
    ) -> Result<Access<Post>, DomainError> {
        self.edit_form(viewer, post_id).await
    }

    /// Delete a post together with its comments.
    pub async fn delete(
        &self,
        viewer: &Viewer,
        post_id: PostId,
    ) -> Result<Mutation<PostId>, DomainError> {
        let post = self.load(post_id).await?;
        if !is_owner(viewer, &post)? {
            tracing::debug!(post_id, "Post delete by non-author redirected");
            return Ok(Mutation::Denied {
                next: Navigation::post(post_id),
            });
        }

        let author = current_user(self.repos.users.as_ref(), viewer).await?;
        self.repos.posts.delete(post_id).await?;
        tracing::info!(post_id, author = %author.username, "Post deleted");

        Ok(Mutation::Applied {
            value: post_id,
            next: Navigation::profile(author.username),
        })
    }

    async fn load(&self, post_id: PostId) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    /// Field checks plus the references that need the store.
    async fn validate(&self, draft: &PostDraft) -> Result<(), DomainError> {
        draft.validate()?;

        let mut validator = Validator::new();
        if let Some(id) = draft.category_id {
            if self.repos.categories.find_by_id(id).await?.is_none() {
                validator.push(FieldError::new("category", "Select a valid choice."));
            }
        }
        if let Some(id) = draft.location_id {
            if self.repos.locations.find_by_id(id).await?.is_none() {
                validator.push(FieldError::new("location", "Select a valid choice."));
            }
        }
        validator.finish()
    }
}
