//! Comment mutation workflow. Every outcome leads back to the parent post.

use std::sync::Arc;

use super::{current_user, is_owner};
use crate::domain::{Comment, CommentDraft, CommentId, NewComment, PostId, Viewer};
use crate::error::{DomainError, RepoError};
use crate::navigation::{Access, Mutation, Navigation};
use crate::ports::{Clock, Repositories};

#[derive(Clone)]
pub struct CommentService {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl CommentService {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    pub async fn create(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        draft: CommentDraft,
    ) -> Result<Mutation<Comment>, DomainError> {
        let author = current_user(self.repos.users.as_ref(), viewer).await?;
        if self.repos.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::not_found("post", post_id));
        }
        draft.validate()?;

        let comment = self
            .repos
            .comments
            .create(NewComment {
                post_id,
                author_id: author.id,
                text: draft.text,
                created_at: self.clock.now(),
            })
            .await
            .map_err(|e| match e {
                // The post vanished between the lookup and the insert.
                RepoError::NotFound => DomainError::not_found("post", post_id),
                other => other.into(),
            })?;
        tracing::info!(post_id, comment_id = comment.id, "Comment added");

        Ok(Mutation::Applied {
            value: comment,
            next: Navigation::post(post_id),
        })
    }

    pub async fn edit_form(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        comment_id: CommentId,
    ) -> Result<Access<Comment>, DomainError> {
        let comment = self.load(post_id, comment_id).await?;
        if is_owner(viewer, &comment)? {
            Ok(Access::Granted(comment))
        } else {
            Ok(Access::Redirect(Navigation::post(post_id)))
        }
    }

    pub async fn update(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        comment_id: CommentId,
        draft: CommentDraft,
    ) -> Result<Mutation<Comment>, DomainError> {
        let mut comment = self.load(post_id, comment_id).await?;
        if !is_owner(viewer, &comment)? {
            tracing::debug!(post_id, comment_id, "Comment edit by non-author redirected");
            return Ok(Mutation::Denied {
                next: Navigation::post(post_id),
            });
        }

        draft.validate()?;
        comment.text = draft.text;
        let comment = self.repos.comments.update(comment).await?;
        tracing::info!(post_id, comment_id, "Comment updated");

        Ok(Mutation::Applied {
            value: comment,
            next: Navigation::post(post_id),
        })
    }

    pub async fn delete_form(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        comment_id: CommentId,
    ) -> Result<Access<Comment>, DomainError> {
        self.edit_form(viewer, post_id, comment_id).await
    }

    pub async fn delete(
        &self,
        viewer: &Viewer,
        post_id: PostId,
        comment_id: CommentId,
    ) -> Result<Mutation<CommentId>, DomainError> {
        let comment = self.load(post_id, comment_id).await?;
        if !is_owner(viewer, &comment)? {
            tracing::debug!(post_id, comment_id, "Comment delete by non-author redirected");
            return Ok(Mutation::Denied {
                next: Navigation::post(post_id),
            });
        }

        self.repos.comments.delete(comment_id).await?;
        tracing::info!(post_id, comment_id, "Comment deleted");

        Ok(Mutation::Applied {
            value: comment_id,
            next: Navigation::post(post_id),
        })
    }

    /// The comment must exist and hang under the post named in the path.
    async fn load(&self, post_id: PostId, comment_id: CommentId) -> Result<Comment, DomainError> {
        self.repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))
    }
}
