//! Comment routes, nested under their post.

use actix_web::{HttpResponse, web};

use blogicum_core::Access;
use blogicum_core::domain::{CommentDraft, CommentId, PostId};
use blogicum_shared::dto::CommentRequest;

use super::render;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppResult, rejected_body, see_other};
use crate::state::AppState;

/// POST /posts/{post_id}/comment
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<PostId>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .comments
        .create(
            &identity.viewer(),
            post_id.into_inner(),
            CommentDraft::new(body.into_inner().text),
        )
        .await?;
    Ok(see_other(outcome.next()))
}

/// GET /posts/{post_id}/edit-comment/{comment_id}
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(PostId, CommentId)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let access = state
        .comments
        .edit_form(&identity.viewer(), post_id, comment_id)
        .await?;
    Ok(render(access))
}

/// POST /posts/{post_id}/edit-comment/{comment_id}
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(PostId, CommentId)>,
    body: Result<web::Json<CommentRequest>, actix_web::Error>,
) -> AppResult<HttpResponse> {
    let viewer = identity.viewer();
    let (post_id, comment_id) = path.into_inner();

    // Ownership is settled before the body.
    let text = match body {
        Ok(body) => body.into_inner().text,
        Err(err) => {
            return match state.comments.edit_form(&viewer, post_id, comment_id).await? {
                Access::Redirect(to) => Ok(see_other(&to)),
                Access::Granted(_) => Err(rejected_body(err)),
            };
        }
    };

    let outcome = state
        .comments
        .update(&viewer, post_id, comment_id, CommentDraft::new(text))
        .await?;
    Ok(see_other(outcome.next()))
}

/// GET /posts/{post_id}/delete-comment/{comment_id}
pub async fn delete_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(PostId, CommentId)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let access = state
        .comments
        .delete_form(&identity.viewer(), post_id, comment_id)
        .await?;
    Ok(render(access))
}

/// POST /posts/{post_id}/delete-comment/{comment_id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(PostId, CommentId)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let outcome = state
        .comments
        .delete(&identity.viewer(), post_id, comment_id)
        .await?;
    Ok(see_other(outcome.next()))
}
