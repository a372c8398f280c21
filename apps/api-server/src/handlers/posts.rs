//! Post create/edit/delete. Every route here sits behind `LoginRequired`.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use blogicum_core::Access;
use blogicum_core::domain::{PostDraft, PostId};
use blogicum_core::services::PostFormChoices;
use blogicum_shared::dto::PostRequest;

use super::render;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppResult, rejected_body, see_other};
use crate::state::AppState;

/// Blank create form: defaults plus what the selects can offer.
#[derive(Serialize)]
struct PostForm {
    pub_date: DateTime<Utc>,
    is_published: bool,
    #[serde(flatten)]
    choices: PostFormChoices,
}

fn draft(req: PostRequest) -> PostDraft {
    PostDraft {
        title: req.title,
        text: req.text,
        pub_date: req.pub_date,
        location_id: req.location,
        category_id: req.category,
        image: req.image,
        is_published: req.is_published,
    }
}

/// GET /posts/create
pub async fn create_form(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let choices = state.posts.form_choices().await?;
    Ok(HttpResponse::Ok().json(PostForm {
        pub_date: state.clock.now(),
        is_published: true,
        choices,
    }))
}

/// POST /posts/create
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .posts
        .create(&identity.viewer(), draft(body.into_inner()))
        .await?;
    Ok(see_other(outcome.next()))
}

/// GET /posts/{post_id}/edit
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<PostId>,
) -> AppResult<HttpResponse> {
    let access = state
        .posts
        .edit_form(&identity.viewer(), post_id.into_inner())
        .await?;
    Ok(render(access))
}

/// POST /posts/{post_id}/edit
///
/// A non-author is sent back to the post whatever the body holds.
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<PostId>,
    body: Result<web::Json<PostRequest>, actix_web::Error>,
) -> AppResult<HttpResponse> {
    let viewer = identity.viewer();
    let post_id = post_id.into_inner();

    let body = match body {
        Ok(body) => body.into_inner(),
        Err(err) => {
            return match state.posts.edit_form(&viewer, post_id).await? {
                Access::Redirect(to) => Ok(see_other(&to)),
                Access::Granted(_) => Err(rejected_body(err)),
            };
        }
    };

    let outcome = state.posts.update(&viewer, post_id, draft(body)).await?;
    Ok(see_other(outcome.next()))
}

/// GET /posts/{post_id}/delete
pub async fn delete_form(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<PostId>,
) -> AppResult<HttpResponse> {
    let access = state
        .posts
        .delete_form(&identity.viewer(), post_id.into_inner())
        .await?;
    Ok(render(access))
}

/// POST /posts/{post_id}/delete
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<PostId>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .posts
        .delete(&identity.viewer(), post_id.into_inner())
        .await?;
    Ok(see_other(outcome.next()))
}
