//! Read-only pages: the feeds and the post detail.

use actix_web::{HttpResponse, web};

use blogicum_core::domain::{PageRequest, PostId};
use blogicum_shared::dto::PageQuery;

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.feeds.home(PageRequest::new(query.number())).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /category/{slug}
pub async fn category_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let feed = state
        .feeds
        .category(&slug, PageRequest::new(query.number()))
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}

/// GET /profile/{username}
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let feed = state
        .feeds
        .profile(&identity.viewer(), &username, PageRequest::new(query.number()))
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}

/// GET /posts/{post_id}
pub async fn post_detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    post_id: web::Path<PostId>,
) -> AppResult<HttpResponse> {
    let detail = state
        .feeds
        .post_detail(&identity.viewer(), post_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(detail))
}
