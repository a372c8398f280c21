//! HTTP handlers and route configuration.

mod accounts;
mod comments;
mod feeds;
mod health;
mod posts;

use actix_web::{HttpResponse, web};
use serde::Serialize;

use blogicum_core::Access;

use crate::middleware::auth::LoginRequired;
use crate::middleware::error::{json_error, see_other};

/// Configure all application routes.
///
/// `/posts/create` is registered ahead of `/posts/{post_id}` so it is not
/// taken for a post id.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/auth")
                .route("/registration", web::post().to(accounts::register))
                .route("/login", web::post().to(accounts::login)),
        )
        // Feeds
        .route("/", web::get().to(feeds::index))
        .route("/category/{slug}", web::get().to(feeds::category_posts))
        .route("/profile/{username}", web::get().to(feeds::profile))
        .service(
            web::resource("/edit-profile")
                .wrap(LoginRequired)
                .route(web::get().to(accounts::edit_profile_form))
                .route(web::post().to(accounts::edit_profile)),
        )
        // Posts
        .service(
            web::resource("/posts/create")
                .wrap(LoginRequired)
                .route(web::get().to(posts::create_form))
                .route(web::post().to(posts::create)),
        )
        .route("/posts/{post_id}", web::get().to(feeds::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit")
                .wrap(LoginRequired)
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::edit)),
        )
        .service(
            web::resource("/posts/{post_id}/delete")
                .wrap(LoginRequired)
                .route(web::get().to(posts::delete_form))
                .route(web::post().to(posts::delete)),
        )
        // Comments
        .service(
            web::resource("/posts/{post_id}/comment")
                .wrap(LoginRequired)
                .route(web::post().to(comments::create)),
        )
        .service(
            web::resource("/posts/{post_id}/edit-comment/{comment_id}")
                .wrap(LoginRequired)
                .route(web::get().to(comments::edit_form))
                .route(web::post().to(comments::edit)),
        )
        .service(
            web::resource("/posts/{post_id}/delete-comment/{comment_id}")
                .wrap(LoginRequired)
                .route(web::get().to(comments::delete_form))
                .route(web::post().to(comments::delete)),
        );
}

/// A guarded form: the entity itself, or a redirect when the viewer may not
/// touch it.
fn render<T: Serialize>(access: Access<T>) -> HttpResponse {
    match access {
        Access::Granted(entity) => HttpResponse::Ok().json(entity),
        Access::Redirect(to) => see_other(&to),
    }
}
