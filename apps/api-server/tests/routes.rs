use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};

use api_server::handlers::configure_routes;
use api_server::state::AppState;
use blogicum_core::domain::{NewUser, PostDraft, User};
use blogicum_core::ports::{Repositories, TokenService};
use blogicum_core::visibility::PostFilter;
use blogicum_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService, ManualClock};

fn now() -> DateTime<Utc> {
    "2024-06-01T12:00:00Z".parse().unwrap()
}

struct TestApp {
    repos: Repositories,
    tokens: Arc<JwtTokenService>,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let repos = Repositories::from_store(Arc::new(InMemoryStore::new()));
        let tokens = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            ..JwtConfig::default()
        }));
        let state = AppState::new(
            repos.clone(),
            Arc::new(ManualClock::new(now())),
            Arc::new(Argon2PasswordService::new()),
            tokens.clone(),
        );

        Self {
            repos,
            tokens,
            state,
        }
    }

    async fn user(&self, username: &str) -> (User, String) {
        let user = self
            .repos
            .users
            .create(User::new(NewUser {
                username: username.to_string(),
                email: String::new(),
                password_hash: "unused".to_string(),
            }))
            .await
            .unwrap();
        let token = self.tokens.generate_token(user.id, &user.username).unwrap();
        (user, format!("Bearer {token}"))
    }

    async fn post(&self, author: &User, title: &str) -> i64 {
        let draft = PostDraft::new(title, "text", now() - TimeDelta::hours(1));
        self.repos
            .posts
            .create(draft.into_new(author.id, now()))
            .await
            .unwrap()
            .id
    }
}

macro_rules! init_app {
    ($t:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($t.state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn location(res: &actix_web::dev::ServiceResponse) -> &str {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn post_body(title: &str) -> Value {
    json!({
        "title": title,
        "text": "Body",
        "pub_date": "2024-06-01T11:00:00Z",
    })
}

#[actix_web::test]
async fn test_health() {
    let t = TestApp::new();
    let app = init_app!(t);

    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_anonymous_create_redirects_to_login() {
    let t = TestApp::new();
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/posts/create")
        .set_json(post_body("Hello"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/auth/login?next=/posts/create");
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["location"], "/auth/login?next=/posts/create");
}

#[actix_web::test]
async fn test_invalid_token_counts_as_anonymous() {
    let t = TestApp::new();
    let app = init_app!(t);

    let req = test::TestRequest::get()
        .uri("/edit-profile")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/auth/login?next=/edit-profile");

    // Public pages still render.
    let req = test::TestRequest::get()
        .uri("/")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_deleted_user_is_sent_to_login() {
    let t = TestApp::new();
    let (anna, token) = t.user("anna").await;
    t.repos.users.delete(anna.id).await.unwrap();
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, token))
        .set_json(post_body("Hello"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/auth/login?next=/posts/create");
}

#[actix_web::test]
async fn test_create_post_then_see_it_on_home() {
    let t = TestApp::new();
    let (_, token) = t.user("anna").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, token))
        .set_json(post_body("Hello"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/profile/anna");

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let page: Value = test::read_body_json(res).await;
    assert_eq!(page["total_items"], 1);
    assert_eq!(page["items"][0]["title"], "Hello");
    assert_eq!(page["items"][0]["comment_count"], 0);
}

#[actix_web::test]
async fn test_create_form_offers_defaults() {
    let t = TestApp::new();
    let (_, token) = t.user("anna").await;
    let app = init_app!(t);

    let req = test::TestRequest::get()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, token))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let form: Value = test::read_body_json(res).await;
    assert_eq!(form["is_published"], true);
    assert_eq!(form["pub_date"], "2024-06-01T12:00:00Z");
    assert!(form["categories"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_invalid_post_is_unprocessable() {
    let t = TestApp::new();
    let (_, token) = t.user("anna").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, token))
        .set_json(post_body(""))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let problem: Value = test::read_body_json(res).await;
    assert_eq!(problem["status"], 422);
    assert_eq!(problem["errors"][0]["field"], "title");
}

#[actix_web::test]
async fn test_post_body_that_does_not_fit_is_unprocessable() {
    let t = TestApp::new();
    let (_, token) = t.user("anna").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, token.clone()))
        .set_json(json!({ "title": "x", "text": "y" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let problem: Value = test::read_body_json(res).await;
    assert_eq!(problem["errors"][0]["field"], "pub_date");
    assert_eq!(problem["errors"][0]["message"], "This field is required.");

    let req = test::TestRequest::post()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, token))
        .set_json(json!({ "title": "x", "text": "y", "pub_date": "tomorrow" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let problem: Value = test::read_body_json(res).await;
    assert_eq!(problem["status"], 422);
    assert_eq!(problem["errors"][0]["field"], "body");

    assert_eq!(t.repos.posts.count(&PostFilter::any()).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_broken_json_is_bad_request() {
    let t = TestApp::new();
    let (_, token) = t.user("anna").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, token))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(r#"{"title": "x", "#)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let problem: Value = test::read_body_json(res).await;
    assert_eq!(problem["status"], 400);
}

#[actix_web::test]
async fn test_non_author_with_bad_body_still_goes_back_to_post() {
    let t = TestApp::new();
    let (anna, anna_token) = t.user("anna").await;
    let (_, boris_token) = t.user("boris").await;
    let post_id = t.post(&anna, "Anna's").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/edit"))
        .insert_header((header::AUTHORIZATION, boris_token))
        .set_json(json!({ "title": "x", "text": "y" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), format!("/posts/{post_id}"));

    // The author gets the field error instead.
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/edit"))
        .insert_header((header::AUTHORIZATION, anna_token))
        .set_json(json!({ "title": "x", "text": "y" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_non_author_comment_edit_with_bad_body_goes_back_to_post() {
    let t = TestApp::new();
    let (anna, anna_token) = t.user("anna").await;
    let (_, boris_token) = t.user("boris").await;
    let post_id = t.post(&anna, "Anna's").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/comment"))
        .insert_header((header::AUTHORIZATION, anna_token))
        .set_json(json!({ "text": "Mine" }))
        .to_request();
    test::call_service(&app, req).await;
    let comment_id = t.repos.comments.list_for_post(post_id).await.unwrap()[0].id;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/edit-comment/{comment_id}"))
        .insert_header((header::AUTHORIZATION, boris_token))
        .set_json(json!({ "body": "no text field" }))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), format!("/posts/{post_id}"));
}

#[actix_web::test]
async fn test_non_author_edit_goes_back_to_post() {
    let t = TestApp::new();
    let (anna, _) = t.user("anna").await;
    let (_, boris_token) = t.user("boris").await;
    let post_id = t.post(&anna, "Anna's").await;
    let app = init_app!(t);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}/edit"))
        .insert_header((header::AUTHORIZATION, boris_token.clone()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), format!("/posts/{post_id}"));

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/edit"))
        .insert_header((header::AUTHORIZATION, boris_token))
        .set_json(post_body("Boris's now"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), format!("/posts/{post_id}"));

    let stored = t.repos.posts.find_by_id(post_id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Anna's");
}

#[actix_web::test]
async fn test_author_edit_form_returns_post() {
    let t = TestApp::new();
    let (anna, token) = t.user("anna").await;
    let post_id = t.post(&anna, "Anna's").await;
    let app = init_app!(t);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}/edit"))
        .insert_header((header::AUTHORIZATION, token))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let post: Value = test::read_body_json(res).await;
    assert_eq!(post["id"], post_id);
}

#[actix_web::test]
async fn test_comment_round_trip_through_detail() {
    let t = TestApp::new();
    let (anna, _) = t.user("anna").await;
    let (_, boris_token) = t.user("boris").await;
    let post_id = t.post(&anna, "Anna's").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/comment"))
        .insert_header((header::AUTHORIZATION, boris_token))
        .set_json(json!({ "text": "Nice" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), format!("/posts/{post_id}"));

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let detail: Value = test::read_body_json(res).await;
    assert_eq!(detail["comment_count"], 1);
    assert_eq!(detail["comments"][0]["text"], "Nice");
    assert_eq!(detail["comments"][0]["author"], "boris");
    assert_eq!(detail["can_comment"], false);
}

#[actix_web::test]
async fn test_anonymous_comment_remembers_post() {
    let t = TestApp::new();
    let (anna, _) = t.user("anna").await;
    let post_id = t.post(&anna, "Anna's").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/comment"))
        .set_json(json!({ "text": "Nice" }))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&res),
        format!("/auth/login?next=/posts/{post_id}/comment")
    );
}

#[actix_web::test]
async fn test_missing_things_are_not_found() {
    let t = TestApp::new();
    let app = init_app!(t);

    for uri in ["/category/nowhere", "/profile/nobody", "/posts/41", "/posts/abc"] {
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn test_bad_page_numbers_fall_back() {
    let t = TestApp::new();
    let app = init_app!(t);

    for uri in ["/?page=abc", "/?page=0", "/?page=99"] {
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK, "{uri}");
        let page: Value = test::read_body_json(res).await;
        assert_eq!(page["number"], 1, "{uri}");
        assert_eq!(page["total_pages"], 1, "{uri}");
    }
}

#[actix_web::test]
async fn test_register_and_login() {
    let t = TestApp::new();
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/auth/registration")
        .set_json(json!({ "username": "anna", "password": "correct horse" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/auth/login");

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "username": "anna", "password": "wrong horse" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "username": "anna", "password": "correct horse" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let auth: Value = test::read_body_json(res).await;
    assert_eq!(auth["token_type"], "Bearer");

    let token = auth["access_token"].as_str().unwrap();
    let req = test::TestRequest::get()
        .uri("/edit-profile")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let form: Value = test::read_body_json(res).await;
    assert_eq!(form["username"], "anna");
}

#[actix_web::test]
async fn test_token_survives_profile_rename() {
    let t = TestApp::new();
    let (_, token) = t.user("anna").await;
    let app = init_app!(t);

    let req = test::TestRequest::post()
        .uri("/edit-profile")
        .insert_header((header::AUTHORIZATION, token.clone()))
        .set_json(json!({ "username": "anna.k" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/profile/anna.k");

    // The token still names "anna"; the redirect follows the stored user.
    let req = test::TestRequest::post()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, token))
        .set_json(post_body("Renamed"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/profile/anna.k");
}
