//! Registration, login and the own-profile form.

use actix_web::{HttpResponse, web};

use blogicum_core::domain::ProfileUpdate;
use blogicum_core::services::Registration;
use blogicum_shared::dto::{AuthResponse, LoginRequest, ProfileRequest, RegisterRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppResult, see_other};
use crate::state::AppState;

/// POST /auth/registration
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let outcome = state
        .accounts
        .register(Registration {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;
    Ok(see_other(outcome.next()))
}

/// POST /auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let issued = state.accounts.login(&req.username, &req.password).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: issued.access_token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
        username: issued.username,
    }))
}

/// GET /edit-profile
pub async fn edit_profile_form(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let user = state.accounts.profile_form(&identity.viewer()).await?;
    Ok(HttpResponse::Ok().json(ProfileRequest {
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}

/// POST /edit-profile
pub async fn edit_profile(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let outcome = state
        .accounts
        .update_profile(
            &identity.viewer(),
            ProfileUpdate {
                username: req.username,
                email: req.email,
                first_name: req.first_name,
                last_name: req.last_name,
            },
        )
        .await?;
    Ok(see_other(outcome.next()))
}
