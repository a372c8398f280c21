//! Authentication middleware and extractors.

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
    web,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;

use blogicum_core::Navigation;
use blogicum_core::domain::{UserId, Viewer};
use blogicum_core::ports::AuthError;

use super::error::{AppError, see_other};
use crate::state::AppState;

/// Identity carried by a valid bearer token. Only the user id is trusted;
/// everything else is looked up again by the services.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
}

impl Identity {
    pub fn viewer(&self) -> Viewer {
        Viewer::User(self.user_id)
    }
}

/// Read and check the `Authorization: Bearer` header.
fn identify(req: &HttpRequest) -> Result<Identity, AuthError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        ));
    };

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    let claims = state.tokens.validate_token(token)?;
    Ok(Identity {
        user_id: claims.user_id,
    })
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Already checked by `LoginRequired`.
        if let Some(identity) = req.extensions().get::<Identity>() {
            return ready(Ok(identity.clone()));
        }

        ready(identify(req).map_err(|e| {
            tracing::debug!(reason = %e, "Rejected identity");
            AppError::LoginRequired
        }))
    }
}

/// Identity extractor for public pages. A missing or broken token makes the
/// request anonymous instead of failing it.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn viewer(&self) -> Viewer {
        self.0.as_ref().map(Identity::viewer).unwrap_or_default()
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        match Identity::from_request(req, payload).into_inner() {
            Ok(identity) => ready(Ok(OptionalIdentity(Some(identity)))),
            Err(_) => ready(Ok(OptionalIdentity(None))),
        }
    }
}

/// Guard for routes that need a logged-in user.
///
/// Requests without a valid token are sent to `/auth/login?next=<path>`
/// before the handler runs. A handler that still reports
/// [`AppError::LoginRequired`] (the token named a deleted user) gets the
/// same redirect.
pub struct LoginRequired;

impl<S, B> Transform<S, ServiceRequest> for LoginRequired
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = LoginRequiredService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoginRequiredService { service }))
    }
}

pub struct LoginRequiredService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for LoginRequiredService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let next = req.path().to_string();

        match identify(req.request()) {
            Ok(identity) => {
                req.extensions_mut().insert(identity);

                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    let stale = matches!(
                        res.response()
                            .error()
                            .and_then(|e| e.as_error::<AppError>()),
                        Some(AppError::LoginRequired)
                    );
                    if !stale {
                        return Ok(res.map_into_left_body());
                    }

                    let (http_req, _) = res.into_parts();
                    let redirect = see_other(&login(next));
                    Ok(ServiceResponse::new(http_req, redirect).map_into_right_body())
                })
            }
            Err(e) => {
                tracing::debug!(path = %next, reason = %e, "Login required");

                let redirect = see_other(&login(next));
                let (http_req, _payload) = req.into_parts();
                let srv_response = ServiceResponse::new(http_req, redirect);

                Box::pin(async move { Ok(srv_response.map_into_right_body()) })
            }
        }
    }
}

fn login(next: String) -> Navigation {
    Navigation::Login { next: Some(next) }
}
