//! Error handling - RFC 7807 bodies and `303 See Other` redirects.

use actix_web::{
    HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError, http::StatusCode,
    http::header,
};
use blogicum_core::{DomainError, Navigation, RepoError};
use blogicum_shared::{ErrorResponse, FieldProblem, RedirectResponse};

/// Application-level error type that converts to HTTP responses.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldProblem>),

    /// No usable identity. [`LoginRequired`](super::auth::LoginRequired)
    /// rewrites this into a redirect that remembers the requested path.
    #[error("Login required")]
    LoginRequired,

    /// An ownership failure that was not turned into a redirect.
    #[error("Not allowed")]
    NotAllowed,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LoginRequired | AppError::NotAllowed => StatusCode::SEE_OTHER,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Validation(errors) => ErrorResponse::validation(errors.clone()),
            AppError::LoginRequired => return see_other(&Navigation::login()),
            AppError::NotAllowed => return see_other_path("/".to_string()),
            AppError::InvalidCredentials => ErrorResponse::unauthorized(
                "Please enter a correct username and password.",
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, key } => {
                AppError::NotFound(format!("{} {} not found", entity_type, key))
            }
            DomainError::Validation(errors) => AppError::Validation(
                errors
                    .into_iter()
                    .map(|e| FieldProblem {
                        field: e.field.to_string(),
                        message: e.message,
                    })
                    .collect(),
            ),
            DomainError::Unauthenticated => AppError::LoginRequired,
            DomainError::Unauthorized => AppError::NotAllowed,
            DomainError::InvalidCredentials => AppError::InvalidCredentials,
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        DomainError::from(err).into()
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Error handler for `web::Json` bodies.
///
/// JSON that parses but does not fit the form is a validation failure (422);
/// anything else about the payload is a bad request (400).
pub fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected request body");

    match err {
        JsonPayloadError::Deserialize(e) if e.is_data() => {
            AppError::Validation(vec![body_problem(&e)]).into()
        }
        other => AppError::BadRequest(other.to_string()).into(),
    }
}

fn body_problem(err: &serde_json::Error) -> FieldProblem {
    let message = err.to_string();
    match message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
    {
        Some((field, _)) => FieldProblem {
            field: field.to_string(),
            message: "This field is required.".to_string(),
        },
        None => FieldProblem {
            field: "body".to_string(),
            message,
        },
    }
}

/// Recover the [`AppError`] that [`json_error`] packed into a rejected body.
pub fn rejected_body(err: actix_web::Error) -> AppError {
    err.as_error::<AppError>()
        .cloned()
        .unwrap_or_else(|| AppError::BadRequest(err.to_string()))
}

/// Send the client on to a read-only destination.
pub fn see_other(to: &Navigation) -> HttpResponse {
    see_other_path(to.path())
}

fn see_other_path(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.clone()))
        .json(RedirectResponse { location })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_validation_lists_fields() {
        let err = AppError::from(DomainError::invalid("title", "This field is required."));
        let res = err.error_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(res.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errors"][0]["field"], "title");
    }

    #[actix_web::test]
    async fn test_internal_details_stay_in_logs() {
        let err = AppError::from(RepoError::Query("relation \"posts\" does not exist".into()));
        let res = err.error_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(res.into_body()).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("relation"));
    }

    #[test]
    fn test_missing_body_field_is_named() {
        let err = serde_json::from_str::<blogicum_shared::dto::PostRequest>(
            r#"{"title":"x","text":"y"}"#,
        )
        .unwrap_err();

        let problem = body_problem(&err);
        assert_eq!(problem.field, "pub_date");
        assert_eq!(problem.message, "This field is required.");
    }

    #[test]
    fn test_rejected_body_keeps_app_error() {
        let err: actix_web::Error = AppError::BadRequest("EOF while parsing".into()).into();
        assert!(matches!(rejected_body(err), AppError::BadRequest(_)));
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        let res = AppError::from(DomainError::Unauthenticated).error_response();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/auth/login");
    }
}
