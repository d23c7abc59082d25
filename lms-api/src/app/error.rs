use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use lms_core::{LmsError, Rejection};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    message: String,
    status: StatusCode,
    /// Seconds for the `Retry-After` header.
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(code: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NotFound", StatusCode::NOT_FOUND, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(
            "TooManyRequests",
            StatusCode::TOO_MANY_REQUESTS,
            message,
        )
    }

    /// 429 for a throttle rejection, with `Retry-After` rounded up to whole seconds.
    pub fn rate_limited(rejection: &Rejection) -> Self {
        let retry = rejection.retry_after;
        let secs = retry.as_secs() + u64::from(retry.subsec_nanos() > 0);
        Self {
            retry_after: Some(secs.max(1)),
            ..Self::too_many_requests(rejection.message())
        }
    }
}

impl From<LmsError> for ApiError {
    fn from(err: LmsError) -> Self {
        match err {
            LmsError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            LmsError::InvalidInput(msg) => {
                ApiError::new("InvalidInput", StatusCode::BAD_REQUEST, msg)
            }
            LmsError::InvalidRule(msg) => {
                ApiError::new("InvalidRule", StatusCode::BAD_REQUEST, msg)
            }
            LmsError::Io(e) => {
                ApiError::new("IoError", StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            LmsError::Serde(e) => {
                ApiError::new("SerdeError", StatusCode::BAD_REQUEST, e.to_string())
            }
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::new("InvalidInput", rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new("InvalidInput", rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new("InvalidInput", rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "code": self.code,
            "message": self.message,
        }));
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
