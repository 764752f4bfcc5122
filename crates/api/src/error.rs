//! Error taxonomy and its mapping onto HTTP responses.
//!
//! Every failing path in the API ends in an [`ApiError`]. [`classify`] is the
//! single place that decides the status code and body for it; the
//! [`crate::responder`] middleware re-runs it with the request's context.

use std::sync::Arc;

use axum::Json;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use domain::ShopError;
use serde_json::{Value, json};
use shop_store::StoreError;
use thiserror::Error;

use crate::auth::AuthError;
use crate::upload::UploadError;

/// Fixed set of error kinds a client can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::Unauthorized => "UnauthorizedError",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Internal => "InternalError",
        }
    }
}

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input or a failed pre-condition.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials.
    #[error("{message}")]
    Unauthorized {
        message: String,
        inner: Option<String>,
    },

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// No route matches the request.
    #[error("cannot do {method} on {path}")]
    RouteNotFound { method: Method, path: String },

    /// Multipart parsing failed.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Storage backend error passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest(_) => ErrorKind::BadRequest,
            ApiError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ApiError::Forbidden(_) => ErrorKind::Forbidden,
            ApiError::NotFound(_) | ApiError::RouteNotFound { .. } => ErrorKind::NotFound,
            ApiError::Upload(err) => match err.status() {
                s if s.is_client_error() => ErrorKind::BadRequest,
                _ => ErrorKind::Internal,
            },
            ApiError::Store(StoreError::Duplicate { .. }) => ErrorKind::Conflict,
            ApiError::Store(StoreError::Validation { .. }) => ErrorKind::BadRequest,
            ApiError::Store(_) | ApiError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Status code the error carries on its own.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Upload(err) => err.status(),
            other => other.kind().status(),
        }
    }

    /// Optional structured reason rendered next to the message.
    pub fn reason(&self) -> Option<String> {
        match self {
            ApiError::Store(err) => err.reason(),
            ApiError::Upload(UploadError::Multipart(err)) => Some(err.body_text()),
            _ => None,
        }
    }
}

/// Request details the classification depends on.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The request was made by a browser script (`X-Requested-With: XMLHttpRequest`).
    pub xhr: bool,
}

/// Status and JSON body chosen for an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub status: StatusCode,
    pub body: Value,
}

/// Maps an error onto the client-facing response.
///
/// Checked in order: script requests get an opaque 500; authentication
/// failures carry their inner detail; unmatched routes, bad requests and
/// not-found render as `name : message`; duplicate keys become 409; anything
/// else keeps its own status with the message and reason.
pub fn classify(err: &ApiError, ctx: &RequestContext) -> Classified {
    if ctx.xhr {
        return Classified {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "error": "Something failed" }),
        };
    }

    match err {
        ApiError::Unauthorized { message, inner } => Classified {
            status: StatusCode::UNAUTHORIZED,
            body: json!({
                "error": format!("{} : {message}", ErrorKind::Unauthorized.name()),
                "inner": inner,
            }),
        },
        ApiError::RouteNotFound { .. } => Classified {
            status: StatusCode::NOT_FOUND,
            body: json!({ "error": err.to_string() }),
        },
        ApiError::BadRequest(message) | ApiError::NotFound(message) => {
            let kind = err.kind();
            Classified {
                status: kind.status(),
                body: json!({ "error": format!("{} : {message}", kind.name()) }),
            }
        }
        ApiError::Store(StoreError::Duplicate { values, .. }) => Classified {
            status: StatusCode::CONFLICT,
            body: json!({ "error": format!("{} already exist", values.join(",")) }),
        },
        other => Classified {
            status: other.status(),
            body: json!({
                "message": other.to_string(),
                "reason": other.reason(),
            }),
        },
    }
}

/// Builds the response for an error and attaches the error to it so the
/// responder middleware can re-render with request context.
pub(crate) fn render(err: Arc<ApiError>, ctx: &RequestContext) -> Response {
    let Classified { status, body } = classify(&err, ctx);
    let mut response = (status, Json(body)).into_response();
    response.extensions_mut().insert(err);
    response
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, reason = ?self.reason(), %status, "request failed");
        } else {
            tracing::warn!(error = %self, kind = ?self.kind(), %status, "request rejected");
        }
        metrics::counter!("http_errors_total", "kind" => self.kind().name()).increment(1);

        render(Arc::new(self), &RequestContext::default())
    }
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::InvalidId(_)
            | ShopError::InvalidForm
            | ShopError::ImageTooLarge { .. }
            | ShopError::IncompleteImage
            | ShopError::HasProducts(_) => ApiError::BadRequest(err.to_string()),
            ShopError::UpdateRejected { ref reason } => {
                if let Some(reason) = reason {
                    tracing::warn!(%reason, "store rejected shop update");
                }
                ApiError::BadRequest(err.to_string())
            }
            ShopError::ShopNotFound(_) | ShopError::NoShops => ApiError::NotFound(err.to_string()),
            ShopError::NotOwner => ApiError::Forbidden(err.to_string()),
            ShopError::ImageRead(io) => ApiError::Internal(format!("failed to read upload: {io}")),
            ShopError::Store(store) => ApiError::Store(store),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized {
            message: err.to_string(),
            inner: Some(err.code().to_string()),
        }
    }
}
