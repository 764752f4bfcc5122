//! Terminal error handling for every request.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::{HeaderMap, Method, Uri};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::{ApiError, RequestContext, render};

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let xhr = headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
        Self { xhr }
    }
}

/// Re-renders error responses with the originating request's context.
///
/// Responses that do not carry an [`ApiError`] are returned untouched.
pub async fn error_responder(request: Request, next: Next) -> Response {
    let ctx = RequestContext::from_headers(request.headers());
    let response = next.run(request).await;

    let Some(err) = response.extensions().get::<Arc<ApiError>>().cloned() else {
        return response;
    };
    if !ctx.xhr {
        return response;
    }

    tracing::debug!(error = %err, "masking error for script request");
    render(err, &ctx)
}

/// Fallback for requests no route matches.
pub async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    let path = uri
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    ApiError::RouteNotFound { method, path }
}
