//! Request extractors that carry per-request context into handlers.
//!
//! Handlers name what they need in their signature. Axum runs parts
//! extractors left to right and the body extractor last, so a handler taking
//! `(OwnedShop, ShopForm)` always resolves the shop, then checks ownership,
//! and only then reads the upload.

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use domain::{Principal, ShopError, UploadResult, check_owner, require_multipart};
use shop_store::Shop;

use crate::auth::bearer_token;
use crate::error::ApiError;
use crate::upload::parse_multipart;
use crate::{AppState, Backend};

/// The shop named by the `{shop_id}` path segment.
#[derive(Debug)]
pub struct ResolvedShop(pub Shop);

impl<S: Backend> FromRequestParts<Arc<AppState<S>>> for ResolvedShop {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let Path(raw_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(%rejection, "missing shop id in path");
                ApiError::BadRequest("valid id is required".to_string())
            })?;

        let shop = state.shop_service.resolve(&raw_id).await?;
        Ok(ResolvedShop(shop))
    }
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

impl<S: Backend> FromRequestParts<Arc<AppState<S>>> for AuthPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let principal = state.authenticator.authenticate(token)?;
        Ok(AuthPrincipal(principal))
    }
}

/// A resolved shop whose owner is the authenticated caller.
#[derive(Debug)]
pub struct OwnedShop {
    pub shop: Shop,
    pub principal: Principal,
}

impl<S: Backend> FromRequestParts<Arc<AppState<S>>> for OwnedShop {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let ResolvedShop(shop) = ResolvedShop::from_request_parts(parts, state).await?;
        let AuthPrincipal(principal) = AuthPrincipal::from_request_parts(parts, state).await?;

        check_owner(Some(&shop), Some(&principal))?;
        Ok(OwnedShop { shop, principal })
    }
}

/// A parsed multipart shop form.
#[derive(Debug)]
pub struct ShopForm(pub UploadResult);

impl<S: Backend> FromRequest<Arc<AppState<S>>> for ShopForm {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &Arc<AppState<S>>) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        require_multipart(content_type)?;

        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(%rejection, "multipart body rejected");
                ApiError::from(ShopError::InvalidForm)
            })?;

        let upload = parse_multipart(multipart, &state.spool).await?;
        Ok(ShopForm(upload))
    }
}
