//! Shop route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use common::ShopId;
use serde::Serialize;
use shop_store::{DeleteResult, OwnerRef, Shop};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::ApiError;
use crate::extract::{AuthPrincipal, OwnedShop, ResolvedShop, ShopForm};
use crate::{AppState, Backend};

/// Image metadata exposed in place of the binary payload.
#[derive(Debug, Serialize)]
pub struct ImageMeta {
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Serialize)]
pub struct ShopResponse {
    pub id: ShopId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner: OwnerRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageMeta>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Shop> for ShopResponse {
    fn from(shop: Shop) -> Self {
        Self {
            id: shop.id,
            name: shop.name,
            description: shop.description,
            owner: shop.owner,
            image: shop.image.map(|image| ImageMeta {
                size: image.len(),
                content_type: image.content_type,
            }),
            created_at: shop.created_at,
            updated_at: shop.updated_at,
        }
    }
}

fn to_responses(shops: Vec<Shop>) -> Vec<ShopResponse> {
    shops.into_iter().map(ShopResponse::from).collect()
}

/// GET /api/shops: lists every shop.
#[tracing::instrument(skip_all)]
pub async fn list<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ShopResponse>>, ApiError> {
    let shops = state.shop_service.list().await?;
    Ok(Json(to_responses(shops)))
}

/// GET /api/shops/mine: lists the caller's shops.
#[tracing::instrument(skip_all, fields(owner = %principal.id()))]
pub async fn mine<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<Vec<ShopResponse>>, ApiError> {
    let shops = state.shop_service.list_by_owner(&principal).await?;
    Ok(Json(to_responses(shops)))
}

/// GET /api/shops/{shop_id}: returns a shop without its image.
#[tracing::instrument(skip_all, fields(shop_id = %shop.id))]
pub async fn read<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    ResolvedShop(shop): ResolvedShop,
) -> Json<ShopResponse> {
    Json(state.shop_service.read(shop).into())
}

/// POST /api/shops: creates a shop owned by the caller.
#[tracing::instrument(skip_all, fields(owner = %principal.id()))]
pub async fn create<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    AuthPrincipal(principal): AuthPrincipal,
    ShopForm(form): ShopForm,
) -> Result<(StatusCode, Json<ShopResponse>), ApiError> {
    let shop = state.shop_service.create(&principal, form).await?;
    Ok((StatusCode::CREATED, Json(shop.into())))
}

/// PUT /api/shops/{shop_id}: updates a shop the caller owns.
#[tracing::instrument(skip_all, fields(shop_id = %owned.shop.id))]
pub async fn update<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    owned: OwnedShop,
    ShopForm(form): ShopForm,
) -> Result<Json<ShopResponse>, ApiError> {
    let shop = state.shop_service.update(owned.shop, form).await?;
    Ok(Json(shop.into()))
}

/// DELETE /api/shops/{shop_id}: removes a shop the caller owns.
#[tracing::instrument(skip_all, fields(shop_id = %owned.shop.id))]
pub async fn delete<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    owned: OwnedShop,
) -> Result<Json<DeleteResult>, ApiError> {
    let result = state.shop_service.delete(&owned.shop).await?;
    Ok(Json(result))
}

/// GET /api/shops/{shop_id}/photo: the shop's image, or the default photo.
#[tracing::instrument(skip_all, fields(shop_id = %shop.id))]
pub async fn photo<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    ResolvedShop(shop): ResolvedShop,
    request: Request,
) -> Response {
    match state.shop_service.photo(shop) {
        Some(image) => ([(header::CONTENT_TYPE, image.content_type)], image.data).into_response(),
        None => serve_default_photo(&state, request).await,
    }
}

/// GET /api/shops/defaultphoto: the placeholder image.
pub async fn default_photo<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    request: Request,
) -> Response {
    serve_default_photo(&state, request).await
}

async fn serve_default_photo<S: Backend>(state: &AppState<S>, request: Request) -> Response {
    let response = ServeFile::new(&state.default_photo)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});

    if response.status() == StatusCode::NOT_FOUND {
        tracing::warn!(path = %state.default_photo.display(), "default photo is missing");
    }
    response.into_response()
}
