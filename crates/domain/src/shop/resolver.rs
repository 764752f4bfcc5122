//! Loads the shop a request refers to.

use common::ShopId;
use shop_store::{Shop, ShopStore};

use crate::error::{Result, ShopError};

/// Resolves a raw path id into a stored shop with its owner's name joined.
///
/// Malformed ids fail with [`ShopError::InvalidId`] before the store is
/// touched, so they are never reported as missing.
#[tracing::instrument(skip(store))]
pub async fn resolve<S: ShopStore + ?Sized>(store: &S, raw_id: &str) -> Result<Shop> {
    let id = ShopId::parse(raw_id).map_err(ShopError::InvalidId)?;

    store
        .find_by_id(id)
        .await?
        .ok_or(ShopError::ShopNotFound(id))
}
