use async_trait::async_trait;
use common::{ShopId, UserId};

use crate::{DeleteResult, NewShop, Result, Shop, StoreError};

/// Persistence for shops.
///
/// A single shop write is atomic; nothing here serializes concurrent
/// requests touching the same shop. All implementations must be thread-safe
/// (Send + Sync).
#[async_trait]
pub trait ShopStore: Send + Sync {
    /// Returns every shop with bare owner references.
    ///
    /// `None` means the backend produced no result set at all, which is
    /// distinct from an empty one.
    async fn find_all(&self) -> Result<Option<Vec<Shop>>>;

    /// Returns the shops owned by `owner`, with the owner's display name joined.
    async fn find_by_owner(&self, owner: UserId) -> Result<Option<Vec<Shop>>>;

    /// Loads a single shop with the owner's display name joined.
    async fn find_by_id(&self, id: ShopId) -> Result<Option<Shop>>;

    /// Writes a new shop, enforcing the required and unique `name`.
    async fn insert(&self, shop: NewShop) -> Result<Shop>;

    /// Overwrites an existing shop in place.
    ///
    /// Returns `None` when no record with the shop's id exists anymore.
    async fn save(&self, shop: Shop) -> Result<Option<Shop>>;

    /// Removes a shop by id.
    async fn delete_one(&self, id: ShopId) -> Result<DeleteResult>;
}

/// Read-only view over products, used to guard shop removal.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Returns true if at least one product references the shop.
    async fn exists_for_shop(&self, shop_id: ShopId) -> Result<bool>;
}

/// Validates the attributes every shop write must satisfy.
pub fn validate_shop_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation {
            field: "name",
            message: "Path `name` is required.".to_string(),
        });
    }
    Ok(())
}
