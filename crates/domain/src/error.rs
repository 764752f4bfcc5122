//! Domain error types.

use common::{IdParseError, ShopId};
use shop_store::StoreError;
use thiserror::Error;

/// Errors that can occur during shop operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// The shop id is not a syntactically valid identifier.
    #[error("valid id is required")]
    InvalidId(#[source] IdParseError),

    /// No shop exists with the given id.
    #[error("Shop not found")]
    ShopNotFound(ShopId),

    /// A listing produced no shops.
    #[error("no shops found")]
    NoShops,

    /// The principal does not own the shop.
    #[error("forbidden! not owner")]
    NotOwner,

    /// The request body is not multipart form data.
    #[error("invalid form")]
    InvalidForm,

    /// The uploaded image is larger than allowed.
    #[error("max image size exceeded")]
    ImageTooLarge { size: u64, max: u64 },

    /// The uploaded image is missing its temporary path or mime type.
    #[error("incomplete image metadata")]
    IncompleteImage,

    /// The shop still has products and cannot be removed.
    #[error("shop has product")]
    HasProducts(ShopId),

    /// The store refused the update or returned no record.
    #[error("invalid update")]
    UpdateRejected { reason: Option<String> },

    /// The uploaded image could not be read back from disk.
    #[error("Failed to read uploaded image: {0}")]
    ImageRead(#[from] std::io::Error),

    /// An error occurred in the shop store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for shop results.
pub type Result<T> = std::result::Result<T, ShopError>;
