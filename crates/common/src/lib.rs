//! Shared identifier types for the shop service.

mod types;

pub use types::{IdParseError, ProductId, ShopId, UserId};
