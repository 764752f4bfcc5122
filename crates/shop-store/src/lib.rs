//! Persistence for shops and the product existence check that guards their removal.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{ProductId, ShopId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryShopStore;
pub use model::{DeleteResult, Image, NewShop, OwnerRef, Shop};
pub use postgres::PostgresShopStore;
pub use store::{ProductStore, ShopStore};
