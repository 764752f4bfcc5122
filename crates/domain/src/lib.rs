//! Domain layer for the shop service.
//!
//! This crate provides:
//! - Shop resolution from raw path ids
//! - The ownership gate for mutating operations
//! - Validation of parsed multipart uploads
//! - The shop lifecycle (create, read, update, delete, photo)

pub mod error;
pub mod principal;
pub mod shop;

pub use error::{Result, ShopError};
pub use principal::Principal;
pub use shop::{
    FileDescriptor, IMAGE_FIELD, MIB, ShopFields, ShopService, UploadLimits, UploadResult,
    check_owner, is_owner, require_multipart, resolve,
};
