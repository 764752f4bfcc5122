//! Shop resolution, ownership, upload validation and lifecycle.

mod guard;
mod resolver;
mod service;
mod upload;

pub use guard::{check_owner, is_owner};
pub use resolver::resolve;
pub use service::{ShopFields, ShopService};
pub use upload::{
    FileDescriptor, IMAGE_FIELD, MIB, UploadLimits, UploadResult, require_multipart,
};
