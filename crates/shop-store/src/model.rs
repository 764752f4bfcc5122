//! Stored document shapes for shops.

use chrono::{DateTime, Utc};
use common::{ShopId, UserId};
use serde::{Deserialize, Serialize};

/// Binary attachment stored inline on a shop.
///
/// Data and content type travel together; a shop either has both or neither.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    pub data: Vec<u8>,
    pub content_type: String,
}

impl Image {
    pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
        }
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Reference from a shop to its owning user.
///
/// Queries that join the owner return `Populated` with the display name only;
/// everything else carries the bare id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnerRef {
    Populated { id: UserId, name: String },
    Id(UserId),
}

impl OwnerRef {
    /// Identity of the owner regardless of how the reference was loaded.
    pub fn id(&self) -> UserId {
        match self {
            OwnerRef::Populated { id, .. } | OwnerRef::Id(id) => *id,
        }
    }

    /// Display name, when the owner was joined.
    pub fn name(&self) -> Option<&str> {
        match self {
            OwnerRef::Populated { name, .. } => Some(name),
            OwnerRef::Id(_) => None,
        }
    }

    /// Drops the joined fields, keeping only the identity.
    pub fn depopulate(&self) -> Self {
        OwnerRef::Id(self.id())
    }
}

impl From<UserId> for OwnerRef {
    fn from(id: UserId) -> Self {
        OwnerRef::Id(id)
    }
}

/// A persisted shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub description: Option<String>,
    pub owner: OwnerRef,
    pub image: Option<Image>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shop {
    /// Returns a copy of this shop with the image payload removed.
    pub fn without_image(mut self) -> Self {
        self.image = None;
        self
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// A shop that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShop {
    pub name: String,
    pub description: Option<String>,
    pub owner: UserId,
    pub image: Option<Image>,
}

impl NewShop {
    pub fn new(name: impl Into<String>, owner: UserId) -> Self {
        Self {
            name: name.into(),
            description: None,
            owner,
            image: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.image = Some(image);
        self
    }
}

/// Acknowledgement returned by a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}
