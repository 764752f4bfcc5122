//! Shop service providing the create/read/update/delete lifecycle.

use std::collections::HashMap;

use shop_store::{DeleteResult, Image, NewShop, ProductStore, Shop, ShopStore, StoreError};

use crate::Principal;
use crate::error::{Result, ShopError};

use super::upload::{UploadLimits, UploadResult};
use super::resolver;

/// Form fields that map onto shop attributes. Anything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopFields {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ShopFields {
    pub fn from_form(fields: &HashMap<String, String>) -> Self {
        Self {
            name: fields.get("name").cloned(),
            description: fields.get("description").cloned(),
        }
    }

    /// Overwrites each attribute the form supplied; absent ones are kept.
    fn merge_into(self, shop: &mut Shop) {
        if let Some(name) = self.name {
            shop.name = name;
        }
        if let Some(description) = self.description {
            shop.description = Some(description);
        }
    }
}

/// Service for managing shops.
///
/// Every method takes the shop it acts on explicitly; callers resolve it
/// once per request and thread it through.
pub struct ShopService<S: ShopStore, P: ProductStore> {
    shops: S,
    products: P,
    limits: UploadLimits,
}

impl<S: ShopStore, P: ProductStore> ShopService<S, P> {
    /// Creates a new shop service with default upload limits.
    pub fn new(shops: S, products: P) -> Self {
        Self {
            shops,
            products,
            limits: UploadLimits::default(),
        }
    }

    /// Replaces the upload limits.
    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Returns a reference to the underlying shop store.
    pub fn shops(&self) -> &S {
        &self.shops
    }

    /// Loads the shop behind a raw path id.
    pub async fn resolve(&self, raw_id: &str) -> Result<Shop> {
        resolver::resolve(&self.shops, raw_id).await
    }

    /// Lists every shop.
    ///
    /// An empty listing is reported as [`ShopError::NoShops`], the same as a
    /// missing result set.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Shop>> {
        match self.shops.find_all().await? {
            Some(shops) if !shops.is_empty() => Ok(shops),
            _ => Err(ShopError::NoShops),
        }
    }

    /// Lists the principal's shops with the owner's name joined.
    #[tracing::instrument(skip(self, principal), fields(owner = %principal.id()))]
    pub async fn list_by_owner(&self, principal: &Principal) -> Result<Vec<Shop>> {
        match self.shops.find_by_owner(principal.id()).await? {
            Some(shops) if !shops.is_empty() => Ok(shops),
            _ => Err(ShopError::NoShops),
        }
    }

    /// Returns the shop without its image payload.
    pub fn read(&self, shop: Shop) -> Shop {
        shop.without_image()
    }

    /// Returns the shop's image, or `None` when the caller should fall back
    /// to the default photo.
    pub fn photo(&self, shop: Shop) -> Option<Image> {
        shop.image
    }

    /// Creates a shop owned by `owner` from a parsed upload.
    #[tracing::instrument(skip(self, owner, upload), fields(owner = %owner.id()))]
    pub async fn create(&self, owner: &Principal, upload: UploadResult) -> Result<Shop> {
        let (fields, image) = upload.into_parts(&self.limits).await?;
        let fields = ShopFields::from_form(&fields);

        let shop = NewShop {
            name: fields.name.unwrap_or_default(),
            description: fields.description,
            owner: owner.id(),
            image,
        };

        let created = self.shops.insert(shop).await?;
        metrics::counter!("shops_created_total").increment(1);
        tracing::info!(shop_id = %created.id, "shop created");

        Ok(created)
    }

    /// Merges form fields into an existing shop and replaces its image when
    /// a new one was uploaded.
    #[tracing::instrument(skip(self, shop, upload), fields(shop_id = %shop.id))]
    pub async fn update(&self, mut shop: Shop, upload: UploadResult) -> Result<Shop> {
        let (fields, image) = upload.into_parts(&self.limits).await?;
        ShopFields::from_form(&fields).merge_into(&mut shop);
        if let Some(image) = image {
            shop.image = Some(image);
        }

        let saved = match self.shops.save(shop).await {
            Ok(Some(saved)) => saved,
            Ok(None) => return Err(ShopError::UpdateRejected { reason: None }),
            Err(err @ (StoreError::Duplicate { .. } | StoreError::Validation { .. })) => {
                return Err(ShopError::UpdateRejected {
                    reason: Some(err.to_string()),
                });
            }
            Err(err) => return Err(err.into()),
        };

        metrics::counter!("shops_updated_total").increment(1);
        Ok(saved)
    }

    /// Removes a shop that no product references.
    #[tracing::instrument(skip(self, shop), fields(shop_id = %shop.id))]
    pub async fn delete(&self, shop: &Shop) -> Result<DeleteResult> {
        if self.products.exists_for_shop(shop.id).await? {
            metrics::counter!("shop_delete_blocked_total").increment(1);
            return Err(ShopError::HasProducts(shop.id));
        }

        let result = self.shops.delete_one(shop.id).await?;
        metrics::counter!("shops_deleted_total").increment(1);
        tracing::info!(deleted = result.deleted_count, "shop deleted");

        Ok(result)
    }
}
