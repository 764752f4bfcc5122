use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{ProductId, ShopId, UserId};
use tokio::sync::RwLock;

use crate::{
    DeleteResult, NewShop, OwnerRef, Result, Shop, StoreError,
    store::{ProductStore, ShopStore, validate_shop_name},
};

/// In-memory shop store implementation for testing and local runs.
///
/// Shops keep insertion order. Products are tracked only by the shop they
/// reference, which is all the shop service ever asks about.
#[derive(Clone, Default)]
pub struct InMemoryShopStore {
    shops: Arc<RwLock<Vec<Shop>>>,
    users: Arc<RwLock<HashMap<UserId, String>>>,
    products: Arc<RwLock<HashMap<ProductId, ShopId>>>,
}

impl InMemoryShopStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user so that owner references can be populated with a name.
    pub async fn register_user(&self, id: UserId, name: impl Into<String>) {
        self.users.write().await.insert(id, name.into());
    }

    /// Records a product listed in `shop_id`.
    pub async fn add_product(&self, shop_id: ShopId) -> ProductId {
        let product_id = ProductId::new();
        self.products.write().await.insert(product_id, shop_id);
        product_id
    }

    /// Removes a product.
    pub async fn remove_product(&self, product_id: ProductId) -> bool {
        self.products.write().await.remove(&product_id).is_some()
    }

    /// Returns the total number of shops stored.
    pub async fn shop_count(&self) -> usize {
        self.shops.read().await.len()
    }

    /// Clears all shops, users and products.
    pub async fn clear(&self) {
        self.shops.write().await.clear();
        self.users.write().await.clear();
        self.products.write().await.clear();
    }

    fn populate(users: &HashMap<UserId, String>, mut shop: Shop) -> Shop {
        let owner = shop.owner.id();
        if let Some(name) = users.get(&owner) {
            shop.owner = OwnerRef::Populated {
                id: owner,
                name: name.clone(),
            };
        }
        shop
    }

    fn ensure_unique_name(shops: &[Shop], name: &str, except: Option<ShopId>) -> Result<()> {
        let taken = shops
            .iter()
            .any(|s| s.name == name && Some(s.id) != except);
        if taken {
            return Err(StoreError::Duplicate {
                field: "name",
                values: vec![name.to_string()],
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ShopStore for InMemoryShopStore {
    async fn find_all(&self) -> Result<Option<Vec<Shop>>> {
        let shops = self.shops.read().await;
        Ok(Some(shops.clone()))
    }

    async fn find_by_owner(&self, owner: UserId) -> Result<Option<Vec<Shop>>> {
        let shops = self.shops.read().await;
        let users = self.users.read().await;
        let owned = shops
            .iter()
            .filter(|s| s.owner.id() == owner)
            .cloned()
            .map(|s| Self::populate(&users, s))
            .collect();
        Ok(Some(owned))
    }

    async fn find_by_id(&self, id: ShopId) -> Result<Option<Shop>> {
        let shops = self.shops.read().await;
        let users = self.users.read().await;
        Ok(shops
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .map(|s| Self::populate(&users, s)))
    }

    async fn insert(&self, shop: NewShop) -> Result<Shop> {
        validate_shop_name(&shop.name)?;

        let mut shops = self.shops.write().await;
        Self::ensure_unique_name(&shops, &shop.name, None)?;

        let now = Utc::now();
        let record = Shop {
            id: ShopId::new(),
            name: shop.name,
            description: shop.description,
            owner: OwnerRef::Id(shop.owner),
            image: shop.image,
            created_at: now,
            updated_at: now,
        };
        shops.push(record.clone());

        Ok(record)
    }

    async fn save(&self, mut shop: Shop) -> Result<Option<Shop>> {
        validate_shop_name(&shop.name)?;

        let mut shops = self.shops.write().await;
        Self::ensure_unique_name(&shops, &shop.name, Some(shop.id))?;

        let Some(slot) = shops.iter_mut().find(|s| s.id == shop.id) else {
            return Ok(None);
        };

        shop.updated_at = Utc::now();
        *slot = Shop {
            owner: shop.owner.depopulate(),
            ..shop.clone()
        };

        Ok(Some(shop))
    }

    async fn delete_one(&self, id: ShopId) -> Result<DeleteResult> {
        let mut shops = self.shops.write().await;
        let before = shops.len();
        shops.retain(|s| s.id != id);

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: (before - shops.len()) as u64,
        })
    }
}

#[async_trait]
impl ProductStore for InMemoryShopStore {
    async fn exists_for_shop(&self, shop_id: ShopId) -> Result<bool> {
        let products = self.products.read().await;
        Ok(products.values().any(|s| *s == shop_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Image;

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = InMemoryShopStore::new();
        let owner = UserId::new();

        let shop = store
            .insert(NewShop::new("Acme", owner).with_description("tools"))
            .await
            .unwrap();

        assert_eq!(shop.name, "Acme");
        assert_eq!(shop.description.as_deref(), Some("tools"));
        assert_eq!(shop.owner, OwnerRef::Id(owner));
        assert_eq!(shop.created_at, shop.updated_at);
        assert_eq!(store.shop_count().await, 1);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_name() {
        let store = InMemoryShopStore::new();
        store
            .insert(NewShop::new("Acme", UserId::new()))
            .await
            .unwrap();

        let err = store
            .insert(NewShop::new("Acme", UserId::new()))
            .await
            .unwrap_err();

        match err {
            StoreError::Duplicate { field, values } => {
                assert_eq!(field, "name");
                assert_eq!(values, vec!["Acme".to_string()]);
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert_eq!(store.shop_count().await, 1);
    }

    #[tokio::test]
    async fn insert_rejects_missing_name() {
        let store = InMemoryShopStore::new();
        let err = store
            .insert(NewShop::new("", UserId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "name", .. }));
    }

    #[tokio::test]
    async fn find_by_id_populates_registered_owner() {
        let store = InMemoryShopStore::new();
        let owner = UserId::new();
        store.register_user(owner, "Ada").await;
        let shop = store.insert(NewShop::new("Acme", owner)).await.unwrap();

        let found = store.find_by_id(shop.id).await.unwrap().unwrap();
        assert_eq!(
            found.owner,
            OwnerRef::Populated {
                id: owner,
                name: "Ada".to_string()
            }
        );
    }

    #[tokio::test]
    async fn find_by_id_unknown_returns_none() {
        let store = InMemoryShopStore::new();
        assert!(store.find_by_id(ShopId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order_and_bare_owners() {
        let store = InMemoryShopStore::new();
        let owner = UserId::new();
        store.register_user(owner, "Ada").await;
        store.insert(NewShop::new("First", owner)).await.unwrap();
        store.insert(NewShop::new("Second", owner)).await.unwrap();

        let all = store.find_all().await.unwrap().unwrap();
        let names: Vec<_> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert!(all.iter().all(|s| s.owner == OwnerRef::Id(owner)));
    }

    #[tokio::test]
    async fn find_by_owner_filters() {
        let store = InMemoryShopStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        store.insert(NewShop::new("A1", alice)).await.unwrap();
        store.insert(NewShop::new("B1", bob)).await.unwrap();
        store.insert(NewShop::new("A2", alice)).await.unwrap();

        let owned = store.find_by_owner(alice).await.unwrap().unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|s| s.owner.id() == alice));

        let none = store.find_by_owner(UserId::new()).await.unwrap().unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn save_overwrites_and_keeps_bare_owner() {
        let store = InMemoryShopStore::new();
        let owner = UserId::new();
        store.register_user(owner, "Ada").await;
        let created = store.insert(NewShop::new("Acme", owner)).await.unwrap();

        let mut shop = store.find_by_id(created.id).await.unwrap().unwrap();
        shop.description = Some("updated".to_string());
        shop.image = Some(Image::new(vec![1, 2, 3], "image/png"));

        let saved = store.save(shop).await.unwrap().unwrap();
        assert_eq!(saved.description.as_deref(), Some("updated"));
        assert!(saved.updated_at >= created.updated_at);

        let all = store.find_all().await.unwrap().unwrap();
        assert_eq!(all[0].owner, OwnerRef::Id(owner));
        assert_eq!(all[0].image.as_ref().unwrap().data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn save_missing_record_returns_none() {
        let store = InMemoryShopStore::new();
        let created = store
            .insert(NewShop::new("Acme", UserId::new()))
            .await
            .unwrap();
        store.delete_one(created.id).await.unwrap();

        assert!(store.save(created).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_rejects_name_taken_by_other_shop() {
        let store = InMemoryShopStore::new();
        let owner = UserId::new();
        store.insert(NewShop::new("Acme", owner)).await.unwrap();
        let mut other = store.insert(NewShop::new("Other", owner)).await.unwrap();

        other.name = "Acme".to_string();
        let err = store.save(other).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn save_allows_keeping_own_name() {
        let store = InMemoryShopStore::new();
        let shop = store
            .insert(NewShop::new("Acme", UserId::new()))
            .await
            .unwrap();
        assert!(store.save(shop).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_one_reports_count() {
        let store = InMemoryShopStore::new();
        let shop = store
            .insert(NewShop::new("Acme", UserId::new()))
            .await
            .unwrap();

        let first = store.delete_one(shop.id).await.unwrap();
        assert_eq!(first.deleted_count, 1);
        assert!(first.acknowledged);

        let second = store.delete_one(shop.id).await.unwrap();
        assert_eq!(second.deleted_count, 0);
    }

    #[tokio::test]
    async fn product_existence_tracks_shop() {
        let store = InMemoryShopStore::new();
        let shop_id = ShopId::new();
        assert!(!store.exists_for_shop(shop_id).await.unwrap());

        let product = store.add_product(shop_id).await;
        assert!(store.exists_for_shop(shop_id).await.unwrap());
        assert!(!store.exists_for_shop(ShopId::new()).await.unwrap());

        assert!(store.remove_product(product).await);
        assert!(!store.exists_for_shop(shop_id).await.unwrap());
    }
}
