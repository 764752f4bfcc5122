//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p shop-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use serial_test::serial;
use shop_store::{
    Image, NewShop, OwnerRef, PostgresShopStore, ProductStore, ShopId, ShopStore, StoreError,
    UserId,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_shops.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresShopStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE shops, products, users")
        .execute(&pool)
        .await
        .unwrap();

    PostgresShopStore::new(pool)
}

#[tokio::test]
#[serial]
async fn insert_and_find_by_id_populates_owner() {
    let store = get_test_store().await;
    let owner = UserId::new();
    store.register_user(owner, "Ada").await.unwrap();

    let created = store
        .insert(NewShop::new("Acme", owner).with_description("tools"))
        .await
        .unwrap();
    assert_eq!(created.owner, OwnerRef::Id(owner));
    assert!(created.image.is_none());

    let found = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found.name, "Acme");
    assert_eq!(found.description.as_deref(), Some("tools"));
    assert_eq!(
        found.owner,
        OwnerRef::Populated {
            id: owner,
            name: "Ada".to_string()
        }
    );
}

#[tokio::test]
#[serial]
async fn image_bytes_survive_round_trip() {
    let store = get_test_store().await;
    let bytes: Vec<u8> = (0..=255).cycle().take(64 * 1024).collect();

    let created = store
        .insert(
            NewShop::new("Pixels", UserId::new())
                .with_image(Image::new(bytes.clone(), "image/png")),
        )
        .await
        .unwrap();

    let found = store.find_by_id(created.id).await.unwrap().unwrap();
    let image = found.image.unwrap();
    assert_eq!(image.content_type, "image/png");
    assert_eq!(image.data, bytes);
}

#[tokio::test]
#[serial]
async fn duplicate_name_maps_to_duplicate_error() {
    let store = get_test_store().await;
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
}

#[tokio::test]
#[serial]
async fn save_updates_fields_and_reports_missing_rows() {
    let store = get_test_store().await;
    let mut shop = store
        .insert(NewShop::new("Acme", UserId::new()))
        .await
        .unwrap();

    shop.description = Some("now with hammers".to_string());
    shop.image = Some(Image::new(vec![9, 9, 9], "image/gif"));
    let saved = store.save(shop.clone()).await.unwrap().unwrap();
    assert!(saved.updated_at >= shop.created_at);

    let found = store.find_by_id(shop.id).await.unwrap().unwrap();
    assert_eq!(found.description.as_deref(), Some("now with hammers"));
    assert_eq!(found.image.unwrap().content_type, "image/gif");

    store.delete_one(shop.id).await.unwrap();
    assert!(store.save(shop).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn find_by_owner_and_find_all() {
    let store = get_test_store().await;
    let alice = UserId::new();
    let bob = UserId::new();
    store.register_user(alice, "Alice").await.unwrap();

    store.insert(NewShop::new("A1", alice)).await.unwrap();
    store.insert(NewShop::new("B1", bob)).await.unwrap();
    store.insert(NewShop::new("A2", alice)).await.unwrap();

    let all = store.find_all().await.unwrap().unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|s| matches!(s.owner, OwnerRef::Id(_))));

    let owned = store.find_by_owner(alice).await.unwrap().unwrap();
    assert_eq!(owned.len(), 2);
    assert!(owned.iter().all(|s| s.owner.name() == Some("Alice")));

    let empty = store.find_by_owner(UserId::new()).await.unwrap().unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
#[serial]
async fn product_existence_and_delete() {
    let store = get_test_store().await;
    let shop = store
        .insert(NewShop::new("Acme", UserId::new()))
        .await
        .unwrap();

    assert!(!store.exists_for_shop(shop.id).await.unwrap());
    store.add_product(shop.id, "Hammer").await.unwrap();
    assert!(store.exists_for_shop(shop.id).await.unwrap());
    assert!(!store.exists_for_shop(ShopId::new()).await.unwrap());

    let result = store.delete_one(shop.id).await.unwrap();
    assert_eq!(result.deleted_count, 1);
    assert!(store.find_by_id(shop.id).await.unwrap().is_none());
}
