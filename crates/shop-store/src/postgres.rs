use async_trait::async_trait;
use common::{ProductId, ShopId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    DeleteResult, Image, NewShop, OwnerRef, Result, Shop, StoreError,
    store::{ProductStore, ShopStore, validate_shop_name},
};

const UNIQUE_NAME_CONSTRAINT: &str = "shops_name_key";

const SELECT_POPULATED: &str = r#"
    SELECT s.id, s.name, s.description, s.owner_id, u.name AS owner_name,
           s.image_data, s.image_content_type, s.created_at, s.updated_at
    FROM shops s
    LEFT JOIN users u ON u.id = s.owner_id
"#;

/// PostgreSQL-backed shop store implementation.
#[derive(Clone)]
pub struct PostgresShopStore {
    pool: PgPool,
}

impl PostgresShopStore {
    /// Creates a new PostgreSQL shop store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Upserts a user so that owner references can be populated with a name.
    pub async fn register_user(&self, id: UserId, name: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(id.as_uuid())
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Records a product listed in `shop_id`.
    pub async fn add_product(&self, shop_id: ShopId, name: &str) -> Result<ProductId> {
        let product_id = ProductId::new();
        sqlx::query("INSERT INTO products (id, shop_id, name) VALUES ($1, $2, $3)")
            .bind(product_id.as_uuid())
            .bind(shop_id.as_uuid())
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(product_id)
    }

    fn row_to_shop(row: PgRow) -> Result<Shop> {
        let owner_id = UserId::from_uuid(row.try_get::<Uuid, _>("owner_id")?);
        let owner = match row.try_get::<Option<String>, _>("owner_name")? {
            Some(name) => OwnerRef::Populated { id: owner_id, name },
            None => OwnerRef::Id(owner_id),
        };

        let image = match (
            row.try_get::<Option<Vec<u8>>, _>("image_data")?,
            row.try_get::<Option<String>, _>("image_content_type")?,
        ) {
            (Some(data), Some(content_type)) => Some(Image { data, content_type }),
            _ => None,
        };

        Ok(Shop {
            id: ShopId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            owner,
            image,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn map_write_error(err: sqlx::Error, name: &str) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.constraint() == Some(UNIQUE_NAME_CONSTRAINT)
        {
            return StoreError::Duplicate {
                field: "name",
                values: vec![name.to_string()],
            };
        }
        StoreError::Database(err)
    }
}

#[async_trait]
impl ShopStore for PostgresShopStore {
    async fn find_all(&self) -> Result<Option<Vec<Shop>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, owner_id, NULL::TEXT AS owner_name,
                   image_data, image_content_type, created_at, updated_at
            FROM shops
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_shop)
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    async fn find_by_owner(&self, owner: UserId) -> Result<Option<Vec<Shop>>> {
        let sql = format!("{SELECT_POPULATED} WHERE s.owner_id = $1 ORDER BY s.created_at ASC");
        let rows = sqlx::query(&sql)
            .bind(owner.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(Self::row_to_shop)
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    async fn find_by_id(&self, id: ShopId) -> Result<Option<Shop>> {
        let sql = format!("{SELECT_POPULATED} WHERE s.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_shop).transpose()
    }

    async fn insert(&self, shop: NewShop) -> Result<Shop> {
        validate_shop_name(&shop.name)?;

        let id = ShopId::new();
        let (image_data, image_content_type) = match &shop.image {
            Some(image) => (Some(image.data.as_slice()), Some(image.content_type.as_str())),
            None => (None, None),
        };

        let row = sqlx::query(
            r#"
            INSERT INTO shops (id, name, description, owner_id, image_data, image_content_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, owner_id, NULL::TEXT AS owner_name,
                      image_data, image_content_type, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(&shop.name)
        .bind(&shop.description)
        .bind(shop.owner.as_uuid())
        .bind(image_data)
        .bind(image_content_type)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &shop.name))?;

        tracing::debug!(shop_id = %id, "inserted shop");
        Self::row_to_shop(row)
    }

    async fn save(&self, mut shop: Shop) -> Result<Option<Shop>> {
        validate_shop_name(&shop.name)?;

        let (image_data, image_content_type) = match &shop.image {
            Some(image) => (Some(image.data.as_slice()), Some(image.content_type.as_str())),
            None => (None, None),
        };

        let updated_at: Option<chrono::DateTime<chrono::Utc>> = sqlx::query_scalar(
            r#"
            UPDATE shops
            SET name = $2, description = $3, image_data = $4, image_content_type = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING updated_at
            "#,
        )
        .bind(shop.id.as_uuid())
        .bind(&shop.name)
        .bind(&shop.description)
        .bind(image_data)
        .bind(image_content_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &shop.name))?;

        Ok(updated_at.map(|ts| {
            shop.updated_at = ts;
            shop
        }))
    }

    async fn delete_one(&self, id: ShopId) -> Result<DeleteResult> {
        let result = sqlx::query("DELETE FROM shops WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.rows_affected(),
        })
    }
}

#[async_trait]
impl ProductStore for PostgresShopStore {
    async fn exists_for_shop(&self, shop_id: ShopId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE shop_id = $1)")
                .bind(shop_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
