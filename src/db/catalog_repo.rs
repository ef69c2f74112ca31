// src/db/catalog_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::map_missing_parent, error::AppError},
    db::store::CatalogStore,
    models::catalog::{Category, CategoryWithCount, NewProduct, Product, ProductPatch},
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for CatalogRepository {
    // ---
    // Categorias
    // ---

    async fn list_categories(&self, company_id: Uuid) -> Result<Vec<CategoryWithCount>, AppError> {
        let categories = sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT c.*, COUNT(p.id) AS product_count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            WHERE c.company_id = $1
            GROUP BY c.id
            ORDER BY c.sort_order ASC, c.created_at ASC, c.id ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn create_category(
        &self,
        company_id: Uuid,
        name: &str,
        order: i32,
    ) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (company_id, name, sort_order)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(name)
        .bind(order)
        .fetch_one(&self.pool)
        .await
        .map_err(map_missing_parent)?;
        Ok(category)
    }

    // A checagem de dono vai no WHERE: uma única escrita condicional.
    async fn update_category(
        &self,
        id: Uuid,
        company_id: Uuid,
        name: &str,
        order: i32,
    ) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $3, sort_order = $4, updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(name)
        .bind(order)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    // Produtos da categoria ficam sem categoria (ON DELETE SET NULL)
    async fn delete_category(&self, id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn category_belongs_to(&self, id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1 AND company_id = $2)",
        )
        .bind(id)
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    // ---
    // Produtos
    // ---

    async fn list_products(&self, company_id: Uuid) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE company_id = $1 ORDER BY name ASC",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn create_product(
        &self,
        company_id: Uuid,
        input: &NewProduct,
    ) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products
                (company_id, category_id, name, description, price, image_url, is_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.image_url)
        .bind(input.is_available)
        .fetch_one(&self.pool)
        .await
        .map_err(map_missing_parent)?;
        Ok(product)
    }

    async fn update_product(
        &self,
        id: Uuid,
        company_id: Uuid,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                category_id = COALESCE($3, category_id),
                name = COALESCE($4, name),
                description = COALESCE($5, description),
                price = COALESCE($6, price),
                image_url = COALESCE($7, image_url),
                is_available = COALESCE($8, is_available),
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(patch.category_id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.price)
        .bind(&patch.image_url)
        .bind(patch.is_available)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn delete_product(&self, id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
