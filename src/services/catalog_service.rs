// src/services/catalog_service.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        cache::{company_tag, CacheLayer, DASHBOARD_MENU_PATH},
        error::AppError,
    },
    db::CatalogStore,
    models::{
        catalog::{
            Category, CategoryPayload, CategoryWithCount, Menu, NewProduct, Product, ProductPatch,
        },
        company::Company,
    },
};

// Cardápio de uma loja: categorias e produtos.
// Toda escrita recebe o `company_id` da sessão e só toca registros dessa loja.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    cache: CacheLayer,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogStore>, cache: CacheLayer) -> Self {
        Self { catalog, cache }
    }

    // Pós-condição obrigatória de toda escrita bem-sucedida
    async fn invalidate_menu(&self, company_id: Uuid) {
        self.cache.revalidate_path(DASHBOARD_MENU_PATH).await;
        self.cache.revalidate_tag(&company_tag(company_id)).await;
    }

    // ---
    // Categorias
    // ---

    /// Ordenadas por `order`. Falha do banco vira lista vazia (logada).
    pub async fn list_categories(&self, company_id: Uuid) -> Vec<CategoryWithCount> {
        let key = format!("categories:{}", company_id);
        let result = self
            .cache
            .get_or_load(&key, &[company_tag(company_id)], &[DASHBOARD_MENU_PATH], || {
                self.catalog.list_categories(company_id)
            })
            .await;

        result.unwrap_or_else(|e| {
            tracing::error!("🔥 Falha ao listar categorias da loja {}: {:?}", company_id, e);
            Vec::new()
        })
    }

    pub async fn create_category(
        &self,
        company_id: Uuid,
        payload: CategoryPayload,
    ) -> Result<Category, AppError> {
        payload.validate()?;

        let category = self
            .catalog
            .create_category(company_id, payload.name.trim(), payload.order)
            .await?;

        self.invalidate_menu(company_id).await;
        Ok(category)
    }

    /// Categoria inexistente ou de outra loja: o mesmo `Forbidden`.
    pub async fn update_category(
        &self,
        id: Uuid,
        company_id: Uuid,
        payload: CategoryPayload,
    ) -> Result<Category, AppError> {
        payload.validate()?;

        let category = self
            .catalog
            .update_category(id, company_id, payload.name.trim(), payload.order)
            .await?
            .ok_or(AppError::Forbidden)?;

        self.invalidate_menu(company_id).await;
        Ok(category)
    }

    pub async fn delete_category(&self, id: Uuid, company_id: Uuid) -> Result<(), AppError> {
        if !self.catalog.delete_category(id, company_id).await? {
            return Err(AppError::Forbidden);
        }

        self.invalidate_menu(company_id).await;
        tracing::info!("🗑️ Categoria {} removida da loja {}", id, company_id);
        Ok(())
    }

    // ---
    // Produtos
    // ---

    pub async fn list_products(&self, company_id: Uuid) -> Vec<Product> {
        let key = format!("products:{}", company_id);
        let result = self
            .cache
            .get_or_load(&key, &[company_tag(company_id)], &[DASHBOARD_MENU_PATH], || {
                self.catalog.list_products(company_id)
            })
            .await;

        result.unwrap_or_else(|e| {
            tracing::error!("🔥 Falha ao listar produtos da loja {}: {:?}", company_id, e);
            Vec::new()
        })
    }

    // A categoria informada também precisa ser desta loja
    async fn check_category(
        &self,
        category_id: Option<Uuid>,
        company_id: Uuid,
    ) -> Result<(), AppError> {
        if let Some(category_id) = category_id {
            if !self.catalog.category_belongs_to(category_id, company_id).await? {
                return Err(AppError::Forbidden);
            }
        }
        Ok(())
    }

    pub async fn create_product(
        &self,
        company_id: Uuid,
        input: NewProduct,
    ) -> Result<Product, AppError> {
        input.validate()?;
        self.check_category(input.category_id, company_id).await?;
        let input = NewProduct { name: input.name.trim().to_string(), ..input };

        let product = self.catalog.create_product(company_id, &input).await?;

        self.invalidate_menu(company_id).await;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        company_id: Uuid,
        patch: ProductPatch,
    ) -> Result<Product, AppError> {
        patch.validate()?;
        self.check_category(patch.category_id, company_id).await?;
        let patch = ProductPatch {
            name: patch.name.map(|n| n.trim().to_string()),
            ..patch
        };

        let product = self
            .catalog
            .update_product(id, company_id, &patch)
            .await?
            .ok_or(AppError::Forbidden)?;

        self.invalidate_menu(company_id).await;
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid, company_id: Uuid) -> Result<(), AppError> {
        if !self.catalog.delete_product(id, company_id).await? {
            return Err(AppError::Forbidden);
        }

        self.invalidate_menu(company_id).await;
        Ok(())
    }

    /// Cardápio público: todas as categorias e só os produtos disponíveis.
    pub async fn menu_for(&self, company: Company) -> Menu {
        let (categories, products) = tokio::join!(
            self.list_categories(company.id),
            self.list_products(company.id)
        );

        Menu {
            company,
            categories,
            products: products.into_iter().filter(|p| p.is_available).collect(),
        }
    }
}
