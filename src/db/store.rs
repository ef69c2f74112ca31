// src/db/store.rs

//! As fronteiras de persistência. Os serviços só conhecem estes traits;
//! `main` decide se entra o Postgres (`*Repository`) ou o `MemoryStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{NewUser, ProfileChanges, User},
        catalog::{Category, CategoryWithCount, NewProduct, Product, ProductPatch},
        company::{Company, CompanyPatch, CompanyWithUsers, NewCompany},
        order::{Order, OrderStatus},
    },
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// `Conflict` se o e-mail ou o cpf já existirem.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;

    /// `false` se o usuário não existir.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError>;

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Cria a loja e o dono na mesma transação: ou os dois, ou nenhum.
    async fn create_with_owner(
        &self,
        company: NewCompany,
        owner: NewUser,
    ) -> Result<(Company, User), AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Company>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError>;

    /// Mais recentes primeiro, com os usuários de cada loja.
    async fn list_with_users(&self) -> Result<Vec<CompanyWithUsers>, AppError>;

    async fn update(&self, id: Uuid, patch: &CompanyPatch) -> Result<Option<Company>, AppError>;
}

/// Toda escrita filtra por `company_id` na própria instrução: `None`/`false`
/// significa "não existe ou não é desta loja", sem distinguir.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self, company_id: Uuid) -> Result<Vec<CategoryWithCount>, AppError>;

    async fn create_category(
        &self,
        company_id: Uuid,
        name: &str,
        order: i32,
    ) -> Result<Category, AppError>;

    async fn update_category(
        &self,
        id: Uuid,
        company_id: Uuid,
        name: &str,
        order: i32,
    ) -> Result<Option<Category>, AppError>;

    async fn delete_category(&self, id: Uuid, company_id: Uuid) -> Result<bool, AppError>;

    async fn category_belongs_to(&self, id: Uuid, company_id: Uuid) -> Result<bool, AppError>;

    async fn list_products(&self, company_id: Uuid) -> Result<Vec<Product>, AppError>;

    async fn create_product(
        &self,
        company_id: Uuid,
        input: &NewProduct,
    ) -> Result<Product, AppError>;

    async fn update_product(
        &self,
        id: Uuid,
        company_id: Uuid,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, AppError>;

    async fn delete_product(&self, id: Uuid, company_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn count_since(&self, company_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError>;

    async fn count_with_status(
        &self,
        company_id: Uuid,
        status: OrderStatus,
    ) -> Result<i64, AppError>;

    /// Soma de `total` sem pedidos cancelados. `since = None` soma tudo.
    async fn revenue(
        &self,
        company_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Decimal, AppError>;

    async fn recent(&self, company_id: Uuid, limit: i64) -> Result<Vec<Order>, AppError>;

    async fn by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, AppError>;
}
