// src/db/memory.rs

//! Implementação em memória dos quatro Stores.
//! Cada teste cria a sua instância isolada; `STORE_BACKEND=memory` usa a mesma
//! coisa em dev. As chaves estrangeiras da migration valem aqui também.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{CatalogStore, CompanyStore, OrderStore, UserStore},
    models::{
        auth::{NewUser, ProfileChanges, PublicUser, User},
        catalog::{Category, CategoryWithCount, NewProduct, Product, ProductPatch},
        company::{Company, CompanyPatch, CompanyWithUsers, NewCompany},
        order::{Order, OrderStatus},
    },
};

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    companies: Vec<Company>,
    categories: Vec<Category>,
    products: Vec<Product>,
    orders: Vec<Order>,
}

impl MemoryState {
    // Mesmas mensagens das constraints do Postgres (ver db_utils)
    fn check_user_unique(
        &self,
        email: Option<&str>,
        cpf: Option<&str>,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        let others = self.users.iter().filter(|u| Some(u.id) != except);
        for user in others {
            if email.is_some() && user.email.as_deref() == email {
                return Err(AppError::Conflict("Este e-mail já está em uso.".into()));
            }
            if cpf.is_some() && user.cpf.as_deref() == cpf {
                return Err(AppError::Conflict("Este CPF já está cadastrado.".into()));
            }
        }
        Ok(())
    }

    // Mesma garantia da FK `company_id REFERENCES companies (id)`
    fn check_company_exists(&self, company_id: Uuid) -> Result<(), AppError> {
        if self.companies.iter().any(|c| c.id == company_id) {
            Ok(())
        } else {
            Err(AppError::NotFound("Loja"))
        }
    }

    fn build_user(new_user: NewUser) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            cpf: new_user.cpf,
            phone: None,
            address: None,
            password_hash: new_user.password_hash,
            role: new_user.role,
            company_id: new_user.company_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Simula o banco fora do ar
    fn check(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Loja com dono, pronta para os testes dos serviços.
    #[cfg(test)]
    pub async fn seed_company(&self, slug: &str) -> Company {
        let owner = NewUser {
            name: format!("Dono {}", slug),
            email: Some(format!("dono@{}.com", slug)),
            cpf: None,
            password_hash: "hash".into(),
            role: crate::models::auth::Role::CompanyOwner,
            company_id: None,
        };
        let (company, _) = self
            .create_with_owner(NewCompany::with_defaults(slug, slug), owner)
            .await
            .expect("loja de teste");
        company
    }

    #[cfg(test)]
    pub async fn record_order(
        &self,
        company_id: Uuid,
        customer_id: Uuid,
        status: OrderStatus,
        total: Decimal,
        created_at: DateTime<Utc>,
    ) -> Order {
        let order = Order {
            id: Uuid::new_v4(),
            company_id,
            customer_id,
            status,
            total,
            created_at,
        };
        let mut state = self.state.write().await;
        state.check_company_exists(company_id).expect("pedido de loja inexistente");
        state.orders.push(order.clone());
        order
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email.as_deref() == Some(email)).cloned())
    }

    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<User>, AppError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.cpf.as_deref() == Some(cpf)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        self.check()?;
        let mut state = self.state.write().await;
        state.check_user_unique(new_user.email.as_deref(), new_user.cpf.as_deref(), None)?;
        let user = MemoryState::build_user(new_user);
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        self.check()?;
        let mut state = self.state.write().await;
        match state.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<User>, AppError> {
        self.check()?;
        let mut state = self.state.write().await;
        state.check_user_unique(None, changes.cpf.as_deref(), Some(id))?;

        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(v) = &changes.name {
            user.name = v.clone();
        }
        if let Some(v) = &changes.phone {
            user.phone = Some(v.clone());
        }
        if let Some(v) = &changes.cpf {
            user.cpf = Some(v.clone());
        }
        if let Some(v) = &changes.address {
            user.address = Some(Json(v.clone()));
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    // Tudo é checado antes de gravar qualquer coisa: ou os dois, ou nenhum.
    async fn create_with_owner(
        &self,
        company: NewCompany,
        owner: NewUser,
    ) -> Result<(Company, User), AppError> {
        self.check()?;
        let mut state = self.state.write().await;

        if state.companies.iter().any(|c| c.slug == company.slug) {
            return Err(AppError::Conflict("Este slug já está em uso.".into()));
        }
        state.check_user_unique(owner.email.as_deref(), owner.cpf.as_deref(), None)?;

        let now = Utc::now();
        let new_company = Company {
            id: Uuid::new_v4(),
            slug: company.slug,
            name: company.name,
            description: None,
            logo_url: company.logo_url,
            banner_url: company.banner_url,
            phone: company.phone,
            whatsapp: None,
            minimum_order: company.minimum_order,
            address: Json(serde_json::json!({})),
            business_hours: Json(serde_json::json!({})),
            payment_methods: company.payment_methods,
            is_open: false,
            delivery_enabled: true,
            pickup_enabled: true,
            created_at: now,
            updated_at: now,
        };
        let new_owner = MemoryState::build_user(NewUser {
            company_id: Some(new_company.id),
            ..owner
        });

        state.companies.push(new_company.clone());
        state.users.push(new_owner.clone());
        Ok((new_company, new_owner))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Company>, AppError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.companies.iter().find(|c| c.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn list_with_users(&self) -> Result<Vec<CompanyWithUsers>, AppError> {
        self.check()?;
        let state = self.state.read().await;
        let mut companies: Vec<CompanyWithUsers> = state
            .companies
            .iter()
            .map(|company| CompanyWithUsers {
                company: company.clone(),
                users: state
                    .users
                    .iter()
                    .filter(|u| u.company_id == Some(company.id))
                    .map(PublicUser::from)
                    .collect(),
            })
            .collect();
        // Mais recentes primeiro; empate fica na ordem inversa de inserção
        companies.reverse();
        companies.sort_by(|a, b| b.company.created_at.cmp(&a.company.created_at));
        Ok(companies)
    }

    async fn update(&self, id: Uuid, patch: &CompanyPatch) -> Result<Option<Company>, AppError> {
        self.check()?;
        let mut state = self.state.write().await;
        let Some(company) = state.companies.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        patch.apply_to(company);
        company.updated_at = Utc::now();
        Ok(Some(company.clone()))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self, company_id: Uuid) -> Result<Vec<CategoryWithCount>, AppError> {
        self.check()?;
        let state = self.state.read().await;
        let mut categories: Vec<CategoryWithCount> = state
            .categories
            .iter()
            .filter(|c| c.company_id == company_id)
            .map(|c| CategoryWithCount {
                category: c.clone(),
                product_count: state
                    .products
                    .iter()
                    .filter(|p| p.category_id == Some(c.id))
                    .count() as i64,
            })
            .collect();
        categories.sort_by(|a, b| {
            (a.category.order, a.category.created_at, a.category.id)
                .cmp(&(b.category.order, b.category.created_at, b.category.id))
        });
        Ok(categories)
    }

    async fn create_category(
        &self,
        company_id: Uuid,
        name: &str,
        order: i32,
    ) -> Result<Category, AppError> {
        self.check()?;
        let mut state = self.state.write().await;
        state.check_company_exists(company_id)?;

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            company_id,
            name: name.to_string(),
            order,
            created_at: now,
            updated_at: now,
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: Uuid,
        company_id: Uuid,
        name: &str,
        order: i32,
    ) -> Result<Option<Category>, AppError> {
        self.check()?;
        let mut state = self.state.write().await;
        let Some(category) = state
            .categories
            .iter_mut()
            .find(|c| c.id == id && c.company_id == company_id)
        else {
            return Ok(None);
        };
        category.name = name.to_string();
        category.order = order;
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
        self.check()?;
        let mut state = self.state.write().await;
        let before = state.categories.len();
        state.categories.retain(|c| !(c.id == id && c.company_id == company_id));
        let deleted = state.categories.len() < before;
        if deleted {
            for product in state.products.iter_mut().filter(|p| p.category_id == Some(id)) {
                product.category_id = None;
            }
        }
        Ok(deleted)
    }

    async fn category_belongs_to(&self, id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.categories.iter().any(|c| c.id == id && c.company_id == company_id))
    }

    async fn list_products(&self, company_id: Uuid) -> Result<Vec<Product>, AppError> {
        self.check()?;
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .iter()
            .filter(|p| p.company_id == company_id)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn create_product(
        &self,
        company_id: Uuid,
        input: &NewProduct,
    ) -> Result<Product, AppError> {
        self.check()?;
        let mut state = self.state.write().await;
        state.check_company_exists(company_id)?;
        if let Some(category_id) = input.category_id {
            if !state.categories.iter().any(|c| c.id == category_id) {
                return Err(AppError::NotFound("Categoria"));
            }
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            company_id,
            category_id: input.category_id,
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            image_url: input.image_url.clone(),
            is_available: input.is_available,
            created_at: now,
            updated_at: now,
        };
        state.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: Uuid,
        company_id: Uuid,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, AppError> {
        self.check()?;
        let mut state = self.state.write().await;
        let Some(product) = state
            .products
            .iter_mut()
            .find(|p| p.id == id && p.company_id == company_id)
        else {
            return Ok(None);
        };
        patch.apply_to(product);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
        self.check()?;
        let mut state = self.state.write().await;
        let before = state.products.len();
        state.products.retain(|p| !(p.id == id && p.company_id == company_id));
        Ok(state.products.len() < before)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn count_since(&self, company_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.company_id == company_id && o.created_at >= since)
            .count() as i64)
    }

    async fn count_with_status(
        &self,
        company_id: Uuid,
        status: OrderStatus,
    ) -> Result<i64, AppError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.company_id == company_id && o.status == status)
            .count() as i64)
    }

    async fn revenue(
        &self,
        company_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Decimal, AppError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.company_id == company_id && o.status != OrderStatus::Cancelled)
            .filter(|o| since.is_none_or(|since| o.created_at >= since))
            .map(|o| o.total)
            .sum())
    }

    async fn recent(&self, company_id: Uuid, limit: i64) -> Result<Vec<Order>, AppError> {
        self.check()?;
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.company_id == company_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit.max(0) as usize);
        Ok(orders)
    }

    async fn by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, AppError> {
        self.check()?;
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
