// src/db/company_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    db::{store::CompanyStore, UserRepository},
    models::{
        auth::{NewUser, PublicUser, User},
        company::{Company, CompanyPatch, CompanyWithUsers, NewCompany},
    },
};

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insere a loja (Estabelecimento) usando o executor dado.
    async fn insert_company<'e, E>(executor: E, company: &NewCompany) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies
                (slug, name, logo_url, banner_url, phone, minimum_order, payment_methods)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&company.slug)
        .bind(&company.name)
        .bind(&company.logo_url)
        .bind(&company.banner_url)
        .bind(&company.phone)
        .bind(company.minimum_order)
        .bind(&company.payment_methods)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }
}

#[async_trait]
impl CompanyStore for CompanyRepository {
    async fn create_with_owner(
        &self,
        company: NewCompany,
        owner: NewUser,
    ) -> Result<(Company, User), AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria a loja
        let new_company = Self::insert_company(&mut *tx, &company).await?;

        // 3. Cria o dono já ligado à loja. Se falhar (ex: e-mail duplicado),
        // o tx sofre rollback automático ao sair do escopo (drop).
        let owner = NewUser { company_id: Some(new_company.id), ..owner };
        let new_owner = UserRepository::insert_user(&mut *tx, &owner).await?;

        // 4. Commit
        tx.commit().await?;

        Ok((new_company, new_owner))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    async fn list_with_users(&self) -> Result<Vec<CompanyWithUsers>, AppError> {
        let companies =
            sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        let ids: Vec<Uuid> = companies.iter().map(|c| c.id).collect();
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE company_id = ANY($1) ORDER BY created_at ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        // Agrupa os usuários por loja
        let mut by_company: HashMap<Uuid, Vec<PublicUser>> = HashMap::new();
        for user in &users {
            if let Some(company_id) = user.company_id {
                by_company.entry(company_id).or_default().push(PublicUser::from(user));
            }
        }

        Ok(companies
            .into_iter()
            .map(|company| {
                let users = by_company.remove(&company.id).unwrap_or_default();
                CompanyWithUsers { company, users }
            })
            .collect())
    }

    // Patch esparso: parâmetro NULL mantém a coluna como está.
    async fn update(&self, id: Uuid, patch: &CompanyPatch) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                logo_url = COALESCE($4, logo_url),
                banner_url = COALESCE($5, banner_url),
                phone = COALESCE($6, phone),
                whatsapp = COALESCE($7, whatsapp),
                minimum_order = COALESCE($8, minimum_order),
                address = COALESCE($9, address),
                business_hours = COALESCE($10, business_hours),
                payment_methods = COALESCE($11, payment_methods),
                is_open = COALESCE($12, is_open),
                delivery_enabled = COALESCE($13, delivery_enabled),
                pickup_enabled = COALESCE($14, pickup_enabled),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(&patch.logo_url)
        .bind(&patch.banner_url)
        .bind(&patch.phone)
        .bind(&patch.whatsapp)
        .bind(patch.minimum_order)
        .bind(patch.address.clone().map(Json))
        .bind(patch.business_hours.clone().map(Json))
        .bind(&patch.payment_methods)
        .bind(patch.is_open)
        .bind(patch.delivery_enabled)
        .bind(patch.pickup_enabled)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }
}
