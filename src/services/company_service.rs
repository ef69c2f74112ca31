// src/services/company_service.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        cache::{admin_company_tag, slug_tag, CacheLayer, ADMIN_COMPANIES_PATH},
        error::AppError,
    },
    db::CompanyStore,
    models::{
        auth::{Identity, NewUser, Role},
        company::{Company, CompanyPatch, CompanyWithUsers, CreateCompanyPayload, NewCompany},
    },
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct CompanyService {
    companies: Arc<dyn CompanyStore>,
    cache: CacheLayer,
}

impl CompanyService {
    pub fn new(companies: Arc<dyn CompanyStore>, cache: CacheLayer) -> Self {
        Self { companies, cache }
    }

    /// LÓGICA DE NEGÓCIO: Cria uma nova loja e, atomicamente, o seu dono
    /// (papel `company_owner`). Só o admin pode provisionar lojas.
    pub async fn create_company(
        &self,
        actor: &Identity,
        payload: CreateCompanyPayload,
    ) -> Result<Company, AppError> {
        actor.require_admin()?;
        payload.validate()?;
        let name = payload.name.trim();

        if self.companies.find_by_slug(&payload.slug).await?.is_some() {
            return Err(AppError::Conflict("Este slug já está em uso.".into()));
        }

        let password_hash = hash_password(&payload.password).await?;

        let owner = NewUser {
            name: name.to_string(),
            email: Some(payload.email.trim().to_lowercase()),
            cpf: None,
            password_hash,
            role: Role::CompanyOwner,
            company_id: None, // preenchido pelo store dentro da transação
        };

        let (company, owner) = self
            .companies
            .create_with_owner(NewCompany::with_defaults(name, &payload.slug), owner)
            .await?;

        self.cache.revalidate_path(ADMIN_COMPANIES_PATH).await;

        tracing::info!(
            "🏪 Loja '{}' ({}) criada com o dono {}",
            company.slug,
            company.id,
            owner.id
        );
        Ok(company)
    }

    /// Resolução da loja a cada requisição da vitrine: sempre pelo cache.
    /// Só cacheamos quem existe: um slug criado depois não fica preso num "null".
    pub async fn get_company_by_slug(&self, slug: &str) -> Result<Option<Company>, AppError> {
        let key = format!("company-by-slug:{}", slug);
        self.cache
            .get_or_load_optional(&key, &[slug_tag(slug)], &[], || {
                self.companies.find_by_slug(slug)
            })
            .await
    }

    /// Leitura por id do painel do admin.
    pub async fn get_company(
        &self,
        actor: &Identity,
        company_id: Uuid,
    ) -> Result<Option<Company>, AppError> {
        actor.require_admin()?;

        let key = format!("company-by-id:{}", company_id);
        self.cache
            .get_or_load_optional(
                &key,
                &[admin_company_tag(company_id)],
                &[ADMIN_COMPANIES_PATH],
                || self.companies.find_by_id(company_id),
            )
            .await
    }

    /// Listagem do admin. Falha do banco vira lista vazia: a tela continua de pé.
    pub async fn list_companies(
        &self,
        actor: &Identity,
    ) -> Result<Vec<CompanyWithUsers>, AppError> {
        actor.require_admin()?;

        match self.companies.list_with_users().await {
            Ok(companies) => Ok(companies),
            Err(e) => {
                tracing::error!("🔥 Falha ao listar lojas, devolvendo lista vazia: {:?}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Patch esparso. O admin altera qualquer loja; o dono, só a sua.
    pub async fn update_company(
        &self,
        actor: &Identity,
        company_id: Uuid,
        patch: CompanyPatch,
    ) -> Result<Company, AppError> {
        match actor.role {
            Role::Admin => {}
            Role::CompanyOwner if actor.company_id == Some(company_id) => {}
            Role::CompanyOwner => return Err(AppError::Forbidden),
            Role::Customer => return Err(AppError::Unauthorized),
        }

        patch.validate()?;
        let patch = CompanyPatch {
            name: patch.name.map(|n| n.trim().to_string()),
            ..patch
        };

        let company = self
            .companies
            .update(company_id, &patch)
            .await?
            .ok_or(AppError::NotFound("Loja"))?;

        // Invalida a entrada por slug (vitrine) e a por id (admin)
        self.cache.revalidate_tag(&slug_tag(&company.slug)).await;
        self.cache.revalidate_tag(&admin_company_tag(company.id)).await;

        tracing::info!("✏️ Loja {} atualizada", company.id);
        Ok(company)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{db::MemoryStore, services::auth::AuthService};

    fn service(store: &MemoryStore) -> (CompanyService, CacheLayer) {
        let cache = CacheLayer::new(Duration::from_secs(300), 1_000);
        (CompanyService::new(Arc::new(store.clone()), cache.clone()), cache)
    }

    fn admin() -> Identity {
        Identity { user_id: Uuid::new_v4(), role: Role::Admin, company_id: None }
    }

    fn payload(slug: &str, email: &str) -> CreateCompanyPayload {
        CreateCompanyPayload {
            name: "Pizzaria do Zé".into(),
            slug: slug.into(),
            email: email.into(),
            password: "senha123".into(),
        }
    }

    #[tokio::test]
    async fn new_company_gets_defaults_and_an_owner_that_can_log_in() {
        let store = MemoryStore::new();
        let (companies, _) = service(&store);

        let company = companies
            .create_company(&admin(), payload("pizzaria-do-ze", "ze@pizza.com"))
            .await
            .unwrap();
        assert!(company.phone.is_empty());
        assert!(company.payment_methods.is_empty());
        assert!(company.minimum_order.is_zero());

        let auth = AuthService::new(Arc::new(store.clone()), Arc::new(store.clone()), "s".into());
        let session = auth.authenticate("ze@pizza.com", "senha123").await.unwrap();
        assert_eq!(session.user.role, "company");
        assert_eq!(session.company.map(|c| c.id), Some(company.id));
    }

    #[tokio::test]
    async fn duplicate_owner_email_leaves_no_company_behind() {
        let store = MemoryStore::new();
        let (companies, _) = service(&store);
        companies.create_company(&admin(), payload("primeira", "dono@loja.com")).await.unwrap();

        let result = companies.create_company(&admin(), payload("segunda", "dono@loja.com")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(companies.get_company_by_slug("segunda").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let store = MemoryStore::new();
        let (companies, _) = service(&store);
        companies.create_company(&admin(), payload("mesmo-slug", "a@loja.com")).await.unwrap();

        let result = companies.create_company(&admin(), payload("mesmo-slug", "b@loja.com")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn only_admins_provision_companies() {
        let store = MemoryStore::new();
        let (companies, _) = service(&store);
        let customer = Identity { user_id: Uuid::new_v4(), role: Role::Customer, company_id: None };

        let result = companies.create_company(&customer, payload("loja", "x@loja.com")).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert!(matches!(companies.list_companies(&customer).await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn sparse_patch_leaves_absent_fields_untouched() {
        let store = MemoryStore::new();
        let (companies, _) = service(&store);
        let company = companies
            .create_company(&admin(), payload("loja-a", "a@loja.com"))
            .await
            .unwrap();

        let setup = CompanyPatch {
            name: Some("A".into()),
            whatsapp: Some("B".into()),
            ..Default::default()
        };
        companies.update_company(&admin(), company.id, setup).await.unwrap();

        let patch = CompanyPatch { name: Some("C".into()), ..Default::default() };
        let updated = companies.update_company(&admin(), company.id, patch).await.unwrap();
        assert_eq!(updated.name, "C");
        assert_eq!(updated.whatsapp.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn update_invalidates_slug_and_id_entries() {
        let store = MemoryStore::new();
        let (companies, cache) = service(&store);
        let company = companies
            .create_company(&admin(), payload("loja-b", "b@loja.com"))
            .await
            .unwrap();

        companies.get_company_by_slug("loja-b").await.unwrap();
        companies.get_company(&admin(), company.id).await.unwrap();
        assert!(cache.contains("company-by-slug:loja-b"));
        assert!(cache.contains(&format!("company-by-id:{}", company.id)));

        let patch = CompanyPatch { is_open: Some(true), ..Default::default() };
        companies.update_company(&admin(), company.id, patch).await.unwrap();

        assert!(!cache.contains("company-by-slug:loja-b"));
        assert!(!cache.contains(&format!("company-by-id:{}", company.id)));
        let fresh = companies.get_company_by_slug("loja-b").await.unwrap().unwrap();
        assert!(fresh.is_open);
    }

    #[tokio::test]
    async fn blank_names_are_rejected_and_valid_ones_trimmed() {
        let store = MemoryStore::new();
        let (companies, _) = service(&store);

        let blank = CreateCompanyPayload { name: "   ".into(), ..payload("loja-x", "x@loja.com") };
        let result = companies.create_company(&admin(), blank).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert!(companies.get_company_by_slug("loja-x").await.unwrap().is_none());

        let padded = CreateCompanyPayload {
            name: " Cantina ".into(),
            ..payload("loja-x", "x@loja.com")
        };
        let company = companies.create_company(&admin(), padded).await.unwrap();
        assert_eq!(company.name, "Cantina");

        let patch = CompanyPatch { name: Some("\t".into()), ..Default::default() };
        let result = companies.update_company(&admin(), company.id, patch).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn owners_cannot_patch_other_companies() {
        let store = MemoryStore::new();
        let (companies, _) = service(&store);
        let company = companies
            .create_company(&admin(), payload("loja-c", "c@loja.com"))
            .await
            .unwrap();
        let stranger = Identity {
            user_id: Uuid::new_v4(),
            role: Role::CompanyOwner,
            company_id: Some(Uuid::new_v4()),
        };

        let result = companies.update_company(&stranger, company.id, CompanyPatch::default()).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn listing_degrades_to_empty_when_the_store_is_down() {
        let store = MemoryStore::new();
        let (companies, _) = service(&store);
        companies.create_company(&admin(), payload("loja-d", "d@loja.com")).await.unwrap();
        companies.create_company(&admin(), payload("loja-e", "e@loja.com")).await.unwrap();

        let listed = companies.list_companies(&admin()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].company.slug, "loja-e");
        assert_eq!(listed[0].users.len(), 1);

        store.set_unavailable(true);
        assert!(companies.list_companies(&admin()).await.unwrap().is_empty());
    }
}
