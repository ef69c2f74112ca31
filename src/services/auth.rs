// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, normalize::digits_only},
    db::{CompanyStore, UserStore},
    models::auth::{
        AuthSession, Claims, Identity, NewUser, ProfileChanges, PublicUser, RegisterCustomerPayload,
        ResetPasswordPayload, Role, UpdateProfilePayload, User,
    },
};

// Custo fixo do bcrypt para todos os hashes gravados
pub const BCRYPT_COST: u32 = 10;

// Hashing roda num thread separado para não travar o runtime
pub(crate) async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, BCRYPT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password_clone = password.to_owned();
    let password_hash_clone = password_hash.to_owned();
    let is_valid =
        tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(is_valid)
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    companies: Arc<dyn CompanyStore>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        companies: Arc<dyn CompanyStore>,
        jwt_secret: String,
    ) -> Self {
        Self { users, companies, jwt_secret }
    }

    /// Login de admin/dono pelo e-mail.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let user = self
            .users
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        self.check_password_and_open_session(user, password).await
    }

    /// Login de cliente pelo CPF (aceita com ou sem pontuação).
    pub async fn authenticate_customer(
        &self,
        cpf: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        let user = self
            .users
            .find_by_cpf(&digits_only(cpf))
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        self.check_password_and_open_session(user, password).await
    }

    async fn check_password_and_open_session(
        &self,
        user: User,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        if !verify_password(password, &user.password_hash).await? {
            tracing::info!("Tentativa de login com senha inválida para o usuário {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        self.open_session(&user).await
    }

    /// Token + usuário público + a loja do dono (se houver).
    pub async fn open_session(&self, user: &User) -> Result<AuthSession, AppError> {
        let company = match user.company_id {
            Some(company_id) => self.companies.find_by_id(company_id).await?,
            None => None,
        };

        Ok(AuthSession {
            token: self.create_token(user.id)?,
            user: PublicUser::from(user),
            company,
        })
    }

    pub async fn register_customer(
        &self,
        payload: RegisterCustomerPayload,
    ) -> Result<User, AppError> {
        payload.validate()?;

        let cpf = digits_only(&payload.cpf);
        if self.users.find_by_cpf(&cpf).await?.is_some() {
            return Err(AppError::Conflict("Este CPF já está cadastrado.".into()));
        }

        let password_hash = hash_password(&payload.password).await?;

        // A constraint única ainda protege contra duas inscrições simultâneas
        let user = self
            .users
            .create_user(NewUser {
                name: payload.name.trim().to_string(),
                email: None,
                cpf: Some(cpf),
                password_hash,
                role: Role::Customer,
                company_id: None,
            })
            .await?;

        tracing::info!("✅ Cliente {} cadastrado", user.id);
        Ok(user)
    }

    /// Troca administrativa de senha. Sempre grava o hash, nunca o texto.
    pub async fn reset_password(
        &self,
        actor: &Identity,
        user_id: Uuid,
        new_password: &str,
    ) -> Result<(), AppError> {
        actor.require_admin()?;

        ResetPasswordPayload { new_password: new_password.to_string() }.validate()?;

        let password_hash = hash_password(new_password).await?;
        if !self.users.update_password(user_id, &password_hash).await? {
            return Err(AppError::NotFound("Usuário"));
        }

        tracing::info!(
            "🔑 Senha do usuário {} redefinida pelo admin {}",
            user_id,
            actor.user_id
        );
        Ok(())
    }

    /// Só o próprio usuário (sessão) pode alterar o seu perfil.
    pub async fn update_profile(
        &self,
        session: Option<&Identity>,
        user_id: Uuid,
        payload: UpdateProfilePayload,
    ) -> Result<PublicUser, AppError> {
        match session {
            Some(identity) if identity.user_id == user_id => {}
            _ => return Err(AppError::Unauthorized),
        }

        payload.validate()?;

        let changes = ProfileChanges {
            name: payload.name.map(|n| n.trim().to_string()),
            phone: payload.phone.as_deref().map(digits_only),
            cpf: payload.cpf.as_deref().map(digits_only),
            address: payload.address,
        };

        let user = self
            .users
            .update_profile(user_id, &changes)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        Ok(PublicUser::from(&user))
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::Unauthorized)?;

        self.users
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Garante que o admin configurado exista. Não mexe na senha se já existir.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        let email = email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Ok(());
        }

        let password_hash = hash_password(password).await?;
        let admin = self
            .users
            .create_user(NewUser {
                name: "Administrador".to_string(),
                email: Some(email),
                cpf: None,
                password_hash,
                role: Role::Admin,
                company_id: None,
            })
            .await?;

        tracing::info!("✅ Usuário admin criado ({})", admin.id);
        Ok(())
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        // Usa '?' para um tratamento de erro mais limpo
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service(store: &MemoryStore) -> AuthService {
        let secret = "segredo-de-teste".to_string();
        AuthService::new(Arc::new(store.clone()), Arc::new(store.clone()), secret)
    }

    fn admin() -> Identity {
        Identity { user_id: Uuid::new_v4(), role: Role::Admin, company_id: None }
    }

    fn customer(name: &str, cpf: &str) -> RegisterCustomerPayload {
        RegisterCustomerPayload { name: name.into(), cpf: cpf.into(), password: "senha123".into() }
    }

    #[tokio::test]
    async fn cpf_is_normalized_before_the_uniqueness_check() {
        let store = MemoryStore::new();
        let auth = service(&store);

        let first = auth.register_customer(customer("Ana", "123.456.789-00")).await.unwrap();
        assert_eq!(first.cpf.as_deref(), Some("12345678900"));

        let second = auth.register_customer(customer("Outra Ana", "12345678900")).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn registration_stores_a_hash_not_the_password() {
        let store = MemoryStore::new();
        let auth = service(&store);

        let user = auth.register_customer(customer("Bia", "111.222.333-44")).await.unwrap();
        assert_ne!(user.password_hash, "senha123");
        assert!(verify("senha123", &user.password_hash).unwrap());
        assert_eq!(user.role, Role::Customer);
    }

    #[tokio::test]
    async fn empty_fields_are_a_validation_error() {
        let store = MemoryStore::new();
        let auth = service(&store);

        let result = auth.register_customer(customer("", "123.456.789-00")).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));

        let result = auth.register_customer(customer("Caio", "")).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn whitespace_names_are_a_validation_error() {
        let store = MemoryStore::new();
        let auth = service(&store);

        let result = auth.register_customer(customer("  ", "123.456.789-00")).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert!(store.find_by_cpf("12345678900").await.unwrap().is_none());

        let user = auth.register_customer(customer(" Gabi ", "123.456.789-00")).await.unwrap();
        assert_eq!(user.name, "Gabi");

        let identity = Identity::from(&user);
        let blank = UpdateProfilePayload { name: Some("\t ".into()), ..Default::default() };
        let result = auth.update_profile(Some(&identity), user.id, blank).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let store = MemoryStore::new();
        let auth = service(&store);
        auth.ensure_admin("admin@cardapio.com", "admin123").await.unwrap();

        let result = auth.authenticate("admin@cardapio.com", "errada").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));

        let result = auth.authenticate("ninguem@cardapio.com", "admin123").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn successful_login_returns_a_token_that_validates() {
        let store = MemoryStore::new();
        let auth = service(&store);
        auth.ensure_admin("admin@cardapio.com", "admin123").await.unwrap();

        let session = auth.authenticate("admin@cardapio.com", "admin123").await.unwrap();
        assert_eq!(session.user.role, "admin");
        assert!(session.company.is_none());

        let user = auth.validate_token(&session.token).await.unwrap();
        assert_eq!(user.id, session.user.id);
        assert!(matches!(auth.validate_token("lixo").await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn customers_log_in_with_their_cpf() {
        let store = MemoryStore::new();
        let auth = service(&store);
        auth.register_customer(customer("Duda", "987.654.321-00")).await.unwrap();

        let session = auth.authenticate_customer("98765432100", "senha123").await.unwrap();
        assert_eq!(session.user.role, "customer");
    }

    #[tokio::test]
    async fn reset_password_requires_admin_and_hashes() {
        let store = MemoryStore::new();
        let auth = service(&store);
        let user = auth.register_customer(customer("Edu", "555.444.333-22")).await.unwrap();
        let as_customer = Identity::from(&user);

        let denied = auth.reset_password(&as_customer, user.id, "novasenha").await;
        assert!(matches!(denied, Err(AppError::Unauthorized)));

        auth.reset_password(&admin(), user.id, "novasenha").await.unwrap();
        let stored = UserStore::find_by_id(&store, user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "novasenha");
        assert!(auth.authenticate_customer("55544433322", "novasenha").await.is_ok());

        let missing = auth.reset_password(&admin(), Uuid::new_v4(), "novasenha").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn profile_updates_need_the_owning_session() {
        let store = MemoryStore::new();
        let auth = service(&store);
        let user = auth.register_customer(customer("Fabi", "222.333.444-55")).await.unwrap();
        let identity = Identity::from(&user);
        let payload = UpdateProfilePayload {
            phone: Some("(11) 98888-7777".into()),
            ..Default::default()
        };

        let no_session = auth.update_profile(None, user.id, payload.clone()).await;
        assert!(matches!(no_session, Err(AppError::Unauthorized)));

        let other = Identity { user_id: Uuid::new_v4(), ..identity.clone() };
        let wrong_session = auth.update_profile(Some(&other), user.id, payload.clone()).await;
        assert!(matches!(wrong_session, Err(AppError::Unauthorized)));

        let updated = auth.update_profile(Some(&identity), user.id, payload).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("11988887777"));
        assert_eq!(updated.name, "Fabi");
    }
}
