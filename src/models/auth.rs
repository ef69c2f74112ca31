// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::{
    error::AppError,
    normalize::{digits_only, not_blank},
};
use crate::models::company::Company;

// Papel do usuário no banco (enum `user_role` do Postgres)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    CompanyOwner,
    Customer,
}

impl Role {
    /// Rótulo exposto na autenticação. `company_owner` vira `company`.
    pub fn public_label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::CompanyOwner => "company",
            Role::Customer => "customer",
        }
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Json<serde_json::Value>>,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub role: Role,
    pub company_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O que sai da API: sem hash e com o rótulo público do papel
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    #[schema(example = "Maria Souza")]
    pub name: String,
    pub email: Option<String>,
    #[schema(example = "12345678900")]
    pub cpf: Option<String>,
    pub phone: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub address: Option<serde_json::Value>,
    #[schema(example = "company")]
    pub role: String,
    pub company_id: Option<Uuid>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            cpf: user.cpf.clone(),
            phone: user.phone.clone(),
            address: user.address.as_ref().map(|a| a.0.clone()),
            role: user.role.public_label().to_string(),
            company_id: user.company_id,
        }
    }
}

// Dados para inserir um usuário (o hash já vem calculado)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub company_id: Option<Uuid>,
}

// Campos do perfil já normalizados. `None` = não mexer.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub address: Option<serde_json::Value>,
}

// ---
// Identidade autenticada
// ---
// Quem está chamando. Resolvida na borda (token) e passada explicitamente aos serviços.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
    pub company_id: Option<Uuid>,
}

impl Identity {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }

    /// A loja que este usuário administra.
    pub fn require_company(&self) -> Result<Uuid, AppError> {
        match (self.role, self.company_id) {
            (Role::CompanyOwner, Some(company_id)) => Ok(company_id),
            _ => Err(AppError::Unauthorized),
        }
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            company_id: user.company_id,
        }
    }
}

// ---
// Payloads
// ---

pub(crate) fn validate_cpf(cpf: &str) -> Result<(), ValidationError> {
    if digits_only(cpf).len() != 11 {
        let mut err = ValidationError::new("cpf");
        err.message = Some("O CPF deve conter 11 dígitos.".into());
        return Err(err);
    }
    Ok(())
}

// Dados para login (admin e dono de loja)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Login do cliente pelo CPF
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CustomerLoginPayload {
    #[validate(custom(function = "validate_cpf"))]
    pub cpf: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Cadastro de cliente
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterCustomerPayload {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "validate_cpf"))]
    #[schema(example = "123.456.789-00")]
    pub cpf: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfilePayload {
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    #[schema(example = "(11) 99999-8888")]
    pub phone: Option<String>,
    #[validate(custom(function = "validate_cpf"))]
    pub cpf: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub address: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
}

// Resposta de autenticação: token + usuário + loja (se for dono)
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthSession {
    pub token: String,
    pub user: PublicUser,
    pub company: Option<Company>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_owner_is_exposed_as_company() {
        assert_eq!(Role::CompanyOwner.public_label(), "company");
        assert_eq!(Role::Admin.public_label(), "admin");
        assert_eq!(Role::Customer.public_label(), "customer");
    }

    #[test]
    fn cpf_validation_ignores_punctuation() {
        assert!(validate_cpf("123.456.789-00").is_ok());
        assert!(validate_cpf("12345678900").is_ok());
        assert!(validate_cpf("123").is_err());
        assert!(validate_cpf("").is_err());
    }

    #[test]
    fn blank_customer_names_are_rejected() {
        let payload = RegisterCustomerPayload {
            name: "  ".into(),
            cpf: "123.456.789-00".into(),
            password: "senha123".into(),
        };
        assert!(payload.validate().is_err());

        let profile = UpdateProfilePayload { name: Some("   ".into()), ..Default::default() };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn only_owners_with_a_company_pass_require_company() {
        let company_id = Uuid::new_v4();
        let owner = Identity {
            user_id: Uuid::new_v4(),
            role: Role::CompanyOwner,
            company_id: Some(company_id),
        };
        let admin = Identity { user_id: Uuid::new_v4(), role: Role::Admin, company_id: None };

        assert_eq!(owner.require_company().unwrap(), company_id);
        assert!(matches!(admin.require_company(), Err(AppError::Unauthorized)));
        assert!(admin.require_admin().is_ok());
        assert!(matches!(owner.require_admin(), Err(AppError::Unauthorized)));
    }
}
