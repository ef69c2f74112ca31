// src/models/company.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{common::normalize::not_blank, models::auth::PublicUser};

pub const PLACEHOLDER_LOGO_URL: &str = "/images/placeholder-logo.png";
pub const PLACEHOLDER_BANNER_URL: &str = "/images/placeholder-banner.png";

// ---
// Company (A "Loja" / Restaurante)
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,

    #[schema(example = "pizzaria-do-ze")]
    pub slug: String,

    #[schema(example = "Pizzaria do Zé")]
    pub name: String,
    pub description: Option<String>,
    pub logo_url: String,
    pub banner_url: String,

    #[schema(example = json!(["11999998888"]))]
    pub phone: Vec<String>,
    pub whatsapp: Option<String>,
    pub minimum_order: Decimal,

    // Estruturas opacas para o núcleo (endereço e horários)
    #[schema(value_type = Object)]
    pub address: Json<serde_json::Value>,
    #[schema(value_type = Object)]
    pub business_hours: Json<serde_json::Value>,

    #[schema(example = json!(["pix", "cartao", "dinheiro"]))]
    pub payment_methods: Vec<String>,
    pub is_open: bool,
    pub delivery_enabled: bool,
    pub pickup_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Loja + usuários, para a listagem do admin
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyWithUsers {
    #[serde(flatten)]
    pub company: Company,
    pub users: Vec<PublicUser>,
}

// Dados para inserir uma loja, com os padrões já aplicados
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub slug: String,
    pub name: String,
    pub logo_url: String,
    pub banner_url: String,
    pub phone: Vec<String>,
    pub minimum_order: Decimal,
    pub payment_methods: Vec<String>,
}

impl NewCompany {
    pub fn with_defaults(name: &str, slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            name: name.to_string(),
            logo_url: PLACEHOLDER_LOGO_URL.to_string(),
            banner_url: PLACEHOLDER_BANNER_URL.to_string(),
            phone: Vec::new(),
            minimum_order: Decimal::ZERO,
            payment_methods: Vec::new(),
        }
    }
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = !slug.is_empty()
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        let mut err = ValidationError::new("slug");
        err.message =
            Some("O slug deve conter apenas letras minúsculas, números e hífens.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// Payload do admin para provisionar uma loja + dono
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyPayload {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    #[schema(example = "pizzaria-do-ze")]
    pub slug: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// ---
// Patch esparso: só o que vier é gravado
// ---
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPatch {
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub phone: Option<Vec<String>>,
    pub whatsapp: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    pub minimum_order: Option<Decimal>,
    #[schema(value_type = Option<Object>)]
    pub address: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub business_hours: Option<serde_json::Value>,
    pub payment_methods: Option<Vec<String>>,
    pub is_open: Option<bool>,
    pub delivery_enabled: Option<bool>,
    pub pickup_enabled: Option<bool>,
}

impl CompanyPatch {
    /// Aplica só as chaves presentes. Usado pelo store em memória.
    pub fn apply_to(&self, company: &mut Company) {
        if let Some(v) = &self.name {
            company.name = v.clone();
        }
        if let Some(v) = &self.description {
            company.description = Some(v.clone());
        }
        if let Some(v) = &self.logo_url {
            company.logo_url = v.clone();
        }
        if let Some(v) = &self.banner_url {
            company.banner_url = v.clone();
        }
        if let Some(v) = &self.phone {
            company.phone = v.clone();
        }
        if let Some(v) = &self.whatsapp {
            company.whatsapp = Some(v.clone());
        }
        if let Some(v) = self.minimum_order {
            company.minimum_order = v;
        }
        if let Some(v) = &self.address {
            company.address = Json(v.clone());
        }
        if let Some(v) = &self.business_hours {
            company.business_hours = Json(v.clone());
        }
        if let Some(v) = &self.payment_methods {
            company.payment_methods = v.clone();
        }
        if let Some(v) = self.is_open {
            company.is_open = v;
        }
        if let Some(v) = self.delivery_enabled {
            company.delivery_enabled = v;
        }
        if let Some(v) = self.pickup_enabled {
            company.pickup_enabled = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_must_be_url_safe() {
        assert!(validate_slug("pizzaria-do-ze-2").is_ok());
        assert!(validate_slug("Pizzaria").is_err());
        assert!(validate_slug("pizza ria").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn negative_minimum_order_is_rejected() {
        let patch = CompanyPatch {
            minimum_order: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = CompanyPatch {
            minimum_order: Some(Decimal::new(1500, 2)),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn blank_company_names_are_rejected() {
        let payload = CreateCompanyPayload {
            name: "   ".into(),
            slug: "loja".into(),
            email: "dono@loja.com".into(),
            password: "senha123".into(),
        };
        assert!(payload.validate().is_err());

        let patch = CompanyPatch { name: Some(" \t ".into()), ..Default::default() };
        assert!(patch.validate().is_err());
        assert!(CompanyPatch::default().validate().is_ok());
    }
}
