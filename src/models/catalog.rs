// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{common::normalize::not_blank, models::company::Company};

// --- 1. Categorias ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(example = "Pizzas")]
    pub name: String,
    // `order` é palavra reservada no SQL
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Categoria + contagem de produtos (listagem do painel e da loja)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub category: Category,
    pub product_count: i64,
}

// --- 2. Produtos ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub company_id: Uuid,
    pub category_id: Option<Uuid>,
    #[schema(example = "Pizza Margherita")]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O cardápio público de uma loja
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Menu {
    pub company: Company,
    pub categories: Vec<CategoryWithCount>,
    pub products: Vec<Product>,
}

fn validate_price(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O preço não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CategoryPayload {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub category_id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub category_id: Option<Uuid>,
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

impl ProductPatch {
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(v) = self.category_id {
            product.category_id = Some(v);
        }
        if let Some(v) = &self.name {
            product.name = v.clone();
        }
        if let Some(v) = &self.description {
            product.description = Some(v.clone());
        }
        if let Some(v) = self.price {
            product.price = v;
        }
        if let Some(v) = &self.image_url {
            product.image_url = Some(v.clone());
        }
        if let Some(v) = self.is_available {
            product.is_available = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        let category = CategoryPayload { name: "   ".into(), order: 0 };
        assert!(category.validate().is_err());

        let product = NewProduct {
            category_id: None,
            name: "\t".into(),
            description: None,
            price: Decimal::new(1000, 2),
            image_url: None,
            is_available: true,
        };
        assert!(product.validate().is_err());

        let patch = ProductPatch { name: Some("  ".into()), ..Default::default() };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut product = Product {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            category_id: None,
            name: "Coxinha".into(),
            description: Some("Frango".into()),
            price: Decimal::new(650, 2),
            image_url: None,
            is_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let patch = ProductPatch { is_available: Some(false), ..Default::default() };
        patch.apply_to(&mut product);

        assert!(!product.is_available);
        assert_eq!(product.name, "Coxinha");
        assert_eq!(product.description.as_deref(), Some("Frango"));
    }
}
