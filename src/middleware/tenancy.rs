// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::Identity,
};

// A loja do painel vem sempre da sessão do dono, nunca de um parâmetro do cliente.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub identity: Identity,
    pub company_id: Uuid,
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        let identity = user.identity();
        let company_id = identity.require_company()?;

        Ok(TenantContext { identity, company_id })
    }
}
