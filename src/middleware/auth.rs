// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{Identity, User},
};

// Extrator do usuário autenticado: lê o `Authorization: Bearer` e valida o token
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn identity(&self) -> Identity {
        Identity::from(&self.0)
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        let app_state = AppState::from_ref(state);
        let user = app_state.auth_service.validate_token(bearer.token()).await?;

        Ok(AuthenticatedUser(user))
    }
}
