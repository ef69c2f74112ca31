// src/handlers/auth.rs

use axum::{extract::State, response::Response, Json};
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        response::{created, ApiResponse},
    },
    config::AppState,
    models::auth::{AuthSession, CustomerLoginPayload, LoginPayload, RegisterCustomerPayload},
};

// "Usuário não existe" e "senha errada" saem iguais para o cliente
fn hide_which_credential_failed(err: AppError) -> AppError {
    match err {
        AppError::NotFound(_) | AppError::InvalidCredentials => AppError::InvalidCredentials,
        other => other,
    }
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login realizado (admin ou dono de loja)", body = AuthSession),
        (status = 401, description = "E-mail ou senha inválidos")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<ApiResponse<AuthSession>, AppError> {
    payload.validate()?;

    let session = app_state
        .auth_service
        .authenticate(&payload.email, &payload.password)
        .await
        .map_err(hide_which_credential_failed)?;

    Ok(ApiResponse::ok(session))
}

// POST /api/auth/customer/login
#[utoipa::path(
    post,
    path = "/api/auth/customer/login",
    tag = "Auth",
    request_body = CustomerLoginPayload,
    responses(
        (status = 200, description = "Login do cliente pelo CPF", body = AuthSession),
        (status = 401, description = "CPF ou senha inválidos")
    )
)]
pub async fn customer_login(
    State(app_state): State<AppState>,
    Json(payload): Json<CustomerLoginPayload>,
) -> Result<ApiResponse<AuthSession>, AppError> {
    payload.validate()?;

    let session = app_state
        .auth_service
        .authenticate_customer(&payload.cpf, &payload.password)
        .await
        .map_err(hide_which_credential_failed)?;

    Ok(ApiResponse::ok(session))
}

// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterCustomerPayload,
    responses(
        (
            status = 201,
            description = "Cliente cadastrado, já com sessão aberta",
            body = AuthSession
        ),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "CPF já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterCustomerPayload>,
) -> Result<Response, AppError> {
    let user = app_state.auth_service.register_customer(payload).await?;
    let session = app_state.auth_service.open_session(&user).await?;

    Ok(created(session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_and_wrong_password_look_the_same() {
        let unknown = hide_which_credential_failed(AppError::NotFound("Usuário"));
        let wrong = hide_which_credential_failed(AppError::InvalidCredentials);

        assert_eq!(unknown.public_message(), wrong.public_message());
        assert_eq!(unknown.status_code(), wrong.status_code());
        assert!(matches!(
            hide_which_credential_failed(AppError::Unauthorized),
            AppError::Unauthorized
        ));
    }
}
