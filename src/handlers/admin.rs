// src/handlers/admin.rs

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        response::{created, ApiResponse},
    },
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::ResetPasswordPayload,
        company::{Company, CompanyPatch, CompanyWithUsers, CreateCompanyPayload},
    },
};

// GET /api/admin/companies
#[utoipa::path(
    get,
    path = "/api/admin/companies",
    tag = "Admin",
    responses(
        (
            status = 200,
            description = "Lojas com seus usuários, mais recentes primeiro",
            body = Vec<CompanyWithUsers>
        ),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<ApiResponse<Vec<CompanyWithUsers>>, AppError> {
    let companies = app_state.company_service.list_companies(&user.identity()).await?;
    Ok(ApiResponse::ok(companies))
}

// POST /api/admin/companies
#[utoipa::path(
    post,
    path = "/api/admin/companies",
    tag = "Admin",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Loja e dono criados", body = Company),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Slug ou e-mail já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<Response, AppError> {
    let company = app_state
        .company_service
        .create_company(&user.identity(), payload)
        .await?;

    Ok(created(company))
}

// GET /api/admin/companies/{id}
#[utoipa::path(
    get,
    path = "/api/admin/companies/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID da loja")),
    responses(
        (status = 200, description = "Loja encontrada", body = Company),
        (status = 404, description = "Loja não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Company>, AppError> {
    let company = app_state
        .company_service
        .get_company(&user.identity(), id)
        .await?
        .ok_or(AppError::NotFound("Loja"))?;

    Ok(ApiResponse::ok(company))
}

// PATCH /api/admin/companies/{id}
#[utoipa::path(
    patch,
    path = "/api/admin/companies/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID da loja")),
    request_body = CompanyPatch,
    responses(
        (status = 200, description = "Loja atualizada", body = Company),
        (status = 404, description = "Loja não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<CompanyPatch>,
) -> Result<ApiResponse<Company>, AppError> {
    let company = app_state
        .company_service
        .update_company(&user.identity(), id, patch)
        .await?;

    Ok(ApiResponse::ok(company))
}

// POST /api/admin/users/{id}/password
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/password",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Senha redefinida"),
        (status = 400, description = "Senha inválida"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<ApiResponse<()>, AppError> {
    app_state
        .auth_service
        .reset_password(&user.identity(), id, &payload.new_password)
        .await?;

    Ok(ApiResponse::ok(()))
}
