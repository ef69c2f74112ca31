// src/handlers/storefront.rs

use axum::extract::{Path, State};

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    models::{catalog::Menu, company::Company},
};

async fn resolve_store(app_state: &AppState, slug: &str) -> Result<Company, AppError> {
    app_state
        .company_service
        .get_company_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound("Loja"))
}

// GET /api/store/{slug}
#[utoipa::path(
    get,
    path = "/api/store/{slug}",
    tag = "Storefront",
    params(("slug" = String, Path, description = "Slug da loja")),
    responses(
        (status = 200, description = "Dados públicos da loja", body = Company),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn get_store(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<Company>, AppError> {
    let company = resolve_store(&app_state, &slug).await?;
    Ok(ApiResponse::ok(company))
}

// GET /api/store/{slug}/menu
#[utoipa::path(
    get,
    path = "/api/store/{slug}/menu",
    tag = "Storefront",
    params(("slug" = String, Path, description = "Slug da loja")),
    responses(
        (status = 200, description = "Cardápio público (só produtos disponíveis)", body = Menu),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn get_menu(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<Menu>, AppError> {
    let company = resolve_store(&app_state, &slug).await?;
    let menu = app_state.catalog_service.menu_for(company).await;
    Ok(ApiResponse::ok(menu))
}
