// src/handlers/dashboard.rs

use axum::{extract::State, Json};

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::tenancy::TenantContext,
    models::{
        company::{Company, CompanyPatch},
        dashboard::DashboardStats,
    },
};

// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses(
        (
            status = 200,
            description = "Cards do painel. `data: null` = estatísticas indisponíveis",
            body = Option<DashboardStats>
        ),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> ApiResponse<Option<DashboardStats>> {
    ApiResponse::ok(app_state.order_service.get_dashboard_stats(tenant.company_id).await)
}

// PATCH /api/dashboard/company
#[utoipa::path(
    patch,
    path = "/api/dashboard/company",
    tag = "Dashboard",
    request_body = CompanyPatch,
    responses(
        (status = 200, description = "Dados da própria loja atualizados", body = Company),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_my_company(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(patch): Json<CompanyPatch>,
) -> Result<ApiResponse<Company>, AppError> {
    let company = app_state
        .company_service
        .update_company(&tenant.identity, tenant.company_id, patch)
        .await?;

    Ok(ApiResponse::ok(company))
}
