// src/handlers/catalog.rs

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
    middleware::tenancy::TenantContext,
    models::catalog::{
        Category, CategoryPayload, CategoryWithCount, NewProduct, Product, ProductPatch,
    },
};

// ---
// Categorias
// ---

// GET /api/dashboard/categories
#[utoipa::path(
    get,
    path = "/api/dashboard/categories",
    tag = "Catalog",
    responses(
        (
            status = 200,
            description = "Categorias da loja, com contagem de produtos",
            body = Vec<CategoryWithCount>
        ),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> ApiResponse<Vec<CategoryWithCount>> {
    ApiResponse::ok(app_state.catalog_service.list_categories(tenant.company_id).await)
}

// POST /api/dashboard/categories
#[utoipa::path(
    post,
    path = "/api/dashboard/categories",
    tag = "Catalog",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CategoryPayload>,
) -> Result<Response, AppError> {
    let category = app_state
        .catalog_service
        .create_category(tenant.company_id, payload)
        .await?;

    Ok(created(category))
}

// PUT /api/dashboard/categories/{id}
#[utoipa::path(
    put,
    path = "/api/dashboard/categories/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da categoria")),
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Categoria atualizada", body = Category),
        (status = 403, description = "Registro não encontrado ou acesso negado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryPayload>,
) -> Result<ApiResponse<Category>, AppError> {
    let category = app_state
        .catalog_service
        .update_category(id, tenant.company_id, payload)
        .await?;

    Ok(ApiResponse::ok(category))
}

// DELETE /api/dashboard/categories/{id}
#[utoipa::path(
    delete,
    path = "/api/dashboard/categories/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da categoria")),
    responses(
        (status = 200, description = "Categoria removida; os produtos ficam sem categoria"),
        (status = 403, description = "Registro não encontrado ou acesso negado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    app_state.catalog_service.delete_category(id, tenant.company_id).await?;
    Ok(ApiResponse::ok(()))
}

// ---
// Produtos
// ---

// GET /api/dashboard/products
#[utoipa::path(
    get,
    path = "/api/dashboard/products",
    tag = "Catalog",
    responses(
        (status = 200, description = "Todos os produtos da loja", body = Vec<Product>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> ApiResponse<Vec<Product>> {
    ApiResponse::ok(app_state.catalog_service.list_products(tenant.company_id).await)
}

// POST /api/dashboard/products
#[utoipa::path(
    post,
    path = "/api/dashboard/products",
    tag = "Catalog",
    request_body = NewProduct,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Categoria não encontrada ou acesso negado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<NewProduct>,
) -> Result<Response, AppError> {
    let product = app_state
        .catalog_service
        .create_product(tenant.company_id, payload)
        .await?;

    Ok(created(product))
}

// PUT /api/dashboard/products/{id}
#[utoipa::path(
    put,
    path = "/api/dashboard/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = ProductPatch,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 403, description = "Registro não encontrado ou acesso negado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProductPatch>,
) -> Result<ApiResponse<Product>, AppError> {
    let product = app_state
        .catalog_service
        .update_product(id, tenant.company_id, patch)
        .await?;

    Ok(ApiResponse::ok(product))
}

// DELETE /api/dashboard/products/{id}
#[utoipa::path(
    delete,
    path = "/api/dashboard/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto removido"),
        (status = 403, description = "Registro não encontrado ou acesso negado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    app_state.catalog_service.delete_product(id, tenant.company_id).await?;
    Ok(ApiResponse::ok(()))
}
