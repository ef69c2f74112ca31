// src/handlers/users.rs

use axum::{extract::State, Json};

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::{PublicUser, UpdateProfilePayload},
        order::Order,
    },
};

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Dados do usuário logado", body = PublicUser),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> ApiResponse<PublicUser> {
    ApiResponse::ok(PublicUser::from(&user))
}

// PUT /api/users/me
#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "Users",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Perfil atualizado", body = PublicUser),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Não autorizado"),
        (status = 409, description = "CPF já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_me(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let identity = user.identity();
    let updated = app_state
        .auth_service
        .update_profile(Some(&identity), identity.user_id, payload)
        .await?;

    Ok(ApiResponse::ok(updated))
}

// GET /api/users/me/orders
#[utoipa::path(
    get,
    path = "/api/users/me/orders",
    tag = "Users",
    responses(
        (status = 200, description = "Histórico de pedidos do cliente", body = Vec<Order>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_orders(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<ApiResponse<Vec<Order>>, AppError> {
    let identity = user.identity();
    let orders = app_state
        .order_service
        .get_customer_orders(Some(&identity), identity.user_id)
        .await?;

    Ok(ApiResponse::ok(orders))
}
