//src/main.rs

use axum::{
    routing::{get, patch, post, put},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::{
    config::{AppConfig, AppState},
    docs::ApiDoc,
};

fn router(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/customer/login", post(handlers::auth::customer_login))
        .route("/register", post(handlers::auth::register));

    // Perfil e pedidos do usuário logado
    let user_routes = Router::new()
        .route("/me", get(handlers::users::get_me).put(handlers::users::update_me))
        .route("/me/orders", get(handlers::users::get_my_orders));

    // Vitrine
    let store_routes = Router::new()
        .route("/{slug}", get(handlers::storefront::get_store))
        .route("/{slug}/menu", get(handlers::storefront::get_menu));

    // Painel do dono: a loja sai da sessão (TenantContext)
    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::dashboard::get_stats))
        .route("/company", patch(handlers::dashboard::update_my_company))
        .route(
            "/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/categories/{id}",
            put(handlers::catalog::update_category).delete(handlers::catalog::delete_category),
        )
        .route(
            "/products",
            get(handlers::catalog::list_products).post(handlers::catalog::create_product),
        )
        .route(
            "/products/{id}",
            put(handlers::catalog::update_product).delete(handlers::catalog::delete_product),
        );

    let admin_routes = Router::new()
        .route(
            "/companies",
            get(handlers::admin::list_companies).post(handlers::admin::create_company),
        )
        .route(
            "/companies/{id}",
            get(handlers::admin::get_company).patch(handlers::admin::update_company),
        )
        .route("/users/{id}/password", post(handlers::admin::reset_password));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/store", store_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/admin", admin_routes)
        .with_state(app_state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = AppConfig::from_env().expect("Configuração inválida.");

    let app_state = AppState::new(config)
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    if let Some(pool) = &app_state.db_pool {
        sqlx::migrate!()
            .run(pool)
            .await
            .expect("Falha ao rodar as migrações do banco de dados.");

        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    let bind_addr = app_state.config.bind_addr;

    let admin = (&app_state.config.admin_email, &app_state.config.admin_password);
    if let (Some(email), Some(password)) = admin {
        app_state
            .auth_service
            .ensure_admin(email, password)
            .await
            .expect("Falha ao garantir o usuário admin.");
    }

    let app = router(app_state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", bind_addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
