// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::customer_login,
        handlers::auth::register,

        // --- Users ---
        handlers::users::get_me,
        handlers::users::update_me,
        handlers::users::get_my_orders,

        // --- Storefront ---
        handlers::storefront::get_store,
        handlers::storefront::get_menu,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
        handlers::dashboard::update_my_company,

        // --- Catalog ---
        handlers::catalog::list_categories,
        handlers::catalog::create_category,
        handlers::catalog::update_category,
        handlers::catalog::delete_category,
        handlers::catalog::list_products,
        handlers::catalog::create_product,
        handlers::catalog::update_product,
        handlers::catalog::delete_product,

        // --- Admin ---
        handlers::admin::list_companies,
        handlers::admin::create_company,
        handlers::admin::get_company,
        handlers::admin::update_company,
        handlers::admin::reset_password,
    ),
    components(
        schemas(
            // Auth
            models::auth::LoginPayload,
            models::auth::CustomerLoginPayload,
            models::auth::RegisterCustomerPayload,
            models::auth::UpdateProfilePayload,
            models::auth::ResetPasswordPayload,
            models::auth::AuthSession,
            models::auth::PublicUser,
            models::auth::Role,

            // Lojas
            models::company::Company,
            models::company::CompanyWithUsers,
            models::company::CreateCompanyPayload,
            models::company::CompanyPatch,

            // Cardápio
            models::catalog::Category,
            models::catalog::CategoryWithCount,
            models::catalog::CategoryPayload,
            models::catalog::Product,
            models::catalog::NewProduct,
            models::catalog::ProductPatch,
            models::catalog::Menu,

            // Pedidos
            models::order::Order,
            models::order::OrderStatus,
            models::dashboard::DashboardStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login e cadastro de clientes"),
        (name = "Users", description = "Perfil e pedidos do usuário logado"),
        (name = "Storefront", description = "Vitrine pública da loja"),
        (name = "Dashboard", description = "Painel do dono da loja"),
        (name = "Catalog", description = "Categorias e produtos do cardápio"),
        (name = "Admin", description = "Provisionamento de lojas"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
