// src/config.rs

use std::{env, net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::cache::CacheLayer,
    db::{
        CatalogRepository, CatalogStore, CompanyRepository, CompanyStore, MemoryStore,
        OrderRepository, OrderStore, UserRepository, UserStore,
    },
    services::{auth::AuthService, CatalogService, CompanyService, OrderService},
};

const CACHE_MAX_ENTRIES: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    // Tudo em memória: desenvolvimento local e testes
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => {
                anyhow::bail!("STORE_BACKEND inválido: '{}' (use 'postgres' ou 'memory')", other)
            }
        }
    }
}

// Configuração lida do ambiente (e do `.env`, se existir)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub cache_ttl: Duration,
    pub db_max_connections: u32,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválido ('{}'): {}", key, raw, e)),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    pub fn from_source<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend =
            parse_or(get("STORE_BACKEND"), "STORE_BACKEND", StoreBackend::Postgres)?;

        let database_url = get("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL deve ser definida");
        }

        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let default_addr = SocketAddr::from(([0, 0, 0, 0], 3000));

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: parse_or(get("BIND_ADDR"), "BIND_ADDR", default_addr)?,
            store_backend,
            cache_ttl: Duration::from_secs(parse_or(get("CACHE_TTL_SECS"), "CACHE_TTL_SECS", 300)?),
            db_max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 5)?,
            admin_email: get("ADMIN_EMAIL"),
            admin_password: get("ADMIN_PASSWORD"),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    // Só existe com o backend Postgres (migrações no `main`)
    pub db_pool: Option<PgPool>,
    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub catalog_service: CatalogService,
    pub order_service: OrderService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        match config.store_backend {
            StoreBackend::Postgres => {
                let database_url = config
                    .database_url
                    .clone()
                    .context("DATABASE_URL deve ser definida")?;

                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(&database_url)
                    .await?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                Ok(Self::assemble(
                    config,
                    Some(db_pool.clone()),
                    Arc::new(UserRepository::new(db_pool.clone())),
                    Arc::new(CompanyRepository::new(db_pool.clone())),
                    Arc::new(CatalogRepository::new(db_pool.clone())),
                    Arc::new(OrderRepository::new(db_pool)),
                ))
            }
            StoreBackend::Memory => {
                tracing::warn!("⚠️ STORE_BACKEND=memory: os dados somem ao reiniciar");
                Ok(Self::in_memory(config, MemoryStore::new()))
            }
        }
    }

    pub fn in_memory(config: AppConfig, store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self::assemble(config, None, store.clone(), store.clone(), store.clone(), store)
    }

    // --- Monta o gráfico de dependências ---
    fn assemble(
        config: AppConfig,
        db_pool: Option<PgPool>,
        users: Arc<dyn UserStore>,
        companies: Arc<dyn CompanyStore>,
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        let cache = CacheLayer::new(config.cache_ttl, CACHE_MAX_ENTRIES);

        Self {
            auth_service: AuthService::new(users, companies.clone(), config.jwt_secret.clone()),
            company_service: CompanyService::new(companies, cache.clone()),
            catalog_service: CatalogService::new(catalog, cache),
            order_service: OrderService::new(orders),
            config: Arc::new(config),
            db_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = AppConfig::from_source(source(&[
            ("DATABASE_URL", "postgres://localhost/cardapio"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.db_max_connections, 5);
        assert!(config.admin_email.is_none());
    }

    #[test]
    fn memory_backend_does_not_need_a_database() {
        let config = AppConfig::from_source(source(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "segredo"),
            ("CACHE_TTL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn missing_or_malformed_values_are_errors() {
        assert!(AppConfig::from_source(source(&[("JWT_SECRET", "s")])).is_err());
        assert!(AppConfig::from_source(source(&[("STORE_BACKEND", "memory")])).is_err());
        assert!(
            AppConfig::from_source(source(&[
                ("STORE_BACKEND", "memory"),
                ("JWT_SECRET", "s"),
                ("CACHE_TTL_SECS", "cinco"),
            ]))
            .is_err()
        );
        let unknown_backend = source(&[("STORE_BACKEND", "redis"), ("JWT_SECRET", "s")]);
        assert!(AppConfig::from_source(unknown_backend).is_err());
    }

    #[tokio::test]
    async fn memory_state_wires_every_service_to_the_same_store() {
        let config =
            AppConfig::from_source(source(&[("STORE_BACKEND", "memory"), ("JWT_SECRET", "s")]))
                .unwrap();
        let state = AppState::new(config).await.unwrap();
        assert!(state.db_pool.is_none());

        state.auth_service.ensure_admin("admin@cardapio.com", "admin123").await.unwrap();
        let session = state
            .auth_service
            .authenticate("admin@cardapio.com", "admin123")
            .await
            .unwrap();
        assert_eq!(session.user.role, "admin");
    }
}
