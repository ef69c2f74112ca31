// src/db/order_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::OrderStore,
    models::order::{Order, OrderStatus},
};

// Lado de leitura dos pedidos: agregados do painel e histórico do cliente.
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    // Pedidos de Hoje (todos os status)
    async fn count_since(&self, company_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE company_id = $1 AND created_at >= $2",
        )
        .bind(company_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_with_status(
        &self,
        company_id: Uuid,
        status: OrderStatus,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE company_id = $1 AND status = $2",
        )
        .bind(company_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // Faturamento: cancelados nunca entram na soma
    async fn revenue(
        &self,
        company_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Decimal, AppError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(total), 0)
            FROM orders
            WHERE company_id = $1
              AND status <> 'cancelled'
              AND ($2::timestamptz IS NULL OR created_at >= $2)
            "#,
        )
        .bind(company_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn recent(&self, company_id: Uuid, limit: i64) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE company_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(company_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }
}
