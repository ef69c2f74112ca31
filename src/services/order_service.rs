// src/services/order_service.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrderStore,
    models::{
        auth::Identity,
        dashboard::DashboardStats,
        order::{Order, OrderStatus},
    },
};

const RECENT_ORDERS_LIMIT: i64 = 5;

/// Meia-noite local do dia de `now`, em UTC.
fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    let midnight = now.date_naive().and_time(NaiveTime::MIN);

    // Em dia de horário de verão a meia-noite pode não existir: o dia começa uma hora depois
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// Cards do painel. `None` = estatísticas indisponíveis (nunca "zero").
    pub async fn get_dashboard_stats(&self, company_id: Uuid) -> Option<DashboardStats> {
        self.get_dashboard_stats_at(company_id, Local::now()).await
    }

    pub async fn get_dashboard_stats_at<Tz: TimeZone>(
        &self,
        company_id: Uuid,
        now: DateTime<Tz>,
    ) -> Option<DashboardStats> {
        let today = start_of_day(&now);

        let result = tokio::try_join!(
            self.orders.count_since(company_id, today),
            self.orders.count_with_status(company_id, OrderStatus::Pending),
            self.orders.revenue(company_id, Some(today)),
            self.orders.revenue(company_id, None),
            self.orders.recent(company_id, RECENT_ORDERS_LIMIT),
        );

        match result {
            Ok((today_orders, pending_orders, today_revenue, total_revenue, recent_orders)) => {
                Some(DashboardStats {
                    today_orders,
                    pending_orders,
                    today_revenue,
                    total_revenue,
                    recent_orders,
                })
            }
            Err(e) => {
                tracing::error!("🔥 Falha ao calcular o painel da loja {}: {:?}", company_id, e);
                None
            }
        }
    }

    /// Histórico de pedidos do próprio cliente, mais recentes primeiro.
    /// Sem sessão válida é `Unauthorized`; falha do banco vira lista vazia (logada).
    pub async fn get_customer_orders(
        &self,
        session: Option<&Identity>,
        user_id: Uuid,
    ) -> Result<Vec<Order>, AppError> {
        match session {
            Some(identity) if identity.user_id == user_id => {}
            _ => return Err(AppError::Unauthorized),
        }

        match self.orders.by_customer(user_id).await {
            Ok(orders) => Ok(orders),
            Err(e) => {
                tracing::error!("🔥 Falha ao buscar pedidos do cliente {}: {:?}", user_id, e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use rust_decimal::Decimal;

    use super::*;
    use crate::{db::MemoryStore, models::auth::Role};

    fn service(store: &MemoryStore) -> OrderService {
        OrderService::new(Arc::new(store.clone()))
    }

    fn reais(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    fn customer_session(user_id: Uuid) -> Identity {
        Identity { user_id, role: Role::Customer, company_id: None }
    }

    #[tokio::test]
    async fn cancelled_orders_never_count_as_revenue() {
        let store = MemoryStore::new();
        let company = store.seed_company("loja").await.id;
        let customer = Uuid::new_v4();
        let now = Utc::now();

        store.record_order(company, customer, OrderStatus::Completed, reais(100), now).await;
        store.record_order(company, customer, OrderStatus::Cancelled, reais(50), now).await;

        let stats = service(&store).get_dashboard_stats_at(company, now).await.unwrap();
        assert_eq!(stats.today_revenue, reais(100));
        assert_eq!(stats.total_revenue, reais(100));
        assert_eq!(stats.today_orders, 2);
    }

    #[tokio::test]
    async fn today_starts_at_local_midnight() {
        let store = MemoryStore::new();
        let company = store.seed_company("loja").await.id;
        let customer = Uuid::new_v4();
        let sao_paulo = FixedOffset::west_opt(3 * 3600).unwrap();
        let now = sao_paulo.with_ymd_and_hms(2026, 3, 10, 1, 0, 0).unwrap();

        // 00:30 local: hoje
        let after = Utc.with_ymd_and_hms(2026, 3, 10, 3, 30, 0).unwrap();
        // 23:00 local da véspera: ontem, embora já seja dia 10 em UTC
        let before = Utc.with_ymd_and_hms(2026, 3, 10, 2, 0, 0).unwrap();
        store.record_order(company, customer, OrderStatus::Completed, reais(30), after).await;
        store.record_order(company, customer, OrderStatus::Completed, reais(70), before).await;

        let stats = service(&store).get_dashboard_stats_at(company, now).await.unwrap();
        assert_eq!(stats.today_orders, 1);
        assert_eq!(stats.today_revenue, reais(30));
        assert_eq!(stats.total_revenue, reais(100));
    }

    #[tokio::test]
    async fn pending_counts_any_day_and_recent_keeps_five_newest() {
        let store = MemoryStore::new();
        let company = store.seed_company("loja").await.id;
        let other_company = store.seed_company("vizinha").await.id;
        let customer = Uuid::new_v4();
        let now = Utc::now();

        for days in 0..7 {
            let status = if days % 2 == 0 { OrderStatus::Pending } else { OrderStatus::Cancelled };
            let created_at = now - Duration::days(days);
            store.record_order(company, customer, status, reais(10), created_at).await;
        }
        // Outra loja não entra na conta
        store.record_order(other_company, customer, OrderStatus::Pending, reais(10), now).await;

        let stats = service(&store).get_dashboard_stats_at(company, now).await.unwrap();
        assert_eq!(stats.pending_orders, 4);
        assert_eq!(stats.recent_orders.len(), 5);
        assert_eq!(stats.recent_orders[0].created_at, now);
        assert!(stats.recent_orders.iter().any(|o| o.status == OrderStatus::Cancelled));
        assert!(stats.recent_orders.iter().all(|o| o.company_id == company));
    }

    #[tokio::test]
    async fn store_failure_yields_no_stats_instead_of_zeros() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        assert!(service(&store).get_dashboard_stats(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn order_history_requires_the_customers_own_session() {
        let store = MemoryStore::new();
        let orders = service(&store);
        let pizzaria = store.seed_company("pizzaria").await.id;
        let sorveteria = store.seed_company("sorveteria").await.id;
        let customer = Uuid::new_v4();
        let now = Utc::now();
        let earlier = now - Duration::hours(2);
        store.record_order(pizzaria, customer, OrderStatus::Completed, reais(20), earlier).await;
        store.record_order(sorveteria, customer, OrderStatus::Pending, reais(15), now).await;

        let session = customer_session(customer);
        let history = orders.get_customer_orders(Some(&session), customer).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, OrderStatus::Pending);

        let result = orders.get_customer_orders(None, customer).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));

        let other = customer_session(Uuid::new_v4());
        let result = orders.get_customer_orders(Some(&other), customer).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn order_history_degrades_to_empty_when_the_store_is_down() {
        let store = MemoryStore::new();
        let orders = service(&store);
        let company = store.seed_company("loja").await.id;
        let customer = Uuid::new_v4();
        store.record_order(company, customer, OrderStatus::Pending, reais(15), Utc::now()).await;

        store.set_unavailable(true);
        let session = customer_session(customer);
        let history = orders.get_customer_orders(Some(&session), customer).await.unwrap();
        assert!(history.is_empty());

        // A sessão continua sendo checada antes do banco
        let result = orders.get_customer_orders(None, customer).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));

        store.set_unavailable(false);
        let history = orders.get_customer_orders(Some(&session), customer).await.unwrap();
        assert_eq!(history.len(), 1);
    }
}
