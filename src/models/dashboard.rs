// src/models/dashboard.rs

use serde::Serialize;
use rust_decimal::Decimal;
use utoipa::ToSchema;

use crate::models::order::Order;

// Os Cards do Topo do painel da loja
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today_orders: i64,        // Pedidos criados desde a meia-noite local
    pub pending_orders: i64,      // Pedidos ainda pendentes (qualquer data)
    pub today_revenue: Decimal,   // Faturamento de hoje, sem cancelados
    pub total_revenue: Decimal,   // Faturamento total, sem cancelados
    pub recent_orders: Vec<Order>, // Os 5 mais recentes, qualquer status
}
