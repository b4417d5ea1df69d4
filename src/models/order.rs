use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// Persisted order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderLine>,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order, denormalized with the item name and unit price
/// as they were at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub item_id: String,
    #[serde(default)]
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Not-yet-persisted order, as produced by checkout. The repository
/// assigns the id, timestamps and initial status.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub user_id: String,
    pub items: Vec<OrderLine>,
    pub total_price: Decimal,
}

impl OrderDraft {
    /// Sum of price * quantity over all lines.
    pub fn expected_total(&self) -> Decimal {
        self.items.iter().map(OrderLine::line_total).sum()
    }
}
