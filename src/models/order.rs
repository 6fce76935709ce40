//! Table order model.

use serde::{Deserialize, Serialize};

use super::{now_timestamp, Dish, Locale, LocalizedText};

/// Order lifecycle: pending → confirmed → preparing → ready → served, or cancelled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "served" => Some(OrderStatus::Served),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Served | OrderStatus::Cancelled)
    }

    /// Whether an order may move from `self` to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (from, Cancelled) => !from.is_terminal(),
            (Pending, Confirmed) | (Confirmed, Preparing) | (Preparing, Ready) | (Ready, Served) => {
                true
            }
            _ => false,
        }
    }
}

/// A line item with the dish name and price captured at order time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub dish_id: String,
    pub name: LocalizedText,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub table_number: u32,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub currency: String,
    pub status: OrderStatus,
    pub language: Locale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Order {
    /// Build a pending order, snapshotting each dish's name and price from `dishes`.
    ///
    /// Every line must name an active dish with a quantity of at least one, and
    /// all dishes must share a currency.
    pub fn place(request: CreateOrderRequest, dishes: &[Dish]) -> Result<Self, String> {
        if request.table_number == 0 {
            return Err("tableNumber must be at least 1".to_string());
        }
        if request.items.is_empty() {
            return Err("An order needs at least one item".to_string());
        }

        let mut items = Vec::with_capacity(request.items.len());
        let mut currency: Option<&str> = None;
        for line in &request.items {
            if line.quantity == 0 {
                return Err(format!("Quantity for dish {} must be at least 1", line.dish_id));
            }
            let dish = dishes
                .iter()
                .find(|d| d.id == line.dish_id && d.is_active)
                .ok_or_else(|| format!("Dish {} is not available", line.dish_id))?;

            match currency {
                Some(c) if c != dish.price.currency => {
                    return Err("All dishes in an order must share a currency".to_string())
                }
                _ => currency = Some(&dish.price.currency),
            }

            items.push(OrderItem {
                dish_id: dish.id.clone(),
                name: dish.name.clone(),
                quantity: line.quantity,
                price: dish.price.amount,
            });
        }

        let total = items.iter().map(|i| i.price * i.quantity as f64).sum();
        let now = now_timestamp();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            table_number: request.table_number,
            items,
            total,
            currency: currency.unwrap_or("THB").to_string(),
            status: OrderStatus::Pending,
            language: request.language,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub dish_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub table_number: u32,
    pub items: Vec<OrderLineRequest>,
    #[serde(default)]
    pub language: Locale,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}
