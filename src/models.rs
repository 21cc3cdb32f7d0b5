use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Prices and totals are integer minor units (cents).
pub type Money = i64;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// Order lifecycle. Checkout always produces `Paid`; `Pending` exists for
/// completeness but nothing creates it today.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// States reachable in one step from `self`.
    pub fn next_states(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Paid, OrderStatus::Cancelled],
            OrderStatus::Paid => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.next_states().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.next_states().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image_url: String,
    pub category: String,
    pub stock: i32,
    pub rating: f64,
    pub reviews_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// Admin input for a new catalog entry; the store assigns id and timestamps.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image_url: String,
    pub category: String,
    pub stock: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A line item: the product reference plus the name/price/image seen when it
/// was added. Used both in live carts and inside persisted orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub product_id: i64,
    pub product_name: String,
    pub product_price: Money,
    pub product_image: String,
    pub quantity: i32,
}

impl CartItem {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            product_price: product.price,
            product_image: product.image_url.clone(),
            quantity: 1,
        }
    }

    /// `price * quantity`, or a validation error when it does not fit.
    pub fn subtotal(&self) -> AppResult<Money> {
        self.product_price
            .checked_mul(Money::from(self.quantity))
            .ok_or_else(amount_too_large)
    }
}

/// Sum of the subtotals of `items`, failing instead of wrapping.
pub fn lines_total<'a>(items: impl IntoIterator<Item = &'a CartItem>) -> AppResult<Money> {
    items.into_iter().try_fold(0, |total: Money, item| {
        total.checked_add(item.subtotal()?).ok_or_else(amount_too_large)
    })
}

pub(crate) fn amount_too_large() -> AppError {
    AppError::validation("amount is too large")
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<CartItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn items_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }
}

/// An order that has not been written yet.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub items: Vec<CartItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub shipping_address: String,
}

impl NewOrder {
    pub fn items_total(&self) -> AppResult<Money> {
        lines_total(&self.items)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
