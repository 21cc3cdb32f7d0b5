use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{CartItem, Money},
    services::cart::CartManager,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Money,
    pub item_count: i64,
}

impl TryFrom<&CartManager> for CartView {
    type Error = AppError;

    fn try_from(cart: &CartManager) -> Result<Self, Self::Error> {
        Ok(Self {
            items: cart.snapshot(),
            total: cart.total()?,
            item_count: cart.item_count(),
        })
    }
}
