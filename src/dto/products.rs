use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

/// `search` wins over `category` when both are given.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub rating: i32,
    pub comment: String,
}
