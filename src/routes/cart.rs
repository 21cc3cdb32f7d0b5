use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartView, UpdateQuantityRequest},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const CART_SESSION_HEADER: &str = "x-cart-session";

/// Session a cart belongs to, taken from the `x-cart-session` header.
#[derive(Debug, Clone, Copy)]
pub struct CartSession(pub Uuid);

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CART_SESSION_HEADER)
            .ok_or_else(|| AppError::validation("x-cart-session header is required"))?
            .to_str()
            .map_err(|_| AppError::validation("x-cart-session header is not valid text"))?;

        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::validation("x-cart-session must be a UUID"))?;
        Ok(CartSession(id))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_view).delete(clear_cart))
        .route("/items", post(add_to_cart))
        .route(
            "/items/{product_id}",
            patch(update_quantity).delete(remove_from_cart),
        )
}

fn respond(message: &str, view: CartView) -> Json<ApiResponse<CartView>> {
    let meta = Meta::count(view.items.len());
    Json(ApiResponse::success(message, view, Some(meta)))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(
        ("x-cart-session" = String, Header, description = "Cart session UUID")
    ),
    responses(
        (status = 200, description = "Current cart with total", body = ApiResponse<CartView>),
        (status = 400, description = "Missing or invalid session header"),
    ),
    tag = "Cart"
)]
pub async fn cart_view(
    State(state): State<AppState>,
    session: CartSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let view = match state.carts.get(session.0) {
        Some(handle) => CartView::try_from(&*handle.lock().await)?,
        None => CartView::default(),
    };
    Ok(respond("OK", view))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    params(
        ("x-cart-session" = String, Header, description = "Cart session UUID")
    ),
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "One unit added", body = ApiResponse<CartView>),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product out of stock"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: CartSession,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let handle = state.carts.cart(session.0);
    let mut cart = handle.lock().await;
    cart.add(&state.catalog, payload.product_id).await?;
    Ok(respond("Added to cart", CartView::try_from(&*cart)?))
}

#[utoipa::path(
    patch,
    path = "/api/cart/items/{product_id}",
    params(
        ("x-cart-session" = String, Header, description = "Cart session UUID"),
        ("product_id" = i64, Path, description = "Product ID")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity set; below 1 removes the line", body = ApiResponse<CartView>),
        (status = 400, description = "Resulting total too large"),
    ),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<i64>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let view = match state.carts.get(session.0) {
        Some(handle) => {
            let mut cart = handle.lock().await;
            cart.update_quantity(product_id, payload.quantity)?;
            CartView::try_from(&*cart)?
        }
        None => CartView::default(),
    };
    Ok(respond("Cart updated", view))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}",
    params(
        ("x-cart-session" = String, Header, description = "Cart session UUID"),
        ("product_id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Line removed (no-op when absent)", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<i64>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let view = match state.carts.get(session.0) {
        Some(handle) => {
            let mut cart = handle.lock().await;
            cart.remove(product_id);
            CartView::try_from(&*cart)?
        }
        None => CartView::default(),
    };
    Ok(respond("Removed from cart", view))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    params(
        ("x-cart-session" = String, Header, description = "Cart session UUID")
    ),
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    session: CartSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    state.carts.discard(session.0);
    Ok(respond("Cart cleared", CartView::default()))
}
