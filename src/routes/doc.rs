use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartView, UpdateQuantityRequest},
        orders::{CheckoutRequest, CheckoutResponse, OrderList, UpdateOrderStatusRequest},
        products::{ProductList, ProductQuery, ReviewRequest},
    },
    models::{CartItem, Order, OrderStatus, Product, ProductDraft, Review, User, UserRole},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, orders, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        cart::cart_view,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        cart::clear_cart,
        products::list_products,
        products::create_product,
        products::get_product,
        products::add_review,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::update_order_status
    ),
    components(
        schemas(
            User,
            UserRole,
            Product,
            ProductDraft,
            Review,
            CartItem,
            Order,
            OrderStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateQuantityRequest,
            CartView,
            CheckoutRequest,
            CheckoutResponse,
            UpdateOrderStatusRequest,
            OrderList,
            ProductList,
            ProductQuery,
            ReviewRequest,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<Order>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Session cart endpoints"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Auth", description = "Registration and login"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
