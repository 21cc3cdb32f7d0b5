use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::products::{ProductList, ProductQuery, ReviewRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Product, ProductDraft, Review},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/{id}", get(get_product))
        .route("/{id}/reviews", post(add_review))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("search" = Option<String>, Query, description = "Case-sensitive substring of name or description"),
        ("category" = Option<String>, Query, description = "Exact category"),
    ),
    responses(
        (status = 200, description = "List products, newest first", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let search = query.search.as_deref().filter(|s| !s.is_empty());
    let category = query.category.as_deref().filter(|c| !c.is_empty());

    let items = match (search, category) {
        (Some(term), _) => state.catalog.search(term).await?,
        (None, Some(category)) => state.catalog.list_by_category(category).await?,
        (None, None) => state.catalog.list_all().await?,
    };

    let meta = Meta::count(items.len());
    Ok(Json(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = state.catalog.get(id).await?;
    Ok(Json(ApiResponse::success("Product", product, None)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductDraft,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<Product>),
        (status = 400, description = "Invalid product"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProductDraft>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let id = state.catalog.create(&user, payload).await?;
    let product = state.catalog.get(id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Product created",
            product,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/reviews",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review stored", body = ApiResponse<Review>),
        (status = 400, description = "Rating out of range"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn add_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<ReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let review = state
        .catalog
        .add_review(&user, id, payload.rating, &payload.comment)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Review stored", review, None)),
    ))
}
