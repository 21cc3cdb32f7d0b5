mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use storefront_core::routes::{cart::CART_SESSION_HEADER, create_app};
use tower::ServiceExt;
use uuid::Uuid;

use common::{admin, app_state, draft, product, setup};

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

#[tokio::test]
async fn missing_product_is_404() -> anyhow::Result<()> {
    let db = setup().await?;
    let app = create_app(app_state(&db));

    let (status, body) = send(&app, "GET", "/api/products/999", &[], None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
    Ok(())
}

#[tokio::test]
async fn cart_routes_need_a_session_header() -> anyhow::Result<()> {
    let db = setup().await?;
    let app = create_app(app_state(&db));

    let (status, _) = send(&app, "GET", "/api/cart", &[], None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "GET",
        "/api/cart",
        &[(CART_SESSION_HEADER, "not-a-uuid")],
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn reading_a_cart_does_not_create_a_session() -> anyhow::Result<()> {
    let db = setup().await?;
    let state = app_state(&db);
    let app = create_app(state.clone());

    for _ in 0..5 {
        let session = Uuid::new_v4().to_string();
        let headers = [(CART_SESSION_HEADER, session.as_str())];
        let (status, body) = send(&app, "GET", "/api/cart", &headers, None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["item_count"], 0);

        let (status, _) = send(&app, "DELETE", "/api/cart/items/1", &headers, None).await?;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            &app,
            "PATCH",
            "/api/cart/items/1",
            &headers,
            Some(json!({ "quantity": 3 })),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
    }
    assert!(state.carts.is_empty());
    Ok(())
}

#[tokio::test]
async fn bad_tokens_are_rejected_on_protected_routes() -> anyhow::Result<()> {
    let db = setup().await?;
    let app = create_app(app_state(&db));

    let (status, _) = send(&app, "GET", "/api/orders", &[], None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "GET",
        "/api/orders",
        &[("authorization", "Bearer garbage")],
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn register_login_shop_and_check_out() -> anyhow::Result<()> {
    let db = setup().await?;
    let admin = admin(&db).await?;
    let widget = product(&db, &admin, draft("Widget", 1000, 3)).await?;
    let state = app_state(&db);
    let app = create_app(state.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        &[],
        Some(json!({
            "email": "jean@example.com",
            "password": "client123",
            "first_name": "Jean",
            "last_name": "Dupont"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "customer");
    assert!(body["data"].get("password_hash").is_none());

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        &[],
        Some(json!({ "email": "jean@example.com", "password": "wrong" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        &[],
        Some(json!({ "email": "jean@example.com", "password": "client123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("token missing"))?
        .to_owned();
    assert!(token.starts_with("Bearer "));

    let session = Uuid::new_v4().to_string();
    let cart_headers = [(CART_SESSION_HEADER, session.as_str())];
    for _ in 0..3 {
        let (status, _) = send(
            &app,
            "POST",
            "/api/cart/items",
            &cart_headers,
            Some(json!({ "product_id": widget })),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, "GET", "/api/cart", &cart_headers, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3000);
    assert_eq!(body["data"]["item_count"], 3);
    assert_eq!(state.carts.len(), 1);

    // Anonymous checkout keeps the cart.
    let (status, _) = send(
        &app,
        "POST",
        "/api/orders/checkout",
        &cart_headers,
        Some(json!({ "shipping_address": "1 Rue de Rivoli" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let checkout_headers = [
        (CART_SESSION_HEADER, session.as_str()),
        ("authorization", token.as_str()),
    ];
    let (status, body) = send(
        &app,
        "POST",
        "/api/orders/checkout",
        &checkout_headers,
        Some(json!({ "shipping_address": "1 Rue de Rivoli" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["data"]["order_id"]
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("order id missing"))?;

    let (_, body) = send(&app, "GET", "/api/cart", &cart_headers, None).await?;
    assert_eq!(body["data"]["item_count"], 0);
    assert!(state.carts.is_empty());

    let auth = [("authorization", token.as_str())];
    let (status, body) = send(&app, "GET", "/api/orders", &auth, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 1);
    assert_eq!(body["data"]["items"][0]["id"], order_id);
    assert_eq!(body["data"]["items"][0]["status"], "paid");
    assert_eq!(body["data"]["items"][0]["total"], 3000);

    let uri = format!("/api/orders/{order_id}");
    let (status, body) = send(&app, "GET", &uri, &auth, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["quantity"], 3);

    // Customers cannot move orders along.
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}/status"),
        &auth,
        Some(json!({ "status": "shipped" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
