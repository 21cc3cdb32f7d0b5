#![allow(dead_code)]

use std::time::Duration;

use storefront_core::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    middleware::auth::AuthUser,
    models::{ProductDraft, User, UserRole},
    services::{catalog::ProductCatalog, order_service::OrderService, user_store::UserStore},
    state::AppState,
    store::Store,
};
use tempfile::TempDir;

pub const MIGRATIONS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/migrations");

/// A migrated SQLite database living in a temp dir for the duration of a test.
pub struct TestDb {
    pub store: Store,
    pub catalog: ProductCatalog,
    pub users: UserStore,
    pub orders: OrderService,
    pub url: String,
    _dir: TempDir,
}

pub async fn setup() -> anyhow::Result<TestDb> {
    let dir = tempfile::tempdir()?;
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("storefront.db").display()
    );
    let conn = create_orm_conn(&url).await?;
    run_migrations(&conn, MIGRATIONS).await?;

    let store = Store::new(conn);
    Ok(TestDb {
        catalog: ProductCatalog::new(store.clone()),
        users: UserStore::new(store.clone()),
        orders: OrderService::new(store.clone(), false),
        store,
        url,
        _dir: dir,
    })
}

pub fn test_config(url: &str, strict_stock: bool) -> AppConfig {
    AppConfig {
        database_url: url.to_owned(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        migrations_dir: MIGRATIONS.into(),
        strict_stock,
        cart_idle: Duration::from_secs(60 * 60),
    }
}

pub fn app_state(db: &TestDb) -> AppState {
    AppState::new(db.store.conn().clone(), test_config(&db.url, false))
}

pub fn draft(name: &str, price: i64, stock: i32) -> ProductDraft {
    ProductDraft {
        name: name.to_owned(),
        description: format!("{name} description"),
        price,
        image_url: format!("https://img.example/{}.png", name.to_lowercase()),
        category: "General".into(),
        stock,
    }
}

pub async fn admin(db: &TestDb) -> anyhow::Result<AuthUser> {
    let user = db
        .users
        .register_with_role("admin@example.com", "admin123", "Ada", "Admin", UserRole::Admin)
        .await?;
    Ok(AuthUser::from(&user))
}

pub async fn customer(db: &TestDb, email: &str) -> anyhow::Result<(User, AuthUser)> {
    let id = db.users.register(email, "client123", "Jean", "Dupont").await?;
    let user = db.users.get(id).await?;
    let auth = AuthUser::from(&user);
    Ok((user, auth))
}

pub async fn product(db: &TestDb, admin: &AuthUser, draft: ProductDraft) -> anyhow::Result<i64> {
    Ok(db.catalog.create(admin, draft).await?)
}
