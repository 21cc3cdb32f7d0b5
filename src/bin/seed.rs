use storefront_core::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    error::AppError,
    middleware::auth::AuthUser,
    models::{ProductDraft, User, UserRole},
    services::{catalog::ProductCatalog, user_store::UserStore},
    store::Store,
};

const DEMO_PRODUCTS: &[(&str, &str, i64, &str, &str, i32)] = &[
    (
        "MacBook Pro 16\"",
        "Pro laptop with M3 Pro chip, 16 GB RAM and a 512 GB SSD.",
        249_999,
        "https://images.unsplash.com/photo-1517336714731-489689fd1ca8?w=500",
        "Electronics",
        15,
    ),
    (
        "iPhone 15 Pro",
        "A17 Pro chip, 48 MP camera and a 6.1 inch Super Retina XDR display.",
        119_999,
        "https://images.unsplash.com/photo-1592286927505-c0d5e9d6e87e?w=500",
        "Electronics",
        25,
    ),
    (
        "AirPods Pro 2",
        "Wireless earbuds with active noise cancellation and spatial audio.",
        27_999,
        "https://images.unsplash.com/photo-1606841837239-c5a1a4a07af7?w=500",
        "Electronics",
        50,
    ),
    (
        "Nike Air Max 2024",
        "Breathable running shoes with Air Max cushioning.",
        15_999,
        "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=500",
        "Fashion",
        40,
    ),
    (
        "Eastpak Backpack",
        "Tough 24 L backpack with a laptop sleeve and a 30 year warranty.",
        7_999,
        "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?w=500",
        "Fashion",
        30,
    ),
    (
        "PlayStation 5",
        "Next-gen console with an ultra fast SSD, ray tracing and 4K 120 fps.",
        49_999,
        "https://images.unsplash.com/photo-1606813907291-d86efa9b94db?w=500",
        "Gaming",
        10,
    ),
    (
        "DualSense Controller",
        "Wireless PS5 controller with haptic feedback and adaptive triggers.",
        6_999,
        "https://images.unsplash.com/photo-1592840496694-26d035b52b48?w=500",
        "Gaming",
        35,
    ),
    (
        "Kindle Paperwhite",
        "6.8 inch e-reader with adjustable warm light, IPX8 waterproof, 16 GB.",
        14_999,
        "https://images.unsplash.com/photo-1592496431122-2349e0fbc666?w=500",
        "Books",
        45,
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_core=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let conn = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&conn, &config.migrations_dir).await?;

    let store = Store::new(conn);
    let users = UserStore::new(store.clone());
    let catalog = ProductCatalog::new(store);

    let admin = ensure_user(
        &users,
        "admin@storefront.test",
        "admin123",
        ("Admin", "Storefront"),
        UserRole::Admin,
    )
    .await?;
    let customer = ensure_user(
        &users,
        "client@example.com",
        "client123",
        ("Jean", "Dupont"),
        UserRole::Customer,
    )
    .await?;

    seed_products(&catalog, &AuthUser::from(&admin)).await?;

    tracing::info!(admin_id = admin.id, customer_id = customer.id, "seed completed");
    Ok(())
}

async fn ensure_user(
    users: &UserStore,
    email: &str,
    password: &str,
    (first_name, last_name): (&str, &str),
    role: UserRole,
) -> anyhow::Result<User> {
    match users
        .register_with_role(email, password, first_name, last_name, role)
        .await
    {
        Ok(user) => {
            tracing::info!(%email, ?role, "user created");
            Ok(user)
        }
        Err(AppError::DuplicateEmail) => {
            tracing::info!(%email, "user already exists");
            Ok(users.get_by_email(email).await?)
        }
        Err(err) => Err(err.into()),
    }
}

async fn seed_products(catalog: &ProductCatalog, admin: &AuthUser) -> anyhow::Result<()> {
    let existing = catalog.list_all().await?;
    if !existing.is_empty() {
        tracing::info!(count = existing.len(), "products already present, skipping");
        return Ok(());
    }

    for &(name, description, price, image_url, category, stock) in DEMO_PRODUCTS {
        catalog
            .create(
                admin,
                ProductDraft {
                    name: name.to_owned(),
                    description: description.to_owned(),
                    price,
                    image_url: image_url.to_owned(),
                    category: category.to_owned(),
                    stock,
                },
            )
            .await?;
    }

    tracing::info!(count = DEMO_PRODUCTS.len(), "seeded products");
    Ok(())
}
