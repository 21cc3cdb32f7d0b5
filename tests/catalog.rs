mod common;

use common::{admin, customer, draft, product, setup};
use storefront_core::{error::AppError, models::ProductDraft};

#[tokio::test]
async fn list_all_returns_newest_first() -> anyhow::Result<()> {
    let db = setup().await?;
    let admin = admin(&db).await?;

    let first = product(&db, &admin, draft("Hoodie", 5500, 10)).await?;
    let second = product(&db, &admin, draft("Mug", 1200, 10)).await?;
    let third = product(&db, &admin, draft("Sticker", 500, 10)).await?;

    let ids: Vec<i64> = db.catalog.list_all().await?.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![third, second, first]);
    Ok(())
}

#[tokio::test]
async fn create_assigns_id_and_default_rating() -> anyhow::Result<()> {
    let db = setup().await?;
    let admin = admin(&db).await?;

    let id = product(&db, &admin, draft("Mug", 1200, 4)).await?;
    let mug = db.catalog.get(id).await?;

    assert_eq!(mug.name, "Mug");
    assert_eq!(mug.price, 1200);
    assert_eq!(mug.stock, 4);
    assert_eq!(mug.rating, 0.0);
    assert_eq!(mug.reviews_count, 0);
    assert!(mug.is_available());
    Ok(())
}

#[tokio::test]
async fn search_is_a_case_sensitive_contains_over_name_and_description() -> anyhow::Result<()> {
    let db = setup().await?;
    let admin = admin(&db).await?;

    let mug = product(
        &db,
        &admin,
        ProductDraft {
            description: "Coffee tastes better with Ferris".into(),
            ..draft("Mug", 1200, 5)
        },
    )
    .await?;
    let plush = product(&db, &admin, draft("Ferris Plush", 2500, 5)).await?;
    product(&db, &admin, draft("Hoodie", 5500, 5)).await?;

    let ids: Vec<i64> = db.catalog.search("Ferris").await?.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![plush, mug]);

    assert!(db.catalog.search("ferris").await?.is_empty());
    assert_eq!(db.catalog.search("Coffee").await?.len(), 1);
    assert!(db.catalog.search("Keyboard").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn category_filter_is_exact() -> anyhow::Result<()> {
    let db = setup().await?;
    let admin = admin(&db).await?;

    let console = product(
        &db,
        &admin,
        ProductDraft {
            category: "Gaming".into(),
            ..draft("Console", 49_999, 10)
        },
    )
    .await?;
    let pad = product(
        &db,
        &admin,
        ProductDraft {
            category: "Gaming".into(),
            ..draft("Controller", 6_999, 35)
        },
    )
    .await?;
    product(&db, &admin, draft("Backpack", 7_999, 30)).await?;

    let ids: Vec<i64> = db
        .catalog
        .list_by_category("Gaming")
        .await?
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![pad, console]);
    assert!(db.catalog.list_by_category("gaming").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_product_is_not_found() -> anyhow::Result<()> {
    let db = setup().await?;
    let err = db.catalog.get(404).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("Product")));
    Ok(())
}

#[tokio::test]
async fn only_admins_can_create_products() -> anyhow::Result<()> {
    let db = setup().await?;
    let (_, shopper) = customer(&db, "shopper@example.com").await?;

    let err = db.catalog.create(&shopper, draft("Mug", 1200, 1)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert!(db.catalog.list_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn invalid_drafts_are_rejected_before_insert() -> anyhow::Result<()> {
    let db = setup().await?;
    let admin = admin(&db).await?;

    let err = db
        .catalog
        .create(
            &admin,
            ProductDraft {
                image_url: String::new(),
                ..draft("Mug", 1200, 1)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = db.catalog.create(&admin, draft("Mug", 1200, -1)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(db.catalog.list_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn reviews_need_a_rating_between_one_and_five() -> anyhow::Result<()> {
    let db = setup().await?;
    let admin = admin(&db).await?;
    let (user, shopper) = customer(&db, "shopper@example.com").await?;
    let mug = product(&db, &admin, draft("Mug", 1200, 1)).await?;

    for rating in [0, 6] {
        let err = db.catalog.add_review(&shopper, mug, rating, "meh").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    let review = db.catalog.add_review(&shopper, mug, 5, " Great mug ").await?;
    assert_eq!(review.product_id, mug);
    assert_eq!(review.user_id, user.id);
    assert_eq!(review.user_name, "Jean Dupont");
    assert_eq!(review.comment, "Great mug");

    let err = db.catalog.add_review(&shopper, 999, 4, "?").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("Product")));
    Ok(())
}
