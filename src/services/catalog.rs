use crate::{
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, ProductDraft, Review},
    store::{NewReview, ProductFilter, Store},
};

/// Read side of the product table, plus admin-only creation. Products are
/// never updated or deleted through the catalog.
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    store: Store,
}

impl ProductCatalog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Product>> {
        self.store.list_products(ProductFilter::All).await
    }

    pub async fn get(&self, id: i64) -> AppResult<Product> {
        self.store
            .find_product(id)
            .await?
            .ok_or(AppError::NotFound("Product"))
    }

    pub async fn search(&self, term: &str) -> AppResult<Vec<Product>> {
        self.store
            .list_products(ProductFilter::Search(term.to_owned()))
            .await
    }

    pub async fn list_by_category(&self, category: &str) -> AppResult<Vec<Product>> {
        self.store
            .list_products(ProductFilter::Category(category.to_owned()))
            .await
    }

    /// Insert a new product. Rating and review count start at zero.
    pub async fn create(&self, user: &AuthUser, draft: ProductDraft) -> AppResult<i64> {
        ensure_admin(user)?;
        validate_draft(&draft)?;

        let product = self.store.insert_product(draft).await?;
        tracing::info!(
            product_id = product.id,
            admin_id = user.user_id,
            category = %product.category,
            "product created"
        );
        Ok(product.id)
    }

    pub async fn add_review(
        &self,
        user: &AuthUser,
        product_id: i64,
        rating: i32,
        comment: &str,
    ) -> AppResult<Review> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::validation("rating must be between 1 and 5"));
        }
        let product = self.get(product_id).await?;
        let author = self
            .store
            .find_user(user.user_id)
            .await?
            .ok_or(AppError::NotFound("User"))?;

        let review = self
            .store
            .insert_review(NewReview {
                product_id: product.id,
                user_id: author.id,
                user_name: author.full_name(),
                rating,
                comment: comment.trim().to_owned(),
            })
            .await?;
        tracing::debug!(product_id, review_id = review.id, "review stored");
        Ok(review)
    }
}

fn validate_draft(draft: &ProductDraft) -> AppResult<()> {
    let required = [
        ("name", &draft.name),
        ("description", &draft.description),
        ("image_url", &draft.image_url),
        ("category", &draft.category),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if draft.price < 0 {
        return Err(AppError::validation("price must not be negative"));
    }
    if draft.stock < 0 {
        return Err(AppError::validation("stock must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Ferris Mug".into(),
            description: "Coffee tastes better with Ferris".into(),
            price: 1200,
            image_url: "https://img.example/mug.png".into(),
            category: "Kitchen".into(),
            stock: 3,
        }
    }

    #[test]
    fn complete_draft_passes() {
        assert!(validate_draft(&draft()).is_ok());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut d = draft();
        d.category = "  ".into();
        let err = validate_draft(&d).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("category")));
    }

    #[test]
    fn negative_price_and_stock_are_rejected() {
        let mut d = draft();
        d.price = -1;
        assert!(matches!(validate_draft(&d), Err(AppError::Validation(_))));

        let mut d = draft();
        d.stock = -5;
        assert!(matches!(validate_draft(&d), Err(AppError::Validation(_))));
    }
}
