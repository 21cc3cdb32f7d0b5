use std::collections::{BTreeMap, HashMap, btree_map::Entry};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::{sync::Mutex, task::JoinHandle};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{CartItem, Money, Product, amount_too_large, lines_total},
    services::catalog::ProductCatalog,
};

/// One session's cart: product id -> line item. Nothing here is persisted.
///
/// Prices, names and images are captured when a product is first added and
/// are not refreshed from the catalog afterwards. Stock is only checked at
/// add time, so a cart can hold more units than the catalog has left.
///
/// Every mutation keeps [`CartManager::total`] representable; a change that
/// would overflow it is refused and leaves the cart as it was.
#[derive(Debug, Clone, Default)]
pub struct CartManager {
    items: BTreeMap<i64, CartItem>,
}

impl CartManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look the product up in the catalog and add one unit of it.
    pub async fn add(&mut self, catalog: &ProductCatalog, product_id: i64) -> AppResult<&CartItem> {
        let product = catalog.get(product_id).await?;
        self.add_product(&product)
    }

    /// Add one unit of an already loaded product. A product already in the
    /// cart gets its quantity bumped instead of a second line.
    pub fn add_product(&mut self, product: &Product) -> AppResult<&CartItem> {
        if !product.is_available() {
            return Err(AppError::OutOfStock(product.id));
        }

        let line = match self.items.get(&product.id) {
            Some(item) => CartItem {
                quantity: item.quantity.checked_add(1).ok_or_else(amount_too_large)?,
                ..item.clone()
            },
            None => CartItem::from_product(product),
        };
        self.ensure_total_fits(&line)?;

        match self.items.entry(product.id) {
            Entry::Occupied(mut entry) => {
                entry.insert(line);
                Ok(&*entry.into_mut())
            }
            Entry::Vacant(entry) => Ok(&*entry.insert(line)),
        }
    }

    pub fn remove(&mut self, product_id: i64) {
        self.items.remove(&product_id);
    }

    /// Set the quantity of a line. Anything below 1 removes it; products not
    /// in the cart are ignored.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i32) -> AppResult<()> {
        if quantity < 1 {
            self.remove(product_id);
            return Ok(());
        }
        let Some(item) = self.items.get(&product_id) else {
            return Ok(());
        };

        let line = CartItem {
            quantity,
            ..item.clone()
        };
        self.ensure_total_fits(&line)?;
        self.items.insert(product_id, line);
        Ok(())
    }

    pub fn total(&self) -> AppResult<Money> {
        lines_total(self.items.values())
    }

    /// Line items ordered by product id.
    pub fn snapshot(&self) -> Vec<CartItem> {
        self.items.values().cloned().collect()
    }

    pub fn get(&self, product_id: i64) -> Option<&CartItem> {
        self.items.get(&product_id)
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.values().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    // Total of the cart with `line` in place of its current version.
    fn ensure_total_fits(&self, line: &CartItem) -> AppResult<()> {
        let others = self
            .items
            .values()
            .filter(|item| item.product_id != line.product_id);
        lines_total(others.chain(std::iter::once(line))).map(|_| ())
    }
}

#[derive(Debug)]
struct SessionCart {
    cart: Arc<Mutex<CartManager>>,
    touched: Instant,
}

/// Per-session carts, keyed by an opaque session id chosen by the client.
/// Owned by the application state.
///
/// Only writes create a cart. Carts not touched for a while are dropped by
/// [`CartSessions::evict_idle`].
#[derive(Debug, Clone, Default)]
pub struct CartSessions {
    carts: Arc<StdMutex<HashMap<Uuid, SessionCart>>>,
}

impl CartSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cart for `session`, created empty on first use.
    pub fn cart(&self, session: Uuid) -> Arc<Mutex<CartManager>> {
        let mut carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = carts.entry(session).or_insert_with(|| SessionCart {
            cart: Arc::default(),
            touched: Instant::now(),
        });
        entry.touched = Instant::now();
        entry.cart.clone()
    }

    /// The cart for `session` if one exists. Never creates one.
    pub fn get(&self, session: Uuid) -> Option<Arc<Mutex<CartManager>>> {
        let mut carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        carts.get_mut(&session).map(|entry| {
            entry.touched = Instant::now();
            entry.cart.clone()
        })
    }

    pub fn discard(&self, session: Uuid) {
        let mut carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        carts.remove(&session);
    }

    /// Drop carts untouched for at least `max_idle`. Returns how many went.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        let before = carts.len();
        carts.retain(|_, entry| entry.touched.elapsed() < max_idle);
        before - carts.len()
    }

    /// Run [`CartSessions::evict_idle`] every `every` on the runtime.
    pub fn spawn_sweeper(&self, max_idle: Duration, every: Duration) -> JoinHandle<()> {
        let sessions = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let evicted = sessions.evict_idle(max_idle);
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = sessions.len(), "idle carts evicted");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(id: i64, price: Money, stock: i32) -> Product {
        Product {
            id,
            name: format!("Product {id}"),
            description: "test product".into(),
            price,
            image_url: format!("https://img.example/{id}.png"),
            category: "Test".into(),
            stock,
            rating: 0.0,
            reviews_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn adding_twice_bumps_quantity() {
        let mut cart = CartManager::new();
        let p = product(1, 1000, 3);
        cart.add_product(&p).unwrap();
        cart.add_product(&p).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(1).map(|item| item.quantity), Some(2));
    }

    #[test]
    fn out_of_stock_leaves_cart_untouched() {
        let mut cart = CartManager::new();
        cart.add_product(&product(1, 500, 1)).unwrap();
        let before = cart.snapshot();

        let err = cart.add_product(&product(2, 700, 0)).unwrap_err();
        assert!(matches!(err, AppError::OutOfStock(2)));
        assert_eq!(cart.snapshot(), before);
    }

    #[test]
    fn zero_quantity_is_the_same_as_remove() {
        let mut updated = CartManager::new();
        let mut removed = CartManager::new();
        for cart in [&mut updated, &mut removed] {
            cart.add_product(&product(1, 100, 5)).unwrap();
            cart.add_product(&product(2, 200, 5)).unwrap();
        }

        updated.update_quantity(1, 0).unwrap();
        removed.remove(1);
        assert_eq!(updated.snapshot(), removed.snapshot());
        assert!(updated.get(1).is_none());
    }

    #[test]
    fn quantity_is_not_capped_by_stock() {
        let mut cart = CartManager::new();
        cart.add_product(&product(1, 100, 2)).unwrap();
        cart.update_quantity(1, 40).unwrap();
        assert_eq!(cart.get(1).map(|item| item.quantity), Some(40));
    }

    #[test]
    fn updating_a_missing_product_is_a_no_op() {
        let mut cart = CartManager::new();
        cart.update_quantity(9, 3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn total_uses_the_price_seen_at_add_time() {
        let mut cart = CartManager::new();
        let mut p = product(1, 1000, 3);
        for _ in 0..3 {
            cart.add_product(&p).unwrap();
        }
        p.price = 5000;
        assert_eq!(cart.total().unwrap(), 3000);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut cart = CartManager::new();
        cart.remove(42);
        cart.add_product(&product(42, 10, 1)).unwrap();
        cart.remove(42);
        cart.remove(42);
        assert!(cart.is_empty());
        assert_eq!(cart.total().unwrap(), 0);
    }

    #[tokio::test]
    async fn sessions_get_independent_carts() {
        let sessions = CartSessions::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        sessions
            .cart(a)
            .lock()
            .await
            .add_product(&product(1, 100, 1))
            .unwrap();

        assert_eq!(sessions.cart(a).lock().await.len(), 1);
        assert!(sessions.cart(b).lock().await.is_empty());
        assert_eq!(sessions.len(), 2);

        sessions.discard(a);
        assert!(sessions.get(a).is_none());
        assert!(sessions.cart(a).lock().await.is_empty());
    }

    #[test]
    fn overflowing_quantity_is_refused() {
        let mut cart = CartManager::new();
        cart.add_product(&product(1, 5_000_000_000, 10)).unwrap();
        cart.add_product(&product(2, 100, 10)).unwrap();
        let before = cart.snapshot();

        let err = cart.update_quantity(1, i32::MAX).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(cart.snapshot(), before);
        assert_eq!(cart.total().unwrap(), 5_000_000_100);
    }

    #[test]
    fn adding_past_the_largest_total_is_refused() {
        let mut cart = CartManager::new();
        let p = product(1, Money::MAX / 2 + 1, 10);
        cart.add_product(&p).unwrap();

        let err = cart.add_product(&p).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(cart.get(1).map(|item| item.quantity), Some(1));
    }

    #[test]
    fn lookups_do_not_create_carts() {
        let sessions = CartSessions::new();
        for _ in 0..5 {
            assert!(sessions.get(Uuid::new_v4()).is_none());
        }
        assert!(sessions.is_empty());
    }

    #[test]
    fn idle_carts_are_evicted() {
        let sessions = CartSessions::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        sessions.cart(a);
        sessions.cart(b);

        assert_eq!(sessions.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(sessions.len(), 2);

        assert_eq!(sessions.evict_idle(Duration::ZERO), 2);
        assert!(sessions.is_empty());
    }
}
