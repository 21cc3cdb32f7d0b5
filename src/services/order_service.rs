use crate::{
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{NewOrder, Order, OrderStatus},
    services::{cart::CartManager, catalog::ProductCatalog, user_store::UserStore},
    store::Store,
};

/// Turns carts into persisted orders and reads them back.
#[derive(Debug, Clone)]
pub struct OrderService {
    store: Store,
    catalog: ProductCatalog,
    users: UserStore,
    strict_stock: bool,
}

impl OrderService {
    pub fn new(store: Store, strict_stock: bool) -> Self {
        Self {
            catalog: ProductCatalog::new(store.clone()),
            users: UserStore::new(store.clone()),
            store,
            strict_stock,
        }
    }

    pub fn strict_stock(&self) -> bool {
        self.strict_stock
    }

    /// Persist the cart as a `Paid` order and empty the cart.
    ///
    /// Preconditions are checked in order and the first failure is returned:
    /// a signed-in user, a non-empty cart, a non-empty shipping address. The
    /// cart is left untouched on any error.
    ///
    /// Unless strict stock is enabled, stock is not decremented here, so two
    /// carts can both buy the last unit.
    pub async fn checkout(
        &self,
        user: Option<&AuthUser>,
        cart: &mut CartManager,
        shipping_address: &str,
    ) -> AppResult<i64> {
        let Some(user) = user else {
            return Err(AppError::validation("you must be signed in to check out"));
        };
        if cart.is_empty() {
            return Err(AppError::validation("cart is empty"));
        }
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(AppError::validation("shipping address is required"));
        }

        let owner = self.users.get(user.user_id).await?;
        let items = cart.snapshot();
        for item in &items {
            self.catalog.get(item.product_id).await?;
        }

        let order = self
            .store
            .create_order_with_items(
                NewOrder {
                    user_id: owner.id,
                    total: cart.total()?,
                    items,
                    status: OrderStatus::Paid,
                    shipping_address: shipping_address.to_owned(),
                },
                self.strict_stock,
            )
            .await?;

        cart.clear();
        tracing::info!(
            order_id = order.id,
            user_id = owner.id,
            total = order.total,
            items = order.items.len(),
            strict_stock = self.strict_stock,
            "order committed"
        );
        Ok(order.id)
    }

    /// Orders of one user, newest first, each with its line items.
    pub async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Order>> {
        self.store.list_orders_for_user(user_id).await
    }

    /// A single order, visible only to the user who placed it.
    pub async fn get_for_user(&self, user_id: i64, order_id: i64) -> AppResult<Order> {
        match self.store.find_order(order_id).await? {
            Some(order) if order.user_id == user_id => Ok(order),
            _ => Err(AppError::NotFound("Order")),
        }
    }

    /// Move an order along its lifecycle. Only steps allowed by
    /// [`OrderStatus::next_states`] are accepted.
    pub async fn transition(
        &self,
        user: &AuthUser,
        order_id: i64,
        next: OrderStatus,
    ) -> AppResult<Order> {
        ensure_admin(user)?;
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or(AppError::NotFound("Order"))?;

        if !order.status.can_transition_to(next) {
            return Err(AppError::validation(format!(
                "cannot move order from {:?} to {:?}",
                order.status, next
            )));
        }

        let updated = self
            .store
            .update_order_status(order_id, order.status, next)
            .await?
            .ok_or_else(|| AppError::validation("order status changed concurrently"))?;

        tracing::info!(
            order_id,
            from = ?order.status,
            to = ?updated.status,
            admin_id = user.user_id,
            "order status updated"
        );
        Ok(updated)
    }
}
