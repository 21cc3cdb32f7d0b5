use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    services::{
        cart::CartSessions, catalog::ProductCatalog, order_service::OrderService,
        user_store::UserStore,
    },
    store::Store,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub catalog: ProductCatalog,
    pub users: UserStore,
    pub orders: OrderService,
    pub carts: CartSessions,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(conn: DatabaseConnection, config: AppConfig) -> Self {
        let store = Store::new(conn);
        Self {
            catalog: ProductCatalog::new(store.clone()),
            users: UserStore::new(store.clone()),
            orders: OrderService::new(store.clone(), config.strict_stock),
            carts: CartSessions::new(),
            store,
            config: Arc::new(config),
        }
    }
}
