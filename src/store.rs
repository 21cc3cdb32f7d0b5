//! Durable storage. Every read and write against the database goes through
//! [`Store`]; the services above it never hold on to rows between calls.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

use crate::{
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
        reviews::{ActiveModel as ReviewActive, Model as ReviewModel},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    models::{CartItem, NewOrder, Order, OrderStatus, Product, ProductDraft, Review, User, UserRole},
};

/// Which slice of the catalog to read. Every variant is ordered newest first.
#[derive(Debug, Clone)]
pub enum ProductFilter {
    All,
    /// Case-sensitive substring of the name or the description.
    Search(String),
    Category(String),
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Clone)]
pub struct Store {
    conn: DatabaseConnection,
}

impl Store {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub async fn insert_product(&self, draft: ProductDraft) -> AppResult<Product> {
        let product = ProductActive {
            id: NotSet,
            name: Set(draft.name),
            description: Set(draft.description),
            price: Set(draft.price),
            image_url: Set(draft.image_url),
            category: Set(draft.category),
            stock: Set(draft.stock),
            rating: Set(0.0),
            reviews_count: Set(0),
            created_at: Set(Utc::now()),
        }
        .insert(&self.conn)
        .await?;

        Ok(product_from_entity(product))
    }

    pub async fn find_product(&self, id: i64) -> AppResult<Option<Product>> {
        let product = Products::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(product_from_entity);
        Ok(product)
    }

    pub async fn list_products(&self, filter: ProductFilter) -> AppResult<Vec<Product>> {
        let mut finder = Products::find();
        finder = match filter {
            ProductFilter::All => finder,
            ProductFilter::Search(term) => finder.filter(
                // instr() is case-sensitive, unlike SQLite's LIKE.
                Condition::any()
                    .add(Expr::cust_with_values("instr(name, ?) > 0", [term.clone()]))
                    .add(Expr::cust_with_values("instr(description, ?) > 0", [term])),
            ),
            ProductFilter::Category(category) => finder.filter(ProdCol::Category.eq(category)),
        };

        let items = finder
            .order_by_desc(ProdCol::CreatedAt)
            .order_by_desc(ProdCol::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect();
        Ok(items)
    }

    pub async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let inserted = UserActive {
            id: NotSet,
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            role: Set(user.role),
            created_at: Set(Utc::now()),
        }
        .insert(&self.conn)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateEmail,
            _ => AppError::Persistence(err),
        })?;

        Ok(user_from_entity(inserted))
    }

    pub async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = Users::find()
            .filter(UserCol::Email.eq(email))
            .one(&self.conn)
            .await?
            .map(user_from_entity);
        Ok(user)
    }

    pub async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(user_from_entity);
        Ok(user)
    }

    /// Write an order header and all of its line items as one unit.
    ///
    /// With `strict_stock`, each line also takes its quantity out of
    /// `products.stock`, and a line that would drive stock negative fails the
    /// whole order with [`AppError::OutOfStock`]. Either every row is committed
    /// or none is.
    pub async fn create_order_with_items(
        &self,
        order: NewOrder,
        strict_stock: bool,
    ) -> AppResult<Order> {
        if order.items.is_empty() {
            return Err(AppError::validation("an order needs at least one item"));
        }
        if order.total != order.items_total()? {
            return Err(AppError::validation("order total does not match its items"));
        }

        let txn = self.conn.begin().await?;
        match write_order(&txn, &order, strict_stock).await {
            Ok(header) => {
                txn.commit().await?;
                Ok(order_from_entity(header, order.items))
            }
            Err(err) => {
                tracing::warn!(user_id = order.user_id, error = %err, "order write failed, rolling back");
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    pub async fn find_order(&self, id: i64) -> AppResult<Option<Order>> {
        let Some(header) = Orders::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        let mut orders = self.attach_items(vec![header]).await?;
        Ok(orders.pop())
    }

    pub async fn list_orders_for_user(&self, user_id: i64) -> AppResult<Vec<Order>> {
        let headers = Orders::find()
            .filter(OrderCol::UserId.eq(user_id))
            .order_by_desc(OrderCol::CreatedAt)
            .order_by_desc(OrderCol::Id)
            .all(&self.conn)
            .await?;
        self.attach_items(headers).await
    }

    /// Move an order from `from` to `to`. Returns `None` when the order does
    /// not exist or is no longer in `from`.
    pub async fn update_order_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> AppResult<Option<Order>> {
        let result = Orders::update_many()
            .col_expr(OrderCol::Status, Expr::value(to))
            .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
            .filter(OrderCol::Id.eq(id))
            .filter(OrderCol::Status.eq(from))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_order(id).await
    }

    pub async fn insert_review(&self, review: NewReview) -> AppResult<Review> {
        let inserted = ReviewActive {
            id: NotSet,
            product_id: Set(review.product_id),
            user_id: Set(review.user_id),
            user_name: Set(review.user_name),
            rating: Set(review.rating),
            comment: Set(review.comment),
            created_at: Set(Utc::now()),
        }
        .insert(&self.conn)
        .await?;

        Ok(review_from_entity(inserted))
    }

    async fn attach_items(&self, headers: Vec<OrderModel>) -> AppResult<Vec<Order>> {
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = headers.iter().map(|order| order.id).collect();
        let mut items_by_order: HashMap<i64, Vec<CartItem>> = HashMap::new();
        for item in OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(ids))
            .order_by_asc(OrderItemCol::Id)
            .all(&self.conn)
            .await?
        {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(order_item_from_entity(item));
        }

        let orders = headers
            .into_iter()
            .map(|header| {
                let items = items_by_order.remove(&header.id).unwrap_or_default();
                order_from_entity(header, items)
            })
            .collect();
        Ok(orders)
    }
}

async fn write_order(
    txn: &DatabaseTransaction,
    order: &NewOrder,
    strict_stock: bool,
) -> AppResult<OrderModel> {
    let now = Utc::now();
    let header = OrderActive {
        id: NotSet,
        user_id: Set(order.user_id),
        total: Set(order.total),
        status: Set(order.status),
        shipping_address: Set(order.shipping_address.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await?;

    for item in &order.items {
        OrderItemActive {
            id: NotSet,
            order_id: Set(header.id),
            product_id: Set(item.product_id),
            product_name: Set(item.product_name.clone()),
            product_price: Set(item.product_price),
            product_image: Set(item.product_image.clone()),
            quantity: Set(item.quantity),
        }
        .insert(txn)
        .await?;

        if strict_stock {
            take_stock(txn, item).await?;
        }
    }

    Ok(header)
}

async fn take_stock(txn: &DatabaseTransaction, item: &CartItem) -> AppResult<()> {
    let result = Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(item.quantity))
        .filter(ProdCol::Id.eq(item.product_id))
        .filter(ProdCol::Stock.gte(item.quantity))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::OutOfStock(item.product_id));
    }
    Ok(())
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        image_url: model.image_url,
        category: model.category,
        stock: model.stock,
        rating: model.rating,
        reviews_count: model.reviews_count,
        created_at: model.created_at,
    }
}

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        first_name: model.first_name,
        last_name: model.last_name,
        role: model.role,
        created_at: model.created_at,
    }
}

fn order_from_entity(model: OrderModel, items: Vec<CartItem>) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        items,
        total: model.total,
        status: model.status,
        shipping_address: model.shipping_address,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn order_item_from_entity(model: OrderItemModel) -> CartItem {
    CartItem {
        product_id: model.product_id,
        product_name: model.product_name,
        product_price: model.product_price,
        product_image: model.product_image,
        quantity: model.quantity,
    }
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        product_id: model.product_id,
        user_id: model.user_id,
        user_name: model.user_name,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at,
    }
}

