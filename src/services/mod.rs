pub mod cart;
pub mod catalog;
pub mod order_service;
pub mod user_store;
