//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::entities::{
    MenuItem, Message, Order, OrderStats, OrderStatus, OrderStatusUpdate,
};
use async_trait::async_trait;
use serde_json::{Map, Value};

#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// All non-metadata menu documents, optionally filtered by category.
    async fn menu_items(&self, category: Option<&str>) -> Result<Vec<MenuItem>, ()>;

    /// The restaurant metadata document; empty if none was seeded.
    async fn restaurant_info(&self) -> Result<Map<String, Value>, ()>;

    /// Case-insensitive substring match on item name or description.
    async fn search(&self, query: &str) -> Result<Vec<MenuItem>, ()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts a pending order and returns its generated id.
    async fn create_order(
        &self,
        customer_name: &str,
        customer_phone: &str,
        items: &[String],
        total_amount: f64,
    ) -> Result<String, ()>;

    async fn orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, ()>;

    /// Sets the status of an order. Malformed and unknown ids resolve to
    /// `NotFound` and leave the store untouched.
    async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<OrderStatusUpdate, ()>;

    async fn stats(&self) -> Result<OrderStats, ()>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Upsert: at most one stored conversation per customer key.
    async fn save(&self, customer_key: &str, messages: &[Message]) -> Result<(), ()>;

    /// The persisted transcript; empty for an unknown customer.
    async fn load(&self, customer_key: &str) -> Result<Vec<Message>, ()>;

    async fn customers(&self) -> Result<Vec<String>, ()>;

    /// Idempotent; deleting an unknown customer is a no-op.
    async fn delete(&self, customer_key: &str) -> Result<(), ()>;
}
