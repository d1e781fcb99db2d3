//! DB Repository abstractions

use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{
    DailyRevenue, MenuItem, Message, Order, OrderStats, OrderStatus, OrderStatusUpdate, StatusCount,
};
use crate::infrastructure::seed::RESTAURANT_INFO_TYPE;
use crate::infrastructure::traits::{ConversationRepository, MenuRepository, OrderRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use di::{Ref, injectable};
use log::error;
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(FromRow)]
struct MenuItemRow {
    name: String,
    description: String,
    category: String,
    subcategory: Option<String>,
    extra: String,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        let extra = serde_json::from_str::<Value>(&row.extra)
            .ok()
            .and_then(|value| value.as_object().cloned())
            .unwrap_or_default();

        MenuItem {
            name: row.name,
            description: row.description,
            category: row.category,
            subcategory: row.subcategory,
            extra,
        }
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: String,
    customer_name: String,
    customer_phone: String,
    items: String,
    total_amount: f64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            items: serde_json::from_str(&row.items).unwrap_or_default(),
            id: row.id,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            total_amount: row.total_amount,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[injectable(MenuRepository)]
pub struct DbMenuRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl MenuRepository for DbMenuRepository {
    async fn menu_items(&self, category: Option<&str>) -> Result<Vec<MenuItem>, ()> {
        let rows: Vec<MenuItemRow> = match category {
            Some(category) => {
                sqlx::query_as(
                    "SELECT name, description, category, subcategory, extra FROM menu_items WHERE doc_type = 'item' AND category = ? ORDER BY id ASC",
                )
                .bind(category)
                .fetch_all(&**self.connection)
                .await
            }
            None => {
                sqlx::query_as(
                    "SELECT name, description, category, subcategory, extra FROM menu_items WHERE doc_type <> ? ORDER BY id ASC",
                )
                .bind(RESTAURANT_INFO_TYPE)
                .fetch_all(&**self.connection)
                .await
            }
        }
        .map_err(|e| error!("{e}"))?;

        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    async fn restaurant_info(&self) -> Result<Map<String, Value>, ()> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT extra FROM menu_items WHERE doc_type = ? LIMIT 1")
                .bind(RESTAURANT_INFO_TYPE)
                .fetch_optional(&**self.connection)
                .await
                .map_err(|e| error!("{e}"))?;

        Ok(row
            .and_then(|(extra,)| serde_json::from_str::<Value>(&extra).ok())
            .and_then(|value| value.as_object().cloned())
            .unwrap_or_default())
    }

    async fn search(&self, query: &str) -> Result<Vec<MenuItem>, ()> {
        let pattern = format!("%{query}%");

        let rows: Vec<MenuItemRow> = sqlx::query_as(
            "SELECT name, description, category, subcategory, extra FROM menu_items WHERE doc_type <> ? AND (name LIKE ? OR description LIKE ?) ORDER BY id ASC",
        )
        .bind(RESTAURANT_INFO_TYPE)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))?;

        Ok(rows.into_iter().map(MenuItem::from).collect())
    }
}

#[injectable(OrderRepository)]
pub struct DbOrderRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl OrderRepository for DbOrderRepository {
    async fn create_order(
        &self,
        customer_name: &str,
        customer_phone: &str,
        items: &[String],
        total_amount: f64,
    ) -> Result<String, ()> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let items_json = serde_json::to_string(items).map_err(|e| error!("{e}"))?;

        sqlx::query(
            "INSERT INTO orders (id, customer_name, customer_phone, items, total_amount, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(customer_name)
        .bind(customer_phone)
        .bind(items_json)
        .bind(total_amount)
        .bind(OrderStatus::Pending)
        .bind(now)
        .bind(now)
        .execute(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))?;

        Ok(id)
    }

    async fn orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, ()> {
        let rows: Vec<OrderRow> = match status {
            Some(status) => {
                sqlx::query_as(
                    "SELECT * FROM orders WHERE status = ? ORDER BY datetime(created_at) DESC",
                )
                .bind(status)
                .fetch_all(&**self.connection)
                .await
            }
            None => {
                sqlx::query_as("SELECT * FROM orders ORDER BY datetime(created_at) DESC")
                    .fetch_all(&**self.connection)
                    .await
            }
        }
        .map_err(|e| error!("{e}"))?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<OrderStatusUpdate, ()> {
        // Malformed ids can come straight from the dashboard; report them
        // as missing rather than erroring.
        let Ok(id) = Uuid::parse_str(order_id) else {
            return Ok(OrderStatusUpdate::NotFound);
        };

        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))?;

        if result.rows_affected() == 0 {
            Ok(OrderStatusUpdate::NotFound)
        } else {
            Ok(OrderStatusUpdate::Updated)
        }
    }

    async fn stats(&self) -> Result<OrderStats, ()> {
        let status_stats: Vec<StatusCount> =
            sqlx::query_as("SELECT status, COUNT(*) AS count FROM orders GROUP BY status")
                .fetch_all(&**self.connection)
                .await
                .map_err(|e| error!("{e}"))?;

        let daily_stats: Vec<DailyRevenue> = sqlx::query_as(
            "SELECT date(created_at) AS day, SUM(total_amount) AS revenue, COUNT(*) AS count FROM orders WHERE status = 'completed' GROUP BY date(created_at) ORDER BY day ASC",
        )
        .fetch_all(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))?;

        Ok(OrderStats {
            status_stats,
            daily_stats,
        })
    }
}

#[injectable(ConversationRepository)]
pub struct DbConversationRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl ConversationRepository for DbConversationRepository {
    async fn save(&self, customer_key: &str, messages: &[Message]) -> Result<(), ()> {
        let now = Utc::now();
        let messages_json = serde_json::to_string(messages).map_err(|e| error!("{e}"))?;

        // Read-then-write upsert; one customer drives one session, so the
        // non-transactional window is accepted.
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT customer_key FROM conversations WHERE customer_key = ?")
                .bind(customer_key)
                .fetch_optional(&**self.connection)
                .await
                .map_err(|e| error!("{e}"))?;

        if existing.is_some() {
            sqlx::query("UPDATE conversations SET messages = ?, updated_at = ? WHERE customer_key = ?")
                .bind(messages_json)
                .bind(now)
                .bind(customer_key)
                .execute(&**self.connection)
                .await
                .map_err(|e| error!("{e}"))?;
        } else {
            sqlx::query(
                "INSERT INTO conversations (customer_key, messages, created_at, updated_at) VALUES (?, ?, ?, ?)",
            )
            .bind(customer_key)
            .bind(messages_json)
            .bind(now)
            .bind(now)
            .execute(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))?;
        }

        Ok(())
    }

    async fn load(&self, customer_key: &str) -> Result<Vec<Message>, ()> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT messages FROM conversations WHERE customer_key = ?")
                .bind(customer_key)
                .fetch_optional(&**self.connection)
                .await
                .map_err(|e| error!("{e}"))?;

        Ok(row
            .and_then(|(messages,)| serde_json::from_str(&messages).ok())
            .unwrap_or_default())
    }

    async fn customers(&self) -> Result<Vec<String>, ()> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT customer_key FROM conversations ORDER BY datetime(updated_at) DESC",
        )
        .fetch_all(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    async fn delete(&self, customer_key: &str) -> Result<(), ()> {
        sqlx::query("DELETE FROM conversations WHERE customer_key = ?")
            .bind(customer_key)
            .execute(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))?;

        Ok(())
    }
}
