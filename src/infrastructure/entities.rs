//! Database entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Speaker of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One transcript entry. The sequence is chronological and append-only
/// while a session is open; it is replayed verbatim as dialogue history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Message {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Message {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Message {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// A menu document. `extra` carries the free-form fields of the menu
/// definition (prices, portion sizes, ...) and flattens into the JSON
/// representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<OrderStatus, ()> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// A placed order. Ids are opaque strings on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub items: Vec<String>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a status update. A malformed or unknown id is reported to
/// the caller instead of being silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatusUpdate {
    Updated,
    NotFound,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Revenue and order count for one calendar day, completed orders only.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyRevenue {
    pub day: String,
    pub revenue: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderStats {
    pub status_stats: Vec<StatusCount>,
    pub daily_stats: Vec<DailyRevenue>,
}
