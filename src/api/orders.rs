//! Staff order management endpoints

use crate::infrastructure::entities::{OrderStats, OrderStatus, OrderStatusUpdate};
use crate::infrastructure::traits::OrderRepository;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use di_axum::Inject;
use serde::Deserialize;
use std::str::FromStr;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders))
        .route("/stats", get(order_stats))
        .route("/:id/status", put(update_status))
}

#[derive(Deserialize, Debug)]
struct OrdersQuery {
    status: Option<String>,
}

async fn list_orders(
    Inject(orders): Inject<dyn OrderRepository>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<schemas::OrderList>, (StatusCode, &'static str)> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(
            OrderStatus::from_str(raw)
                .map_err(|()| (StatusCode::BAD_REQUEST, "unknown order status"))?,
        ),
        None => None,
    };

    let orders = orders
        .orders(status)
        .await
        .map_err(|()| (StatusCode::INTERNAL_SERVER_ERROR, "order lookup failed"))?;

    Ok(Json(schemas::OrderList { orders }))
}

async fn update_status(
    Inject(orders): Inject<dyn OrderRepository>,
    Path(order_id): Path<String>,
    Json(request): Json<schemas::UpdateStatus>,
) -> Result<StatusCode, (StatusCode, &'static str)> {
    match orders.update_status(&order_id, request.status).await {
        Ok(OrderStatusUpdate::Updated) => Ok(StatusCode::OK),
        Ok(OrderStatusUpdate::NotFound) => Err((StatusCode::NOT_FOUND, "no such order")),
        Err(()) => Err((StatusCode::INTERNAL_SERVER_ERROR, "order update failed")),
    }
}

async fn order_stats(
    Inject(orders): Inject<dyn OrderRepository>,
) -> Result<Json<OrderStats>, StatusCode> {
    orders
        .stats()
        .await
        .map(Json)
        .map_err(|()| StatusCode::INTERNAL_SERVER_ERROR)
}

pub mod schemas {
    use crate::infrastructure::entities::{Order, OrderStatus};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Debug)]
    pub struct OrderList {
        pub orders: Vec<Order>,
    }

    #[derive(Deserialize, Debug)]
    pub struct UpdateStatus {
        pub status: OrderStatus,
    }
}
