//! Conversation and checkout endpoints

use crate::api::ExtractCustomer;
use crate::core::traits::{ChatService, CheckoutError};
use crate::infrastructure::traits::ConversationRepository;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route(
            "/messages",
            get(history).post(post_message).delete(delete_history),
        )
        .route("/checkout", post(checkout))
        .route("/customers", get(list_customers))
}

/// One conversation turn: waiter reply plus best-effort order capture.
async fn post_message(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractCustomer(customer): ExtractCustomer,
    Json(request): Json<schemas::CreateMessage>,
) -> Result<Json<schemas::ChatTurn>, (StatusCode, &'static str)> {
    match chat_service.chat_turn(&customer, &request.text).await {
        Ok(turn) => Ok(Json(schemas::ChatTurn {
            reply: turn.reply,
            current_order: turn.current_order,
            order_captured: turn.order_captured,
        })),
        Err(()) => Err((StatusCode::UNAUTHORIZED, "no open session; log in first")),
    }
}

async fn history(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractCustomer(customer): ExtractCustomer,
) -> Json<schemas::MessagesList> {
    let messages = chat_service.transcript(&customer).await;
    Json(schemas::MessagesList { messages })
}

/// Deletes the persisted conversation; a no-op for unknown customers.
async fn delete_history(
    Inject(conversations): Inject<dyn ConversationRepository>,
    ExtractCustomer(customer): ExtractCustomer,
) -> StatusCode {
    match conversations.delete(&customer).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(()) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn list_customers(
    Inject(conversations): Inject<dyn ConversationRepository>,
) -> Result<Json<schemas::CustomerList>, StatusCode> {
    let customers = conversations
        .customers()
        .await
        .map_err(|()| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(schemas::CustomerList { customers }))
}

async fn checkout(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractCustomer(customer): ExtractCustomer,
    Json(request): Json<schemas::Checkout>,
) -> Result<(StatusCode, Json<schemas::OrderPlaced>), (StatusCode, &'static str)> {
    match chat_service
        .checkout(&customer, &request.name, &request.phone, &request.address)
        .await
    {
        Ok(order_id) => Ok((StatusCode::CREATED, Json(schemas::OrderPlaced { order_id }))),
        Err(e @ CheckoutError::NoSession) => Err((StatusCode::UNAUTHORIZED, e.message())),
        Err(e @ (CheckoutError::MissingContact | CheckoutError::EmptyOrder)) => {
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.message()))
        }
        Err(e @ CheckoutError::Storage) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.message())),
    }
}

pub mod schemas {
    use crate::infrastructure::entities::Message;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct CreateMessage {
        pub text: String,
    }

    #[derive(Serialize, Debug)]
    pub struct ChatTurn {
        pub reply: String,
        pub current_order: Vec<String>,
        pub order_captured: bool,
    }

    #[derive(Serialize, Debug, Default)]
    pub struct MessagesList {
        pub messages: Vec<Message>,
    }

    #[derive(Serialize, Debug)]
    pub struct CustomerList {
        pub customers: Vec<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Checkout {
        pub name: String,
        pub phone: String,
        #[serde(default)]
        pub address: String,
    }

    #[derive(Serialize, Debug)]
    pub struct OrderPlaced {
        pub order_id: String,
    }
}
