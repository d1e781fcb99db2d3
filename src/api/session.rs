//! Login gate endpoints

use crate::api::{ExtractCustomer, normalize_customer_key};
use crate::core::traits::ChatService;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new().route("/", post(login).delete(logout))
}

/// Name-based login: normalizes the name, opens a session and replays
/// the customer's persisted conversation. No password, by design.
async fn login(
    Inject(chat_service): Inject<dyn ChatService>,
    Json(request): Json<schemas::Login>,
) -> Result<Json<schemas::SessionOpened>, (StatusCode, &'static str)> {
    let customer = normalize_customer_key(&request.name);
    if customer.is_empty() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "please enter your name"));
    }

    let messages = chat_service.login(&customer).await;

    Ok(Json(schemas::SessionOpened { customer, messages }))
}

/// Clears the in-memory session only; the persisted conversation stays.
async fn logout(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractCustomer(customer): ExtractCustomer,
) -> StatusCode {
    chat_service.logout(&customer).await;
    StatusCode::NO_CONTENT
}

pub mod schemas {
    use crate::infrastructure::entities::Message;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct Login {
        pub name: String,
    }

    #[derive(Serialize, Debug)]
    pub struct SessionOpened {
        pub customer: String,
        pub messages: Vec<Message>,
    }
}
