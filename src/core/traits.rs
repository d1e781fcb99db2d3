//! DI "Interfaces"

use crate::core::assistant::ExtractedOrderInfo;
use crate::infrastructure::entities::Message;
use async_trait::async_trait;

/// One completed conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub reply: String,
    pub current_order: Vec<String>,
    /// Whether this turn folded new items into the running order.
    pub order_captured: bool,
}

/// Why a checkout was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutError {
    NoSession,
    MissingContact,
    EmptyOrder,
    Storage,
}

impl CheckoutError {
    pub fn message(self) -> &'static str {
        match self {
            CheckoutError::NoSession => "Please log in before placing an order",
            CheckoutError::MissingContact => "Please fill in name and phone number",
            CheckoutError::EmptyOrder => "There is nothing in your order yet",
            CheckoutError::Storage => "We could not save your order. Please try again.",
        }
    }
}

#[async_trait]
pub trait ChatAssistant: Send + Sync {
    /// Waiter persona reply for one user utterance.
    ///
    /// Never fails; an unreachable completion API degrades to a fixed
    /// apology string.
    async fn waiter_response(
        &self,
        user_message: &str,
        menu_context: &str,
        chat_history: &[Message],
    ) -> String;

    /// Best-effort structured order extraction from a single utterance.
    ///
    /// Returns the zero value when the model is unreachable or answers
    /// with anything other than the expected JSON shape.
    async fn extract_order_info(&self, user_message: &str) -> ExtractedOrderInfo;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Opens a session for the customer and returns the persisted
    /// transcript (empty for a first visit).
    async fn login(&self, customer_key: &str) -> Vec<Message>;

    /// Drops the in-memory session. Persisted conversations are kept.
    async fn logout(&self, customer_key: &str);

    /// Runs one conversation turn.
    ///
    /// Returns `Err` if the customer has no open session.
    async fn chat_turn(&self, customer_key: &str, text: &str) -> Result<ChatTurn, ()>;

    /// Current transcript: the live session if one is open, otherwise
    /// the persisted conversation.
    async fn transcript(&self, customer_key: &str) -> Vec<Message>;

    /// Places the running order and clears the session state.
    async fn checkout(
        &self,
        customer_key: &str,
        name: &str,
        phone: &str,
        address: &str,
    ) -> Result<String, CheckoutError>;
}
