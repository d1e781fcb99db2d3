//! Implementations for the services the app needs.
//!

use crate::core::session::SessionStore;
use crate::core::traits::{ChatAssistant, ChatService, ChatTurn, CheckoutError};
use crate::infrastructure::entities::Message;
use crate::infrastructure::traits::{ConversationRepository, MenuRepository, OrderRepository};
use async_trait::async_trait;
use di::{Ref, injectable};

/// Items folded into the menu context shown to the assistant.
const MENU_CONTEXT_ITEMS: usize = 10;

/// Placeholder checkout total: captured items are free-text strings and
/// are not priced against the menu.
const UNPRICED_TOTAL: f64 = 0.0;

#[injectable(ChatService)]
pub struct MyChatService {
    sessions: Ref<SessionStore>,
    assistant: Ref<dyn ChatAssistant>,
    menu: Ref<dyn MenuRepository>,
    orders: Ref<dyn OrderRepository>,
    conversations: Ref<dyn ConversationRepository>,
}

#[async_trait]
impl ChatService for MyChatService {
    async fn login(&self, customer_key: &str) -> Vec<Message> {
        let messages = self
            .conversations
            .load(customer_key)
            .await
            .unwrap_or_default();
        self.sessions.open(customer_key, messages.clone());
        messages
    }

    async fn logout(&self, customer_key: &str) {
        self.sessions.close(customer_key);
    }

    async fn chat_turn(&self, customer_key: &str, text: &str) -> Result<ChatTurn, ()> {
        let history = self
            .sessions
            .push_user_message(customer_key, text)
            .ok_or(())?;

        let menu_context = self.menu_context().await;

        // The reply and the extraction are independent completions; only
        // their consumption is ordered.
        let (reply, order_info) = tokio::join!(
            self.assistant.waiter_response(text, &menu_context, &history),
            self.assistant.extract_order_info(text),
        );

        let captured = if order_info.is_complete_order && !order_info.items.is_empty() {
            order_info.items
        } else {
            Vec::new()
        };
        let order_captured = !captured.is_empty();

        let (messages, current_order) = self
            .sessions
            .push_assistant_reply(customer_key, &reply, &captured)
            .ok_or(())?;

        // A failed save degrades the turn to in-memory history only.
        let _ = self.conversations.save(customer_key, &messages).await;

        Ok(ChatTurn {
            reply,
            current_order,
            order_captured,
        })
    }

    async fn transcript(&self, customer_key: &str) -> Vec<Message> {
        if let Some(messages) = self.sessions.transcript(customer_key) {
            return messages;
        }
        self.conversations
            .load(customer_key)
            .await
            .unwrap_or_default()
    }

    async fn checkout(
        &self,
        customer_key: &str,
        name: &str,
        phone: &str,
        address: &str,
    ) -> Result<String, CheckoutError> {
        // The delivery address is collected but not part of the order
        // record.
        let _ = address;

        if name.trim().is_empty() || phone.trim().is_empty() {
            return Err(CheckoutError::MissingContact);
        }

        let items = self
            .sessions
            .current_order(customer_key)
            .ok_or(CheckoutError::NoSession)?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyOrder);
        }

        let order_id = self
            .orders
            .create_order(name, phone, &items, UNPRICED_TOTAL)
            .await
            .map_err(|()| CheckoutError::Storage)?;

        self.sessions.clear_after_checkout(customer_key);
        Ok(order_id)
    }
}

impl MyChatService {
    /// Bulleted `name: description` list over the first few menu items.
    async fn menu_context(&self) -> String {
        let items = self.menu.menu_items(None).await.unwrap_or_default();

        let mut context = String::from("Available menu items:\n");
        for item in items.iter().take(MENU_CONTEXT_ITEMS) {
            context.push_str(&format!("- {}: {}\n", item.name, item.description));
        }
        context
    }
}
