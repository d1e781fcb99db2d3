//! In-memory per-customer session state.

use crate::infrastructure::entities::Message;
use di::inject;
use di::injectable;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// State scoped to one logged-in customer: the rolling transcript and the
/// items captured for the order in progress.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub messages: Vec<Message>,
    pub current_order: Vec<String>,
}

/// Registry of open sessions, keyed by normalized customer name.
/// Created on login, dropped on logout; never touches persisted
/// conversations.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

#[injectable]
impl SessionStore {
    #[inject]
    pub fn create() -> SessionStore {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl SessionStore {
    pub fn open(&self, customer_key: &str, messages: Vec<Message>) {
        self.lock().insert(
            customer_key.to_owned(),
            Session {
                messages,
                current_order: Vec::new(),
            },
        );
    }

    pub fn close(&self, customer_key: &str) {
        self.lock().remove(customer_key);
    }

    /// Appends the user message and returns the transcript snapshot that
    /// is replayed to the assistant. `None` if no session is open.
    pub fn push_user_message(&self, customer_key: &str, content: &str) -> Option<Vec<Message>> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(customer_key)?;
        session.messages.push(Message::user(content));
        Some(session.messages.clone())
    }

    /// Appends the assistant reply, folds captured items into the running
    /// order, and returns the updated transcript and order.
    pub fn push_assistant_reply(
        &self,
        customer_key: &str,
        reply: &str,
        captured_items: &[String],
    ) -> Option<(Vec<Message>, Vec<String>)> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(customer_key)?;
        session.current_order.extend(captured_items.iter().cloned());
        session.messages.push(Message::assistant(reply));
        Some((session.messages.clone(), session.current_order.clone()))
    }

    pub fn transcript(&self, customer_key: &str) -> Option<Vec<Message>> {
        self.lock()
            .get(customer_key)
            .map(|session| session.messages.clone())
    }

    pub fn current_order(&self, customer_key: &str) -> Option<Vec<String>> {
        self.lock()
            .get(customer_key)
            .map(|session| session.current_order.clone())
    }

    /// Empties both the running order and the transcript after a placed
    /// order. The session itself stays open.
    pub fn clear_after_checkout(&self, customer_key: &str) {
        if let Some(session) = self.lock().get_mut(customer_key) {
            session.current_order.clear();
            session.messages.clear();
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().expect("session store lock poisoned")
    }
}
