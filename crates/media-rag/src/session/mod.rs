//! Process-wide mutable state, owned explicitly and shared by handle

pub mod conversation;

use parking_lot::Mutex;
use std::sync::Arc;

use crate::learning::KnowledgeStore;

pub use conversation::{ConversationState, ConversationView, Role};

/// Handle to the conversation window and knowledge store.
///
/// Each container has its own mutex; locks are taken for single operations and
/// never held across an await point, so concurrent requests cannot interleave
/// an eviction or an id assignment.
#[derive(Clone)]
pub struct SharedSession {
    conversation: Arc<Mutex<ConversationState>>,
    knowledge: Arc<Mutex<KnowledgeStore>>,
}

impl SharedSession {
    /// Create a fresh session with the given history bound
    pub fn new(history_capacity: usize) -> Self {
        Self {
            conversation: Arc::new(Mutex::new(ConversationState::new(history_capacity))),
            knowledge: Arc::new(Mutex::new(KnowledgeStore::new())),
        }
    }

    /// Record one history line
    pub fn record_turn(&self, role: Role, text: &str) {
        self.conversation.lock().record_turn(role, text);
    }

    /// History text and cached visual context, read under one lock
    pub fn context_snapshot(&self) -> (String, Option<String>) {
        let conversation = self.conversation.lock();
        (
            conversation.snapshot(),
            conversation.last_visual_context().map(str::to_string),
        )
    }

    /// Record the bot reply and, for image turns, cache it as visual context
    pub fn complete_turn(&self, reply: &str, had_image: bool) {
        let mut conversation = self.conversation.lock();
        conversation.record_turn(Role::Bot, reply);
        if had_image {
            conversation.set_visual_context(reply.to_string());
        }
    }

    /// Run `f` with exclusive access to the conversation window
    pub fn with_conversation<R>(&self, f: impl FnOnce(&mut ConversationState) -> R) -> R {
        f(&mut self.conversation.lock())
    }

    /// Run `f` with exclusive access to the knowledge store
    pub fn with_knowledge<R>(&self, f: impl FnOnce(&mut KnowledgeStore) -> R) -> R {
        f(&mut self.knowledge.lock())
    }
}
