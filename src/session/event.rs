//! Events that drive the session

use super::state::Ticket;
use crate::api::{Conversation, Envelope, MessageExchange};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    /// Dashboard entry: check the backend, then load conversations
    Startup,
    /// Same sequence as startup, on demand
    Refresh,
    InputChanged {
        text: String,
    },
    Select {
        conversation_id: String,
    },
    SubmitInput,
    CreateRequested,
    DeleteRequested {
        conversation_id: String,
    },
    ReloadRequested {
        conversation_id: String,
    },

    // Backend results
    HealthChecked {
        reachable: bool,
    },
    ConversationsLoaded {
        ticket: Ticket,
        result: Envelope<Vec<Conversation>>,
    },
    ConversationCreated {
        ticket: Ticket,
        result: Envelope<Conversation>,
    },
    ConversationDeleted {
        ticket: Ticket,
        conversation_id: String,
        result: Envelope<String>,
    },
    MessageSent {
        ticket: Ticket,
        result: Envelope<MessageExchange>,
    },
    ConversationFetched {
        ticket: Ticket,
        result: Envelope<Conversation>,
    },
}
