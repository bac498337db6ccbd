//! Pure session transition function
//!
//! Given the same state and event this always produces the same new state and
//! effects; all I/O happens in the runtime that executes the effects.
//!
//! Sends are two-phase. `SubmitInput` applies the speculative change (input
//! cleared, pending record set) and `MessageSent` either commits the server's
//! conversation or compensates by restoring the input.

use super::{Effect, Event, SessionState};

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    /// No state change, no effects
    pub fn unchanged(state: &SessionState) -> Self {
        Self::new(state.clone())
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[allow(clippy::too_many_lines)]
pub fn transition(state: &SessionState, event: Event) -> TransitionResult {
    match event {
        // ============================================================
        // Startup and health
        // ============================================================
        Event::Startup | Event::Refresh => {
            let mut next = state.clone();
            next.checking_connection = true;
            TransitionResult::new(next).with_effect(Effect::CheckHealth)
        }

        Event::HealthChecked { reachable } => {
            let mut next = state.clone();
            next.checking_connection = false;
            next.backend_reachable = reachable;
            if reachable {
                let ticket = next.issue_ticket();
                TransitionResult::new(next).with_effect(Effect::FetchConversations { ticket })
            } else {
                TransitionResult::new(next).with_effect(Effect::error(
                    "Backend Connection Failed",
                    "Please make sure the backend server is running",
                ))
            }
        }

        Event::ConversationsLoaded { ticket, result } => match result {
            Ok(conversations) => {
                let mut next = state.clone();
                if !next.apply_load(conversations, ticket) {
                    tracing::debug!(ticket, "Discarding stale conversation list");
                    return TransitionResult::unchanged(state);
                }
                TransitionResult::new(next)
            }
            Err(e) => TransitionResult::unchanged(state)
                .with_effect(Effect::error("Failed to load chats", e.message)),
        },

        // ============================================================
        // Input and selection
        // ============================================================
        Event::InputChanged { text } => {
            let mut next = state.clone();
            next.pending_input = text;
            TransitionResult::new(next)
        }

        Event::Select { conversation_id } => {
            if !state.is_cached(&conversation_id) {
                return TransitionResult::unchanged(state);
            }
            let mut next = state.clone();
            next.active_id = Some(conversation_id);
            TransitionResult::new(next)
        }

        // ============================================================
        // Create
        // ============================================================
        Event::CreateRequested => {
            if !state.backend_reachable {
                return TransitionResult::unchanged(state).with_effect(not_connected());
            }
            let mut next = state.clone();
            let ticket = next.issue_ticket();
            TransitionResult::new(next).with_effect(Effect::CreateConversation { ticket })
        }

        Event::ConversationCreated { ticket, result } => match result {
            Ok(conversation) if state.is_deleted(&conversation.id) => {
                tracing::debug!(
                    conversation_id = %conversation.id,
                    "Ignoring create for deleted id"
                );
                TransitionResult::unchanged(state)
            }
            Ok(conversation) => {
                let mut next = state.clone();
                next.active_id = Some(conversation.id.clone());
                next.prepend_conversation(conversation, ticket);
                TransitionResult::new(next).with_effect(Effect::info(
                    "New Chat Created",
                    "You can start asking questions about sales data!",
                ))
            }
            Err(e) => {
                TransitionResult::unchanged(state).with_effect(Effect::error("Error", e.message))
            }
        },

        // ============================================================
        // Delete
        // ============================================================
        Event::DeleteRequested { conversation_id } => {
            if !state.backend_reachable {
                return TransitionResult::unchanged(state).with_effect(not_connected());
            }
            if !state.is_cached(&conversation_id) {
                return TransitionResult::unchanged(state);
            }
            let mut next = state.clone();
            let ticket = next.issue_ticket();
            TransitionResult::new(next).with_effect(Effect::DeleteConversation {
                ticket,
                conversation_id,
            })
        }

        Event::ConversationDeleted {
            ticket,
            conversation_id,
            result,
        } => match result {
            Ok(confirmation) => {
                tracing::debug!(ticket, %conversation_id, %confirmation, "Conversation deleted");
                let mut next = state.clone();
                next.remove_conversation(&conversation_id);
                TransitionResult::new(next).with_effect(Effect::info(
                    "Chat Deleted",
                    "Chat has been successfully deleted",
                ))
            }
            Err(e) => {
                tracing::debug!(ticket, %conversation_id, "Delete rejected");
                TransitionResult::unchanged(state).with_effect(Effect::error("Error", e.message))
            }
        },

        // ============================================================
        // Send (two-phase)
        // ============================================================
        Event::SubmitInput => {
            let text = state.pending_input.trim();
            let Some(conversation_id) = state.active_id.clone() else {
                return TransitionResult::unchanged(state);
            };
            if text.is_empty() || !state.backend_reachable || state.awaiting_response() {
                return TransitionResult::unchanged(state);
            }

            let text = text.to_string();
            let mut next = state.clone();
            let ticket = next.issue_ticket();
            next.pending_input.clear();
            next.pending_send = Some(super::PendingSend {
                ticket,
                conversation_id: conversation_id.clone(),
                text: text.clone(),
            });
            TransitionResult::new(next).with_effect(Effect::SendMessage {
                ticket,
                conversation_id,
                text,
            })
        }

        Event::MessageSent { ticket, result } => {
            let Some(pending) = state.pending_send.as_ref().filter(|p| p.ticket == ticket) else {
                tracing::debug!(ticket, "Ignoring result for unknown send");
                return TransitionResult::unchanged(state);
            };

            let mut next = state.clone();
            next.pending_send = None;
            match result {
                Ok(exchange) => {
                    // Commit
                    if !next.update_conversation(exchange.chat, ticket) {
                        tracing::debug!(
                            conversation_id = %pending.conversation_id,
                            "Reply arrived for a conversation no longer cached or already newer"
                        );
                    }
                    TransitionResult::new(next).with_effect(Effect::info(
                        "Response Generated",
                        "Your sales data analysis is ready!",
                    ))
                }
                Err(e) => {
                    // Compensate
                    next.pending_input.clone_from(&pending.text);
                    TransitionResult::new(next).with_effect(Effect::error("Error", e.message))
                }
            }
        }

        // ============================================================
        // Single conversation refresh
        // ============================================================
        Event::ReloadRequested { conversation_id } => {
            if !state.backend_reachable || !state.is_cached(&conversation_id) {
                return TransitionResult::unchanged(state);
            }
            let mut next = state.clone();
            let ticket = next.issue_ticket();
            TransitionResult::new(next).with_effect(Effect::FetchConversation {
                ticket,
                conversation_id,
            })
        }

        Event::ConversationFetched { ticket, result } => match result {
            Ok(conversation) => {
                let mut next = state.clone();
                next.update_conversation(conversation, ticket);
                TransitionResult::new(next)
            }
            Err(e) => {
                TransitionResult::unchanged(state).with_effect(Effect::error("Error", e.message))
            }
        },
    }
}

fn not_connected() -> Effect {
    Effect::error("Backend Not Connected", "Please check your backend connection")
}
