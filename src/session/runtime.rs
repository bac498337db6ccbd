//! Session runtime: executes effects against the backend

use super::{transition, Effect, Event, Notice, NoticeLevel, SessionState};
use crate::api::{ChatbotApi, Transport};
use std::collections::VecDeque;
use tokio::sync::broadcast;

const NOTICE_CAPACITY: usize = 64;

/// Owns the session state and the API client
///
/// Events are processed one at a time; a user event and every result event it
/// causes are fully applied before `dispatch` returns.
pub struct SessionRuntime<T> {
    state: SessionState,
    api: ChatbotApi<T>,
    notices: broadcast::Sender<Notice>,
}

impl<T: Transport> SessionRuntime<T> {
    pub fn new(api: ChatbotApi<T>) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            state: SessionState::new(),
            api,
            notices,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn api(&self) -> &ChatbotApi<T> {
        &self.api
    }

    /// Receive user-facing notices emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub async fn dispatch(&mut self, event: Event) {
        let mut events = VecDeque::from([event]);

        while let Some(current) = events.pop_front() {
            let result = transition(&self.state, current);
            self.state = result.new_state;

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(effect).await {
                    events.push_back(generated);
                }
            }
        }
    }

    async fn execute_effect(&self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::CheckHealth => {
                let reachable = self.api.check_backend_connection().await;
                tracing::info!(reachable, "Backend health checked");
                Some(Event::HealthChecked { reachable })
            }
            Effect::FetchConversations { ticket } => Some(Event::ConversationsLoaded {
                ticket,
                result: self.api.list_conversations().await,
            }),
            Effect::CreateConversation { ticket } => Some(Event::ConversationCreated {
                ticket,
                result: self.api.create_conversation().await,
            }),
            Effect::SendMessage {
                ticket,
                conversation_id,
                text,
            } => {
                tracing::info!(%conversation_id, ticket, "Sending message");
                Some(Event::MessageSent {
                    ticket,
                    result: self.api.send_message(&conversation_id, &text).await,
                })
            }
            Effect::DeleteConversation {
                ticket,
                conversation_id,
            } => {
                let result = self.api.delete_conversation(&conversation_id).await;
                Some(Event::ConversationDeleted {
                    ticket,
                    conversation_id,
                    result,
                })
            }
            Effect::FetchConversation {
                ticket,
                conversation_id,
            } => Some(Event::ConversationFetched {
                ticket,
                result: self.api.get_conversation(&conversation_id).await,
            }),
            Effect::Notify(notice) => {
                match notice.level {
                    NoticeLevel::Info => {
                        tracing::debug!(title = %notice.title, "{}", notice.detail);
                    }
                    NoticeLevel::Error => {
                        tracing::warn!(title = %notice.title, "{}", notice.detail);
                    }
                }
                // No subscribers is fine
                let _ = self.notices.send(notice);
                None
            }
        }
    }
}
