//! Property-based tests for the session reconciler
//!
//! A model backend resolves effects in arbitrary order, so these runs cover
//! the interleavings a real client sees when results arrive out of order.

use super::*;
use crate::api::{ApiError, Conversation, Message, MessageExchange, MessageRole};
use proptest::prelude::*;
use std::collections::HashMap;

// ============================================================================
// Model backend
// ============================================================================

#[derive(Default)]
struct ModelBackend {
    chats: Vec<Conversation>,
    created: usize,
    sent: usize,
}

impl ModelBackend {
    fn find(&mut self, id: &str) -> Option<&mut Conversation> {
        self.chats.iter_mut().find(|c| c.id == id)
    }

    /// Resolve an effect; `fail` forces a failure result
    fn resolve(&mut self, effect: &Effect, fail: bool) -> Option<Event> {
        let failure = || ApiError::protocol(500, "Failed: 500");
        Some(match effect {
            Effect::CheckHealth => Event::HealthChecked { reachable: !fail },
            Effect::FetchConversations { ticket } => Event::ConversationsLoaded {
                ticket: *ticket,
                result: if fail { Err(failure()) } else { Ok(self.chats.clone()) },
            },
            Effect::CreateConversation { ticket } => Event::ConversationCreated {
                ticket: *ticket,
                result: if fail {
                    Err(failure())
                } else {
                    self.created += 1;
                    let chat = Conversation {
                        id: format!("c{}", self.created),
                        title: "New Chat".into(),
                        messages: vec![],
                        created_at: String::new(),
                        last_updated: String::new(),
                    };
                    self.chats.insert(0, chat.clone());
                    Ok(chat)
                },
            },
            Effect::SendMessage {
                ticket,
                conversation_id,
                text,
            } => {
                self.sent += 1;
                let n = self.sent;
                let result = match self.find(conversation_id) {
                    Some(chat) if !fail => {
                        let user_message = Message {
                            id: format!("u{n}"),
                            content: text.clone(),
                            role: MessageRole::User,
                            timestamp: String::new(),
                        };
                        let ai_response = Message {
                            id: format!("a{n}"),
                            content: format!("answer {n}"),
                            role: MessageRole::Assistant,
                            timestamp: String::new(),
                        };
                        chat.messages.push(user_message.clone());
                        chat.messages.push(ai_response.clone());
                        Ok(MessageExchange {
                            user_message,
                            ai_response,
                            chat: chat.clone(),
                        })
                    }
                    _ => Err(failure()),
                };
                Event::MessageSent {
                    ticket: *ticket,
                    result,
                }
            }
            Effect::DeleteConversation {
                ticket,
                conversation_id,
            } => {
                let existed = self.chats.iter().any(|c| &c.id == conversation_id);
                let result = if fail || !existed {
                    Err(failure())
                } else {
                    self.chats.retain(|c| &c.id != conversation_id);
                    Ok("Chat deleted successfully".to_string())
                };
                Event::ConversationDeleted {
                    ticket: *ticket,
                    conversation_id: conversation_id.clone(),
                    result,
                }
            }
            Effect::FetchConversation {
                ticket,
                conversation_id,
            } => {
                let found = self.find(conversation_id).cloned();
                Event::ConversationFetched {
                    ticket: *ticket,
                    result: match found {
                        Some(chat) if !fail => Ok(chat),
                        _ => Err(failure()),
                    },
                }
            }
            Effect::Notify(_) => return None,
        })
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    Startup,
    Input(String),
    /// Select the n-th cached conversation (modulo count)
    Select(usize),
    Submit,
    Create,
    Delete(usize),
    Reload(usize),
    /// Resolve the n-th outstanding effect (modulo count)
    Resolve { index: usize, fail: bool },
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        1 => Just(Step::Startup),
        2 => "[a-z ]{0,12}".prop_map(Step::Input),
        2 => any::<usize>().prop_map(Step::Select),
        2 => Just(Step::Submit),
        2 => Just(Step::Create),
        1 => any::<usize>().prop_map(Step::Delete),
        1 => any::<usize>().prop_map(Step::Reload),
        6 => (any::<usize>(), prop::bool::weighted(0.25))
            .prop_map(|(index, fail)| Step::Resolve { index, fail }),
    ]
}

fn nth_cached(state: &SessionState, n: usize) -> Option<String> {
    let ids = state.conversation_ids();
    if ids.is_empty() {
        None
    } else {
        Some(ids[n % ids.len()].to_string())
    }
}

fn step_event(state: &SessionState, step: &Step) -> Option<Event> {
    Some(match step {
        Step::Startup => Event::Startup,
        Step::Input(text) => Event::InputChanged { text: text.clone() },
        Step::Select(n) => Event::Select {
            conversation_id: nth_cached(state, *n)?,
        },
        Step::Submit => Event::SubmitInput,
        Step::Create => Event::CreateRequested,
        Step::Delete(n) => Event::DeleteRequested {
            conversation_id: nth_cached(state, *n)?,
        },
        Step::Reload(n) => Event::ReloadRequested {
            conversation_id: nth_cached(state, *n)?,
        },
        Step::Resolve { .. } => return None,
    })
}

// ============================================================================
// Invariants
// ============================================================================

fn check_invariants(state: &SessionState) -> Result<(), TestCaseError> {
    if let Some(active) = &state.active_id {
        prop_assert!(state.is_cached(active), "active {} not cached", active);
    }
    for id in state.conversation_ids() {
        prop_assert!(!state.is_deleted(id), "deleted {} is cached", id);
    }
    let mut seen = std::collections::HashSet::new();
    for id in state.conversation_ids() {
        prop_assert!(seen.insert(id), "duplicate id {}", id);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_random_sessions_keep_invariants(steps in proptest::collection::vec(arb_step(), 0..60)) {
        let mut backend = ModelBackend::default();
        let mut state = SessionState::new();
        let mut outstanding: Vec<Effect> = Vec::new();

        for step in &steps {
            let event = match step {
                Step::Resolve { index, fail } => {
                    if outstanding.is_empty() {
                        continue;
                    }
                    let effect = outstanding.remove(index % outstanding.len());
                    match backend.resolve(&effect, *fail) {
                        Some(event) => event,
                        None => continue,
                    }
                }
                other => match step_event(&state, other) {
                    Some(event) => event,
                    None => continue,
                },
            };

            let before = state.clone();
            let is_result = matches!(step, Step::Resolve { .. });
            let result = transition(&state, event);
            state = result.new_state;

            check_invariants(&state)?;

            // Single-flight: a send is only issued when none is pending
            let sends = result
                .effects
                .iter()
                .filter(|e| matches!(e, Effect::SendMessage { .. }))
                .count();
            prop_assert!(sends <= 1);
            if sends == 1 {
                prop_assert!(!before.awaiting_response());
                prop_assert!(state.awaiting_response());
            }

            // Append-only: a conversation that stays cached never loses messages
            if is_result {
                let before_counts: HashMap<&str, usize> = before
                    .conversations()
                    .map(|c| (c.id.as_str(), c.messages.len()))
                    .collect();
                for conv in state.conversations() {
                    if let Some(&count) = before_counts.get(conv.id.as_str()) {
                        prop_assert!(
                            conv.messages.len() >= count,
                            "{} shrank from {} to {}",
                            conv.id,
                            count,
                            conv.messages.len()
                        );
                    }
                }
            }

            outstanding.extend(result.effects.into_iter().filter(Effect::is_request));
        }
    }

    #[test]
    fn prop_failed_send_restores_sent_text(input in "[a-zA-Z ]{0,8}[a-zA-Z][a-zA-Z ]{0,8}") {
        let mut state = SessionState::new();
        state = transition(&state, Event::HealthChecked { reachable: true }).new_state;
        state = transition(&state, Event::ConversationCreated {
            ticket: 10,
            result: Ok(Conversation {
                id: "c1".into(),
                title: "New Chat".into(),
                messages: vec![],
                created_at: String::new(),
                last_updated: String::new(),
            }),
        }).new_state;
        state = transition(&state, Event::InputChanged { text: input.clone() }).new_state;
        let before = state.clone();

        let submitted = transition(&state, Event::SubmitInput);
        prop_assert!(submitted.new_state.pending_input.is_empty());
        let ticket = submitted.new_state.pending_send.as_ref().map(|p| p.ticket);
        prop_assert!(ticket.is_some());

        let failed = transition(&submitted.new_state, Event::MessageSent {
            ticket: ticket.unwrap_or_default(),
            result: Err(ApiError::transport("Connection failed")),
        }).new_state;

        prop_assert_eq!(failed.pending_input.as_str(), input.trim());
        prop_assert!(!failed.awaiting_response());
        prop_assert_eq!(&failed.conversations, &before.conversations);
    }

    #[test]
    fn prop_failed_health_never_loads(repeats in 1usize..5) {
        let mut state = SessionState::new();
        for _ in 0..repeats {
            let result = transition(&state, Event::Startup);
            prop_assert_eq!(&result.effects, &vec![Effect::CheckHealth]);
            let result = transition(&result.new_state, Event::HealthChecked { reachable: false });
            prop_assert!(!result.effects.iter().any(Effect::is_request));
            state = result.new_state;
            prop_assert!(state.conversations.is_empty());
            prop_assert!(!state.backend_reachable);
        }
    }
}
