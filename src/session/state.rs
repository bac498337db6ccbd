//! Client-local session state

use crate::api::Conversation;
use std::collections::HashSet;

/// Monotonic number issued to every dispatched backend operation
pub type Ticket = u64;

/// Ordering key for cached copies of one conversation
///
/// Messages are append-only, so a copy with more messages is newer regardless
/// of dispatch order. Between copies of equal length the later ticket wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Revision {
    pub messages: usize,
    pub ticket: Ticket,
}

impl Revision {
    pub fn of(conversation: &Conversation, ticket: Ticket) -> Self {
        Self {
            messages: conversation.messages.len(),
            ticket,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedConversation {
    pub conversation: Conversation,
    pub revision: Revision,
}

/// Speculative half of a send: the input has been cleared and the flag
/// raised, but the backend has not answered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub ticket: Ticket,
    pub conversation_id: String,
    /// The trimmed text that was sent; put back into the input on failure
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Iteration order is display order, newest first after a create
    pub conversations: Vec<CachedConversation>,
    pub active_id: Option<String>,
    pub pending_input: String,
    pub pending_send: Option<PendingSend>,
    pub backend_reachable: bool,
    /// True until the first health check resolves
    pub checking_connection: bool,
    pub(crate) next_ticket: Ticket,
    /// Ticket of the last wholesale load that was applied
    pub(crate) last_load: Ticket,
    /// Conversations deleted by this client; late results never revive them
    pub(crate) tombstones: HashSet<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            conversations: Vec::new(),
            active_id: None,
            pending_input: String::new(),
            pending_send: None,
            backend_reachable: false,
            checking_connection: true,
            next_ticket: 1,
            last_load: 0,
            tombstones: HashSet::new(),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a send is in flight. Derived, so it can never disagree with
    /// the pending record.
    pub fn awaiting_response(&self) -> bool {
        self.pending_send.is_some()
    }

    pub fn conversations(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.iter().map(|c| &c.conversation)
    }

    #[cfg(test)]
    pub fn conversation_ids(&self) -> Vec<&str> {
        self.conversations().map(|c| c.id.as_str()).collect()
    }

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.cached(id).map(|c| &c.conversation)
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.cached(id).is_some()
    }

    pub fn is_deleted(&self, id: &str) -> bool {
        self.tombstones.contains(id)
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active_id.as_deref().and_then(|id| self.conversation(id))
    }

    pub(crate) fn cached(&self, id: &str) -> Option<&CachedConversation> {
        self.conversations.iter().find(|c| c.conversation.id == id)
    }

    pub(crate) fn issue_ticket(&mut self) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    /// Replace a cached conversation if the incoming copy is not older.
    /// Never inserts: an id that is not cached stays absent.
    pub(crate) fn update_conversation(
        &mut self,
        conversation: Conversation,
        ticket: Ticket,
    ) -> bool {
        if self.is_deleted(&conversation.id) {
            return false;
        }
        let incoming = Revision::of(&conversation, ticket);
        match self
            .conversations
            .iter_mut()
            .find(|c| c.conversation.id == conversation.id)
        {
            Some(slot) if slot.revision <= incoming => {
                slot.conversation = conversation;
                slot.revision = incoming;
                true
            }
            _ => false,
        }
    }

    /// Put a conversation first, replacing any cached copy with the same id
    pub(crate) fn prepend_conversation(&mut self, conversation: Conversation, ticket: Ticket) {
        self.conversations
            .retain(|c| c.conversation.id != conversation.id);
        let revision = Revision::of(&conversation, ticket);
        self.conversations.insert(
            0,
            CachedConversation {
                conversation,
                revision,
            },
        );
    }

    pub(crate) fn remove_conversation(&mut self, id: &str) {
        self.conversations.retain(|c| c.conversation.id != id);
        self.tombstones.insert(id.to_string());
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
    }

    /// Apply a fetch-all result issued at `ticket`.
    ///
    /// With nothing written since the load was issued this is a wholesale
    /// replace. Entries written after it (created, or updated to a newer
    /// revision) survive. Returns false when a newer load was already applied.
    pub(crate) fn apply_load(&mut self, incoming: Vec<Conversation>, ticket: Ticket) -> bool {
        if ticket < self.last_load {
            return false;
        }
        self.last_load = ticket;

        let incoming_ids: HashSet<String> = incoming.iter().map(|c| c.id.clone()).collect();

        // Written after the load was issued and unknown to it
        let mut merged: Vec<CachedConversation> = self
            .conversations
            .iter()
            .filter(|c| c.revision.ticket > ticket && !incoming_ids.contains(&c.conversation.id))
            .cloned()
            .collect();

        for conversation in incoming {
            if self.is_deleted(&conversation.id) {
                continue;
            }
            let revision = Revision::of(&conversation, ticket);
            let entry = match self.cached(&conversation.id) {
                Some(cached) if cached.revision > revision => cached.clone(),
                _ => CachedConversation {
                    conversation,
                    revision,
                },
            };
            merged.push(entry);
        }

        self.conversations = merged;
        if let Some(active) = self.active_id.clone() {
            if !self.is_cached(&active) {
                self.active_id = None;
            }
        }
        true
    }
}
