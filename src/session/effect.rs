//! Effects produced by session transitions

use super::state::Ticket;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CheckHealth,
    FetchConversations {
        ticket: Ticket,
    },
    CreateConversation {
        ticket: Ticket,
    },
    SendMessage {
        ticket: Ticket,
        conversation_id: String,
        text: String,
    },
    DeleteConversation {
        ticket: Ticket,
        conversation_id: String,
    },
    FetchConversation {
        ticket: Ticket,
        conversation_id: String,
    },
    /// Tell the user something
    Notify(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub detail: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            detail: detail.into(),
        }
    }
}

impl Effect {
    pub fn info(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Effect::Notify(Notice::info(title, detail))
    }

    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Effect::Notify(Notice::error(title, detail))
    }

    /// Whether executing this effect talks to the backend
    #[cfg(test)]
    pub fn is_request(&self) -> bool {
        !matches!(self, Effect::Notify(_))
    }
}
