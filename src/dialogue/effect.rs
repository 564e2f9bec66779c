//! Effects produced by the dialogue engine.
//!
//! The engine never talks to the chat transport directly. It returns a list
//! of effects and the host applies them in order.

use super::calendar::CalendarView;
use crate::db::UserSummary;
use serde::Serialize;
use std::fmt;

/// Transport-assigned id of an inbound chat message.
pub type MessageId = i64;

/// A button shown under a prompt. `data` is the callback payload the host
/// sends back when it is pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub label: String,
    pub data: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Unified effect type returned by [`DialogueEngine::handle`](super::DialogueEngine::handle).
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogueEffect {
    /// Delete an inbound message from the chat history (password entry).
    Redact { message_id: MessageId },

    /// Plain text reply.
    Reply { text: String },

    /// Text reply with buttons.
    Prompt { text: String, choices: Vec<Choice> },

    /// Main menu for a signed-in user.
    Menu { text: String, choices: Vec<Choice> },

    /// Show the date picker at its current step.
    Calendar { text: String, view: CalendarView },

    /// Login succeeded. The host keeps `token` for later `/start` and logout.
    Authenticated { token: String, profile: UserSummary },

    /// The host should forget any token it holds for this identity.
    SessionEnded,
}

impl DialogueEffect {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply { text: text.into() }
    }

    pub fn prompt(text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self::Prompt {
            text: text.into(),
            choices,
        }
    }

    /// The text of a reply-like effect, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Reply { text }
            | Self::Prompt { text, .. }
            | Self::Menu { text, .. }
            | Self::Calendar { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Debug for DialogueEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redact { message_id } => f
                .debug_struct("Redact")
                .field("message_id", message_id)
                .finish(),
            Self::Reply { text } => f.debug_struct("Reply").field("text", text).finish(),
            Self::Prompt { text, choices } => f
                .debug_struct("Prompt")
                .field("text", text)
                .field("choices", choices)
                .finish(),
            Self::Menu { text, choices } => f
                .debug_struct("Menu")
                .field("text", text)
                .field("choices", choices)
                .finish(),
            Self::Calendar { text, view } => f
                .debug_struct("Calendar")
                .field("text", text)
                .field("view", view)
                .finish(),
            Self::Authenticated { profile, .. } => f
                .debug_struct("Authenticated")
                .field("token", &"<redacted>")
                .field("profile", profile)
                .finish(),
            Self::SessionEnded => f.write_str("SessionEnded"),
        }
    }
}
