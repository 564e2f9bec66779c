//! Inbound dialogue events.
//!
//! Raw chat input (message text or button callback payload) is decoded once,
//! here, into a closed [`DialogueEvent`]. Nothing past this point matches on
//! strings.

use super::calendar::CalendarInput;
use super::effect::MessageId;
use crate::db::Role;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

/// Raw input as delivered by the chat transport.
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawInput {
    Message { message_id: MessageId, text: String },
    Callback { data: String },
}

impl fmt::Debug for RawInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message { message_id, text } => f
                .debug_struct("Message")
                .field("message_id", message_id)
                .field("len", &text.len())
                .finish(),
            Self::Callback { data } => f.debug_struct("Callback").field("data", data).finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown callback: {0}")]
    UnknownCallback(String),
    #[error("logout requires a session token")]
    MissingToken,
}

/// A decoded dialogue event.
#[derive(Clone)]
pub enum DialogueEvent {
    /// `/start`, optionally presenting the token the host holds.
    Start { token: Option<String> },
    BeginRegistration,
    BeginLogin,
    /// Free text. May carry a password, so it is wiped on drop.
    Text {
        message_id: MessageId,
        text: Zeroizing<String>,
    },
    Calendar(CalendarInput),
    ChooseRole(Role),
    Cancel,
    Logout { token: String },
}

impl DialogueEvent {
    pub fn text(message_id: MessageId, text: impl Into<String>) -> Self {
        Self::Text {
            message_id,
            text: Zeroizing::new(text.into()),
        }
    }

    /// Decode raw transport input. `session_token` is whatever token the host
    /// currently holds for this identity.
    pub fn decode(raw: RawInput, session_token: Option<String>) -> Result<Self, DecodeError> {
        match raw {
            RawInput::Message { message_id, text } => {
                // Only exact commands; anything else slash-prefixed is field text.
                match text.trim() {
                    "/start" => Ok(Self::Start {
                        token: session_token,
                    }),
                    "/cancel" => Ok(Self::Cancel),
                    "/logout" => logout(session_token),
                    _ => Ok(Self::Text {
                        message_id,
                        text: Zeroizing::new(text),
                    }),
                }
            }
            RawInput::Callback { data } => Self::decode_callback(&data, session_token),
        }
    }

    fn decode_callback(data: &str, session_token: Option<String>) -> Result<Self, DecodeError> {
        let unknown = || DecodeError::UnknownCallback(data.to_string());
        match data {
            "register_init" => return Ok(Self::BeginRegistration),
            "login_init" => return Ok(Self::BeginLogin),
            "role_follower" => return Ok(Self::ChooseRole(Role::Follower)),
            "role_leader" => return Ok(Self::ChooseRole(Role::Leader)),
            "cancel" => return Ok(Self::Cancel),
            "logout" => return logout(session_token),
            "cal:back" => return Ok(Self::Calendar(CalendarInput::Back)),
            _ => {}
        }

        let Some(rest) = data.strip_prefix("cal:") else {
            return Err(unknown());
        };
        let Some((part, value)) = rest.split_once(':') else {
            return Err(unknown());
        };
        let input = match part {
            "y" => CalendarInput::Year(value.parse().map_err(|_| unknown())?),
            "m" => CalendarInput::Month(value.parse().map_err(|_| unknown())?),
            "d" => CalendarInput::Day(value.parse().map_err(|_| unknown())?),
            _ => return Err(unknown()),
        };
        Ok(Self::Calendar(input))
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::BeginRegistration => "register_init",
            Self::BeginLogin => "login_init",
            Self::Text { .. } => "text",
            Self::Calendar(_) => "calendar",
            Self::ChooseRole(_) => "role",
            Self::Cancel => "cancel",
            Self::Logout { .. } => "logout",
        }
    }
}

fn logout(session_token: Option<String>) -> Result<DialogueEvent, DecodeError> {
    session_token
        .map(|token| DialogueEvent::Logout { token })
        .ok_or(DecodeError::MissingToken)
}

impl fmt::Debug for DialogueEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start { token } => f
                .debug_struct("Start")
                .field("token", &token.as_ref().map(|_| "<redacted>"))
                .finish(),
            Self::Text { message_id, text } => f
                .debug_struct("Text")
                .field("message_id", message_id)
                .field("len", &text.len())
                .finish(),
            Self::Logout { .. } => f
                .debug_struct("Logout")
                .field("token", &"<redacted>")
                .finish(),
            Self::BeginRegistration => f.write_str("BeginRegistration"),
            Self::BeginLogin => f.write_str("BeginLogin"),
            Self::Calendar(input) => f.debug_tuple("Calendar").field(input).finish(),
            Self::ChooseRole(role) => f.debug_tuple("ChooseRole").field(role).finish(),
            Self::Cancel => f.write_str("Cancel"),
        }
    }
}
