use serde::{Deserialize, Serialize};

use crate::models::payload::{EmailItem, StructuredPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Normalizes the wire role from the session log. The backend stores
    /// assistant turns as "bot"; anything that isn't "user" is treated as
    /// the assistant.
    pub fn from_wire(role: &str) -> Role {
        if role.eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

/// One message in a conversation. Immutable once appended; ordering within a
/// session is append-only and defines display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub payload: Option<StructuredPayload>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Turn {
        Turn {
            role: Role::User,
            text: text.into(),
            payload: None,
        }
    }

    pub fn assistant(text: impl Into<String>, payload: Option<StructuredPayload>) -> Turn {
        Turn {
            role: Role::Assistant,
            text: text.into(),
            payload,
        }
    }
}

/// A named, persisted conversation thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

impl Session {
    pub fn empty(session_id: impl Into<String>) -> Session {
        Session {
            session_id: session_id.into(),
            turns: Vec::new(),
        }
    }

    /// The most recent assistant turn carrying an email list. Earlier
    /// payloads are historical and inert; only this one is eligible for
    /// user interaction.
    pub fn active_email_list(&self) -> Option<&[EmailItem]> {
        self.turns
            .iter()
            .rev()
            .filter(|turn| turn.role == Role::Assistant)
            .find_map(|turn| turn.payload.as_ref())
            .and_then(|payload| payload.as_email_list())
    }

    /// The most recent assistant turn with no structured payload, the only
    /// kind of turn eligible for speech playback.
    pub fn last_spoken_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant && turn.payload.is_none())
            .map(|turn| turn.text.as_str())
    }
}
