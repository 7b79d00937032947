use std::fmt;
use serde::{Deserialize, Serialize};

/// One email extracted from an assistant reply.
///
/// `thread_id` is the stable identity. When the item was recovered from a
/// markdown list rather than real JSON there is no identifier to recover, so
/// the id is synthesized as `md-<index>` and is only unique within that one
/// extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailItem {
    /// 1-based, in order of appearance in the source text. Never re-sorted.
    pub index: u32,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
}

impl fmt::Display for EmailItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. From: {} | Subject: {} | {}",
            self.index, self.from, self.subject, self.snippet
        )
    }
}

/// Machine-usable data extracted from an assistant turn's text.
///
/// A tagged union so further variants (calendar events, contact lists) can be
/// added without touching the turn model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StructuredPayload {
    EmailList { items: Vec<EmailItem> },
}

impl StructuredPayload {
    pub fn as_email_list(&self) -> Option<&[EmailItem]> {
        match self {
            StructuredPayload::EmailList { items } => Some(items),
        }
    }
}

pub fn format_email_list(items: &[EmailItem]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
