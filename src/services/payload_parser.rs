use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::models::payload::{EmailItem, StructuredPayload};

lazy_static! {
    static ref RE_CODE_FENCE: Regex = Regex::new(r"```[A-Za-z0-9]*").unwrap();
    static ref RE_TRAILING_COMMA: Regex = Regex::new(r",\s*([}\]])").unwrap();
    // A single-quoted token is only rewritten when the closing quote is
    // followed by a structural character, so quoting inside values is left
    // alone.
    static ref RE_SINGLE_QUOTED: Regex = Regex::new(r"'([^'\n]*)'(\s*[:,}\]])").unwrap();
    static ref RE_MD_ITEM_START: Regex = Regex::new(r"\d+\.\s*\*\*From:\*\*").unwrap();
    static ref RE_MD_FIELDS: Regex = Regex::new(
        r"(?s)\*\*From:\*\*\s*(.*?)\s*\*\*Subject:\*\*\s*(.*?)\s*\*\*Snippet:\*\*\s*(.*)$"
    )
    .unwrap();
}

/// Result of classifying a raw assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    EmailList(Vec<EmailItem>),
    Text,
}

/// Classifies an untrusted, possibly malformed reply string. Total: any
/// failure to extract a structured payload degrades to `Text`, never an
/// error.
///
/// Strategies are tried in order, first success wins:
/// fenced/direct JSON, balanced bracket scan, loose first-`[`-to-last-`]`
/// scan, sanitized whole string, markdown numbered list.
pub fn classify(raw: &str) -> Classification {
    let stripped = RE_CODE_FENCE.replace_all(raw, "");

    if let Some(items) = parse_email_array(&stripped) {
        return Classification::EmailList(items);
    }
    if let Some(candidate) = balanced_array(&stripped) {
        if let Some(items) = parse_email_array(&sanitize_json(candidate)) {
            return Classification::EmailList(items);
        }
    }
    if let Some(candidate) = loose_array(&stripped) {
        if let Some(items) = parse_email_array(&sanitize_json(candidate)) {
            return Classification::EmailList(items);
        }
    }
    if let Some(items) = parse_email_array(&sanitize_json(&stripped)) {
        return Classification::EmailList(items);
    }
    if let Some(items) = extract_markdown_list(raw) {
        return Classification::EmailList(items);
    }
    Classification::Text
}

/// Convenience wrapper producing the turn-level payload type.
pub fn classify_payload(raw: &str) -> Option<StructuredPayload> {
    match classify(raw) {
        Classification::EmailList(items) => Some(StructuredPayload::EmailList { items }),
        Classification::Text => None,
    }
}

/// Parses `text` as JSON and accepts it only if it is a non-empty array in
/// which some element carries a `threadId` field. The guard keeps
/// coincidental JSON (citation lists, number arrays) out of the email path.
fn parse_email_array(text: &str) -> Option<Vec<EmailItem>> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    let array = value.as_array()?;
    if array.is_empty() || !array.iter().any(|el| el.get("threadId").is_some()) {
        return None;
    }
    let items = array
        .iter()
        .enumerate()
        .map(|(pos, el)| EmailItem {
            index: el
                .get("index")
                .or_else(|| el.get("idx"))
                .and_then(Value::as_u64)
                .map(|n| n as u32)
                .unwrap_or(pos as u32 + 1),
            from: string_field(el, "from"),
            subject: string_field(el, "subject"),
            snippet: string_field(el, "snippet"),
            thread_id: string_field(el, "threadId"),
        })
        .collect();
    Some(items)
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Depth-scans from the first `[` for the first balanced array substring.
/// Deliberately naive about brackets inside string values; when that defeats
/// it, the loose scan below picks up the slack.
fn balanced_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0i32;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Fallback window: everything from the first `[` to the last `]`.
fn loose_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Best-effort repair of near-JSON: trailing commas before a closer, and
/// single-quoted tokens terminated by a structural character. Not a JSON5
/// parser.
fn sanitize_json(text: &str) -> String {
    let requoted = RE_SINGLE_QUOTED.replace_all(text, "\"${1}\"${2}");
    RE_TRAILING_COMMA.replace_all(&requoted, "${1}").into_owned()
}

/// Extracts repeated `N. **From:** … **Subject:** … **Snippet:** …` blocks.
/// Each field spans to the next numbered item or the end of the string.
fn extract_markdown_list(text: &str) -> Option<Vec<EmailItem>> {
    let starts: Vec<usize> = RE_MD_ITEM_START.find_iter(text).map(|m| m.start()).collect();
    if starts.is_empty() {
        return None;
    }
    let mut items = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        let block = &text[start..end];
        if let Some(caps) = RE_MD_FIELDS.captures(block) {
            let index = items.len() as u32 + 1;
            items.push(EmailItem {
                index,
                from: caps[1].trim().to_string(),
                subject: caps[2].trim().to_string(),
                snippet: caps[3].trim().to_string(),
                thread_id: format!("md-{}", index),
            });
        }
    }
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
