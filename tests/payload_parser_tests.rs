use AdukiChatClient::models::payload::EmailItem;
use AdukiChatClient::services::payload_parser::{classify, Classification};

fn item(index: u32, from: &str, subject: &str, snippet: &str, thread_id: &str) -> EmailItem {
    EmailItem {
        index,
        from: from.to_string(),
        subject: subject.to_string(),
        snippet: snippet.to_string(),
        thread_id: thread_id.to_string(),
    }
}

#[test]
fn fenced_json_array_round_trips_in_order() {
    let items = vec![
        item(1, "alice@x.com", "Status", "All green", "t-1"),
        item(2, "bob@x.com", "Quote", "Here is my quote", "t-2"),
    ];
    let raw = format!("```json\n{}\n```", serde_json::to_string(&items).unwrap());
    assert_eq!(classify(&raw), Classification::EmailList(items));
}

#[test]
fn bare_json_array_without_fence() {
    let raw = r#"[{"threadId": "t-7", "from": "c@x.com", "subject": "Hi", "snippet": "hey"}]"#;
    match classify(raw) {
        Classification::EmailList(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].thread_id, "t-7");
            assert_eq!(items[0].index, 1);
        }
        Classification::Text => panic!("expected an email list"),
    }
}

#[test]
fn trailing_comma_is_tolerated() {
    let raw = r#"[{"threadId": "t-1", "from": "a@x.com", "subject": "s", "snippet": "x",},]"#;
    match classify(raw) {
        Classification::EmailList(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].from, "a@x.com");
        }
        Classification::Text => panic!("trailing comma should be repaired"),
    }
}

#[test]
fn single_quoted_tokens_are_repaired() {
    let raw = "[{'threadId': 't-1', 'from': 'a@x.com', 'subject': 'Hi', 'snippet': 'yo'}]";
    match classify(raw) {
        Classification::EmailList(items) => {
            assert_eq!(items[0].subject, "Hi");
            assert_eq!(items[0].thread_id, "t-1");
        }
        Classification::Text => panic!("single quotes should be repaired"),
    }
}

#[test]
fn balanced_scan_extracts_array_from_prose() {
    let raw = concat!(
        "Here are your latest emails:\n",
        r#"[{"threadId": "t-3", "from": "d@x.com", "subject": "Lunch", "snippet": "Friday?"}]"#,
        "\nLet me know if you want replies drafted."
    );
    match classify(raw) {
        Classification::EmailList(items) => assert_eq!(items[0].thread_id, "t-3"),
        Classification::Text => panic!("array embedded in prose should be found"),
    }
}

#[test]
fn loose_scan_recovers_when_bracket_inside_value_defeats_depth_scan() {
    // The unmatched "[" inside the subject keeps the depth scan from ever
    // balancing; the first-to-last-bracket window still parses.
    let raw = r#"Found one: [{"threadId": "t-9", "from": "ci@x.com", "subject": "Re: [urgent", "snippet": "see log"}]"#;
    match classify(raw) {
        Classification::EmailList(items) => {
            assert_eq!(items[0].subject, "Re: [urgent");
            assert_eq!(items[0].thread_id, "t-9");
        }
        Classification::Text => panic!("loose scan should recover this array"),
    }
}

#[test]
fn markdown_single_item() {
    let raw = "1. **From:** a@x.com\n**Subject:** Hi\n**Snippet:** hello";
    assert_eq!(
        classify(raw),
        Classification::EmailList(vec![item(1, "a@x.com", "Hi", "hello", "md-1")])
    );
}

#[test]
fn markdown_multiple_items_keep_source_order() {
    let raw = concat!(
        "Here is your inbox:\n",
        "1. **From:** alice@x.com\n**Subject:** Meeting\n**Snippet:** tomorrow at 10\n",
        "2. **From:** bob@x.com\n**Subject:** Report\n**Snippet:** due friday\n",
    );
    match classify(raw) {
        Classification::EmailList(items) => {
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].from, "alice@x.com");
            assert_eq!(items[0].thread_id, "md-1");
            assert_eq!(items[1].subject, "Report");
            assert_eq!(items[1].thread_id, "md-2");
        }
        Classification::Text => panic!("markdown list should be extracted"),
    }
}

#[test]
fn plain_prose_is_text_and_idempotent() {
    let raw = "Sure, I can help you draft that reply. What tone would you like?";
    assert_eq!(classify(raw), Classification::Text);
    assert_eq!(classify(raw), Classification::Text);
}

#[test]
fn json_without_thread_ids_is_text() {
    assert_eq!(classify("[1, 2, 3]"), Classification::Text);
    assert_eq!(
        classify(r#"[{"from": "a@x.com", "subject": "hi"}]"#),
        Classification::Text
    );
}

#[test]
fn degenerate_inputs_never_panic() {
    for raw in ["", "```", "[", "]", "[]", "1. **From:**", "{'a'}", "``` [ ``` ]"] {
        assert_eq!(classify(raw), Classification::Text, "input: {:?}", raw);
    }
}
