use super::*;

// =============================================================
// OutboundMessage
// =============================================================

#[test]
fn outbound_message_encodes_token_then_content() {
    let msg = OutboundMessage::new("abc", "hello");
    assert_eq!(msg.encode().unwrap(), r#"{"token":"abc","content":"hello"}"#);
}

#[test]
fn outbound_message_escapes_json_specials_in_content() {
    let msg = OutboundMessage::new("t", "say \"hi\"\n");
    assert_eq!(msg.encode().unwrap(), r#"{"token":"t","content":"say \"hi\"\n"}"#);
}

// =============================================================
// Inbound decoding
// =============================================================

#[test]
fn decode_inbound_single_message() {
    let frame = decode_inbound(r#"{"username":"alice","content":"hi"}"#).unwrap();
    assert_eq!(frame, InboundFrame::Message(ChatMessage::new("alice", "hi")));
}

#[test]
fn decode_inbound_ignores_echoed_token_and_unknown_fields() {
    let frame = decode_inbound(
        r#"{"username":"alice","content":"hi","token":"secret-jwt","timestamp":"2024-01-02 03:04:05","extra":1}"#,
    )
    .unwrap();
    let InboundFrame::Message(msg) = frame else {
        panic!("expected single message frame");
    };
    assert_eq!(msg.timestamp.as_deref(), Some("2024-01-02 03:04:05"));
    let reencoded = serde_json::to_string(&msg).unwrap();
    assert!(!reencoded.contains("secret-jwt"));
}

#[test]
fn decode_inbound_empty_or_null_timestamp_is_none() {
    let empty = decode_inbound(r#"{"username":"Bot","content":"x","timestamp":""}"#).unwrap();
    let null = decode_inbound(r#"{"username":"Bot","content":"x","timestamp":null}"#).unwrap();
    assert_eq!(empty, InboundFrame::Message(ChatMessage::new("Bot", "x")));
    assert_eq!(null, InboundFrame::Message(ChatMessage::new("Bot", "x")));
}

#[test]
fn decode_inbound_history_array() {
    let frame = decode_inbound(
        r#"[{"username":"a","content":"1"},{"username":"b","content":"2","timestamp":"t"}]"#,
    )
    .unwrap();
    assert_eq!(
        frame,
        InboundFrame::History(vec![ChatMessage::new("a", "1"), ChatMessage::new("b", "2").with_timestamp("t")])
    );
}

#[test]
fn decode_inbound_empty_array_is_empty_history() {
    assert_eq!(decode_inbound("[]").unwrap(), InboundFrame::History(Vec::new()));
}

#[test]
fn decode_inbound_rejects_malformed_json() {
    assert!(decode_inbound("{not json").is_err());
}

#[test]
fn decode_inbound_rejects_missing_fields() {
    assert!(decode_inbound(r#"{"username":"alice"}"#).is_err());
    assert!(decode_inbound(r#"{"content":"hi"}"#).is_err());
}

#[test]
fn decode_inbound_rejects_non_text_fields() {
    assert!(decode_inbound(r#"{"username":1,"content":"hi"}"#).is_err());
    assert!(decode_inbound(r#""just a string""#).is_err());
}
