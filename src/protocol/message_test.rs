use super::decode_payloads;
use super::is_terminal_payload;
use super::RawTraceMessage;
use super::TraceMode;
use crate::ProtocolError;

fn sample_message() -> RawTraceMessage {
    RawTraceMessage {
        routing_key: "abc123".to_string(),
        directory: "/tmp/build".to_string(),
        arguments: vec![
            "cc".to_string(),
            "-c".to_string(),
            "foo.c".to_string(),
            "-o".to_string(),
            "foo.o".to_string(),
        ],
        mode: TraceMode::CompileCommand,
    }
}

/// # Case 1: encode/decode round-trip
///
/// ## Validation criteria:
/// 1. For fields with no embedded separator bytes, decoding the encoding
///    reproduces every field exactly
#[test]
fn test_round_trip() {
    let message = sample_message();
    let decoded =
        RawTraceMessage::decode(message.encode().as_bytes()).expect("decode should succeed");
    assert_eq!(decoded, message);
}

/// # Case 2: wire layout is bit-exact
#[test]
fn test_encode_wire_layout() {
    let message = RawTraceMessage {
        routing_key: "h".to_string(),
        directory: "/wd".to_string(),
        arguments: vec!["cc".to_string(), "x.c".to_string()],
        mode: TraceMode::CompileCommand,
    };
    assert_eq!(message.encode(), "h:/wd:cc\x07x.c:cc");
}

/// # Case 3: fewer than four fields is malformed
#[test]
fn test_decode_too_few_fields() {
    match RawTraceMessage::decode(b"hash:/wd:args") {
        Err(ProtocolError::Malformed { fields }) => assert_eq!(fields, 3),
        other => panic!("expected Malformed, got {:?}", other),
    }
}

/// # Case 4: more than four fields is malformed, not truncated
#[test]
fn test_decode_too_many_fields() {
    match RawTraceMessage::decode(b"hash:/wd:args:cc:extra") {
        Err(ProtocolError::Malformed { fields }) => assert_eq!(fields, 5),
        other => panic!("expected Malformed, got {:?}", other),
    }
}

/// # Case 5: non-UTF-8 payload is malformed
#[test]
fn test_decode_non_utf8() {
    assert!(matches!(
        RawTraceMessage::decode(&[0xff, 0xfe, b':', b':', b':']),
        Err(ProtocolError::NotUtf8)
    ));
}

/// # Case 6: unrecognized mode is preserved verbatim
#[test]
fn test_decode_other_mode() {
    let decoded =
        RawTraceMessage::decode(b"hash:/wd:ld\x07-r:link").expect("decode should succeed");
    assert_eq!(decoded.mode, TraceMode::Other("link".to_string()));
    assert_eq!(decoded.mode.as_wire(), "link");
}

/// # Case 7: a session with one malformed payload among N well-formed ones
/// yields exactly N messages
#[test]
fn test_decode_payloads_skips_malformed() {
    let good = sample_message().encode();
    let payloads = vec![good.clone(), "not-enough-fields".to_string(), good.clone()];

    let messages = decode_payloads(&payloads);
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.routing_key == "abc123"));
}

/// # Case 8: terminal sentinel matched by exact payload equality
#[test]
fn test_terminal_sentinel_equality() {
    assert!(is_terminal_payload(b"DONE"));
    assert!(!is_terminal_payload(b"DONE "));
    assert!(!is_terminal_payload(b"done"));
}
