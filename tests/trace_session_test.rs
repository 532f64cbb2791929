//! End-to-end trace session: a real named queue, concurrent producers,
//! the termination handshake, and the decoded compile-command document.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use cctrace::decode_payloads;
use cctrace::run_driver;
use cctrace::write_compile_commands;
use cctrace::ChannelConfig;
use cctrace::CompileCommand;
use cctrace::DecodePolicy;
use cctrace::Error;
use cctrace::MessageQueue;
use cctrace::RawTraceMessage;
use cctrace::TraceError;
use cctrace::TraceMode;
use cctrace::TraceOutput;
use cctrace::TraceSession;
use tokio_util::sync::CancellationToken;

fn channel_config() -> ChannelConfig {
    ChannelConfig {
        name_prefix: "cctrace-it".to_string(),
        max_depth: 10,
        max_message_size: 4096,
    }
}

fn compile_event(
    routing_key: &str,
    file: &str,
) -> String {
    RawTraceMessage {
        routing_key: routing_key.to_string(),
        directory: "/build".to_string(),
        arguments: vec![
            "cc".to_string(),
            "-c".to_string(),
            file.to_string(),
            "-o".to_string(),
            format!("{file}.o"),
        ],
        mode: TraceMode::CompileCommand,
    }
    .encode()
}

/// A full session: producers attach by name and emit events (one of them
/// malformed), the driver's terminal handshake closes the session, and the
/// decoded document lands on disk. The queue name must be gone afterward.
#[tokio::test]
async fn test_session_end_to_end() {
    let session = TraceSession::create(&channel_config(), Duration::from_secs(2))
        .expect("session should be created");
    let queue_name = session.queue_name().to_string();

    let producer_name = queue_name.clone();
    let install = async move {
        // Two compiler-wrapper processes worth of events, interleaved with
        // one malformed payload that must be skipped, not fatal.
        let queue = MessageQueue::open(&producer_name)?;
        queue.send(compile_event("node-a", "alpha.c").as_bytes(), 1)?;
        queue.send(b"only:three:fields", 1)?;
        queue.send(compile_event("node-a", "beta.c").as_bytes(), 1)?;
        Ok(())
    };
    let driver = run_driver(install, queue_name.clone());

    let shutdown = CancellationToken::new();
    let payloads = session
        .collect(driver, &shutdown)
        .await
        .expect("collect should succeed");
    assert_eq!(payloads.len(), 3);

    // The session owns the queue name; it must not survive the session.
    assert!(matches!(
        MessageQueue::open(&queue_name),
        Err(cctrace::ChannelError::NotFound(_))
    ));

    let messages = decode_payloads(&payloads);
    assert_eq!(messages.len(), 2);

    let policy = DecodePolicy::CompileCommands {
        known_keys: HashSet::from(["node-a".to_string()]),
    };
    let TraceOutput::CompileCommands(by_spec) = policy.decode(messages) else {
        panic!("compile-commands policy should yield compile commands");
    };
    assert_eq!(by_spec["node-a"].len(), 2);

    let dir = tempfile::tempdir().expect("tempdir should succeed");
    let destination = dir.path().join("compile_commands.json");
    let destinations =
        HashMap::from([("node-a".to_string(), destination.clone())]);
    let written = write_compile_commands(&by_spec, &destinations).await;
    assert_eq!(written, 1);

    let bytes = std::fs::read(&destination).expect("document should exist");
    let commands: Vec<CompileCommand> =
        serde_json::from_slice(&bytes).expect("parse should succeed");
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].output.as_deref(), Some("alpha.c.o"));
}

/// A driver that never performs the terminal handshake bounds the session
/// with `DriverAbandoned` instead of hanging, and still releases the name.
#[tokio::test]
async fn test_session_driver_abandoned() {
    let session = TraceSession::create(&channel_config(), Duration::from_millis(200))
        .expect("session should be created");
    let queue_name = session.queue_name().to_string();

    let shutdown = CancellationToken::new();
    let result = session.collect(async {}, &shutdown).await;
    assert!(matches!(
        result,
        Err(Error::Trace(TraceError::DriverAbandoned { .. }))
    ));
    assert!(matches!(
        MessageQueue::open(&queue_name),
        Err(cctrace::ChannelError::NotFound(_))
    ));
}
