use tracing::warn;

use crate::constants::ARGUMENT_SEPARATOR;
use crate::constants::COMPILE_COMMAND_MODE;
use crate::constants::FIELD_SEPARATOR;
use crate::constants::TERMINAL_PAYLOAD;
use crate::ProtocolError;

/// Invocation mode carried in the fourth envelope field.
///
/// Only [`TraceMode::CompileCommand`] messages are turned into
/// compile-command records; every other mode is preserved verbatim for the
/// raw-log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceMode {
    CompileCommand,
    Other(String),
}

impl TraceMode {
    pub fn from_wire(mode: &str) -> Self {
        if mode == COMPILE_COMMAND_MODE {
            TraceMode::CompileCommand
        } else {
            TraceMode::Other(mode.to_string())
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            TraceMode::CompileCommand => COMPILE_COMMAND_MODE,
            TraceMode::Other(mode) => mode,
        }
    }
}

/// One decoded trace event: the routing key ties the invocation back to the
/// concretized spec whose build produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTraceMessage {
    pub routing_key: String,
    pub directory: String,
    pub arguments: Vec<String>,
    pub mode: TraceMode,
}

impl RawTraceMessage {
    /// Decode one payload. The envelope must split into exactly four
    /// colon-delimited fields; anything else is malformed and the caller
    /// skips it — a bad message must never crash the collector.
    pub fn decode(payload: &[u8]) -> std::result::Result<Self, ProtocolError> {
        let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::NotUtf8)?;
        let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();
        if fields.len() != 4 {
            return Err(ProtocolError::Malformed {
                fields: fields.len(),
            });
        }
        let arguments = fields[2]
            .split(ARGUMENT_SEPARATOR)
            .map(str::to_string)
            .collect();
        Ok(RawTraceMessage {
            routing_key: fields[0].to_string(),
            directory: fields[1].to_string(),
            arguments,
            mode: TraceMode::from_wire(fields[3]),
        })
    }

    /// Encode to the exact wire layout the compiler wrapper produces.
    pub fn encode(&self) -> String {
        format!(
            "{key}{sep}{dir}{sep}{args}{sep}{mode}",
            key = self.routing_key,
            dir = self.directory,
            args = self
                .arguments
                .join(&ARGUMENT_SEPARATOR.to_string()),
            sep = FIELD_SEPARATOR,
            mode = self.mode.as_wire(),
        )
    }
}

/// True when `payload` is the well-known terminal sentinel, matched by
/// exact equality.
pub fn is_terminal_payload(payload: &[u8]) -> bool {
    payload == TERMINAL_PAYLOAD.as_bytes()
}

/// Decode a whole session's payloads in receipt order, skipping malformed
/// entries with a warning.
pub fn decode_payloads(payloads: &[String]) -> Vec<RawTraceMessage> {
    let mut messages = Vec::with_capacity(payloads.len());
    for payload in payloads {
        match RawTraceMessage::decode(payload.as_bytes()) {
            Ok(message) => messages.push(message),
            Err(e) => {
                warn!("skipping malformed trace message: {}", e);
            }
        }
    }
    messages
}
