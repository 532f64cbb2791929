use std::collections::HashMap;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use super::RawTraceMessage;
use super::TraceMode;

/// One structured record per compiler invocation, the unit of the
/// compile_commands.json artifact. A single build graph node owns many of
/// these, one per source file compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    /// Raw argument vector of the invocation, in order
    pub arguments: Vec<String>,
    /// Working directory the compiler ran in
    pub directory: String,
    /// Last positional argument of the invocation
    pub file: String,
    /// Argument following a literal `-o` token, absent when not found
    pub output: Option<String>,
}

impl CompileCommand {
    /// Build a record from one invocation. Returns `None` for an empty
    /// argument vector, which carries nothing worth recording.
    pub fn from_invocation(
        directory: String,
        arguments: Vec<String>,
    ) -> Option<Self> {
        let file = arguments.last()?.clone();
        let output = arguments
            .iter()
            .position(|arg| arg == "-o")
            .and_then(|idx| arguments.get(idx + 1))
            .cloned();
        Some(CompileCommand {
            arguments,
            directory,
            file,
            output,
        })
    }
}

/// Raw-log rendition of one message: everything preserved, no
/// compile-command-specific extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawLogEntry {
    pub directory: String,
    pub arguments: Vec<String>,
    pub mode: String,
}

/// Selects between the two decode policies over the same raw message
/// stream, instead of scattering mode branches through the pipeline.
#[derive(Debug)]
pub enum DecodePolicy {
    /// Per-routing-key compile-command records; only `cc`-mode messages
    /// whose routing key appears in `known_keys` are converted.
    CompileCommands { known_keys: HashSet<String> },
    /// Every message preserved as a [`RawLogEntry`]
    RawLog,
}

#[derive(Debug)]
pub enum TraceOutput {
    CompileCommands(HashMap<String, Vec<CompileCommand>>),
    RawLog(Vec<RawLogEntry>),
}

impl DecodePolicy {
    pub fn decode(
        &self,
        messages: Vec<RawTraceMessage>,
    ) -> TraceOutput {
        match self {
            DecodePolicy::CompileCommands { known_keys } => {
                TraceOutput::CompileCommands(group_compile_commands(messages, known_keys))
            }
            DecodePolicy::RawLog => TraceOutput::RawLog(
                messages
                    .into_iter()
                    .map(|msg| RawLogEntry {
                        directory: msg.directory,
                        arguments: msg.arguments,
                        mode: msg.mode.as_wire().to_string(),
                    })
                    .collect(),
            ),
        }
    }
}

/// Separate messages by the spec that produced them and shape each into a
/// well-formed [`CompileCommand`]. Messages in a non-data mode, with an
/// unknown routing key, or with an empty argument vector are skipped.
fn group_compile_commands(
    messages: Vec<RawTraceMessage>,
    known_keys: &HashSet<String>,
) -> HashMap<String, Vec<CompileCommand>> {
    let mut by_spec: HashMap<String, Vec<CompileCommand>> = HashMap::new();
    for msg in messages {
        if msg.mode != TraceMode::CompileCommand {
            continue;
        }
        if !known_keys.contains(&msg.routing_key) {
            warn!(
                "trace message with unknown routing key '{}' dropped",
                msg.routing_key
            );
            continue;
        }
        match CompileCommand::from_invocation(msg.directory, msg.arguments) {
            Some(command) => by_spec.entry(msg.routing_key).or_default().push(command),
            None => {
                warn!(
                    "trace message for '{}' carried an empty argument vector",
                    msg.routing_key
                );
            }
        }
    }
    by_spec
}
