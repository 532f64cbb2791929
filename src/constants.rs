// -
// Event wire format

/// Separates the four envelope fields: routing key, working directory,
/// joined arguments, mode. Out-of-band for everything but raw argument text.
pub(crate) const FIELD_SEPARATOR: char = ':';

/// Joins the entries of the raw argument vector inside the third envelope
/// field. BEL was chosen because it essentially never appears in compiler
/// argument text, so arguments are never mistaken for field boundaries.
pub(crate) const ARGUMENT_SEPARATOR: char = '\x07';

/// Wire value of the mode field for data-producing compile invocations
pub(crate) const COMPILE_COMMAND_MODE: &str = "cc";

// -
// Termination handshake

/// Sentinel payload the build driver sends when it finishes, matched by
/// exact equality. Must be sent at [`TERMINAL_PRIORITY`] so that every data
/// event already queued is delivered first.
pub(crate) const TERMINAL_PAYLOAD: &str = "DONE";

/// Lower than any data event's priority; the kernel's priority ordering is
/// what guarantees the sentinel arrives last.
pub(crate) const TERMINAL_PRIORITY: u32 = 0;

/// Priority used by compiler-wrapper senders for data events
pub(crate) const DATA_PRIORITY: u32 = 1;

// -
// Queue capacity negotiated at creation (immutable for the life of the name)

pub(crate) const DEFAULT_QUEUE_DEPTH: i64 = 10;
pub(crate) const DEFAULT_MAX_MESSAGE_SIZE: i64 = 4096;

// -
// Graph roles and well-known file names

/// Dependency name satisfying the compiler-wrapper role in a concretized spec
pub(crate) const COMPILER_WRAPPER_NAME: &str = "compiler-wrapper";

/// The instrumented wrapper spec that substitution redirects the role edge to
pub(crate) const TRACING_WRAPPER_NAME: &str = "tracing-compiler-wrapper";

/// Cache file holding the serialized concretization of the tracing wrapper;
/// existence is the cache-hit test.
pub(crate) const WRAPPER_CACHE_FILE: &str = "tracing-compiler-wrapper.spec.json";

/// Per-spec persisted concretization under the source root
pub(crate) const TRACE_SPEC_FILE: &str = "trace_spec.json";

/// Output artifact name per traced spec
pub(crate) const COMPILE_COMMANDS_FILE: &str = "compile_commands.json";

/// Output artifact name for a raw-log trace of an external command
pub(crate) const RAW_LOG_FILE: &str = "trace_log.json";
