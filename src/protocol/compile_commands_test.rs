use std::collections::HashSet;

use super::CompileCommand;
use super::DecodePolicy;
use super::RawTraceMessage;
use super::TraceMode;
use super::TraceOutput;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn cc_message(key: &str, arguments: &[&str]) -> RawTraceMessage {
    RawTraceMessage {
        routing_key: key.to_string(),
        directory: "/build".to_string(),
        arguments: args(arguments),
        mode: TraceMode::CompileCommand,
    }
}

/// # Case 1: output is the argument following a literal "-o"
///
/// ## Validation criteria:
/// 1. `["-c", "foo.c", "-o", "foo.o"]` -> file "foo.o" (last element),
///    output "foo.o"
#[test]
fn test_extraction_with_output_flag() {
    let command = CompileCommand::from_invocation(
        "/build".to_string(),
        args(&["-c", "foo.c", "-o", "foo.o"]),
    )
    .expect("record should be produced");
    assert_eq!(command.file, "foo.o");
    assert_eq!(command.output.as_deref(), Some("foo.o"));
    assert_eq!(command.directory, "/build");
}

/// # Case 2: no "-o" token means no output
#[test]
fn test_extraction_without_output_flag() {
    let command = CompileCommand::from_invocation("/build".to_string(), args(&["-c", "foo.c"]))
        .expect("record should be produced");
    assert_eq!(command.file, "foo.c");
    assert_eq!(command.output, None);
}

/// # Case 3: trailing "-o" with nothing after it means no output
#[test]
fn test_extraction_with_trailing_output_flag() {
    let command = CompileCommand::from_invocation("/build".to_string(), args(&["foo.c", "-o"]))
        .expect("record should be produced");
    assert_eq!(command.file, "-o");
    assert_eq!(command.output, None);
}

/// # Case 4: empty argument vector produces no record
#[test]
fn test_extraction_empty_arguments() {
    assert!(CompileCommand::from_invocation("/build".to_string(), vec![]).is_none());
}

/// # Case 5: compile-commands policy groups by routing key and filters
///
/// ## Validation criteria:
/// 1. Only cc-mode messages become records
/// 2. Unknown routing keys are dropped
/// 3. Records for one spec keep receipt order
#[test]
fn test_compile_commands_policy_grouping() {
    let known_keys: HashSet<String> = ["spec-a".to_string(), "spec-b".to_string()].into();
    let messages = vec![
        cc_message("spec-a", &["-c", "one.c", "-o", "one.o"]),
        RawTraceMessage {
            mode: TraceMode::Other("link".to_string()),
            ..cc_message("spec-a", &["-r", "one.o"])
        },
        cc_message("spec-b", &["-c", "two.c"]),
        cc_message("unknown", &["-c", "three.c"]),
        cc_message("spec-a", &["-c", "four.c", "-o", "four.o"]),
    ];

    let policy = DecodePolicy::CompileCommands { known_keys };
    let TraceOutput::CompileCommands(by_spec) = policy.decode(messages) else {
        panic!("expected compile-commands output");
    };

    assert_eq!(by_spec.len(), 2);
    let spec_a = &by_spec["spec-a"];
    assert_eq!(spec_a.len(), 2);
    assert_eq!(spec_a[0].file, "one.o");
    assert_eq!(spec_a[1].file, "four.o");
    assert_eq!(by_spec["spec-b"][0].output, None);
}

/// # Case 6: raw-log policy preserves every message without extraction
#[test]
fn test_raw_log_policy_preserves_all_modes() {
    let messages = vec![
        cc_message("spec-a", &["-c", "one.c"]),
        RawTraceMessage {
            mode: TraceMode::Other("link".to_string()),
            ..cc_message("unknown", &["-r", "one.o"])
        },
    ];

    let TraceOutput::RawLog(entries) = DecodePolicy::RawLog.decode(messages) else {
        panic!("expected raw-log output");
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].mode, "cc");
    assert_eq!(entries[1].mode, "link");
    assert_eq!(entries[1].arguments, args(&["-r", "one.o"]));
}
