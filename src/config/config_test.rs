use std::io::Write;

use serial_test::serial;

use super::ChannelConfig;
use super::Settings;
use crate::Error;

/// # Case 1: defaults load without any file or environment
#[test]
#[serial]
fn test_defaults() {
    let settings = Settings::load(None).expect("load should succeed");
    assert_eq!(settings.channel.name_prefix, "cctrace");
    assert_eq!(settings.channel.max_depth, 10);
    assert_eq!(settings.channel.max_message_size, 4096);
    assert!(settings.trace.use_cache);
    assert!(settings.trace.restore_environment);
    assert_eq!(settings.trace.driver_grace_timeout_ms, 5000);
    assert_eq!(settings.driver.queue_env_var, "CCTRACE_MQ");
    assert!(settings.driver.command.is_empty());
}

/// # Case 2: TOML file overrides defaults
#[test]
#[serial]
fn test_toml_file_overrides() {
    let dir = tempfile::tempdir().expect("tempdir should succeed");
    let path = dir.path().join("cctrace.toml");
    let mut file = std::fs::File::create(&path).expect("create should succeed");
    writeln!(
        file,
        r#"
[channel]
name_prefix = "mytrace"
max_depth = 32

[trace]
driver_grace_timeout_ms = 250

[driver]
command = ["make", "-j4"]
"#
    )
    .expect("write should succeed");

    let settings =
        Settings::load(Some(path.to_str().expect("utf-8 path"))).expect("load should succeed");
    assert_eq!(settings.channel.name_prefix, "mytrace");
    assert_eq!(settings.channel.max_depth, 32);
    // untouched values fall back to defaults
    assert_eq!(settings.channel.max_message_size, 4096);
    assert_eq!(settings.trace.driver_grace_timeout_ms, 250);
    assert_eq!(settings.driver.command, vec!["make", "-j4"]);
}

/// # Case 3: environment variables win over defaults
#[test]
#[serial]
fn test_environment_overlay() {
    temp_env::with_var("CCTRACE_CHANNEL__MAX_DEPTH", Some("64"), || {
        let settings = Settings::load(None).expect("load should succeed");
        assert_eq!(settings.channel.max_depth, 64);
    });
}

/// # Case 4: validation rejects nonsensical channel capacity
#[test]
fn test_channel_validation() {
    let invalid_depth = ChannelConfig {
        max_depth: 0,
        ..ChannelConfig::default()
    };
    assert!(matches!(
        invalid_depth.validate(),
        Err(Error::InvalidConfig(_))
    ));

    let tiny_payload = ChannelConfig {
        max_message_size: 2,
        ..ChannelConfig::default()
    };
    assert!(matches!(
        tiny_payload.validate(),
        Err(Error::InvalidConfig(_))
    ));

    let slash_prefix = ChannelConfig {
        name_prefix: "a/b".to_string(),
        ..ChannelConfig::default()
    };
    assert!(matches!(
        slash_prefix.validate(),
        Err(Error::InvalidConfig(_))
    ));
}

/// # Case 5: zero grace timeout is rejected
#[test]
fn test_trace_validation() {
    let mut trace = super::TraceConfig::default();
    trace.driver_grace_timeout_ms = 0;
    assert!(matches!(trace.validate(), Err(Error::InvalidConfig(_))));
}
