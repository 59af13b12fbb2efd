//! Integration tests for the logger initializers
//!
//! These tests verify:
//! - Events reach attached writers in text and JSON encodings
//! - Caller annotation (trimmed, full, disabled, and unresolvable)
//! - Level filtering
//! - The rotating file sink end to end
//! - Global installation with the `log` facade bridge

use std::fs;
use tempfile::TempDir;
use xlog::{Builder, BufferWriter, LogConfig};

/// Config with both standard sinks disabled, so output only reaches the
/// writer attached by the test.
fn capture_config() -> LogConfig {
    LogConfig {
        console: false,
        file: false,
        no_color: true,
        ..LogConfig::default()
    }
}

fn capture(config: LogConfig, f: impl FnOnce()) -> String {
    let buffer = BufferWriter::new();
    let subscriber = Builder::new()
        .with_config(config)
        .with_writer(buffer.clone())
        .build()
        .expect("failed to build subscriber");
    tracing::subscriber::with_default(subscriber, f);
    buffer.contents()
}

#[test]
fn test_text_output_carries_message_fields_and_caller() {
    let config = LogConfig {
        json: false,
        ..capture_config()
    };
    let output = capture(config, || {
        tracing::info!(user = "alice", attempts = 3, "login accepted");
    });

    assert!(output.contains("INFO"), "missing level: {output}");
    assert!(output.contains("login accepted"), "missing message: {output}");
    assert!(output.contains("user=alice"), "missing field: {output}");
    assert!(output.contains("attempts=3"), "missing field: {output}");
    // Default trim width keeps the bare file name.
    assert!(
        output.contains("integration_tests.rs:"),
        "missing trimmed caller: {output}"
    );
    assert!(!output.contains("tests/integration_tests.rs"));
}

#[test]
fn test_json_output_shape() {
    let output = capture(capture_config(), || {
        tracing::warn!(code = 503, retryable = true, "upstream unavailable");
    });

    let line = output.lines().next().expect("one JSON line");
    let parsed: serde_json::Value = serde_json::from_str(line).expect("valid JSON");

    assert_eq!(parsed["level"], "WARN");
    assert_eq!(parsed["message"], "upstream unavailable");
    assert_eq!(parsed["code"], 503);
    assert_eq!(parsed["retryable"], true);
    assert!(parsed["timestamp"].is_string());
    assert!(parsed["target"].is_string());
    let caller = parsed["caller"].as_str().expect("caller string");
    assert!(
        caller.starts_with("integration_tests.rs:"),
        "unexpected caller: {caller}"
    );
}

#[test]
fn test_full_caller_keeps_whole_path() {
    let config = LogConfig {
        full_caller: true,
        ..capture_config()
    };
    let output = capture(config, || {
        tracing::info!("full path please");
    });

    let line = output.lines().next().expect("one JSON line");
    let parsed: serde_json::Value = serde_json::from_str(line).expect("valid JSON");
    let caller = parsed["caller"].as_str().expect("caller string");
    // The untrimmed location is exactly what the compiler recorded.
    assert!(
        caller.starts_with(&format!("{}:", file!())),
        "unexpected caller: {caller}"
    );
}

#[test]
fn test_caller_annotation_can_be_disabled() {
    let config = LogConfig {
        caller: false,
        ..capture_config()
    };
    let output = capture(config, || {
        tracing::info!("anonymous");
    });

    let line = output.lines().next().expect("one JSON line");
    let parsed: serde_json::Value = serde_json::from_str(line).expect("valid JSON");
    assert!(parsed.get("caller").is_none());
}

#[test]
fn test_wider_trim_width_keeps_parent_directory() {
    let config = LogConfig {
        path_segments: 2,
        ..capture_config()
    };
    let output = capture(config, || {
        tracing::info!("two segments");
    });

    let line = output.lines().next().expect("one JSON line");
    let parsed: serde_json::Value = serde_json::from_str(line).expect("valid JSON");
    let caller = parsed["caller"].as_str().expect("caller string");
    assert!(
        caller.starts_with("tests/integration_tests.rs:"),
        "unexpected caller: {caller}"
    );
}

#[test]
fn test_excessive_caller_skip_omits_the_field() {
    // Attribution is best-effort: an offset past the stack depth must omit
    // the field, not fail the log call.
    let config = LogConfig {
        caller_function: true,
        caller_skip: 100_000,
        ..capture_config()
    };
    let output = capture(config, || {
        tracing::info!("still logged");
    });

    let line = output.lines().next().expect("one JSON line");
    let parsed: serde_json::Value = serde_json::from_str(line).expect("valid JSON");
    assert_eq!(parsed["message"], "still logged");
    assert!(parsed.get("caller_fn").is_none());
}

#[test]
fn test_events_below_the_level_are_dropped() {
    let config = LogConfig {
        level: "warn".to_string(),
        ..capture_config()
    };
    let output = capture(config, || {
        tracing::debug!("too quiet");
        tracing::info!("still too quiet");
        tracing::error!("loud enough");
    });

    assert!(!output.contains("too quiet"));
    assert!(output.contains("loud enough"));
}

#[test]
fn test_file_sink_receives_json_lines() {
    let dir = TempDir::new().expect("temp dir");
    let config = LogConfig {
        console: false,
        directory: dir.path().display().to_string(),
        file_name: "app.log".to_string(),
        ..LogConfig::default()
    };
    let path = config.log_file_path();

    let subscriber = Builder::new()
        .with_config(config)
        .build()
        .expect("failed to build subscriber");
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(request_id = "abc-123", "request complete");
    });

    let content = fs::read_to_string(&path).expect("log file readable");
    let parsed: serde_json::Value =
        serde_json::from_str(content.lines().next().expect("one line")).expect("valid JSON");
    assert_eq!(parsed["message"], "request complete");
    assert_eq!(parsed["request_id"], "abc-123");
}

#[test]
fn test_file_sink_text_encoding() {
    let dir = TempDir::new().expect("temp dir");
    let config = LogConfig {
        console: false,
        json: false,
        directory: dir.path().display().to_string(),
        file_name: "app.log".to_string(),
        ..LogConfig::default()
    };
    let path = config.log_file_path();

    let subscriber = Builder::new()
        .with_config(config)
        .build()
        .expect("failed to build subscriber");
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("plain text line");
    });

    let content = fs::read_to_string(&path).expect("log file readable");
    assert!(content.contains("plain text line"));
    assert!(serde_json::from_str::<serde_json::Value>(content.lines().next().unwrap()).is_err());
}

#[test]
fn test_global_init_bridges_log_facade() {
    // The one test that installs the process-wide subscriber; everything
    // else scopes its own with `with_default`.
    let dir = TempDir::new().expect("temp dir");
    let config = LogConfig {
        console: false,
        directory: dir.path().display().to_string(),
        file_name: "global.log".to_string(),
        ..LogConfig::default()
    };
    let path = config.log_file_path();

    xlog::init(config).expect("first init succeeds");

    tracing::info!(via = "tracing", "structured event");
    log::warn!("facade record");

    let content = fs::read_to_string(&path).expect("log file readable");
    assert!(content.contains("structured event"));
    assert!(content.contains("facade record"));

    // Installed once; a second attempt is an error, not a reconfiguration.
    let again = xlog::init(LogConfig {
        console: false,
        file: false,
        ..LogConfig::default()
    });
    assert!(matches!(again, Err(xlog::XlogError::AlreadyInitialized)));
}
