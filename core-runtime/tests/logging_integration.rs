//! Integration tests for logging configuration and URI redaction

use bridge_traits::logging::{ConsoleLogger, LogLevel};
use core_runtime::logging::{display_uri, strip_path, LogFormat, LoggingConfig};
use std::sync::Arc;

#[test]
fn test_track_uris_are_redacted_by_default() {
    // init_logging is never called in this binary, so the default applies.
    assert!(LoggingConfig::default().redact_uris);
    assert_eq!(display_uri("file:///sdcard/Music/Road/mix.m4a"), "mix.m4a");
    assert_eq!(display_uri("content://media/external/audio/42"), "42");
}

#[test]
fn test_strip_path_handles_host_uri_shapes() {
    assert_eq!(strip_path("file:///home/ana/Music/song.mp3"), "song.mp3");
    assert_eq!(strip_path("C:\\Users\\ana\\Music\\song.flac"), "song.flac");
    assert_eq!(strip_path("song.mp3"), "song.mp3");
    assert_eq!(strip_path("/music/"), "");
}

#[test]
fn test_player_config() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_uri_redaction(false)
        .with_filter("core_playback=trace,core_library=debug")
        .with_logger_sink(Arc::new(ConsoleLogger::default()))
        .with_spans(false);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.redact_uris);
    assert_eq!(
        config.filter.as_deref(),
        Some("core_playback=trace,core_library=debug")
    );
    assert!(config.logger_sink.is_some());
    assert!(!config.enable_spans);

    let debug = format!("{:?}", config);
    assert!(debug.contains("has_logger_sink: true"));
}
