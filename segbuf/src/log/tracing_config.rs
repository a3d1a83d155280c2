// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::Debug,
          io::Write,
          sync::{Arc, Mutex}};

use tracing_core::LevelFilter;

/// Where buffer events go ([`WriterConfig`]), which of them ([`LevelFilter`]), and for
/// whom ([`TracingScope`]). Materialization, growth and decoupling are logged at
/// `DEBUG`, source fills at `TRACE`, and clamped integers at `WARN`.
///
/// Pass it to [`crate::init_tracing()`].
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub scope: TracingScope,
    pub writer_config: WriterConfig,
    pub level_filter: LevelFilter,
}

/// Global is meant for apps, and thread local for tests, since each test thread can get
/// its own subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingScope {
    Global,
    ThreadLocal,
}

#[derive(Debug, Clone)]
pub enum WriterConfig {
    None,
    Display(DisplayPreference),
    /// Log file path, eg: `/tmp/segbuf.log`. Relative paths start in the current
    /// directory.
    File(String),
    DisplayAndFile(DisplayPreference, String),
}

#[derive(Clone)]
pub enum DisplayPreference {
    Stdout,
    Stderr,
    Capture(CapturedLog),
}

impl Debug for DisplayPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayPreference::Stdout => write!(f, "Stdout"),
            DisplayPreference::Stderr => write!(f, "Stderr"),
            DisplayPreference::Capture(_) => write!(f, "Capture"),
        }
    }
}

impl TracingConfig {
    pub const DEFAULT_LOG_FILE: &'static str = "segbuf_log_file_debug.log";

    /// Logs to both the given [`DisplayPreference`] and a file.
    #[must_use]
    pub fn new_file_and_display(
        filename: Option<String>,
        preferred_display: DisplayPreference,
    ) -> Self {
        Self {
            scope: TracingScope::Global,
            writer_config: WriterConfig::DisplayAndFile(
                preferred_display,
                filename.unwrap_or_else(|| Self::DEFAULT_LOG_FILE.to_string()),
            ),
            level_filter: LevelFilter::DEBUG,
        }
    }

    #[must_use]
    pub fn new_display(preferred_display: DisplayPreference) -> Self {
        Self {
            scope: TracingScope::Global,
            writer_config: WriterConfig::Display(preferred_display),
            level_filter: LevelFilter::DEBUG,
        }
    }

    #[must_use]
    pub fn new_file(filename: Option<String>) -> Self {
        Self {
            scope: TracingScope::Global,
            writer_config: WriterConfig::File(
                filename.unwrap_or_else(|| Self::DEFAULT_LOG_FILE.to_string()),
            ),
            level_filter: LevelFilter::DEBUG,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: TracingScope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_level_filter(mut self, level_filter: LevelFilter) -> Self {
        self.level_filter = level_filter;
        self
    }

    #[must_use]
    pub fn get_writer_config(&self) -> WriterConfig { self.writer_config.clone() }

    #[must_use]
    pub fn get_level_filter(&self) -> LevelFilter { self.level_filter }
}

/// In memory log sink. Clones share the same bytes, so one clone can be handed to
/// the tracing system and another one inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct CapturedLog {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLog {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        match self.inner.lock() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut bytes = self
            .inner
            .lock()
            .map_err(|_| std::io::Error::other("Captured log is poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_eq2;

    #[test]
    fn test_constructors() {
        let it = TracingConfig::new_file(None);
        assert!(matches!(
            it.get_writer_config(),
            WriterConfig::File(ref name) if name == TracingConfig::DEFAULT_LOG_FILE
        ));
        assert_eq2!(it.get_level_filter(), LevelFilter::DEBUG);

        let it = TracingConfig::new_display(DisplayPreference::Stderr)
            .with_scope(TracingScope::ThreadLocal)
            .with_level_filter(LevelFilter::WARN);
        assert_eq2!(it.scope, TracingScope::ThreadLocal);
        assert_eq2!(it.get_level_filter(), LevelFilter::WARN);
        assert_eq2!(format!("{:?}", it.writer_config), "Display(Stderr)");
    }

    #[test]
    fn test_captured_log_clones_share_bytes() {
        let log = CapturedLog::new();
        let mut writer = log.clone();
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        assert_eq2!(log.contents(), "hello world");
    }
}
