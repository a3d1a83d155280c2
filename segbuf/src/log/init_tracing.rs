// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # [`init_tracing`]
//!
//! Convenience setup for a [`tracing_subscriber`] that shows the events this crate emits
//! (materialization, range growth, decoupling, source fills, and clamped integers).
//! Use [`TracingConfig`] to choose between `stdout`, `stderr`, an in memory
//! [`crate::CapturedLog`], a log file, or a display and a file together.

use tracing::dispatcher;
use tracing_core::LevelFilter;
use tracing_subscriber::{Layer, layer::SubscriberExt, registry::LookupSpan,
                         util::SubscriberInitExt};

use super::{DisplayPreference, TracingConfig, TracingScope, WriterConfig,
            rolling_file_appender_impl};

/// One line per event: level, message, and fields (eg: `range=[0, 4096)`). Buffer
/// events are frequent, so timestamps, targets and source locations are left out.
macro_rules! create_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
    };
}

pub type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

/// Initialize the tracing system with the provided [`TracingConfig`]. Depending on its
/// [`TracingScope`] this sets either:
/// 1. The global default subscriber, which once set, can't be unset or changed.
/// 2. A thread local subscriber, which is reset when the returned
///    [`dispatcher::DefaultGuard`] is dropped. This is what tests want.
///
/// # Errors
///
/// Returns an error if the log file can't be created.
///
/// # Panics
///
/// Panics if the scope is [`TracingScope::Global`] and a global subscriber has already
/// been set.
pub fn init_tracing(
    tracing_config: TracingConfig,
) -> miette::Result<Option<dispatcher::DefaultGuard>> {
    let scope = tracing_config.scope;
    try_create_layers(tracing_config).map(|layers| match scope {
        TracingScope::Global => {
            tracing_subscriber::registry().with(layers).init();
            None
        }
        TracingScope::ThreadLocal => {
            let it = tracing_subscriber::registry().with(layers).set_default();
            Some(it)
        }
    })
}

/// The layers [`init_tracing`] installs: the level filter, then a display layer and
/// a file layer as configured. Returns [`None`] for [`WriterConfig::None`].
///
/// # Errors
///
/// Returns an error if the log file can't be created.
pub fn try_create_layers(
    tracing_config: TracingConfig,
) -> miette::Result<Option<Vec<Box<DynLayer<tracing_subscriber::Registry>>>>> {
    if matches!(tracing_config.writer_config, WriterConfig::None) {
        return Ok(None);
    }

    let level_filter = tracing_config.get_level_filter();
    let mut return_it: Vec<Box<DynLayer<tracing_subscriber::Registry>>> = vec![];

    return_it.push(Box::new(level_filter));

    if let Some(layer) =
        try_create_display_layer(level_filter, tracing_config.get_writer_config())
    {
        return_it.push(layer);
    }

    if let Some(layer) =
        try_create_file_layer(level_filter, tracing_config.get_writer_config())?
    {
        return_it.push(layer);
    }

    Ok(Some(return_it))
}

/// Layer that writes to the [`DisplayPreference`] of `writer_config`, if it has one.
/// Only the terminal streams get ANSI colors.
#[must_use]
pub fn try_create_display_layer<S>(
    level_filter: LevelFilter,
    writer_config: WriterConfig,
) -> Option<Box<DynLayer<S>>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let fmt_layer = create_fmt!();

    match writer_config {
        WriterConfig::DisplayAndFile(display_pref, _)
        | WriterConfig::Display(display_pref) => match display_pref {
            DisplayPreference::Stdout => Some(Box::new(
                fmt_layer
                    .with_ansi(true)
                    .with_writer(std::io::stdout)
                    .with_filter(level_filter),
            )),
            DisplayPreference::Stderr => Some(Box::new(
                fmt_layer
                    .with_ansi(true)
                    .with_writer(std::io::stderr)
                    .with_filter(level_filter),
            )),
            DisplayPreference::Capture(captured_log) => Some(Box::new(
                fmt_layer
                    .with_ansi(false)
                    .with_writer(move || captured_log.clone())
                    .with_filter(level_filter),
            )),
        },
        WriterConfig::None | WriterConfig::File(_) => None,
    }
}

/// Layer that appends plain text to the log file of `writer_config`, if it has one.
///
/// # Errors
///
/// Returns an error if the log file can't be created.
pub fn try_create_file_layer<S>(
    level_filter: LevelFilter,
    writer_config: WriterConfig,
) -> miette::Result<Option<Box<DynLayer<S>>>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let fmt_layer = create_fmt!();

    Ok(match writer_config {
        WriterConfig::DisplayAndFile(_, log_file_path)
        | WriterConfig::File(log_file_path) => {
            let file = rolling_file_appender_impl::try_create(log_file_path.as_str())?;
            Some(Box::new(
                fmt_layer
                    .with_ansi(false)
                    .with_writer(file)
                    .with_filter(level_filter),
            ))
        }
        WriterConfig::None | WriterConfig::Display(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::{Buffer, CapturedLog, assert_eq2, try_create_temp_dir};

    #[test]
    fn test_try_create_display_layer() {
        let writer_config = WriterConfig::Display(DisplayPreference::Stdout);
        let layer: Option<Box<DynLayer<tracing_subscriber::Registry>>> =
            try_create_display_layer(LevelFilter::DEBUG, writer_config);
        assert!(layer.is_some());
    }

    #[test]
    fn test_try_create_file_layer() {
        let dir = try_create_temp_dir().unwrap();
        let file_path = dir.join("my_temp_log_file.log");
        let file_path = file_path.to_str().unwrap().to_string();

        let writer_config = WriterConfig::File(file_path.clone());
        let layer: Option<Box<DynLayer<tracing_subscriber::Registry>>> =
            try_create_file_layer(LevelFilter::DEBUG, writer_config).unwrap();

        assert!(layer.is_some());
        assert!(std::path::Path::new(&file_path).exists());
    }

    #[test]
    fn test_try_create_both_layers() {
        let dir = try_create_temp_dir().unwrap();
        let file_path = dir.join("my_temp_log_file.log");
        let file_path = file_path.to_str().unwrap().to_string();

        let tracing_config = TracingConfig {
            scope: TracingScope::ThreadLocal,
            writer_config: WriterConfig::DisplayAndFile(
                DisplayPreference::Stdout,
                file_path.clone(),
            ),
            level_filter: LevelFilter::DEBUG,
        };

        let layers = try_create_layers(tracing_config).unwrap().unwrap();
        assert_eq2!(layers.len(), 3);
        assert!(std::path::Path::new(&file_path).exists());
    }

    #[test]
    fn test_no_writer_no_layers() {
        let tracing_config = TracingConfig {
            scope: TracingScope::ThreadLocal,
            writer_config: WriterConfig::None,
            level_filter: LevelFilter::DEBUG,
        };
        assert!(try_create_layers(tracing_config).unwrap().is_none());
    }

    #[test]
    #[serial]
    fn test_clamped_integer_is_logged() {
        let captured_log = CapturedLog::new();
        let default_guard = init_tracing(
            TracingConfig::new_display(DisplayPreference::Capture(captured_log.clone()))
                .with_scope(TracingScope::ThreadLocal),
        )
        .unwrap();

        let buffer = Buffer::from_static(b"12345");
        let parsed = buffer.reader().parse_unsigned(10, 100).unwrap();
        drop(default_guard);

        assert!(parsed.overflowed);
        let output = captured_log.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains("Clamped unsigned integer"));
    }

    #[test]
    #[serial]
    fn test_level_filter_drops_debug_events() {
        let captured_log = CapturedLog::new();
        let default_guard = init_tracing(
            TracingConfig::new_display(DisplayPreference::Capture(captured_log.clone()))
                .with_scope(TracingScope::ThreadLocal)
                .with_level_filter(LevelFilter::WARN),
        )
        .unwrap();

        let mut buffer = Buffer::new();
        buffer.append(&Buffer::from_static(b"abc")).unwrap();
        drop(default_guard);

        assert!(!captured_log.contents().contains("Appended"));
    }
}
