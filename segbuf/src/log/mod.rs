// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod init_tracing;
pub mod rolling_file_appender_impl;
pub mod tracing_config;

// Re-export.
pub use init_tracing::*;
pub use tracing_config::*;
