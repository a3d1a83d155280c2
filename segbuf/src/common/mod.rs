// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod buffer_config;
pub mod buffer_error;
pub mod decl_macros;
pub mod friendly_random_id;
pub mod temp_dir;

// Re-export.
pub use buffer_config::*;
pub use buffer_error::*;
pub use friendly_random_id::*;
pub use temp_dir::*;
