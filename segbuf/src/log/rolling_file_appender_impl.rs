// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::path::PathBuf;

/// Appender that writes every event to the single file at `path_str`. The file is
/// created if needed and never rotated.
///
/// # Errors
///
/// Returns an error if `path_str` has no parent folder or no file name.
pub fn try_create(path_str: &str) -> miette::Result<tracing_appender::rolling::RollingFileAppender> {
    let path = PathBuf::from(&path_str);

    let Some(parent) = path.parent() else {
        miette::bail!("Log file path {} has no parent folder", path.display());
    };
    let Some(file_name) = path.file_name() else {
        miette::bail!("Log file path {} has no file name", path.display());
    };

    Ok(tracing_appender::rolling::never(parent, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::try_create_temp_dir;

    #[test]
    fn test_try_create() {
        let dir = try_create_temp_dir().unwrap();
        let path = dir.join("appender.log");
        let _appender = try_create(path.to_str().unwrap()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_no_file_name() {
        assert!(try_create("/").is_err());
    }
}
