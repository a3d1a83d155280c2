// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use miette::IntoDiagnostic;
use std::{fmt::{Display, Formatter},
          io::ErrorKind,
          ops::Deref,
          path::Path};

use crate::generate_friendly_random_id;

/// Tests run in parallel, so a random name can already be taken.
const MAX_ATTEMPTS: usize = 8;

/// Temporary directory that is deleted when dropped. Used to back file sources in
/// tests and demos.
#[derive(Debug)]
pub struct TempDir {
    pub inner: std::path::PathBuf,
}

impl TempDir {
    /// Join a path to the temporary directory.
    pub fn join<P: AsRef<Path>>(&self, path: P) -> std::path::PathBuf {
        self.inner.join(path)
    }
}

/// Create a temporary directory. The directory is automatically deleted when the
/// [`TempDir`] struct is dropped.
///
/// # Errors
///
/// Returns an error if:
/// - The temp directory cannot be created due to insufficient permissions
/// - The file system is full
/// - I/O errors occur during directory creation
pub fn try_create_temp_dir() -> miette::Result<TempDir> {
    let root = std::env::temp_dir();
    let mut attempt = 1;
    loop {
        let new_temp_dir = root.join(generate_friendly_random_id());
        match std::fs::create_dir(&new_temp_dir) {
            Ok(()) => {
                return Ok(TempDir {
                    inner: new_temp_dir,
                });
            }
            Err(error) if error.kind() == ErrorKind::AlreadyExists && attempt < MAX_ATTEMPTS => {
                attempt += 1;
            }
            Err(error) => return Err(error).into_diagnostic(),
        }
    }
}

/// Automatically delete the temporary directory when the [`TempDir`] struct is dropped.
impl Drop for TempDir {
    fn drop(&mut self) {
        // We don't care about the result of this operation.
        std::fs::remove_dir_all(&self.inner).ok();
    }
}

impl Deref for TempDir {
    type Target = std::path::PathBuf;

    fn deref(&self) -> &Self::Target { &self.inner }
}

impl Display for TempDir {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner.display())
    }
}

impl AsRef<Path> for TempDir {
    fn as_ref(&self) -> &Path { &self.inner }
}

#[cfg(test)]
mod tests_temp_dir {
    use super::*;
    use crate::ok;

    #[test]
    fn test_try_create_temp_dir() -> miette::Result<()> {
        let root = try_create_temp_dir()?;
        assert!(root.inner.exists());

        let other = try_create_temp_dir()?;
        assert!(root.inner != other.inner);

        // Named with a friendly random id, eg: `misty-quartz-0421`.
        let name = root.inner.file_name().and_then(|it| it.to_str()).unwrap_or_default();
        assert_eq!(name.split('-').count(), 3);

        let copy_of_path = root.inner.clone();
        drop(root);
        assert!(!copy_of_path.exists());

        ok!()
    }
}
