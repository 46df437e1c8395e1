//! Scoped ownership of the temporary files one pipeline run creates.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Paths registered here are removed when the guard is dropped, in reverse
/// registration order, on success, on error and while unwinding from a panic.
///
/// Removal is best effort: failures are logged and never returned.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    paths: Vec<PathBuf>,
}

impl TempArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `path`, whether or not the file exists yet.
    pub fn register<P: Into<PathBuf>>(&mut self, path: P) -> &Path {
        self.paths.push(path.into());
        let path = &self.paths[self.paths.len() - 1];
        tracing::debug!("Registered temporary artifact {:?}", path);
        path
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Removes one registered file now instead of at drop.
    pub fn remove(&mut self, path: &Path) {
        if let Some(idx) = self.paths.iter().position(|p| p == path) {
            remove_artifact(&self.paths.remove(idx));
        }
    }

    pub fn remove_all(&mut self) {
        while let Some(path) = self.paths.pop() {
            remove_artifact(&path);
        }
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        self.remove_all();
    }
}

fn remove_artifact(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!("Removed temporary file {:?}", path),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Temporary file {:?} already gone", path)
        }
        Err(e) => tracing::warn!("Failed to remove temporary file {:?}: {}", path, e),
    }
}
