//! Staging of in-memory files into a host directory for bind-mounting

use std::collections::HashSet;
use std::path::Path;

use tempfile::TempDir;

use crate::{
    constants::STAGING_PREFIX,
    error::{AppResult, JudgeError},
    models::InMemoryFile,
};

/// A uniquely named directory holding one run's files.
///
/// The directory and everything in it are removed when the guard drops,
/// including when staging fails partway through.
#[derive(Debug)]
pub struct StagingDir {
    dir: Option<TempDir>,
}

impl StagingDir {
    /// Create a directory under `root` and write every file into it verbatim
    pub async fn create(root: &Path, files: &[InMemoryFile]) -> AppResult<Self> {
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            JudgeError::Staging(format!("creating workspace {}: {}", root.display(), e))
        })?;

        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(root)
            .map_err(|e| {
                JudgeError::Staging(format!(
                    "creating staging directory in {}: {}",
                    root.display(),
                    e
                ))
            })?;
        let staging = Self { dir: Some(dir) };

        let mut seen = HashSet::new();
        for file in files {
            validate_file_name(&file.name)?;
            if !seen.insert(file.name.as_str()) {
                return Err(JudgeError::Staging(format!(
                    "duplicate file name: {}",
                    file.name
                )));
            }

            let path = staging.path().join(&file.name);
            tokio::fs::write(&path, file.content.as_bytes())
                .await
                .map_err(|e| {
                    JudgeError::Staging(format!("writing {}: {}", path.display(), e))
                })?;
            tracing::debug!(path = %path.display(), "Staged file");
        }

        Ok(staging)
    }

    pub fn path(&self) -> &Path {
        self.dir.as_ref().map_or(Path::new(""), TempDir::path)
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            tracing::debug!(path = %path.display(), "Removing staging directory");
            if let Err(e) = dir.close() {
                tracing::warn!(path = %path.display(), "Failed to remove staging directory: {}", e);
            }
        }
    }
}

/// Staged names must be plain file names inside the staging directory
fn validate_file_name(name: &str) -> AppResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(JudgeError::Staging(format!("invalid file name: {:?}", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content: &str) -> InMemoryFile {
        InMemoryFile {
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    fn entries(root: &Path) -> Vec<String> {
        std::fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_files_written_verbatim() {
        let root = tempfile::tempdir().unwrap();
        let files = vec![file("main.cpp", "int main() {}\n"), file("main.h", "")];

        let staging = StagingDir::create(root.path(), &files).await.unwrap();

        let name = staging.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("work_dir_"));
        assert_eq!(
            std::fs::read_to_string(staging.path().join("main.cpp")).unwrap(),
            "int main() {}\n"
        );
        assert!(staging.path().join("main.h").exists());
    }

    #[tokio::test]
    async fn test_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();

        let staging = StagingDir::create(root.path(), &[file("a.py", "pass")])
            .await
            .unwrap();
        assert_eq!(entries(root.path()).len(), 1);

        drop(staging);
        assert!(entries(root.path()).is_empty());
    }

    #[tokio::test]
    async fn test_unique_directories() {
        let root = tempfile::tempdir().unwrap();

        let first = StagingDir::create(root.path(), &[]).await.unwrap();
        let second = StagingDir::create(root.path(), &[]).await.unwrap();

        assert_ne!(first.path(), second.path());
    }

    #[tokio::test]
    async fn test_failed_staging_leaves_nothing_behind() {
        let root = tempfile::tempdir().unwrap();
        let files = vec![file("ok.py", "pass"), file("../escape.py", "pass")];

        let err = StagingDir::create(root.path(), &files).await.unwrap_err();

        assert!(matches!(err, JudgeError::Staging(_)));
        assert!(entries(root.path()).is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let root = tempfile::tempdir().unwrap();
        let files = vec![file("main.py", "1"), file("main.py", "2")];

        let err = StagingDir::create(root.path(), &files).await.unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
