//! JSON cache of loaded problem definitions

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{AppResult, JudgeError};

use super::Catalog;

/// A catalog persisted at an explicit path
#[derive(Debug, Clone)]
pub struct ProblemCache {
    path: PathBuf,
}

impl ProblemCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache; a missing file is an empty catalog
    pub async fn load(&self) -> AppResult<Catalog> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No problem cache yet");
                return Ok(Catalog::default());
            }
            Err(e) => return Err(self.io_error("reading", e)),
        };

        let catalog: Catalog = serde_json::from_slice(&raw)?;
        tracing::info!(path = %self.path.display(), problems = catalog.len(), "Loaded problem cache");
        Ok(catalog)
    }

    /// Replace the cache with `catalog`
    pub async fn save(&self, catalog: &Catalog) -> AppResult<()> {
        let raw = serde_json::to_vec_pretty(catalog)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error("creating directory for", e))?;
        }

        // Write aside and rename so a reader never sees a partial file
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| self.io_error("writing", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error("replacing", e))?;

        tracing::info!(path = %self.path.display(), problems = catalog.len(), "Saved problem cache");
        Ok(())
    }

    /// Merge `catalog` into the cached one and save the result
    pub async fn update(&self, catalog: Catalog) -> AppResult<Catalog> {
        let mut cached = self.load().await?;
        cached.extend(catalog);
        self.save(&cached).await?;
        Ok(cached)
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> JudgeError {
        JudgeError::ProblemStore(format!("{} cache {}: {}", action, self.path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IoExample, JudgeData, Payload};

    fn problem(id: &str) -> JudgeData {
        JudgeData {
            id: id.to_string(),
            title: format!("title of {}", id),
            description: String::new(),
            io: vec![IoExample {
                input: "1\n".to_string(),
                output: "1\n".to_string(),
            }],
            tags: Default::default(),
            solution: Some(Payload::new(id, "python").with_file("main.py", "print(input())")),
        }
    }

    #[tokio::test]
    async fn test_missing_cache_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProblemCache::new(dir.path().join("cache.json"));

        assert!(cache.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_saved_catalog_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProblemCache::new(dir.path().join("nested").join("cache.json"));
        let mut catalog = Catalog::default();
        catalog.insert(problem("prob-1"));

        cache.save(&catalog).await.unwrap();

        assert_eq!(cache.load().await.unwrap(), catalog);
        assert!(!dir.path().join("nested").join("cache.tmp").exists());
    }

    #[tokio::test]
    async fn test_update_merges() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProblemCache::new(dir.path().join("cache.json"));

        let mut first = Catalog::default();
        first.insert(problem("prob-1"));
        cache.save(&first).await.unwrap();

        let mut second = Catalog::default();
        second.insert(problem("prob-2"));
        let merged = cache.update(second).await.unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(cache.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = ProblemCache::new(path).load().await.unwrap_err();
        assert!(matches!(err, JudgeError::ProblemStore(_)));
    }
}
