//! Content directory holding original photos and their thumbnails

use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{MediaError, MediaResult};

/// Filesystem store whose files are served under a public URL prefix
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    url_prefix: String,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            url_prefix,
        }
    }

    /// Create the content directory if it does not exist yet
    pub async fn ensure_root(&self) -> MediaResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        info!("Content directory ready at {}", self.root.display());
        Ok(())
    }

    /// Public URL of a stored file
    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.url_prefix, name)
    }

    /// Stored name behind a public URL produced by [`ContentStore::url_for`]
    pub fn name_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.url_prefix.as_str())?
            .strip_prefix('/')
            .filter(|name| !name.is_empty())
    }

    /// Write `data` under `name`
    pub async fn save(&self, name: &str, data: &[u8]) -> MediaResult<PathBuf> {
        let path = self.path_for(name)?;
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    /// Remove one stored file
    pub async fn remove(&self, name: &str) -> MediaResult<()> {
        let path = self.path_for(name)?;
        tokio::fs::remove_file(path).await?;
        Ok(())
    }

    /// Remove every named file, logging failures instead of returning them
    ///
    /// Returns the number of files actually removed.
    pub async fn remove_best_effort(&self, names: &[&str]) -> usize {
        let mut removed = 0;
        for &name in names {
            match self.remove(name).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to delete stored file {}: {}", name, e),
            }
        }
        removed
    }

    fn path_for(&self, name: &str) -> MediaResult<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.contains("..");
        if !valid {
            return Err(MediaError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path().join("uploads"), "/uploads/");
        store.ensure_root().await.unwrap();

        let path = store.save("a.png", b"data").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"data");

        store.remove("a.png").await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_best_effort_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path(), "/uploads");
        store.save("kept.jpg", b"x").await.unwrap();

        let removed = store
            .remove_best_effort(&["kept.jpg", "missing.jpg", "../escape"])
            .await;
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_urls_round_trip_through_names() {
        let store = ContentStore::new("/tmp/uploads", "/uploads/");
        let url = store.url_for("thumb_1.jpg");
        assert_eq!(url, "/uploads/thumb_1.jpg");
        assert_eq!(store.name_from_url(&url), Some("thumb_1.jpg"));
        assert_eq!(store.name_from_url("/elsewhere/x.jpg"), None);
        assert_eq!(store.name_from_url("/uploads/"), None);
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path(), "/uploads");
        for name in ["../x", "a/b", "..", ""] {
            assert!(matches!(
                store.save(name, b"x").await,
                Err(MediaError::InvalidName(_))
            ));
        }
    }
}
