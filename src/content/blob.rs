use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use super::BlobStore;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid blob path: {0}")]
    InvalidPath(String),
    #[error("url is not served by this blob store: {0}")]
    ForeignUrl(String),
}

/// Blob store on the local filesystem. Files land in `<root>/<bucket>/<path>`
/// and are served publicly under `<public_prefix>/<bucket>/<path>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_prefix: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf, BlobError> {
        validate_relative(bucket)?;
        validate_relative(path)?;
        Ok(self.root.join(bucket).join(path))
    }

    fn relative_from_url<'a>(&self, url: &'a str) -> Result<&'a str, BlobError> {
        url.strip_prefix(&self.public_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| BlobError::ForeignUrl(url.to_string()))
    }
}

fn validate_relative(path: &str) -> Result<(), BlobError> {
    if path.is_empty() {
        return Err(BlobError::InvalidPath("empty path".to_string()));
    }
    let all_normal = Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !all_normal {
        return Err(BlobError::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        let target = self.resolve(bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        tracing::debug!(bucket, path, "blob uploaded");
        Ok(self.get_url(bucket, path))
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let relative = self.relative_from_url(url)?;
        let (bucket, path) = relative
            .split_once('/')
            .ok_or_else(|| BlobError::InvalidPath(relative.to_string()))?;
        let target = self.resolve(bucket, path)?;
        tokio::fs::remove_file(&target).await?;
        Ok(())
    }

    fn get_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.public_prefix, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "/static/uploads/");

        let url = store
            .upload("news-images", "a/b.png", vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(url, "/static/uploads/news-images/a/b.png");
        assert!(dir.path().join("news-images/a/b.png").exists());

        store.delete(&url).await.unwrap();
        assert!(!dir.path().join("news-images/a/b.png").exists());
    }

    #[tokio::test]
    async fn rejects_traversal_and_foreign_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "/static/uploads");

        assert!(matches!(
            store.upload("news-images", "../x.png", vec![]).await,
            Err(BlobError::InvalidPath(_))
        ));
        assert!(matches!(
            store.delete("https://cdn.example.com/x.png").await,
            Err(BlobError::ForeignUrl(_))
        ));
        assert!(matches!(
            store.delete("/static/uploads/news-images/../../etc").await,
            Err(BlobError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn deleting_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "/static/uploads");
        let result = store.delete("/static/uploads/news-images/missing.png").await;
        assert!(matches!(result, Err(BlobError::Io(_))));
    }
}
