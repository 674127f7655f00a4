use crate::{
    error::{BoardError, Result},
    store::{merge_patch, path_segments, RemoteStore},
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File-backed document store for offline boards
///
/// Each leaf document lives in `<root>/<path>.json`; reading a collection
/// path assembles its children into one object keyed by file stem.
pub struct FileStore {
    root_path: PathBuf,
}

impl FileStore {
    const DATA_DIR: &'static str = ".kanban";
    const EXTENSION: &'static str = "json";

    /// Creates a FileStore under the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::DATA_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    fn dir_for(&self, segments: &[&str]) -> PathBuf {
        segments
            .iter()
            .fold(self.root_path.clone(), |path, segment| path.join(segment))
    }

    fn file_for(&self, segments: &[&str]) -> Result<PathBuf> {
        let Some((last, parents)) = segments.split_last() else {
            return Err(BoardError::StoreError(
                "cannot write a document at the store root".to_string(),
            ));
        };
        Ok(self
            .dir_for(parents)
            .join(format!("{}.{}", last, Self::EXTENSION)))
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    async fn read_document(&self, file: &Path) -> Result<Option<Value>> {
        if !file.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(file).await?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn write_document(&self, file: &Path, value: &Value) -> Result<()> {
        if let Some(parent) = file.parent() {
            self.ensure_directory_exists(parent).await?;
        }
        let json = serde_json::to_string_pretty(value)?;
        fs::write(file, json).await?;
        Ok(())
    }

    /// Collects the leaf documents directly under a directory
    async fn read_collection(&self, dir: &Path) -> Result<Option<Value>> {
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut entries = fs::read_dir(dir).await?;
        let mut documents = Map::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some(Self::EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Some(doc) = self.read_document(&path).await? {
                    documents.insert(stem.to_string(), doc);
                }
            }
        }

        Ok(Some(Value::Object(documents)))
    }
}

#[async_trait]
impl RemoteStore for FileStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let segments = path_segments(path)?;
        if !segments.is_empty() {
            if let Some(doc) = self.read_document(&self.file_for(&segments)?).await? {
                return Ok(Some(doc));
            }
        }
        self.read_collection(&self.dir_for(&segments)).await
    }

    async fn put(&self, path: &str, value: &Value) -> Result<()> {
        let segments = path_segments(path)?;
        self.write_document(&self.file_for(&segments)?, value).await
    }

    async fn patch(&self, path: &str, partial: &Value) -> Result<Value> {
        let segments = path_segments(path)?;
        let file = self.file_for(&segments)?;

        let mut document = self.read_document(&file).await?.unwrap_or(Value::Null);
        merge_patch(&mut document, partial)?;
        self.write_document(&file, &document).await?;

        Ok(document)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let segments = path_segments(path)?;
        let file = self.file_for(&segments)?;
        if file.exists() {
            fs::remove_file(file).await?;
            return Ok(());
        }

        let dir = self.dir_for(&segments);
        if dir.is_dir() {
            fs::remove_dir_all(dir).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_and_get_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        let task = json!({ "title": "Test Task", "column": "todo" });
        store.put("tasks/a1", &task).await.unwrap();

        assert!(store.root().join("tasks").join("a1.json").exists());
        assert_eq!(store.get("tasks/a1").await.unwrap(), Some(task));
    }

    #[tokio::test]
    async fn test_get_missing_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        assert_eq!(store.get("tasks/nope").await.unwrap(), None);
        assert_eq!(store.get("tasks").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_collection() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.put("tasks/a", &json!({ "title": "A", "column": "todo" })).await.unwrap();
        store.put("tasks/b", &json!({ "title": "B", "column": "done" })).await.unwrap();

        let tasks = store.get("tasks").await.unwrap().unwrap();
        assert_eq!(tasks.as_object().unwrap().len(), 2);
        assert_eq!(tasks["b"]["column"], "done");
    }

    #[tokio::test]
    async fn test_patch_keeps_other_fields() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.put("tasks/a", &json!({ "title": "A", "column": "todo" })).await.unwrap();
        let merged = store
            .patch("tasks/a", &json!({ "column": "inProgress" }))
            .await
            .unwrap();

        assert_eq!(merged, json!({ "title": "A", "column": "inProgress" }));
        assert_eq!(store.get("tasks/a").await.unwrap(), Some(merged));
    }

    #[tokio::test]
    async fn test_patch_creates_missing_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        let merged = store.patch("tasks/new", &json!({ "column": "done" })).await.unwrap();
        assert_eq!(merged, json!({ "column": "done" }));
    }

    #[tokio::test]
    async fn test_delete_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.put("tasks/a", &json!({ "title": "A" })).await.unwrap();
        store.delete("tasks/a").await.unwrap();
        store.delete("tasks/a").await.unwrap();

        assert_eq!(store.get("tasks/a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        let result = store.put("../outside", &json!({})).await;
        assert!(matches!(result, Err(BoardError::StoreError(_))));
    }
}
