use crate::{
    domain::CardId,
    error::{BoardError, Result},
};
use async_trait::async_trait;
use serde_json::Value;

pub mod file_store;
pub mod http_store;
pub mod memory_store;

pub use file_store::FileStore;
pub use http_store::HttpStore;
pub use memory_store::{MemoryStore, StoreCall};

/// Collection all task records live under
pub const TASKS_PATH: &str = "tasks";

/// Remote document store addressed by slash-separated paths
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads the document at `path`, `None` if nothing is stored there
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Replaces the document at `path`
    async fn put(&self, path: &str, value: &Value) -> Result<()>;

    /// Merges the top-level fields of `partial` into the document at `path`
    /// and returns the merged document
    async fn patch(&self, path: &str, partial: &Value) -> Result<Value>;

    /// Removes the document at `path`
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Record path of a task, e.g. `tasks/-Nx3k`
pub fn task_path(id: &CardId) -> String {
    format!("{}/{}", TASKS_PATH, id.as_str())
}

/// Splits a store path into its segments, rejecting traversal
pub(crate) fn path_segments(path: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(BoardError::StoreError(format!("invalid path: {path}")));
    }
    Ok(segments)
}

/// Applies `partial` onto `target` the way a PATCH does
///
/// Top-level keys overwrite, `null` values delete. A non-object target is
/// replaced by an empty object first.
pub(crate) fn merge_patch(target: &mut Value, partial: &Value) -> Result<()> {
    let Value::Object(fields) = partial else {
        return Err(BoardError::StoreError(
            "patch body must be a JSON object".to_string(),
        ));
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(existing) = target {
        for (key, value) in fields {
            if value.is_null() {
                existing.remove(key);
            } else {
                existing.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_path() {
        let id = CardId::new("task-7").unwrap();
        assert_eq!(task_path(&id), "tasks/task-7");
    }

    #[test]
    fn test_path_segments() {
        assert_eq!(path_segments("/tasks//a/").unwrap(), vec!["tasks", "a"]);
        assert!(path_segments("tasks/../secrets").is_err());
        assert!(path_segments("").unwrap().is_empty());
    }

    #[test]
    fn test_merge_patch() {
        let mut record = json!({ "title": "A", "column": "todo", "category": "x" });
        merge_patch(&mut record, &json!({ "column": "done", "category": null })).unwrap();
        assert_eq!(record, json!({ "title": "A", "column": "done" }));

        let mut empty = Value::Null;
        merge_patch(&mut empty, &json!({ "column": "done" })).unwrap();
        assert_eq!(empty, json!({ "column": "done" }));

        assert!(merge_patch(&mut empty, &json!("done")).is_err());
    }
}
