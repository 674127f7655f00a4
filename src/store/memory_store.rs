use crate::{
    error::{BoardError, Result},
    store::{merge_patch, path_segments, RemoteStore},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

/// A request seen by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Get(String),
    Put(String, Value),
    Patch(String, Value),
    Delete(String),
}

/// In-process document tree that records every request
///
/// Used for offline boards and for observing what the engine sends.
#[derive(Debug)]
pub struct MemoryStore {
    root: Mutex<Value>,
    calls: Mutex<Vec<StoreCall>>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(Value::Object(Map::new())),
            calls: Mutex::new(Vec::new()),
            fail_writes: Mutex::new(false),
        }
    }

    /// Seeds the store with an initial document tree
    pub fn with_root(root: Value) -> Self {
        let store = Self::new();
        *store.root.lock() = root;
        store
    }

    /// Makes every subsequent put/patch/delete fail, as an unreachable server would
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Only the write requests, in order
    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| !matches!(c, StoreCall::Get(_)))
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> Value {
        self.root.lock().clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }

    fn check_writable(&self) -> Result<()> {
        if *self.fail_writes.lock() {
            return Err(BoardError::StoreError("store unavailable".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(*segment))
}

/// Walks to `segments`, creating intermediate objects along the way
fn lookup_or_create<'a>(root: &'a mut Value, segments: &[&str]) -> &'a mut Value {
    let mut node = root;
    for segment in segments {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = &mut node[*segment];
    }
    node
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.record(StoreCall::Get(path.to_string()));
        let segments = path_segments(path)?;
        let root = self.root.lock();
        Ok(lookup(&root, &segments).filter(|v| !v.is_null()).cloned())
    }

    async fn put(&self, path: &str, value: &Value) -> Result<()> {
        self.record(StoreCall::Put(path.to_string(), value.clone()));
        self.check_writable()?;
        let segments = path_segments(path)?;
        let mut root = self.root.lock();
        *lookup_or_create(&mut root, &segments) = value.clone();
        Ok(())
    }

    async fn patch(&self, path: &str, partial: &Value) -> Result<Value> {
        self.record(StoreCall::Patch(path.to_string(), partial.clone()));
        self.check_writable()?;
        let segments = path_segments(path)?;
        let mut root = self.root.lock();
        let target = lookup_or_create(&mut root, &segments);
        merge_patch(target, partial)?;
        Ok(target.clone())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.record(StoreCall::Delete(path.to_string()));
        self.check_writable()?;
        let segments = path_segments(path)?;
        let Some((last, parents)) = segments.split_last() else {
            *self.root.lock() = Value::Object(Map::new());
            return Ok(());
        };
        let mut root = self.root.lock();
        if let Some(Value::Object(map)) = parents
            .iter()
            .try_fold(&mut *root, |node, segment| node.as_object_mut()?.get_mut(*segment))
        {
            map.remove(*last);
        }
        Ok(())
    }
}
