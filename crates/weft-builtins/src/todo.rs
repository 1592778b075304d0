//! Shared todo-plan storage: a `plan.json` file guarded by an advisory lock
//! directory, so concurrent agents serialize their read-modify-write cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use weft_core::{WeftError, WeftResult};

const PLAN_FILE: &str = "plan.json";
const LOCK_DIR: &str = ".locks";
const LOCK_WAIT: Duration = Duration::from_secs(5);
const LOCK_POLL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoPriority {
    High,
    Medium,
    Low,
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// One todo entry. Ids are chosen by the caller (the model) and are the
/// merge key for updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub content: String,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    #[serde(default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,
}

fn default_schema_version() -> u32 {
    1
}

/// The persisted plan document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoPlan {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub todos: Vec<TodoItem>,
}

impl TodoPlan {
    pub fn empty() -> Self {
        Self {
            schema_version: 1,
            updated_at: Utc::now(),
            todos: Vec::new(),
        }
    }

    /// Merges incoming items by id: an existing id is updated in place
    /// (keeping its creation time), a new id is appended.
    pub fn merge(&mut self, items: Vec<TodoItem>) {
        for mut item in items {
            item.updated_at = Utc::now();
            match self.todos.iter_mut().find(|t| t.id == item.id) {
                Some(existing) => {
                    item.created_at = existing.created_at;
                    *existing = item;
                }
                None => self.todos.push(item),
            }
        }
        self.updated_at = Utc::now();
    }

    /// Replaces the whole todo list.
    pub fn replace(&mut self, items: Vec<TodoItem>) {
        self.todos = items;
        self.updated_at = Utc::now();
    }
}

/// Removes the lock directory when the guard is dropped.
struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to release plan lock");
        }
    }
}

/// File-backed plan storage under a work directory.
pub struct TodoStore {
    dir: PathBuf,
}

impl TodoStore {
    pub async fn new(dir: impl Into<PathBuf>) -> WeftResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(dir.join(LOCK_DIR)).await?;
        Ok(Self { dir })
    }

    fn plan_path(&self) -> PathBuf {
        self.dir.join(PLAN_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_DIR).join("plan")
    }

    /// Takes the advisory lock. `create_dir` is atomic on every platform;
    /// an existing directory means another writer holds the lock, so poll
    /// with a bounded wait instead of blocking forever.
    async fn acquire_lock(&self) -> WeftResult<LockGuard> {
        let path = self.lock_path();
        let deadline = tokio::time::Instant::now() + LOCK_WAIT;
        loop {
            match tokio::fs::create_dir(&path).await {
                Ok(()) => return Ok(LockGuard { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if tokio::time::Instant::now() >= deadline {
                        return Err(WeftError::Tool(
                            "timed out waiting for the todo plan lock".into(),
                        ));
                    }
                    tokio::time::sleep(LOCK_POLL).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn read_unlocked(&self) -> WeftResult<TodoPlan> {
        let path = self.plan_path();
        if !path.exists() {
            return Ok(TodoPlan::empty());
        }
        let data = tokio::fs::read_to_string(&path).await?;
        let plan = serde_json::from_str(&data)
            .map_err(|e| WeftError::Tool(format!("corrupt todo plan: {e}")))?;
        Ok(plan)
    }

    async fn write_unlocked(&self, plan: &TodoPlan) -> WeftResult<()> {
        let path = self.plan_path();
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(plan)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Reads the current plan. Missing file means an empty plan.
    pub async fn read(&self) -> WeftResult<TodoPlan> {
        let _guard = self.acquire_lock().await?;
        self.read_unlocked().await
    }

    /// One locked read-modify-write cycle: merge or replace, then persist.
    pub async fn apply(&self, items: Vec<TodoItem>, merge: bool) -> WeftResult<TodoPlan> {
        let _guard = self.acquire_lock().await?;
        let mut plan = self.read_unlocked().await?;
        if merge {
            plan.merge(items);
        } else {
            plan.replace(items);
        }
        self.write_unlocked(&plan).await?;
        debug!(todos = plan.todos.len(), merge, "todo plan written");
        Ok(plan)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn item(id: &str, content: &str, status: TodoStatus) -> TodoItem {
        TodoItem {
            id: id.into(),
            content: content.into(),
            status,
            priority: TodoPriority::Medium,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_write_merge_read_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = TodoStore::new(dir.path()).await.unwrap();

        store
            .apply(
                vec![
                    item("t1", "write the parser", TodoStatus::Pending),
                    item("t2", "write the tests", TodoStatus::Pending),
                ],
                false,
            )
            .await
            .unwrap();

        // Merge updates t1 in place and appends t3.
        let plan = store
            .apply(
                vec![
                    item("t1", "write the parser", TodoStatus::Completed),
                    item("t3", "update the docs", TodoStatus::Pending),
                ],
                true,
            )
            .await
            .unwrap();
        assert_eq!(plan.todos.len(), 3);
        assert_eq!(plan.todos[0].status, TodoStatus::Completed);
        assert_eq!(plan.todos[2].id, "t3");

        let reread = store.read().await.unwrap();
        assert_eq!(reread.todos, plan.todos);
        assert_eq!(reread.schema_version, 1);
    }

    #[tokio::test]
    async fn test_replace_drops_old_items() {
        let dir = tempfile::tempdir().unwrap();
        let store = TodoStore::new(dir.path()).await.unwrap();

        store
            .apply(vec![item("t1", "old", TodoStatus::Pending)], false)
            .await
            .unwrap();
        let plan = store
            .apply(vec![item("t9", "new", TodoStatus::Pending)], false)
            .await
            .unwrap();
        assert_eq!(plan.todos.len(), 1);
        assert_eq!(plan.todos[0].id, "t9");
    }

    #[tokio::test]
    async fn test_concurrent_writers_serialize() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(TodoStore::new(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .apply(
                        vec![item(&format!("t{n}"), "task", TodoStatus::Pending)],
                        true,
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let plan = store.read().await.unwrap();
        assert_eq!(plan.todos.len(), 8);
    }

    #[tokio::test]
    async fn test_lock_wait_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = TodoStore::new(dir.path()).await.unwrap();
        // Simulate a stuck writer by pre-creating the lock directory.
        std::fs::create_dir(store.lock_path()).unwrap();

        // Under a paused clock the poll loop's sleeps auto-advance, so the
        // deadline is reached without real waiting.
        tokio::time::pause();
        let result = store.read().await;
        assert!(matches!(result, Err(WeftError::Tool(_))));
    }
}
