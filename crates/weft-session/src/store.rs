use crate::conversation::Conversation;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;
use weft_core::{WeftError, WeftResult};

/// Persistence seam for conversations.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn save(&self, conversation: &Conversation) -> WeftResult<()>;
    async fn load(&self, id: Uuid) -> WeftResult<Option<Conversation>>;
    async fn delete(&self, id: Uuid) -> WeftResult<()>;
    async fn list(&self) -> WeftResult<Vec<Uuid>>;
}

/// File-based conversation store: one pretty-printed JSON file per
/// conversation id.
pub struct FileConversationStore {
    dir: PathBuf,
}

impl FileConversationStore {
    pub async fn new(dir: PathBuf) -> WeftResult<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn conversation_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn save(&self, conversation: &Conversation) -> WeftResult<()> {
        let path = self.conversation_path(conversation.id);
        let json = serde_json::to_string_pretty(conversation)?;
        // Write-then-rename so a crash mid-write never leaves a torn file.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(id = %conversation.id, messages = conversation.message_count(), "conversation saved");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> WeftResult<Option<Conversation>> {
        let path = self.conversation_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let data = tokio::fs::read_to_string(path).await?;
        let conversation: Conversation = serde_json::from_str(&data)
            .map_err(|e| WeftError::Session(format!("failed to parse conversation: {e}")))?;
        Ok(Some(conversation))
    }

    async fn delete(&self, id: Uuid) -> WeftResult<()> {
        let path = self.conversation_path(id);
        if path.exists() {
            tokio::fs::remove_file(path).await?;
        }
        Ok(())
    }

    async fn list(&self) -> WeftResult<Vec<Uuid>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if let Some(stem) = name.strip_suffix(".json") {
                    if let Ok(id) = Uuid::parse_str(stem) {
                        ids.push(id);
                    }
                }
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use weft_core::Message;

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConversationStore::new(dir.path().to_path_buf())
            .await
            .unwrap();

        let mut conversation = Conversation::new();
        conversation.push(Message::user("hello"));
        conversation.push(Message::assistant("hi there"));
        store.save(&conversation).await.unwrap();

        let loaded = store.load(conversation.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, conversation.id);
        assert_eq!(loaded.messages, conversation.messages);
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConversationStore::new(dir.path().to_path_buf())
            .await
            .unwrap();
        assert!(store.load(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConversationStore::new(dir.path().to_path_buf())
            .await
            .unwrap();

        let a = Conversation::new();
        let b = Conversation::new();
        store.save(&a).await.unwrap();
        store.save(&b).await.unwrap();

        let mut ids = store.list().await.unwrap();
        ids.sort();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(ids, expected);

        store.delete(a.id).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![b.id]);
    }
}
