//! Prompt storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shared prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category_id: String,
    pub user_id: String,
    pub view_count: i64,
    pub favorite_count: i64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPrompt {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    pub category_id: String,
    #[serde(default)]
    pub image_url: String,
}

impl NewPrompt {
    /// Name of the first required field that is blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("title", &self.title),
            ("content", &self.content),
            ("category_id", &self.category_id),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// One page of prompts, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct PromptPage {
    pub prompts: Vec<Prompt>,
    pub total: usize,
}

/// Persistence for prompts.
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Store a new prompt owned by `user_id`.
    async fn create(&self, user_id: &str, new_prompt: NewPrompt) -> Prompt;

    /// Fetch a prompt by id.
    async fn get(&self, id: Uuid) -> Option<Prompt>;

    /// List prompts newest first. `page` is 1-based.
    async fn list(&self, page: usize, page_size: usize) -> PromptPage;
}

/// Prompt store kept in process memory.
#[derive(Default)]
pub struct InMemoryPromptStore {
    prompts: DashMap<Uuid, Prompt>,
}

impl InMemoryPromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

#[async_trait]
impl PromptStore for InMemoryPromptStore {
    async fn create(&self, user_id: &str, new_prompt: NewPrompt) -> Prompt {
        let now = Utc::now();
        let prompt = Prompt {
            id: Uuid::new_v4(),
            title: new_prompt.title,
            description: new_prompt.description,
            content: new_prompt.content,
            category_id: new_prompt.category_id,
            user_id: user_id.to_string(),
            view_count: 0,
            favorite_count: 0,
            image_url: new_prompt.image_url,
            created_at: now,
            updated_at: now,
        };
        self.prompts.insert(prompt.id, prompt.clone());
        prompt
    }

    async fn get(&self, id: Uuid) -> Option<Prompt> {
        self.prompts.get(&id).map(|entry| entry.value().clone())
    }

    async fn list(&self, page: usize, page_size: usize) -> PromptPage {
        let mut prompts: Vec<Prompt> = self
            .prompts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        prompts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = prompts.len();
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        let prompts = prompts.into_iter().skip(offset).take(page_size).collect();

        PromptPage { prompts, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_prompt(title: &str) -> NewPrompt {
        NewPrompt {
            title: title.to_string(),
            description: String::new(),
            content: "Summarise the following text".to_string(),
            category_id: "writing".to_string(),
            image_url: String::new(),
        }
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(new_prompt("ok").missing_field(), None);
        assert_eq!(new_prompt("  ").missing_field(), Some("title"));

        let mut prompt = new_prompt("ok");
        prompt.category_id.clear();
        assert_eq!(prompt.missing_field(), Some("category_id"));
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryPromptStore::new();
        let created = store.create("alice", new_prompt("first")).await;

        assert_eq!(created.user_id, "alice");
        assert_eq!(created.view_count, 0);
        assert_eq!(store.get(created.id).await, Some(created.clone()));
        assert_eq!(store.get(Uuid::new_v4()).await, None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let store = InMemoryPromptStore::new();
        for i in 0..25 {
            store.create("alice", new_prompt(&format!("prompt {}", i))).await;
        }

        let first = store.list(1, 10).await;
        assert_eq!(first.total, 25);
        assert_eq!(first.prompts.len(), 10);

        let last = store.list(3, 10).await;
        assert_eq!(last.prompts.len(), 5);

        let beyond = store.list(4, 10).await;
        assert!(beyond.prompts.is_empty());
        assert_eq!(beyond.total, 25);
    }
}
