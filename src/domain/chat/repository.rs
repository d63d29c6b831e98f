//! Chat record repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ChatResponse;
use crate::domain::DomainError;

/// A persisted chat response
#[derive(Debug, Clone, Serialize)]
pub struct ChatRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub response: ChatResponse,
}

impl ChatRecord {
    pub fn new(response: ChatResponse) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            response,
        }
    }
}

/// Repository trait for chat record persistence
#[async_trait]
pub trait ChatRecordRepository: Send + Sync + std::fmt::Debug {
    async fn insert(&self, record: ChatRecord) -> Result<(), DomainError>;

    /// Records created within `[from, until]`, oldest first
    async fn list_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<ChatRecord>, DomainError>;
}

/// In-memory implementation of ChatRecordRepository
///
/// Process-local and bounded: once `max_records` is reached the oldest
/// record is dropped on each insert. Meant for development and tests.
pub mod in_memory {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    pub const DEFAULT_MAX_RECORDS: usize = 10_000;

    #[derive(Debug)]
    pub struct InMemoryChatRecordRepository {
        records: Mutex<VecDeque<ChatRecord>>,
        max_records: usize,
    }

    impl Default for InMemoryChatRecordRepository {
        fn default() -> Self {
            Self::with_max_records(DEFAULT_MAX_RECORDS)
        }
    }

    impl InMemoryChatRecordRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_max_records(max_records: usize) -> Self {
            Self {
                records: Mutex::new(VecDeque::new()),
                max_records: max_records.max(1),
            }
        }
    }

    #[async_trait]
    impl ChatRecordRepository for InMemoryChatRecordRepository {
        async fn insert(&self, record: ChatRecord) -> Result<(), DomainError> {
            let mut records = self
                .records
                .lock()
                .map_err(|_| DomainError::storage("chat record store lock poisoned"))?;

            while records.len() >= self.max_records {
                records.pop_front();
            }
            records.push_back(record);
            Ok(())
        }

        async fn list_between(
            &self,
            from: DateTime<Utc>,
            until: DateTime<Utc>,
        ) -> Result<Vec<ChatRecord>, DomainError> {
            let records = self
                .records
                .lock()
                .map_err(|_| DomainError::storage("chat record store lock poisoned"))?;

            let mut found: Vec<ChatRecord> = records
                .iter()
                .filter(|r| r.created_at >= from && r.created_at <= until)
                .cloned()
                .collect();
            found.sort_by_key(|r| r.created_at);

            Ok(found)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::llm::TokenUsage;
        use crate::domain::ChatModel;
        use chrono::Duration;

        fn record_at(created_at: DateTime<Utc>) -> ChatRecord {
            let mut record = ChatRecord::new(ChatResponse {
                chat_session_id: Some("s1".to_string()),
                response: "ok".to_string(),
                documents: vec![],
                request: "q".to_string(),
                rendered_prompt: None,
                model: ChatModel::Gpt4o,
                response_duration_ms: 0.0,
                token_usage: TokenUsage::new(1, 1),
                steps: vec![],
            });
            record.created_at = created_at;
            record
        }

        #[tokio::test]
        async fn test_list_between_window() {
            let repo = InMemoryChatRecordRepository::new();
            let now = Utc::now();

            repo.insert(record_at(now - Duration::days(3))).await.unwrap();
            repo.insert(record_at(now - Duration::hours(1))).await.unwrap();
            repo.insert(record_at(now)).await.unwrap();

            let found = repo
                .list_between(now - Duration::days(1), now)
                .await
                .unwrap();
            assert_eq!(found.len(), 2);
            assert!(found[0].created_at < found[1].created_at);
        }

        #[tokio::test]
        async fn test_insert_beyond_capacity_drops_oldest() {
            let repo = InMemoryChatRecordRepository::with_max_records(2);
            let now = Utc::now();

            repo.insert(record_at(now - Duration::hours(3))).await.unwrap();
            repo.insert(record_at(now - Duration::hours(2))).await.unwrap();
            repo.insert(record_at(now - Duration::hours(1))).await.unwrap();

            let found = repo
                .list_between(now - Duration::days(1), now)
                .await
                .unwrap();
            assert_eq!(found.len(), 2);
            assert_eq!(found[0].created_at, now - Duration::hours(2));
        }
    }
}
