use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::interview::status::InterviewStatus;
use crate::models::session::{NewSession, Session, SessionId};
use crate::models::turn::{NewTurn, TurnAggregate};
use crate::store::{ConversationStore, StoreError};

/// Process-local store. Data lives as long as the process.
#[derive(Default)]
pub struct InMemoryConversationStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    sessions: HashMap<SessionId, Session>,
    turns: HashMap<SessionId, TurnAggregate>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session as-is. Lets callers seed a session in any status.
    pub async fn insert_session(&self, session: Session) {
        self.inner
            .write()
            .await
            .sessions
            .insert(session.id.clone(), session);
    }

    #[cfg(test)]
    pub async fn insert_turn_aggregate(&self, aggregate: TurnAggregate) {
        self.inner
            .write()
            .await
            .turns
            .insert(aggregate.session_id.clone(), aggregate);
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_session(&self, session: NewSession) -> Result<Session, StoreError> {
        let now = Utc::now();
        let session = Session {
            id: SessionId::generate(),
            name: session.name,
            experience: session.experience,
            tech_stacks: session.tech_stacks,
            projects: session.projects,
            interview_status: InterviewStatus::NotStarted,
            created_at: now,
            updated_at: now,
        };
        self.insert_session(session.clone()).await;
        Ok(session)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.inner
            .read()
            .await
            .sessions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(id.clone()))
    }

    async fn update_session_status(
        &self,
        id: &SessionId,
        status: InterviewStatus,
    ) -> Result<Session, StoreError> {
        let mut tables = self.inner.write().await;
        let session = tables
            .sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
        session.interview_status = status;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn create_turn_aggregate(
        &self,
        id: &SessionId,
        first_question: &str,
    ) -> Result<TurnAggregate, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.sessions.contains_key(id) {
            return Err(StoreError::SessionNotFound(id.clone()));
        }
        if tables.turns.contains_key(id) {
            return Err(StoreError::AggregateExists(id.clone()));
        }
        let aggregate = TurnAggregate::new(id.clone(), first_question.to_string(), Utc::now());
        tables.turns.insert(id.clone(), aggregate.clone());
        Ok(aggregate)
    }

    async fn append_turn(&self, id: &SessionId, turn: NewTurn) -> Result<TurnAggregate, StoreError> {
        let mut tables = self.inner.write().await;
        let aggregate = tables
            .turns
            .get_mut(id)
            .ok_or_else(|| StoreError::AggregateNotFound(id.clone()))?;
        aggregate.push_turn(turn, Utc::now())?;
        Ok(aggregate.clone())
    }

    async fn get_turn_aggregate(&self, id: &SessionId) -> Result<TurnAggregate, StoreError> {
        self.inner
            .read()
            .await
            .turns
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::AggregateNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Project;

    fn profile() -> NewSession {
        NewSession {
            name: "Asha".to_string(),
            experience: "Fresher".to_string(),
            tech_stacks: vec!["Go".to_string(), "MongoDB".to_string()],
            projects: vec![Project {
                title: "Ledger".to_string(),
                description: "Bookkeeping".to_string(),
                tech_stacks: vec![],
            }],
        }
    }

    fn turn(question: &str) -> NewTurn {
        NewTurn {
            question: question.to_string(),
            rating: "5".to_string(),
            feedback: "fine".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_read_session() {
        let store = InMemoryConversationStore::new();
        let created = store.create_session(profile()).await.unwrap();
        assert_eq!(created.interview_status, InterviewStatus::NotStarted);

        let fetched = store.get_session(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let store = InMemoryConversationStore::new();
        let id = SessionId::generate();
        assert!(matches!(
            store.get_session(&id).await,
            Err(StoreError::SessionNotFound(_))
        ));
        assert!(matches!(
            store.update_session_status(&id, InterviewStatus::Ended).await,
            Err(StoreError::SessionNotFound(_))
        ));
        assert!(matches!(
            store.create_turn_aggregate(&id, "Q1").await,
            Err(StoreError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_aggregate_is_created_once() {
        let store = InMemoryConversationStore::new();
        let session = store.create_session(profile()).await.unwrap();

        let agg = store.create_turn_aggregate(&session.id, "Q1").await.unwrap();
        assert_eq!(agg.questions, vec!["Q1"]);
        assert!(agg.ratings.is_empty() && agg.feedback.is_empty());

        assert!(matches!(
            store.create_turn_aggregate(&session.id, "Q1 again").await,
            Err(StoreError::AggregateExists(_))
        ));
    }

    #[tokio::test]
    async fn test_append_requires_aggregate() {
        let store = InMemoryConversationStore::new();
        let session = store.create_session(profile()).await.unwrap();
        assert!(matches!(
            store.append_turn(&session.id, turn("Q2")).await,
            Err(StoreError::AggregateNotFound(_))
        ));
        assert!(matches!(
            store.get_turn_aggregate(&session.id).await,
            Err(StoreError::AggregateNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_append_returns_updated_aggregate() {
        let store = InMemoryConversationStore::new();
        let session = store.create_session(profile()).await.unwrap();
        store.create_turn_aggregate(&session.id, "Q1").await.unwrap();

        let agg = store.append_turn(&session.id, turn("Q2")).await.unwrap();
        assert_eq!(agg.questions, vec!["Q1", "Q2"]);
        assert_eq!(agg.ratings, vec!["5"]);
        assert_eq!(store.get_turn_aggregate(&session.id).await.unwrap(), agg);
    }
}
