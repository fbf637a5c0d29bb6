//! Conversation store: persistence port for sessions and their turn aggregates.
//!
//! `PgConversationStore` backs production; `InMemoryConversationStore` serves local runs
//! without `DATABASE_URL` and the engine tests. Both honour the same contract, including the
//! append-time turn invariant.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::interview::status::InterviewStatus;
use crate::models::session::{NewSession, Session, SessionId};
use crate::models::turn::{NewTurn, TurnAggregate, TurnInvariantError};

pub use memory::InMemoryConversationStore;
pub use postgres::PgConversationStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    #[error("No question history found for session {0}")]
    AggregateNotFound(SessionId),

    #[error("Question history already exists for session {0}")]
    AggregateExists(SessionId),

    #[error(transparent)]
    Invariant(#[from] TurnInvariantError),

    #[error("Session {id} has unknown status '{status}'")]
    CorruptStatus { id: SessionId, status: String },

    #[error("Store operation '{0}' timed out")]
    Timeout(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_session(&self, session: NewSession) -> Result<Session, StoreError>;

    async fn get_session(&self, id: &SessionId) -> Result<Session, StoreError>;

    async fn update_session_status(
        &self,
        id: &SessionId,
        status: InterviewStatus,
    ) -> Result<Session, StoreError>;

    /// Creates the aggregate with `questions = [first_question]` and empty evaluations.
    /// Fails with `AggregateExists` when the session already has one.
    async fn create_turn_aggregate(
        &self,
        id: &SessionId,
        first_question: &str,
    ) -> Result<TurnAggregate, StoreError>;

    /// Pushes one turn onto the existing aggregate and returns the updated aggregate.
    /// Fails with `AggregateNotFound` when there is none, `Invariant` when the stored
    /// sequences are misaligned.
    async fn append_turn(&self, id: &SessionId, turn: NewTurn) -> Result<TurnAggregate, StoreError>;

    async fn get_turn_aggregate(&self, id: &SessionId) -> Result<TurnAggregate, StoreError>;
}
