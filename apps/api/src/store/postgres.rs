use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;

use crate::interview::status::InterviewStatus;
use crate::models::session::{NewSession, Session, SessionId, SessionRow};
use crate::models::turn::{NewTurn, TurnAggregate};
use crate::store::{ConversationStore, StoreError};

const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn session_from_row(row: SessionRow) -> Result<Session, StoreError> {
    let interview_status = row
        .interview_status
        .parse::<InterviewStatus>()
        .map_err(|_| StoreError::CorruptStatus {
            id: row.id.clone(),
            status: row.interview_status.clone(),
        })?;

    Ok(Session {
        id: row.id,
        name: row.name,
        experience: row.experience,
        tech_stacks: row.tech_stacks,
        projects: row.projects.0,
        interview_status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == FOREIGN_KEY_VIOLATION)
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn create_session(&self, session: NewSession) -> Result<Session, StoreError> {
        let id = SessionId::generate();

        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO interview_sessions
                (id, name, experience, tech_stacks, projects, interview_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&session.name)
        .bind(&session.experience)
        .bind(&session.tech_stacks)
        .bind(Json(&session.projects))
        .bind(InterviewStatus::NotStarted.as_str())
        .fetch_one(&self.pool)
        .await?;

        info!("Created interview session {id} for {}", session.name);
        session_from_row(row)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>("SELECT * FROM interview_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;

        session_from_row(row)
    }

    async fn update_session_status(
        &self,
        id: &SessionId,
        status: InterviewStatus,
    ) -> Result<Session, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE interview_sessions
            SET interview_status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;

        session_from_row(row)
    }

    async fn create_turn_aggregate(
        &self,
        id: &SessionId,
        first_question: &str,
    ) -> Result<TurnAggregate, StoreError> {
        let created = sqlx::query_as::<_, TurnAggregate>(
            r#"
            INSERT INTO turn_aggregates (session_id, questions, ratings, feedback)
            VALUES ($1, $2, '{}', '{}')
            ON CONFLICT (session_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(vec![first_question.to_string()])
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::SessionNotFound(id.clone())
            } else {
                StoreError::Database(e)
            }
        })?;

        created.ok_or_else(|| StoreError::AggregateExists(id.clone()))
    }

    async fn append_turn(&self, id: &SessionId, turn: NewTurn) -> Result<TurnAggregate, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock: concurrent appends for one session queue up here.
        let mut aggregate = sqlx::query_as::<_, TurnAggregate>(
            "SELECT * FROM turn_aggregates WHERE session_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::AggregateNotFound(id.clone()))?;

        aggregate.push_turn(turn, Utc::now())?;

        let updated = sqlx::query_as::<_, TurnAggregate>(
            r#"
            UPDATE turn_aggregates
            SET questions = $2, ratings = $3, feedback = $4, updated_at = $5
            WHERE session_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&aggregate.questions)
        .bind(&aggregate.ratings)
        .bind(&aggregate.feedback)
        .bind(aggregate.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn get_turn_aggregate(&self, id: &SessionId) -> Result<TurnAggregate, StoreError> {
        sqlx::query_as::<_, TurnAggregate>("SELECT * FROM turn_aggregates WHERE session_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::AggregateNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Project;

    fn row(status: &str) -> SessionRow {
        SessionRow {
            id: "65a1b2c3d4e5f60718293a4b".parse().unwrap(),
            name: "Asha".to_string(),
            experience: "Fresher".to_string(),
            tech_stacks: vec!["Go".to_string()],
            projects: Json(vec![Project {
                title: "Ledger".to_string(),
                description: "Bookkeeping".to_string(),
                tech_stacks: vec![],
            }]),
            interview_status: status.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_from_row_parses_status() {
        let session = session_from_row(row("waiting-for-answer")).unwrap();
        assert_eq!(session.interview_status, InterviewStatus::WaitingForAnswer);
        assert_eq!(session.projects[0].title, "Ledger");
    }

    #[test]
    fn test_session_from_row_rejects_unknown_status() {
        let err = session_from_row(row("paused")).unwrap_err();
        assert!(matches!(err, StoreError::CorruptStatus { ref status, .. } if status == "paused"));
    }
}
