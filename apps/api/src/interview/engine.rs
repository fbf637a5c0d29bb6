//! Interview engine: runs one turn per answer submission.
//!
//! Flow: lock session → read session → validate against the state machine →
//!       read turn history → assemble directive → AI gateway → extract fields →
//!       persist (status + first question, or appended turn) → return extracted fields.
//!
//! Nothing is retried. If the reply arrives but a write fails, the caller sees the error and
//! the session stays where it was: a failed opening write puts the status back, so the next
//! submission asks again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::interview::assembler::build_directive;
use crate::interview::extractor::{extract, ExtractedResponse};
use crate::interview::locks::SessionLocks;
use crate::interview::status::{self, InterviewStatus};
use crate::llm_client::AiGateway;
use crate::models::session::{NewSession, Session, SessionId};
use crate::models::turn::{NewTurn, TurnAggregate};
use crate::store::{ConversationStore, StoreError};

pub struct InterviewEngine {
    gateway: Arc<dyn AiGateway>,
    store: Arc<dyn ConversationStore>,
    /// Upper bound for each individual store call.
    store_timeout: Duration,
    locks: SessionLocks,
}

impl InterviewEngine {
    pub fn new(
        gateway: Arc<dyn AiGateway>,
        store: Arc<dyn ConversationStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            store,
            store_timeout,
            locks: SessionLocks::new(),
        }
    }

    pub async fn create_session(&self, profile: NewSession) -> Result<Session, AppError> {
        let profile = profile.normalized()?;
        Ok(self
            .bounded("create_session", self.store.create_session(profile))
            .await?)
    }

    pub async fn session(&self, id: &SessionId) -> Result<Session, AppError> {
        Ok(self.bounded("get_session", self.store.get_session(id)).await?)
    }

    /// The recorded questions, ratings and feedback of a session.
    pub async fn transcript(&self, id: &SessionId) -> Result<TurnAggregate, AppError> {
        self.bounded("get_session", self.store.get_session(id)).await?;
        Ok(self
            .bounded("get_turn_aggregate", self.store.get_turn_aggregate(id))
            .await?)
    }

    /// Applies the external end signal.
    pub async fn end_session(&self, id: &SessionId) -> Result<Session, AppError> {
        let _turn = self.locks.acquire(id).await;

        let session = self.bounded("get_session", self.store.get_session(id)).await?;
        let next = status::next_status_on_end(session.interview_status)?;
        let ended = self
            .bounded("update_session_status", self.store.update_session_status(id, next))
            .await?;

        info!("Session {id} ended ({} -> {next})", session.interview_status);
        Ok(ended)
    }

    /// Runs one interview turn for `answer`.
    ///
    /// `cancel`, or dropping the returned future, abandons the gateway call. Once a reply is
    /// in hand the writes run on their own task, so they complete even if the caller goes away.
    pub async fn submit_answer(
        &self,
        id: &SessionId,
        answer: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractedResponse, AppError> {
        let turn_guard = self.locks.acquire(id).await;

        let session = self.bounded("get_session", self.store.get_session(id)).await?;
        let prior = session.interview_status;
        status::validate_submission(prior, answer)?;

        let history = if status::is_answer_required(prior) {
            self.history_for(id).await?
        } else {
            None
        };

        let now = Local::now().time();
        let directive = match &history {
            Some(turns) => build_directive(&session, Some(turns), answer, now),
            None => {
                // Also covers a waiting session whose opening question never got stored.
                let opening = Session {
                    interview_status: InterviewStatus::NotStarted,
                    ..session.clone()
                };
                build_directive(&opening, None, answer, now)
            }
        };
        debug!(
            "Sending {} byte directive for session {id} ({prior})",
            directive.len()
        );

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Session {id}: submission cancelled while waiting for the AI gateway");
                return Err(AppError::Cancelled);
            }
            reply = self.gateway.generate(&directive) => reply?,
        };

        if reply.trim().is_empty() {
            return Err(AppError::Llm("AI gateway returned an empty reply".to_string()));
        }

        let extracted = extract(&reply);
        if extracted.question.is_empty() {
            warn!("Session {id}: reply carried no Question tag");
        }
        if !extracted.rating.is_empty() && extracted.rating_score().is_none() {
            warn!(
                "Session {id}: rating '{}' is not an integer between 0 and 10",
                extracted.rating
            );
        }

        let write = match history {
            Some(_) => TurnWrite::FollowUp(NewTurn {
                question: extracted.question_with_code(),
                rating: extracted.rating.clone(),
                feedback: extracted.feedback.clone(),
            }),
            None => TurnWrite::Opening {
                from: prior,
                question: extracted.question_with_code(),
            },
        };

        let persist = tokio::spawn(persist_turn(
            Arc::clone(&self.store),
            self.store_timeout,
            id.clone(),
            write,
            turn_guard,
        ));
        persist
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Turn persistence task failed: {e}")))??;

        Ok(extracted)
    }

    /// Turn history for a session awaiting an answer.
    ///
    /// `None` means no aggregate was ever stored and the opening question has to be asked
    /// again. A misaligned aggregate is refused here, before any generation is paid for.
    async fn history_for(&self, id: &SessionId) -> Result<Option<TurnAggregate>, AppError> {
        match self
            .bounded("get_turn_aggregate", self.store.get_turn_aggregate(id))
            .await
        {
            Ok(aggregate) => {
                aggregate.ensure_awaiting_answer().map_err(StoreError::from)?;
                Ok(Some(aggregate))
            }
            Err(StoreError::AggregateNotFound(_)) => {
                warn!(
                    "Session {id} is awaiting an answer but has no question history; \
                     asking the opening question again"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        bounded(self.store_timeout, operation, call).await
    }
}

/// The store writes that follow one generated reply.
enum TurnWrite {
    /// First stored question. `from` is the status the turn started in.
    Opening {
        from: InterviewStatus,
        question: String,
    },
    FollowUp(NewTurn),
}

/// Holds the session lock until the writes are done.
async fn persist_turn(
    store: Arc<dyn ConversationStore>,
    limit: Duration,
    id: SessionId,
    write: TurnWrite,
    _turn_guard: OwnedMutexGuard<()>,
) -> Result<(), StoreError> {
    match write {
        TurnWrite::Opening { from, question } => {
            let next = status::next_status_after_first_question(from);
            if from != next {
                bounded(limit, "update_session_status", store.update_session_status(&id, next))
                    .await?;
            }

            let created = bounded(
                limit,
                "create_turn_aggregate",
                store.create_turn_aggregate(&id, &question),
            )
            .await;
            if let Err(e) = created {
                if from != next {
                    revert_status(store.as_ref(), limit, &id, from).await;
                }
                return Err(e);
            }
            info!("Session {id} started ({from} -> {next})");
        }
        TurnWrite::FollowUp(turn) => {
            let rating = turn.rating.clone();
            let aggregate = bounded(limit, "append_turn", store.append_turn(&id, turn)).await?;
            info!(
                "Session {id}: recorded turn {} (rating '{rating}')",
                aggregate.ratings.len()
            );
        }
    }
    Ok(())
}

/// Puts the status back after the opening question failed to store, so the next
/// submission generates it again.
async fn revert_status(
    store: &dyn ConversationStore,
    limit: Duration,
    id: &SessionId,
    status: InterviewStatus,
) {
    match bounded(limit, "update_session_status", store.update_session_status(id, status)).await {
        Ok(_) => warn!("Session {id}: opening question not stored, status reverted to {status}"),
        Err(e) => error!("Session {id}: failed to revert status to {status}: {e}"),
    }
}

async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout(operation))?
}
