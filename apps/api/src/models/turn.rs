use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;

use crate::models::session::SessionId;

/// Per-session record of every turn, held as parallel sequences.
///
/// While the latest question is awaiting an answer:
/// `ratings.len() == feedback.len() == questions.len() - 1`.
/// `push_turn` refuses to write when that does not hold.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TurnAggregate {
    pub session_id: SessionId,
    pub questions: Vec<String>,
    pub ratings: Vec<String>,
    pub feedback: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The values written by one answered turn: the rating and feedback describe the
/// previous question, `question` is the new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTurn {
    pub question: String,
    pub rating: String,
    pub feedback: String,
}

/// A question that has already been answered, as rendered into the history.
/// Rating and feedback are `None` when a stored row is shorter than its questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedTurn<'a> {
    pub index: usize,
    pub question: &'a str,
    pub rating: Option<&'a str>,
    pub feedback: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "turn history for session {session_id} is misaligned: \
     {questions} questions, {ratings} ratings, {feedback} feedback entries"
)]
pub struct TurnInvariantError {
    pub session_id: SessionId,
    pub questions: usize,
    pub ratings: usize,
    pub feedback: usize,
}

impl TurnAggregate {
    pub fn new(session_id: SessionId, first_question: String, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            questions: vec![first_question],
            ratings: Vec::new(),
            feedback: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_awaiting_answer(&self) -> bool {
        !self.questions.is_empty()
            && self.ratings.len() + 1 == self.questions.len()
            && self.feedback.len() + 1 == self.questions.len()
    }

    pub fn ensure_awaiting_answer(&self) -> Result<(), TurnInvariantError> {
        if self.is_awaiting_answer() {
            return Ok(());
        }
        Err(TurnInvariantError {
            session_id: self.session_id.clone(),
            questions: self.questions.len(),
            ratings: self.ratings.len(),
            feedback: self.feedback.len(),
        })
    }

    /// Records the evaluation of the current question and the next question to ask.
    /// All three sequences grow together, empty strings included.
    pub fn push_turn(&mut self, turn: NewTurn, now: DateTime<Utc>) -> Result<(), TurnInvariantError> {
        self.ensure_awaiting_answer()?;
        self.ratings.push(turn.rating);
        self.feedback.push(turn.feedback);
        self.questions.push(turn.question);
        self.updated_at = now;
        Ok(())
    }

    /// The question the candidate is answering right now.
    pub fn current_question(&self) -> Option<&str> {
        self.questions.last().map(String::as_str)
    }

    /// Every question except the last, paired with whatever evaluation exists at its index.
    pub fn completed_turns(&self) -> impl Iterator<Item = CompletedTurn<'_>> {
        let answered = self.questions.len().saturating_sub(1);
        self.questions[..answered]
            .iter()
            .enumerate()
            .map(|(index, question)| CompletedTurn {
                index,
                question,
                rating: self.ratings.get(index).map(String::as_str),
                feedback: self.feedback.get(index).map(String::as_str),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_id() -> SessionId {
        "65a1b2c3d4e5f60718293a4b".parse().unwrap()
    }

    fn turn(question: &str, rating: &str, feedback: &str) -> NewTurn {
        NewTurn {
            question: question.to_string(),
            rating: rating.to_string(),
            feedback: feedback.to_string(),
        }
    }

    #[test]
    fn test_new_aggregate_awaits_first_answer() {
        let agg = TurnAggregate::new(session_id(), "What is a mutex?".to_string(), Utc::now());
        assert!(agg.is_awaiting_answer());
        assert_eq!(agg.current_question(), Some("What is a mutex?"));
        assert_eq!(agg.completed_turns().count(), 0);
    }

    #[test]
    fn test_push_turn_keeps_sequences_aligned() {
        let mut agg = TurnAggregate::new(session_id(), "Q1".to_string(), Utc::now());
        agg.push_turn(turn("Q2", "7", "solid"), Utc::now()).unwrap();
        agg.push_turn(turn("Q3", "", ""), Utc::now()).unwrap();

        assert_eq!(agg.questions, vec!["Q1", "Q2", "Q3"]);
        assert_eq!(agg.ratings, vec!["7", ""]);
        assert_eq!(agg.feedback, vec!["solid", ""]);
        assert!(agg.is_awaiting_answer());
    }

    #[test]
    fn test_push_turn_rejects_misaligned_history() {
        let mut agg = TurnAggregate::new(session_id(), "Q1".to_string(), Utc::now());
        agg.ratings.push("5".to_string());

        let err = agg.push_turn(turn("Q2", "6", "ok"), Utc::now()).unwrap_err();
        assert_eq!(err.questions, 1);
        assert_eq!(err.ratings, 1);
        assert_eq!(err.feedback, 0);
        assert_eq!(agg.questions.len(), 1);
    }

    #[test]
    fn test_completed_turns_tolerate_short_sequences() {
        let agg = TurnAggregate {
            session_id: session_id(),
            questions: vec!["Q1".into(), "Q2".into(), "Q3".into()],
            ratings: vec!["8".into()],
            feedback: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let turns: Vec<_> = agg.completed_turns().collect();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].rating, Some("8"));
        assert_eq!(turns[0].feedback, None);
        assert_eq!(turns[1].question, "Q2");
        assert_eq!(turns[1].rating, None);
    }
}
