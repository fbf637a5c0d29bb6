//! Interview session state machine.
//!
//! `NotStarted` → `WaitingForAnswer` → `Ended`. `WaitingForAnswer` repeats for every
//! answered turn; only the external end signal moves a session to `Ended`, which is terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewStatus {
    /// Profile captured, no question asked yet.
    #[default]
    NotStarted,
    /// A question is outstanding and the next submission must carry an answer.
    WaitingForAnswer,
    /// Read-only.
    Ended,
}

/// Why a submission was refused before any generation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("Session has already ended")]
    SessionEnded,

    #[error("An answer is required at this stage of the interview")]
    MissingAnswer,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown interview status '{0}'")]
pub struct UnknownStatus(pub String);

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::WaitingForAnswer => "waiting-for-answer",
            Self::Ended => "ended",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl FromStr for InterviewStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "not-started" => Ok(Self::NotStarted),
            "waiting-for-answer" => Ok(Self::WaitingForAnswer),
            "ended" => Ok(Self::Ended),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The opening request carries no answer; every later one must.
pub fn is_answer_required(status: InterviewStatus) -> bool {
    !matches!(status, InterviewStatus::NotStarted)
}

pub fn validate_submission(status: InterviewStatus, answer: &str) -> Result<(), SubmissionError> {
    if status.is_terminal() {
        return Err(SubmissionError::SessionEnded);
    }
    if is_answer_required(status) && answer.trim().is_empty() {
        return Err(SubmissionError::MissingAnswer);
    }
    Ok(())
}

pub fn next_status_after_first_question(status: InterviewStatus) -> InterviewStatus {
    match status {
        InterviewStatus::NotStarted => InterviewStatus::WaitingForAnswer,
        other => other,
    }
}

/// The external end signal. Ending twice is refused like any other operation on an ended session.
pub fn next_status_on_end(status: InterviewStatus) -> Result<InterviewStatus, SubmissionError> {
    if status.is_terminal() {
        return Err(SubmissionError::SessionEnded);
    }
    Ok(InterviewStatus::Ended)
}
