use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::status::InterviewStatus;

/// Opaque session handle: 24 lowercase hexadecimal characters.
///
/// The first 8 characters encode the creation second, the remaining 16 are random,
/// so ids sort roughly by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct SessionId(String);

/// Rejected before any store access. Surfaces as a 400 `INVALID_SESSION_ID`, kept apart
/// from the 404 for a well-formed id that matches no session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid session id '{0}': expected 24 hexadecimal characters")]
pub struct InvalidSessionId(pub String);

impl SessionId {
    pub const LEN: usize = 24;

    pub fn generate() -> Self {
        let seconds = Utc::now().timestamp() as u32;
        let random = Uuid::new_v4();
        let mut id = format!("{seconds:08x}");
        for byte in &random.as_bytes()[..8] {
            id.push_str(&format!("{byte:02x}"));
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionId {
    type Err = InvalidSessionId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.len() != Self::LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidSessionId(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for SessionId {
    type Error = InvalidSessionId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A project the candidate wants to be interviewed about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tech_stacks: Vec<String>,
}

/// One interview instance: the candidate profile plus where the conversation stands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub experience: String,
    pub tech_stacks: Vec<String>,
    pub projects: Vec<Project>,
    pub interview_status: InterviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw `interview_sessions` row. Status is stored as text and checked on conversion.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: SessionId,
    pub name: String,
    pub experience: String,
    pub tech_stacks: Vec<String>,
    pub projects: Json<Vec<Project>>,
    pub interview_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Candidate profile submitted when a session is created.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub name: String,
    pub experience: String,
    pub tech_stacks: Vec<String>,
    pub projects: Vec<Project>,
}

impl NewSession {
    /// Trims every field, drops blank and repeated tech stacks (first occurrence wins)
    /// and rejects profiles the interviewer cannot work from.
    pub fn normalized(self) -> Result<Self, AppError> {
        let name = self.name.trim().to_string();
        let experience = self.experience.trim().to_string();
        let tech_stacks = dedup_tags(self.tech_stacks);

        if name.is_empty() {
            return Err(AppError::Validation("name cannot be empty".to_string()));
        }
        if experience.is_empty() {
            return Err(AppError::Validation("experience cannot be empty".to_string()));
        }
        if tech_stacks.is_empty() {
            return Err(AppError::Validation(
                "at least one tech stack is required".to_string(),
            ));
        }
        if self.projects.is_empty() {
            return Err(AppError::Validation(
                "at least one project is required".to_string(),
            ));
        }

        let mut projects = Vec::with_capacity(self.projects.len());
        for project in self.projects {
            let title = project.title.trim().to_string();
            let description = project.description.trim().to_string();
            if title.is_empty() || description.is_empty() {
                return Err(AppError::Validation(
                    "every project needs a title and a description".to_string(),
                ));
            }
            projects.push(Project {
                title,
                description,
                tech_stacks: dedup_tags(project.tech_stacks),
            });
        }

        Ok(Self {
            name,
            experience,
            tech_stacks,
            projects,
        })
    }
}

fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|seen| seen == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
