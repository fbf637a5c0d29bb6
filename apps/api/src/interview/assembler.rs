//! Directive assembly: turns a session and its turn history into the text sent to the
//! AI gateway. Pure: the clock reading is passed in.

use chrono::NaiveTime;

use crate::interview::prompts::{FIRST_QUESTION_TEMPLATE, NEXT_QUESTION_INSTRUCTIONS, PERSONA};
use crate::interview::status::InterviewStatus;
use crate::models::session::Session;
use crate::models::turn::TurnAggregate;

/// Builds the full directive for the session's current status.
///
/// - `NotStarted`: persona, candidate details, opening-question instructions.
/// - `WaitingForAnswer`: persona, candidate details, `History` (every question but the last),
///   `CurrentInteraction` (last question + `answer`), follow-up instructions. History and
///   current interaction are left out when `turns` is missing or holds no question.
/// - `Ended`: persona and candidate details only; the engine never gets this far.
pub fn build_directive(
    session: &Session,
    turns: Option<&TurnAggregate>,
    answer: &str,
    now: NaiveTime,
) -> String {
    let mut directive = String::new();
    directive.push_str(PERSONA);
    directive.push_str(&render_candidate_details(session));

    match session.interview_status {
        InterviewStatus::NotStarted => {
            let time = now.format("%H:%M").to_string();
            directive.push_str(&FIRST_QUESTION_TEMPLATE.replace("{current_time}", &time));
        }
        InterviewStatus::WaitingForAnswer => {
            if let Some(turns) = turns.filter(|t| !t.questions.is_empty()) {
                directive.push_str(&render_history(turns));
                directive.push_str(&render_current_interaction(turns, answer));
            }
            directive.push_str(NEXT_QUESTION_INSTRUCTIONS);
        }
        InterviewStatus::Ended => {}
    }

    directive
}

fn render_candidate_details(session: &Session) -> String {
    let mut block = String::from("\n<CandidateDetails>\n");
    block.push_str(&format!("Name: {}\n", session.name));
    block.push_str(&format!("Experience: {}\n", session.experience));
    block.push_str(&format!("TechStacks: {}\n", session.tech_stacks.join(", ")));
    block.push_str("Projects:\n");
    for project in &session.projects {
        if project.tech_stacks.is_empty() {
            block.push_str(&format!("- {}: {}\n", project.title, project.description));
        } else {
            block.push_str(&format!(
                "- {} [{}]: {}\n",
                project.title,
                project.tech_stacks.join(", "),
                project.description
            ));
        }
    }
    block.push_str("</CandidateDetails>\n");
    block
}

fn render_history(turns: &TurnAggregate) -> String {
    let mut block = String::from("<History>\n");
    for turn in turns.completed_turns() {
        block.push_str(&format!("<Turn number=\"{}\">\n", turn.index + 1));
        block.push_str(&format!("  <QuestionAsked>{}</QuestionAsked>\n", turn.question));
        if let Some(rating) = turn.rating {
            block.push_str(&format!("  <RatingGiven>{rating}</RatingGiven>\n"));
        }
        if let Some(feedback) = turn.feedback {
            block.push_str(&format!("  <FeedbackGiven>{feedback}</FeedbackGiven>\n"));
        }
        block.push_str("</Turn>\n");
    }
    block.push_str("</History>\n");
    block
}

fn render_current_interaction(turns: &TurnAggregate, answer: &str) -> String {
    let question = turns.current_question().unwrap_or_default();
    let mut block = String::from("<CurrentInteraction>\n");
    block.push_str(&format!("  <Question>{question}</Question>\n"));
    block.push_str(&format!("  <CandidateAnswer>{answer}</CandidateAnswer>\n"));
    block.push_str("</CurrentInteraction>\n");
    block
}
