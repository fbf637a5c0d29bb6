//! Lenient extraction of the tagged fields in a generator reply.
//!
//! A field is either present (the trimmed text between its first usable `<Tag>`/`</Tag>`
//! pair) or absent. Absent fields become empty strings in [`ExtractedResponse`]; a reply that
//! forgets a tag is not an error.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Rating,
    Feedback,
    Question,
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    /// Opening and closing tag on the same line.
    SingleLine,
    Multiline,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Rating => "Rating",
            Tag::Feedback => "Feedback",
            Tag::Question => "Question",
            Tag::Code => "Code",
        }
    }

    fn span(self) -> Span {
        match self {
            Tag::Code => Span::Multiline,
            Tag::Rating | Tag::Feedback | Tag::Question => Span::SingleLine,
        }
    }
}

/// Structured fields of one reply. `feedback` keeps any nested
/// `Positive`/`Negative`/`Improvements` tags verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedResponse {
    pub question: String,
    pub code: String,
    pub rating: String,
    pub feedback: String,
}

impl ExtractedResponse {
    /// The question as persisted: the code snippet, when there is one, fenced under it.
    pub fn question_with_code(&self) -> String {
        if self.code.is_empty() {
            self.question.clone()
        } else {
            format!("{}\n```\n{}\n```", self.question, self.code)
        }
    }

    /// The rating as a score, when it is an integer within 0..=10.
    pub fn rating_score(&self) -> Option<u8> {
        self.rating.parse::<u8>().ok().filter(|score| *score <= 10)
    }
}

pub fn extract(reply: &str) -> ExtractedResponse {
    let field = |tag| find_tag(reply, tag).unwrap_or_default().to_string();
    ExtractedResponse {
        question: field(Tag::Question),
        code: field(Tag::Code),
        rating: field(Tag::Rating),
        feedback: field(Tag::Feedback),
    }
}

/// Locates the first `<Tag>...</Tag>` pair allowed by the tag's span rule.
///
/// Single-line tags skip an opening tag whose line holds no closing tag and try the next
/// opening tag. A multi-line tag takes the first closing tag anywhere after its opening.
pub fn find_tag(text: &str, tag: Tag) -> Option<&str> {
    let open = format!("<{}>", tag.name());
    let close = format!("</{}>", tag.name());

    let mut cursor = 0;
    while let Some(found) = text[cursor..].find(&open) {
        let start = cursor + found + open.len();
        let rest = &text[start..];

        match tag.span() {
            Span::Multiline => return rest.find(&close).map(|end| rest[..end].trim()),
            Span::SingleLine => {
                let line = rest.find('\n').map_or(rest, |newline| &rest[..newline]);
                if let Some(end) = line.find(&close) {
                    return Some(line[..end].trim());
                }
            }
        }
        cursor = start;
    }
    None
}
