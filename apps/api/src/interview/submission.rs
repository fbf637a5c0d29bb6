//! Decodes the candidate's answer from whatever encoding the client used.
//!
//! JSON, multipart and URL-encoded bodies are all accepted; anything else falls back to the
//! query string. The first non-empty field among `ANSWER_FIELDS` wins.

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Multipart, Query, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde_json::Value;
use tracing::debug;

use crate::errors::AppError;

/// Field names probed for the answer, in order.
pub const ANSWER_FIELDS: [&str; 3] = ["answer", "Answer", "transcript"];

/// Body limit for answer submissions (multipart uploads included).
pub const MAX_SUBMISSION_BYTES: usize = 10 << 20;

pub async fn read_answer(request: Request) -> Result<String, AppError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    debug!("Decoding answer submission (content-type: {content_type:?})");

    let fields = if content_type.contains("application/json") {
        json_fields(request).await?
    } else if content_type.contains("multipart/form-data") {
        multipart_fields(request).await?
    } else if content_type.contains("application/x-www-form-urlencoded") {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(|e| AppError::Validation(format!("Invalid form body: {e}")))?;
        fields
    } else {
        Query::<HashMap<String, String>>::try_from_uri(request.uri())
            .map(|Query(fields)| fields)
            .unwrap_or_default()
    };

    Ok(probe_answer(&fields))
}

fn probe_answer(fields: &HashMap<String, String>) -> String {
    ANSWER_FIELDS
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|value| !value.is_empty())
        .cloned()
        .unwrap_or_default()
}

async fn json_fields(request: Request) -> Result<HashMap<String, String>, AppError> {
    let Json(body) = Json::<Value>::from_request(request, &())
        .await
        .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e.body_text())))?;

    let Value::Object(map) = body else {
        return Err(AppError::Validation(
            "Invalid JSON body: expected an object".to_string(),
        ));
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key, text)),
            _ => None,
        })
        .collect())
}

async fn multipart_fields(request: Request) -> Result<HashMap<String, String>, AppError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::Validation(format!("Failed to parse form data: {e}")))?;

    let mut fields = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to parse form data: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if field.file_name().is_some() {
            debug!("Skipping file field [{name}]");
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read form field {name}: {e}")))?;
        debug!("Form field [{name}] | {} bytes", value.len());
        fields.entry(name).or_insert(value);
    }

    if fields.is_empty() {
        debug!("Multipart submission carried no text fields");
    }
    Ok(fields)
}
