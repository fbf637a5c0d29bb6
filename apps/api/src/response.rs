use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Success envelope shared by every endpoint: `{status, message, data}`.
/// Errors use the same shape without `data` (see `AppError`).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            data: Some(data),
        })
    }

    pub fn created(message: impl Into<String>, data: T) -> (StatusCode, Json<Self>) {
        (
            StatusCode::CREATED,
            Json(Self {
                status: StatusCode::CREATED.as_u16(),
                message: message.into(),
                data: Some(data),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_carries_data() {
        let Json(body) = ApiResponse::ok("done", vec![1, 2]);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["message"], "done");
        assert_eq!(value["data"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_created_uses_201() {
        let (status, Json(body)) = ApiResponse::created("made", "id");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.status, 201);
    }
}
