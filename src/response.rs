use serde::Serialize;
use utoipa::ToSchema;

/// Pagination block attached to list responses. Single-resource endpoints
/// send it with every field null rather than omitting it, which keeps the
/// envelope shape stable for clients.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// Envelope used by every handler: a short human-readable message, the
/// payload, and optional pagination metadata. Errors produce the same shape
/// with `data: null` (see `error::AppError`).
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_with_stable_shape() {
        let body = ApiResponse::success("OK", serde_json::json!({"id": 7}), Some(Meta::empty()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "OK");
        assert_eq!(json["data"]["id"], 7);
        assert_eq!(json["meta"]["page"], serde_json::Value::Null);

        let paged = ApiResponse::success("Products", serde_json::json!([]), Some(Meta::new(2, 20, 41)));
        let json = serde_json::to_value(&paged).unwrap();
        assert_eq!(json["meta"]["page"], 2);
        assert_eq!(json["meta"]["total"], 41);
    }
}
