use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Standard response envelope: `{success, message, data, statusCode, timestamp}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: &str, data: T) -> Response {
        Self::with_status(StatusCode::OK, message, Some(data))
    }

    pub fn created(message: &str, data: T) -> Response {
        Self::with_status(StatusCode::CREATED, message, Some(data))
    }

    fn with_status(status: StatusCode, message: &str, data: Option<T>) -> Response {
        let body = ApiResponse {
            success: status.is_success(),
            message: message.to_string(),
            data,
            status_code: status.as_u16(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

/// Failure envelope used by the error type.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = ApiResponse::<serde_json::Value> {
        success: false,
        message: message.to_string(),
        data: None,
        status_code: status.as_u16(),
        timestamp: Utc::now(),
    };
    (status, Json(body)).into_response()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Paginated listing payload: `{items, pagination}`.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        Self {
            items,
            pagination: PageMeta {
                page,
                limit,
                total,
                total_pages: total.div_ceil(limit.max(1)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_uses_camel_case_keys() {
        let body = ApiResponse {
            success: true,
            message: "ok".to_string(),
            data: Some(serde_json::json!({"id": 1})),
            status_code: 200,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["statusCode"], 200);
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_page_math() {
        let page = Page::new(vec![1, 2, 3], 2, 10, 23);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.page, 2);

        let exact = Page::new(Vec::<i32>::new(), 1, 10, 20);
        assert_eq!(exact.pagination.total_pages, 2);
    }
}
