use axum::{response::IntoResponse, Json};

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Backend rejected request: {0}")]
    Api(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Query timed out after {0}s")]
    Timeout(u64),
}

impl IntoResponse for LayoutError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Request(_) | Self::Api(_) | Self::Decode(_) | Self::Timeout(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
