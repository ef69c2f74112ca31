// src/common/response.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Envelope de todas as respostas: `{ success, data?, error? }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    // Só aparece em erros de validação
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None, details: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()), details: None }
    }

    pub fn with_details(mut self, details: HashMap<String, Vec<String>>) -> Self {
        self.details = Some(details);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.success { StatusCode::OK } else { StatusCode::BAD_REQUEST };
        (status, Json(self)).into_response()
    }
}

/// Sucesso com status explícito (ex: 201 na criação).
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::ok(data))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_omits_error() {
        let body = serde_json::to_value(ApiResponse::ok(42)).unwrap();
        assert_eq!(body, json!({ "success": true, "data": 42 }));
    }

    #[test]
    fn failure_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::<()>::failure("falhou")).unwrap();
        assert_eq!(body, json!({ "success": false, "error": "falhou" }));
    }

    #[test]
    fn unavailable_stats_serialize_as_null_data() {
        let body = serde_json::to_value(ApiResponse::ok(None::<i32>)).unwrap();
        assert_eq!(body, json!({ "success": true, "data": null }));
    }
}
