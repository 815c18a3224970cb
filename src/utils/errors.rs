//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    InsufficientStock(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: Some(json!({ "sql_error": e.to_string() })),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => {
                tracing::warn!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::NotFound(msg) => {
                tracing::warn!("Resource not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error: "Not Found".to_string(),
                        message: msg,
                        details: None,
                        code: Some("NOT_FOUND".to_string()),
                    },
                )
            }

            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Bad Request".to_string(),
                        message: msg,
                        details: None,
                        code: Some("BAD_REQUEST".to_string()),
                    },
                )
            }

            AppError::InsufficientStock(msg) => {
                tracing::warn!("Insufficient stock: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Insufficient Stock".to_string(),
                        message: msg,
                        details: None,
                        code: Some("INSUFFICIENT_STOCK".to_string()),
                    },
                )
            }

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Ordem de serviço no encontrada
pub fn work_order_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Ordem de serviço com ID {} não encontrada", id))
}

/// Stock insuficiente en la creación (se valida la cantidad completa)
pub fn insufficient_stock_requested(part_name: &str, available: i32, requested: i32) -> AppError {
    AppError::InsufficientStock(format!(
        "Estoque insuficiente para a peça {}. Disponível: {}, Solicitado: {}",
        part_name, available, requested
    ))
}

/// Stock insuficiente en la edición (solo se valida el delta)
pub fn insufficient_stock_needed(part_name: &str, available: i32, needed: i32) -> AppError {
    AppError::InsufficientStock(format!(
        "Estoque insuficiente para a peça {}. Disponível: {}, Necessário: {}",
        part_name, available, needed
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn not_found_maps_to_404() {
        let response = work_order_not_found(7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_request_maps_to_400() {
        let response =
            AppError::BadRequest("Transição de status inválida".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn insufficient_stock_maps_to_400_with_amounts() {
        let error = insufficient_stock_requested("Filtro de óleo", 3, 5);
        assert_eq!(
            error.to_string(),
            "Estoque insuficiente para a peça Filtro de óleo. Disponível: 3, Solicitado: 5"
        );
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn insufficient_stock_on_update_names_the_delta() {
        let error = insufficient_stock_needed("Pastilha de freio", 1, 2);
        assert_eq!(
            error.to_string(),
            "Estoque insuficiente para a peça Pastilha de freio. Disponível: 1, Necessário: 2"
        );
    }
}
