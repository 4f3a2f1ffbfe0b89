//! Error handling for the Beverage Distribution Manager
//!
//! Provides consistent error responses in English and Spanish

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{AmountOverflow, QuantityError};
use thiserror::Error;
use uuid::Uuid;

/// Page the client shell sends users to after a permission failure
pub const UNAUTHORIZED_PAGE: &str = "/unauthorized";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String, message_es: String },

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Insufficient stock for {product_name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        product_name: String,
        requested: i64,
        available: i64,
    },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Field-level validation error with both translations
    pub fn validation(field: &str, message: &str, message_es: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_es: message_es.to_string(),
        }
    }

    pub fn unauthorized(message: &str, message_es: &str) -> Self {
        AppError::Unauthorized {
            message: message.to_string(),
            message_es: message_es.to_string(),
        }
    }
}

impl From<QuantityError> for AppError {
    fn from(err: QuantityError) -> Self {
        let message_es = match err {
            QuantityError::InvalidUnitsPerBox(_) => "Las unidades por caja deben ser mayores a cero",
            QuantityError::Negative => "Las cantidades no pueden ser negativas",
            QuantityError::Overflow => "La cantidad es demasiado grande",
        };
        AppError::Validation {
            field: "quantity".to_string(),
            message: err.to_string(),
            message_es: message_es.to_string(),
        }
    }
}

impl From<AmountOverflow> for AppError {
    fn from(err: AmountOverflow) -> Self {
        AppError::Validation {
            field: "quantity".to_string(),
            message: err.to_string(),
            message_es: "El importe del pedido es demasiado grande".to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        fields.sort_unstable();
        let field = fields.first().copied().unwrap_or("input");
        let (message, message_es) = match field {
            "email" => ("Invalid email address", "Correo electrónico inválido"),
            "password" | "new_password" => (
                "Password must be at least 6 characters",
                "La contraseña debe tener al menos 6 caracteres",
            ),
            _ => ("Invalid value", "Valor inválido"),
        };
        AppError::validation(field, message, message_es)
    }
}

/// Whether a database error is a unique-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
}

impl ErrorDetail {
    fn new(code: &str, message_en: impl Into<String>, message_es: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message_en: message_en.into(),
            message_es: message_es.into(),
            field: None,
            redirect: None,
            product_id: None,
        }
    }

    fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    fn with_redirect(mut self, path: &str) -> Self {
        self.redirect = Some(path.to_string());
        self
    }

    fn with_product(mut self, product_id: Uuid) -> Self {
        self.product_id = Some(product_id);
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Unauthorized { message, message_es } => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone(), message_es.clone()),
            ),
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "INSUFFICIENT_PERMISSIONS",
                    "You do not have permission to perform this action",
                    "No tienes permiso para realizar esta acción",
                )
                .with_redirect(UNAUTHORIZED_PAGE),
            ),
            AppError::Validation {
                field,
                message,
                message_es,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_es.clone())
                    .with_field(field),
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "DUPLICATE_ENTRY",
                    format!("A record with this {} already exists", field),
                    format!("Ya existe un registro con este {}", field),
                )
                .with_field(field),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    "NOT_FOUND",
                    format!("{} not found", resource),
                    format!("No se encontró {}", resource),
                ),
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "INVALID_STATE_TRANSITION",
                    msg.clone(),
                    format!("No se puede cambiar el estado: {}", msg),
                ),
            ),
            AppError::InsufficientStock {
                product_id,
                product_name,
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "INSUFFICIENT_STOCK",
                    format!(
                        "Not enough stock of {}: requested {} units, {} available",
                        product_name, requested, available
                    ),
                    format!(
                        "Inventario insuficiente de {}: se pidieron {} unidades, hay {} disponibles",
                        product_name, requested, available
                    ),
                )
                .with_field("items")
                .with_product(*product_id),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "DATABASE_ERROR",
                    "A database error occurred",
                    "Ocurrió un error en la base de datos",
                ),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone(), "Error interno del servidor"),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred",
                    "Error interno del servidor",
                ),
            ),
        };

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::InsufficientPermissions, StatusCode::FORBIDDEN),
            (AppError::DuplicateEntry("email".into()), StatusCode::CONFLICT),
            (AppError::NotFound("Product".into()), StatusCode::NOT_FOUND),
            (
                AppError::InsufficientStock {
                    product_id: Uuid::nil(),
                    product_name: "Cola".into(),
                    requested: 6,
                    available: 4,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::validation("password", "too short", "muy corta"),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_order_amount_overflow_is_bad_request() {
        let error = AppError::from(AmountOverflow);
        assert!(matches!(&error, AppError::Validation { field, .. } if field == "quantity"));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_quantity_error_maps_to_validation() {
        match AppError::from(QuantityError::Negative) {
            AppError::Validation { field, .. } => assert_eq!(field, "quantity"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
