use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::admin::ControllerError;
use crate::content::BlobError;
use crate::store::StoreError;

/// Success envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

/// Error envelope. `traceId` is filled in by the request-id middleware.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

const REDACTED_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone)]
pub struct AppError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    /// false 表示非预期错误，响应中不暴露原始消息
    pub is_operational: bool,
}

impl AppError {
    fn operational(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.to_string(),
            is_operational: true,
        }
    }

    pub fn bad_request(code: &str, message: &str) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::operational(StatusCode::UNAUTHORIZED, "AUTH_UNAUTHORIZED", message)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::operational(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(code: &str, message: &str) -> Self {
        Self::operational(StatusCode::CONFLICT, code, message)
    }

    pub fn unsupported_media_type(message: &str) -> Self {
        Self::operational(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UNSUPPORTED_MEDIA_TYPE",
            message,
        )
    }

    pub fn payload_too_large(message: &str) -> Self {
        Self::operational(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", message)
    }

    pub fn internal(message: &str) -> Self {
        Self {
            is_operational: false,
            ..Self::operational(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            tracing::warn!(status = %self.status, code = %self.code, error = %self.message, "API error");
            self.message
        } else {
            tracing::error!(status = %self.status, code = %self.code, error = %self.message, "Internal API error");
            REDACTED_MESSAGE.to_string()
        };

        let body = ErrorBody {
            success: false,
            code: self.code,
            message,
            trace_id: None,
        };
        (self.status, Json(body)).into_response()
    }
}

// Validation -> 400, Forbidden -> 403, NotFound -> 404, Conflict -> 409；其余按内部错误处理
impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match &value {
            StoreError::Validation(msg) => AppError::bad_request("VALIDATION_ERROR", msg),
            StoreError::Forbidden(msg) => AppError::forbidden(msg),
            StoreError::NotFound { entity, .. } => {
                AppError::not_found(&format!("{entity} not found"))
            }
            StoreError::Conflict { entity, .. } => {
                AppError::conflict("CONFLICT", &format!("{entity} already exists"))
            }
            _ => AppError::internal(&value.to_string()),
        }
    }
}

impl From<ControllerError> for AppError {
    fn from(value: ControllerError) -> Self {
        match value {
            ControllerError::Store(e) => e.into(),
            ControllerError::Busy => {
                AppError::conflict("ADMIN_BUSY", "A bulk operation is already running")
            }
            ControllerError::EmptySelection => {
                AppError::bad_request("EMPTY_SELECTION", "No records selected")
            }
            ControllerError::NotFound(id) => AppError::not_found(&format!("Record {id} not found")),
            ControllerError::InvalidFields(msg) => AppError::bad_request("INVALID_FIELDS", &msg),
        }
    }
}

impl From<BlobError> for AppError {
    fn from(value: BlobError) -> Self {
        match &value {
            BlobError::InvalidPath(_) | BlobError::ForeignUrl(_) => {
                AppError::bad_request("INVALID_UPLOAD_PATH", &value.to_string())
            }
            BlobError::Io(_) => AppError::internal(&value.to_string()),
        }
    }
}

fn envelope<T: Serialize>(status: StatusCode, data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        status,
        Json(ApiResponse {
            success: true,
            data,
        }),
    )
}

pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    envelope(StatusCode::OK, data)
}

pub fn created<T: Serialize>(data: T) -> impl IntoResponse {
    envelope(StatusCode::CREATED, data)
}
