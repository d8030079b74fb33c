// src/errors.rs
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(String),

    #[error("Document not found")]
    DocumentNotFound,

    #[error("An account with this email already exists")]
    DuplicateKey,

    #[error("Invalid email or password")]
    AuthError,

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    // Password reset flow
    #[error("No active reset code for this account. Request a new one.")]
    OtpNotFound,

    #[error("Reset code has expired. Request a new one.")]
    OtpExpired,

    #[error("Invalid reset code")]
    InvalidOtp,

    #[error("Too many invalid attempts. Request a new code.")]
    OtpAttemptsExhausted,

    #[error("Verify your reset code before setting a new password")]
    NoVerifiedChallenge,

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Could not deliver the reset code: {0}")]
    DeliveryFailed(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Service error: {0}")]
    ServiceError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MongoDB(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidObjectId(_) => StatusCode::BAD_REQUEST,
            AppError::DocumentNotFound => StatusCode::NOT_FOUND,
            AppError::DuplicateKey => StatusCode::CONFLICT,
            AppError::AuthError => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::OtpNotFound => StatusCode::NOT_FOUND,
            AppError::OtpExpired => StatusCode::GONE,
            AppError::InvalidOtp => StatusCode::BAD_REQUEST,
            AppError::OtpAttemptsExhausted => StatusCode::TOO_MANY_REQUESTS,
            AppError::NoVerifiedChallenge => StatusCode::BAD_REQUEST,
            AppError::WeakPassword(_) => StatusCode::BAD_REQUEST,
            AppError::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ServiceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-friendly label placed in the `error` field.
    fn label(&self) -> &'static str {
        match self {
            AppError::MongoDB(_) => "Database error",
            AppError::InvalidObjectId(_) => "Invalid ID format",
            AppError::DocumentNotFound => "Not found",
            AppError::DuplicateKey => "Duplicate entry",
            AppError::AuthError => "Authentication failed",
            AppError::Unauthorized => "Unauthorized",
            AppError::ValidationError(_) => "Validation failed",
            AppError::OtpNotFound => "OTP not found",
            AppError::OtpExpired => "OTP expired",
            AppError::InvalidOtp => "Invalid OTP",
            AppError::OtpAttemptsExhausted => "Too many attempts",
            AppError::NoVerifiedChallenge => "OTP not verified",
            AppError::WeakPassword(_) => "Weak password",
            AppError::DeliveryFailed(_) => "Delivery failed",
            AppError::Hashing(_) => "Hashing error",
            AppError::ConfigurationError(_) => "Configuration error",
            AppError::ServiceError(_) => "Service error",
        }
    }

    /// Message shown to the caller. Infrastructure details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::DeliveryFailed(_) => {
                "Could not deliver the reset code. Please try again.".to_string()
            }
            AppError::MongoDB(_)
            | AppError::Hashing(_)
            | AppError::ConfigurationError(_)
            | AppError::ServiceError(_) => "Something went wrong. Please try again later.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.label(),
            "message": self.public_message(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::ValidationError(err.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

impl From<mongodb::bson::oid::Error> for AppError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        AppError::InvalidObjectId(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Hashing(err.to_string())
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        AppError::DeliveryFailed(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        AppError::ServiceError(msg.into())
    }

    /// Unique-index violations surface as `DuplicateKey`.
    pub fn from_write(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        if let ErrorKind::Write(WriteFailure::WriteError(ref write_error)) = *err.kind {
            if write_error.code == 11000 {
                return AppError::DuplicateKey;
            }
        }
        AppError::MongoDB(err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
