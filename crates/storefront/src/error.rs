//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::docstore::DocStoreError;
use crate::identity::AuthError;
use crate::payments::PaymentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store operation failed.
    #[error("Document store error: {0}")]
    Store(#[from] DocStoreError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment confirmation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Checkout was refused or failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error should be reported to Sentry. Payment declines,
    /// validation failures, and the like are expected traffic.
    fn is_reportable(&self) -> bool {
        match self {
            Self::Store(_) | Self::Internal(_) | Self::Session(_) => true,
            Self::Auth(err) => !err.is_user_error(),
            Self::Payment(err) => !matches!(err, PaymentError::Declined(_)),
            Self::Checkout(err) => matches!(
                err,
                CheckoutError::OrderWrite(_)
                    | CheckoutError::PermitMismatch
                    | CheckoutError::Payment(
                        PaymentError::Http(_) | PaymentError::Api { .. } | PaymentError::Parse(_)
                    )
            ),
            Self::NotFound(_) | Self::Unauthorized(_) | Self::BadRequest(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_reportable() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Store(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Payment(err) => payment_status(err),
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => StatusCode::BAD_REQUEST,
                CheckoutError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::SubmissionInFlight | CheckoutError::ApprovedAmountChanged => {
                    StatusCode::CONFLICT
                }
                CheckoutError::Payment(payment) => payment_status(payment),
                CheckoutError::OrderWrite(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::PermitMismatch => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Store(_) | Self::Internal(_) | Self::Session(_) => {
                json!({ "error": "Internal server error" })
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::UserAlreadyExists
                | AuthError::WeakPassword
                | AuthError::InvalidEmail(_) => json!({ "error": err.to_string() }),
                _ => json!({ "error": "Authentication error" }),
            },
            Self::Payment(err) => payment_body(err),
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart
                | CheckoutError::SubmissionInFlight
                | CheckoutError::ApprovedAmountChanged => {
                    json!({ "error": err.to_string() })
                }
                CheckoutError::PermitMismatch => json!({ "error": "Internal server error" }),
                CheckoutError::Validation(missing) => json!({
                    "error": "missing required fields",
                    "missing_fields": missing,
                }),
                CheckoutError::Payment(payment) => payment_body(payment),
                CheckoutError::OrderWrite(_) => json!({
                    "error": "We could not record your order. Your cart is unchanged - please try again.",
                }),
            },
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

fn payment_status(err: &PaymentError) -> StatusCode {
    match err {
        PaymentError::Declined(_) => StatusCode::PAYMENT_REQUIRED,
        PaymentError::Http(_) | PaymentError::Api { .. } | PaymentError::Parse(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn payment_body(err: &PaymentError) -> serde_json::Value {
    match err {
        PaymentError::Declined(reason) => json!({ "error": format!("payment declined: {reason}") }),
        _ => json!({ "error": "Payment service error" }),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an identity.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
