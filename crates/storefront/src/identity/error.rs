//! Identity provider errors.

use wavecrest_core::EmailError;

/// Errors from sign-in and sign-up.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong email or password. Always reported without saying which.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Sign-up with an email that already has an account.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// The provider rejected the password as too weak.
    #[error("password does not meet the minimum requirements")]
    WeakPassword,

    /// The email address failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an unrecognized error response.
    #[error("identity API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The provider response could not be decoded.
    #[error("identity response parse error: {0}")]
    Parse(String),
}

impl AuthError {
    /// Whether this error is the user's fault and safe to show them.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::UserAlreadyExists
                | Self::WeakPassword
                | Self::InvalidEmail(_)
        )
    }
}
