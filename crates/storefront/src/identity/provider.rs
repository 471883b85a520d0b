//! Hosted identity provider client.
//!
//! The provider exposes `accounts:signInWithPassword` and `accounts:signUp`
//! endpoints keyed by an API key query parameter, answering with the account
//! ID or a machine-readable error code.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use wavecrest_core::{Email, IdentityId};

use super::{AuthError, Identity};
use crate::config::IdentityConfig;

/// Client for the identity provider API.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

#[derive(Debug, Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "returnSecureToken")]
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(rename = "localId")]
    local_id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: String,
}

impl IdentityClient {
    /// Create a new identity client.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for any wrong-email or
    /// wrong-password answer from the provider.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, AuthError> {
        self.credentials_call("accounts:signInWithPassword", email, password)
            .await
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserAlreadyExists`] when the email is taken and
    /// [`AuthError::WeakPassword`] when the provider rejects the password.
    #[instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &Email, password: &str) -> Result<Identity, AuthError> {
        self.credentials_call("accounts:signUp", email, password)
            .await
    }

    async fn credentials_call(
        &self,
        method: &str,
        email: &Email,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let body = CredentialsRequest {
            email: email.as_str(),
            password,
            return_secure_token: true,
        };

        let response = self
            .client
            .post(format!("{}/{method}", self.endpoint))
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        account_outcome(status, &text)
    }
}

/// Decode a provider response into an identity or a typed auth error.
fn account_outcome(status: u16, body: &str) -> Result<Identity, AuthError> {
    if (200..300).contains(&status) {
        let parsed: AccountResponse =
            serde_json::from_str(body).map_err(|e| AuthError::Parse(e.to_string()))?;
        return Ok(Identity {
            id: IdentityId::new(parsed.local_id),
            email: parsed.email,
        });
    }

    let code = serde_json::from_str::<ProviderError>(body)
        .map(|e| e.error.message)
        .unwrap_or_default();

    // Provider error codes carry detail after a colon ("WEAK_PASSWORD : ...").
    let code = code.split(':').next().unwrap_or_default().trim();

    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            Err(AuthError::InvalidCredentials)
        }
        "EMAIL_EXISTS" => Err(AuthError::UserAlreadyExists),
        "WEAK_PASSWORD" => Err(AuthError::WeakPassword),
        _ => Err(AuthError::Api {
            status,
            message: body.chars().take(200).collect(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_account_outcome_success() {
        let identity = account_outcome(
            200,
            r#"{"localId":"uid_42","email":"shopper@example.com","idToken":"t"}"#,
        )
        .unwrap();
        assert_eq!(identity.id.as_str(), "uid_42");
        assert_eq!(identity.email, "shopper@example.com");
    }

    #[test]
    fn test_wrong_password_is_invalid_credentials() {
        let err =
            account_outcome(400, r#"{"error":{"message":"INVALID_PASSWORD"}}"#).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_unknown_email_is_invalid_credentials() {
        let err = account_outcome(400, r#"{"error":{"message":"EMAIL_NOT_FOUND"}}"#).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_duplicate_email_on_signup() {
        let err = account_outcome(400, r#"{"error":{"message":"EMAIL_EXISTS"}}"#).unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[test]
    fn test_weak_password_with_detail_suffix() {
        let err = account_outcome(
            400,
            r#"{"error":{"message":"WEAK_PASSWORD : Password should be at least 6 characters"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword));
    }

    #[test]
    fn test_unrecognized_error_is_api_error() {
        let err = account_outcome(500, "backend down").unwrap_err();
        assert!(matches!(err, AuthError::Api { status: 500, .. }));
    }
}
