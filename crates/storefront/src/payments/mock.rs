//! Mock card payment client.
//!
//! The endpoint is explicitly a mock: it answers a POST with a pass/fail and
//! a generated payment ID, with no server-side verification behind it. A
//! `success: false` answer is a decline, not a transport error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use wavecrest_core::IdentityId;

use super::PaymentError;
use crate::config::MockPaymentConfig;

/// Client for the mock card payment endpoint.
#[derive(Clone)]
pub struct MockPaymentClient {
    client: reqwest::Client,
    endpoint: String,
}

/// Request body for a mock charge.
#[derive(Debug, Serialize)]
struct ChargeRequest<'a> {
    amount: Decimal,
    payment_method: &'a str,
    customer_ref: &'a str,
}

/// Response body from the mock endpoint.
#[derive(Debug, Deserialize)]
struct ChargeResponse {
    success: bool,
    #[serde(default)]
    payment_id: String,
}

/// A confirmed mock charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardConfirmation {
    pub payment_id: String,
}

impl MockPaymentClient {
    /// Create a new mock payment client.
    #[must_use]
    pub fn new(config: &MockPaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
        }
    }

    /// Charge the given amount against the mock endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Declined`] when the endpoint answers
    /// `success: false`, [`PaymentError::Api`] for non-success statuses, and
    /// [`PaymentError::Http`]/[`PaymentError::Parse`] for transport and
    /// decoding failures.
    #[instrument(skip(self))]
    pub async fn charge(
        &self,
        amount: Decimal,
        customer_ref: &IdentityId,
    ) -> Result<CardConfirmation, PaymentError> {
        let body = ChargeRequest {
            amount,
            payment_method: "Credit Card",
            customer_ref: customer_ref.as_str(),
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        charge_outcome(status, &text)
    }
}

/// Decode a mock-endpoint response into a confirmation or decline.
fn charge_outcome(status: u16, body: &str) -> Result<CardConfirmation, PaymentError> {
    if !(200..300).contains(&status) {
        return Err(PaymentError::Api {
            status,
            message: body.chars().take(200).collect(),
        });
    }

    let parsed: ChargeResponse =
        serde_json::from_str(body).map_err(|e| PaymentError::Parse(e.to_string()))?;

    if !parsed.success {
        return Err(PaymentError::Declined(
            "card payment was not approved".to_owned(),
        ));
    }

    Ok(CardConfirmation {
        payment_id: parsed.payment_id,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_charge() {
        let outcome = charge_outcome(
            200,
            r#"{"success":true,"payment_id":"pay_abc123","amount":"250.00","payment_method":"Credit Card"}"#,
        )
        .unwrap();
        assert_eq!(outcome.payment_id, "pay_abc123");
    }

    #[test]
    fn test_unsuccessful_charge_is_a_decline() {
        let err = charge_outcome(200, r#"{"success":false}"#).unwrap_err();
        assert!(matches!(err, PaymentError::Declined(_)));
    }

    #[test]
    fn test_error_status_is_api_error() {
        let err = charge_outcome(500, r#"{"error":"Payment processing failed"}"#).unwrap_err();
        assert!(matches!(err, PaymentError::Api { status: 500, .. }));
    }

    #[test]
    fn test_garbage_body_is_parse_error() {
        let err = charge_outcome(200, "not json").unwrap_err();
        assert!(matches!(err, PaymentError::Parse(_)));
    }
}
