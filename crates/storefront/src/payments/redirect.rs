//! GCash redirect payment client.
//!
//! The buyer-approval flow: `create_checkout` registers the amount and
//! shipping details with the provider and returns an approval URL plus an
//! opaque handle; the buyer approves off-site; `capture` exchanges the handle
//! for a transaction reference. A decline or error at capture aborts the
//! checkout with the cart left untouched, and abandoning the approval step
//! has no effect at all.

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use wavecrest_core::CURRENCY_CODE;

use super::PaymentError;
use crate::checkout::form::CheckoutForm;
use crate::config::GcashConfig;

/// Client for the GCash checkout API.
#[derive(Clone)]
pub struct GcashClient {
    client: reqwest::Client,
    endpoint: String,
    client_id: String,
    client_secret: String,
}

/// A provider checkout awaiting buyer approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectCheckout {
    /// Opaque provider handle, needed to capture after approval.
    pub handle: String,
    /// Where to send the buyer to approve the payment.
    pub approval_url: String,
}

/// A captured (approved) redirect payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPayment {
    pub transaction_id: String,
}

#[derive(Debug, Serialize)]
struct CreateCheckoutRequest<'a> {
    amount: Decimal,
    currency: &'static str,
    shipping: ShippingAddress<'a>,
}

#[derive(Debug, Serialize)]
struct ShippingAddress<'a> {
    name: String,
    address: &'a str,
    city: &'a str,
    zip: &'a str,
    phone: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateCheckoutResponse {
    id: String,
    redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    transaction_id: String,
    #[serde(default)]
    reason: Option<String>,
}

impl GcashClient {
    /// Create a new GCash client.
    #[must_use]
    pub fn new(config: &GcashConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.expose_secret().to_owned(),
        }
    }

    /// Register a checkout with the provider for the given amount (the cart
    /// subtotal) and shipping details. The currency is fixed.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError`] when the provider rejects the request or the
    /// response cannot be decoded.
    #[instrument(skip(self, shipping))]
    pub async fn create_checkout(
        &self,
        amount: Decimal,
        shipping: &CheckoutForm,
    ) -> Result<RedirectCheckout, PaymentError> {
        let body = CreateCheckoutRequest {
            amount,
            currency: CURRENCY_CODE,
            shipping: ShippingAddress {
                name: shipping.full_name(),
                address: &shipping.address,
                city: &shipping.city,
                zip: &shipping.zip,
                phone: &shipping.phone,
            },
        };

        let response = self
            .client
            .post(format!("{}/checkouts", self.endpoint))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        create_outcome(status, &text)
    }

    /// Capture a buyer-approved checkout, exchanging the handle for a
    /// transaction reference.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Declined`] when the provider reports a decline
    /// and [`PaymentError::Api`]/[`PaymentError::Parse`] for other failures.
    #[instrument(skip(self))]
    pub async fn capture(&self, handle: &str) -> Result<CapturedPayment, PaymentError> {
        let response = self
            .client
            .post(format!("{}/checkouts/{handle}/capture", self.endpoint))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        capture_outcome(status, &text)
    }
}

fn create_outcome(status: u16, body: &str) -> Result<RedirectCheckout, PaymentError> {
    if !(200..300).contains(&status) {
        return Err(PaymentError::Api {
            status,
            message: body.chars().take(200).collect(),
        });
    }

    let parsed: CreateCheckoutResponse =
        serde_json::from_str(body).map_err(|e| PaymentError::Parse(e.to_string()))?;

    Ok(RedirectCheckout {
        handle: parsed.id,
        approval_url: parsed.redirect_url,
    })
}

fn capture_outcome(status: u16, body: &str) -> Result<CapturedPayment, PaymentError> {
    // Declines come back as a 402 or as a 200 with a "declined" status.
    let parsed: Result<CaptureResponse, _> = serde_json::from_str(body);

    if status == 402 {
        let reason = parsed
            .ok()
            .and_then(|r| r.reason)
            .unwrap_or_else(|| "payment was declined".to_owned());
        return Err(PaymentError::Declined(reason));
    }

    if !(200..300).contains(&status) {
        return Err(PaymentError::Api {
            status,
            message: body.chars().take(200).collect(),
        });
    }

    let parsed = parsed.map_err(|e| PaymentError::Parse(e.to_string()))?;

    if parsed.status == "declined" {
        return Err(PaymentError::Declined(
            parsed
                .reason
                .unwrap_or_else(|| "payment was declined".to_owned()),
        ));
    }

    if parsed.transaction_id.is_empty() {
        return Err(PaymentError::Parse(
            "capture response missing transaction_id".to_owned(),
        ));
    }

    Ok(CapturedPayment {
        transaction_id: parsed.transaction_id,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_outcome_success() {
        let checkout = create_outcome(
            201,
            r#"{"id":"co_123","redirect_url":"https://pay.example/approve/co_123"}"#,
        )
        .unwrap();
        assert_eq!(checkout.handle, "co_123");
        assert_eq!(checkout.approval_url, "https://pay.example/approve/co_123");
    }

    #[test]
    fn test_create_outcome_provider_error() {
        let err = create_outcome(422, r#"{"error":"amount too small"}"#).unwrap_err();
        assert!(matches!(err, PaymentError::Api { status: 422, .. }));
    }

    #[test]
    fn test_capture_outcome_approved() {
        let captured =
            capture_outcome(200, r#"{"status":"captured","transaction_id":"txn_9"}"#).unwrap();
        assert_eq!(captured.transaction_id, "txn_9");
    }

    #[test]
    fn test_capture_outcome_declined_status_code() {
        let err = capture_outcome(402, r#"{"reason":"insufficient funds"}"#).unwrap_err();
        match err {
            PaymentError::Declined(reason) => assert_eq!(reason, "insufficient funds"),
            other => panic!("expected decline, got {other:?}"),
        }
    }

    #[test]
    fn test_capture_outcome_declined_in_body() {
        let err = capture_outcome(200, r#"{"status":"declined","reason":"expired"}"#).unwrap_err();
        assert!(matches!(err, PaymentError::Declined(_)));
    }

    #[test]
    fn test_capture_outcome_missing_transaction_id() {
        let err = capture_outcome(200, r#"{"status":"captured"}"#).unwrap_err();
        assert!(matches!(err, PaymentError::Parse(_)));
    }
}
