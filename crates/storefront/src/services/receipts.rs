//! Order receipts over email and SMS.
//!
//! Receipts are strictly best-effort: they are dispatched after the order is
//! created, in background tasks, and a failed send is logged and forgotten.
//! An order without a receipt is still an order.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{info, warn};

use wavecrest_core::format_amount;

use crate::config::{EmailReceiptConfig, SmsReceiptConfig};
use crate::models::Order;

#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("receipt API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Sends order receipts. Either channel may be absent.
#[derive(Clone)]
pub struct ReceiptClient {
    client: reqwest::Client,
    email: Option<EmailReceiptConfig>,
    sms: Option<SmsReceiptConfig>,
}

#[derive(Debug, Serialize)]
struct EmailSendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: EmailTemplateParams<'a>,
}

#[derive(Debug, Serialize)]
struct EmailTemplateParams<'a> {
    to_email: &'a str,
    to_name: String,
    order_id: String,
    order_summary: String,
    order_total: String,
}

impl ReceiptClient {
    #[must_use]
    pub fn new(email: Option<EmailReceiptConfig>, sms: Option<SmsReceiptConfig>) -> Self {
        Self {
            client: reqwest::Client::new(),
            email,
            sms,
        }
    }

    /// Whether any receipt channel is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.email.is_some() || self.sms.is_some()
    }

    /// Dispatch receipts for an order in the background. Failures are logged
    /// and never surface to the checkout path.
    pub fn dispatch(&self, order: &Order, email_to: &str) {
        let client = self.clone();
        let order = order.clone();
        let email_to = email_to.to_owned();
        tokio::spawn(async move {
            if let Err(e) = client.send_email(&order, &email_to).await {
                warn!(order_id = %order.id, error = %e, "Failed to send email receipt");
            }
            if let Err(e) = client.send_sms(&order).await {
                warn!(order_id = %order.id, error = %e, "Failed to send SMS receipt");
            }
        });
    }

    async fn send_email(&self, order: &Order, to: &str) -> Result<(), ReceiptError> {
        let Some(config) = &self.email else {
            return Ok(());
        };

        let body = EmailSendRequest {
            service_id: &config.service_id,
            template_id: &config.template_id,
            user_id: &config.public_key,
            template_params: EmailTemplateParams {
                to_email: to,
                to_name: order.shipping.full_name(),
                order_id: order.id.to_string(),
                order_summary: order_summary(order),
                order_total: format_amount(order.total),
            },
        };

        let response = self
            .client
            .post(format!("{}/api/v1.0/email/send", config.endpoint))
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let text = response.text().await?;
            return Err(ReceiptError::Api {
                status,
                message: text.chars().take(200).collect(),
            });
        }

        info!(order_id = %order.id, "Email receipt sent");
        Ok(())
    }

    async fn send_sms(&self, order: &Order) -> Result<(), ReceiptError> {
        let Some(config) = &self.sms else {
            return Ok(());
        };

        let auth = BASE64.encode(format!(
            "{}:{}",
            config.account_sid,
            config.auth_token.expose_secret()
        ));
        let message = format!(
            "Your order {} is confirmed. Total: {}. Thank you for shopping with us!",
            order.id,
            format_amount(order.total)
        );

        let response = self
            .client
            .post(format!(
                "{}/2010-04-01/Accounts/{}/Messages.json",
                config.endpoint, config.account_sid
            ))
            .header("Authorization", format!("Basic {auth}"))
            .form(&[
                ("From", config.from_number.as_str()),
                ("To", order.shipping.phone.as_str()),
                ("Body", message.as_str()),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let text = response.text().await?;
            return Err(ReceiptError::Api {
                status,
                message: text.chars().take(200).collect(),
            });
        }

        info!(order_id = %order.id, "SMS receipt sent");
        Ok(())
    }
}

/// One line per item: `Title (xN) - ₱amount`.
fn order_summary(order: &Order) -> String {
    order
        .items
        .iter()
        .map(|item| {
            format!(
                "{} (x{}) - {}",
                item.title,
                item.quantity,
                format_amount(item.line_total())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use wavecrest_core::{IdentityId, OrderId, OrderStatus, PaymentMethod, ProductId};

    use crate::cart::LineItem;
    use crate::checkout::CheckoutForm;

    use super::*;

    #[test]
    fn test_order_summary_lines() {
        let order = Order {
            id: OrderId::generate(),
            owner: IdentityId::new("alice"),
            items: vec![
                LineItem {
                    product_id: ProductId::new("A"),
                    title: "Dried Mangoes".to_owned(),
                    image_ref: "/images/a.jpg".to_owned(),
                    unit_price: "150".parse().unwrap(),
                    quantity: 2,
                    description: String::new(),
                },
                LineItem {
                    product_id: ProductId::new("B"),
                    title: "Barako Coffee".to_owned(),
                    image_ref: "/images/b.jpg".to_owned(),
                    unit_price: "320.50".parse().unwrap(),
                    quantity: 1,
                    description: String::new(),
                },
            ],
            total: "620.50".parse().unwrap(),
            shipping: CheckoutForm::default(),
            payment_method: PaymentMethod::Card,
            payment_transaction_ref: None,
            status: OrderStatus::Processing,
            created_at: Utc::now(),
        };

        let summary = order_summary(&order);
        assert_eq!(
            summary,
            "Dried Mangoes (x2) - \u{20b1}300.00\nBarako Coffee (x1) - \u{20b1}320.50"
        );
    }

    #[test]
    fn test_unconfigured_client_reports_not_configured() {
        let client = ReceiptClient::new(None, None);
        assert!(!client.is_configured());
    }
}
