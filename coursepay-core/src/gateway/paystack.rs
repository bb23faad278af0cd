//! Paystack implementation of [`PaymentGateway`].
//!
//! Thin adapter over the REST API: `POST /transaction/initialize`,
//! `GET /transaction/verify/{reference}`, plus webhook signature
//! verification and event parsing. Amounts are in kobo (minor units).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::signature;
use super::{
    GatewayAuthorization, GatewayConfirmation, GatewayError, GatewayTxStatus,
    InitializeTransaction, PaymentGateway, WebhookEvent,
};
use crate::config::GatewayConfig;

/// Production API root; overridable through config for tests and mocks.
pub const LIVE_BASE_URL: &str = "https://api.paystack.co";

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

pub struct PaystackClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl PaystackClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn read_envelope(
        resp: reqwest::Response,
        reference: Option<&str>,
    ) -> Result<serde_json::Value, GatewayError> {
        let status = resp.status();
        let body = resp.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound {
                reference: reference.unwrap_or_default().to_string(),
            });
        }
        if !status.is_success() {
            let message = serde_json::from_str::<Envelope>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(GatewayError::Api { message });
        }

        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        if !envelope.status {
            return Err(GatewayError::Api {
                message: envelope.message,
            });
        }
        envelope
            .data
            .ok_or_else(|| GatewayError::Malformed("response envelope has no data".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<GatewayAuthorization, GatewayError> {
        let url = format!("{}/transaction/initialize", self.base_url);
        let body = InitializeBody {
            email: &request.email,
            amount: request.amount_minor_units,
            reference: &request.reference,
            callback_url: &request.callback_url,
            currency: &request.currency,
            metadata: &request.metadata,
        };
        tracing::debug!(reference = %request.reference, amount = request.amount_minor_units, "initializing gateway transaction");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await?;
        let data = Self::read_envelope(resp, Some(&request.reference)).await?;

        let init: InitializeData = serde_json::from_value(data)
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        Ok(GatewayAuthorization {
            authorization_url: init.authorization_url,
            access_code: init.access_code,
            reference: init.reference,
        })
    }

    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<GatewayConfirmation, GatewayError> {
        let url = format!(
            "{}/transaction/verify/{}",
            self.base_url,
            urlencoding::encode(reference)
        );
        tracing::debug!(reference = %reference, "verifying gateway transaction");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        let raw = Self::read_envelope(resp, Some(reference)).await?;
        confirmation_from_charge(raw)
    }

    fn verify_webhook_signature(&self, raw_body: &[u8], signature_header: Option<&str>) -> bool {
        signature::verify(self.secret_key.as_bytes(), raw_body, signature_header).is_ok()
    }

    fn parse_webhook_event(&self, raw_body: &[u8]) -> Result<WebhookEvent, GatewayError> {
        parse_webhook_event(raw_body)
    }
}

/// Parse a webhook body into a neutral event. Charge events carry a
/// confirmation; anything else is acknowledged without action.
pub fn parse_webhook_event(raw_body: &[u8]) -> Result<WebhookEvent, GatewayError> {
    let body: WebhookBody = serde_json::from_slice(raw_body)
        .map_err(|e| GatewayError::Malformed(e.to_string()))?;

    let confirmation = if body.event.starts_with("charge.") {
        Some(confirmation_from_charge(body.data)?)
    } else {
        None
    };
    Ok(WebhookEvent {
        event_type: body.event,
        confirmation,
    })
}

fn confirmation_from_charge(raw: serde_json::Value) -> Result<GatewayConfirmation, GatewayError> {
    let charge: ChargeData = serde_json::from_value(raw.clone())
        .map_err(|e| GatewayError::Malformed(e.to_string()))?;
    Ok(GatewayConfirmation {
        reference: charge.reference,
        status: GatewayTxStatus::from_wire(&charge.status),
        amount_minor_units: charge.amount,
        currency: charge.currency,
        channel: charge.channel,
        paid_at: parse_paid_at(charge.paid_at.as_deref()),
        metadata: charge.metadata,
        raw,
    })
}

fn parse_paid_at(paid_at: Option<&str>) -> Option<time::OffsetDateTime> {
    let raw = paid_at?;
    time::OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339).ok()
}

/// Response envelope shared by every Paystack endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    callback_url: &'a str,
    currency: &'a str,
    metadata: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct ChargeData {
    reference: String,
    status: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    paid_at: Option<String>,
    /// Can be an object, `null`, or an empty string depending on how the
    /// transaction was created.
    #[serde(default)]
    metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WebhookBody {
    event: String,
    data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_success_webhook_parses() {
        let body = br#"{
            "event": "charge.success",
            "data": {
                "reference": "TXN-1700000000000-AB12CD",
                "status": "success",
                "amount": 400000,
                "currency": "NGN",
                "channel": "card",
                "paid_at": "2023-02-15T15:30:00.000Z",
                "metadata": {"course_id": "f2b9a2a1-9f76-4f2e-bd55-fb9ebabb60a7"}
            }
        }"#;
        let event = parse_webhook_event(body).unwrap();
        assert_eq!(event.event_type, "charge.success");
        let confirmation = event.confirmation.unwrap();
        assert_eq!(confirmation.reference, "TXN-1700000000000-AB12CD");
        assert!(confirmation.status.is_success());
        assert_eq!(confirmation.amount_minor_units, 400_000);
        assert_eq!(confirmation.channel.as_deref(), Some("card"));
        assert!(confirmation.paid_at.is_some());
        assert_eq!(
            confirmation.metadata["course_id"],
            "f2b9a2a1-9f76-4f2e-bd55-fb9ebabb60a7"
        );
    }

    #[test]
    fn charge_failed_webhook_is_settled_failure() {
        let body = br#"{
            "event": "charge.failed",
            "data": {
                "reference": "TXN-1700000000000-AB12CD",
                "status": "failed",
                "amount": 400000,
                "currency": "NGN",
                "metadata": ""
            }
        }"#;
        let event = parse_webhook_event(body).unwrap();
        let confirmation = event.confirmation.unwrap();
        assert_eq!(confirmation.status, GatewayTxStatus::Failed);
        assert!(confirmation.status.is_settled());
        assert!(confirmation.paid_at.is_none());
    }

    #[test]
    fn non_charge_events_carry_no_confirmation() {
        let body = br#"{"event": "transfer.success", "data": {"whatever": true}}"#;
        let event = parse_webhook_event(body).unwrap();
        assert_eq!(event.event_type, "transfer.success");
        assert!(event.confirmation.is_none());
    }

    #[test]
    fn unparseable_body_is_malformed() {
        assert!(matches!(
            parse_webhook_event(b"not json"),
            Err(GatewayError::Malformed(_))
        ));
    }

    #[test]
    fn initialize_envelope_deserializes() {
        let body = r#"{
            "status": true,
            "message": "Authorization URL created",
            "data": {
                "authorization_url": "https://checkout.paystack.com/abc123",
                "access_code": "abc123",
                "reference": "TXN-1700000000000-AB12CD"
            }
        }"#;
        let envelope: Envelope = serde_json::from_str(body).unwrap();
        assert!(envelope.status);
        let init: InitializeData = serde_json::from_value(envelope.data.unwrap()).unwrap();
        assert_eq!(init.access_code, "abc123");
        assert!(init.authorization_url.starts_with("https://checkout.paystack.com/"));
    }
}
