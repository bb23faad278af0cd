//! Payment gateway boundary.
//!
//! The rest of the crate only sees the [`PaymentGateway`] trait; the
//! concrete Paystack client lives in [`paystack`] and is injected at
//! startup so tests can substitute a deterministic fake.

pub mod paystack;
pub mod signature;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Fields sent to the gateway when initializing a transaction.
///
/// Amounts cross this boundary in the gateway's minor units.
#[derive(Debug, Clone)]
pub struct InitializeTransaction {
    pub email: String,
    pub amount_minor_units: i64,
    pub reference: String,
    pub callback_url: String,
    pub currency: String,
    pub metadata: serde_json::Value,
}

/// What the gateway hands back for a freshly initialized transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayAuthorization {
    /// Gateway-hosted payment page to redirect the buyer to.
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Charge status as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayTxStatus {
    Success,
    Failed,
    Abandoned,
    Reversed,
    Pending,
    Ongoing,
    Other(String),
}

impl GatewayTxStatus {
    pub fn from_wire(status: &str) -> Self {
        match status {
            "success" => GatewayTxStatus::Success,
            "failed" => GatewayTxStatus::Failed,
            "abandoned" => GatewayTxStatus::Abandoned,
            "reversed" => GatewayTxStatus::Reversed,
            "pending" => GatewayTxStatus::Pending,
            "ongoing" | "processing" | "queued" => GatewayTxStatus::Ongoing,
            other => GatewayTxStatus::Other(other.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GatewayTxStatus::Success)
    }

    /// Settled statuses are final on the gateway side. An unsettled status
    /// observed through the pull channel must never be treated as a
    /// failure; the charge may still resolve.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            GatewayTxStatus::Success
                | GatewayTxStatus::Failed
                | GatewayTxStatus::Abandoned
                | GatewayTxStatus::Reversed
        )
    }
}

impl std::fmt::Display for GatewayTxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayTxStatus::Success => f.write_str("success"),
            GatewayTxStatus::Failed => f.write_str("failed"),
            GatewayTxStatus::Abandoned => f.write_str("abandoned"),
            GatewayTxStatus::Reversed => f.write_str("reversed"),
            GatewayTxStatus::Pending => f.write_str("pending"),
            GatewayTxStatus::Ongoing => f.write_str("ongoing"),
            GatewayTxStatus::Other(s) => f.write_str(s),
        }
    }
}

/// One confirmation of a charge, from either channel.
#[derive(Debug, Clone)]
pub struct GatewayConfirmation {
    pub reference: String,
    pub status: GatewayTxStatus,
    pub amount_minor_units: i64,
    pub currency: String,
    /// Payment channel reported by the gateway (card, bank, ussd, …).
    pub channel: Option<String>,
    pub paid_at: Option<time::OffsetDateTime>,
    /// Gateway-side metadata. Advisory only; the ledger is the
    /// authoritative source of which course a reference belongs to.
    pub metadata: serde_json::Value,
    /// The confirmation payload verbatim, for audit.
    pub raw: serde_json::Value,
}

/// One parsed webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub event_type: String,
    /// Present for charge events; `None` for event types this system does
    /// not act on.
    pub confirmation: Option<GatewayConfirmation>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("gateway rejected the call: {message}")]
    Api { message: String },
    #[error("malformed gateway response: {0}")]
    Malformed(String),
    #[error("transaction not found on gateway: {reference}")]
    NotFound { reference: String },
}

/// External payment gateway operations, injected wherever a confirmation
/// is produced or consumed. Holds no state beyond connection plumbing.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register a transaction and obtain the redirect authorization.
    /// Callers must mark the local ledger entry failed when this errors.
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<GatewayAuthorization, GatewayError>;

    /// Pull-style confirmation, safe to call repeatedly; read-only on the
    /// gateway side.
    async fn verify_transaction(&self, reference: &str)
    -> Result<GatewayConfirmation, GatewayError>;

    /// Authenticate an inbound webhook body against its signature header.
    fn verify_webhook_signature(&self, raw_body: &[u8], signature_header: Option<&str>) -> bool;

    /// Parse a verified webhook body into a neutral event.
    fn parse_webhook_event(&self, raw_body: &[u8]) -> Result<WebhookEvent, GatewayError>;
}

/// Convert a major-unit amount to gateway minor units (×100).
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED).round().to_i64()
}

/// Convert gateway minor units back to a major-unit amount.
pub fn from_minor_units(amount_minor: i64) -> Decimal {
    Decimal::new(amount_minor, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_unit_conversion_round_trips() {
        assert_eq!(to_minor_units(Decimal::new(4000, 0)), Some(400_000));
        assert_eq!(to_minor_units(Decimal::new(4999, 2)), Some(4999));
        assert_eq!(from_minor_units(400_000), Decimal::new(4000, 0));
        assert_eq!(from_minor_units(4999), Decimal::new(4999, 2));
    }

    #[test]
    fn wire_statuses_map_to_settlement() {
        assert!(GatewayTxStatus::from_wire("success").is_success());
        assert!(GatewayTxStatus::from_wire("failed").is_settled());
        assert!(GatewayTxStatus::from_wire("abandoned").is_settled());
        assert!(!GatewayTxStatus::from_wire("pending").is_settled());
        assert!(!GatewayTxStatus::from_wire("processing").is_settled());
        let unknown = GatewayTxStatus::from_wire("weird");
        assert_eq!(unknown, GatewayTxStatus::Other("weird".to_string()));
        assert!(!unknown.is_settled());
    }
}
