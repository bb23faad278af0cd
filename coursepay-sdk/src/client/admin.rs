//! Admin API client (operator tooling → Coursepay server).

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::ADMIN_SECRET_HEADER;
use crate::objects::admin::{
    AdminPaymentActionResponse, ListOrphansResponse, ListPaymentsQuery, ListPaymentsResponse,
};

/// Typed HTTP client for the operator-facing Coursepay API.
///
/// Every request carries the admin secret in the `x-admin-secret` header;
/// the server verifies it against the argon2 hash in its config.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    secret: String,
}

impl AdminClient {
    pub fn new(base_url: Url, secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            secret: secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /admin/payments` – list ledger entries. Filter with
    /// `status=pending` for the reconciliation-needed view.
    pub async fn list_payments(
        &self,
        query: &ListPaymentsQuery,
    ) -> Result<ListPaymentsResponse, ClientError> {
        let url = self.base_url.join("/admin/payments")?;

        let mut params: Vec<(&str, String)> = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(status) = query.status {
            params.push(("status", status.to_string()));
        }
        if let Some(user_id) = query.user_id {
            params.push(("user_id", user_id.to_string()));
        }
        if let Some(course_id) = query.course_id {
            params.push(("course_id", course_id.to_string()));
        }

        let resp = self
            .http
            .get(url)
            .query(&params)
            .header(ADMIN_SECRET_HEADER, &self.secret)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /admin/payments/{reference}/reconcile` – re-drive gateway
    /// verification for a stuck reference.
    pub async fn reconcile_payment(
        &self,
        reference: &str,
    ) -> Result<AdminPaymentActionResponse, ClientError> {
        let url = self.base_url.join(&format!(
            "/admin/payments/{}/reconcile",
            urlencoding::encode(reference)
        ))?;
        let resp = self
            .http
            .post(url)
            .header(ADMIN_SECRET_HEADER, &self.secret)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /admin/payments/{reference}/refund` – mark a completed
    /// payment refunded and downgrade its enrollment.
    pub async fn refund_payment(
        &self,
        reference: &str,
    ) -> Result<AdminPaymentActionResponse, ClientError> {
        let url = self.base_url.join(&format!(
            "/admin/payments/{}/refund",
            urlencoding::encode(reference)
        ))?;
        let resp = self
            .http
            .post(url)
            .header(ADMIN_SECRET_HEADER, &self.secret)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /admin/orphans` – list unresolved gateway confirmations that
    /// matched no ledger entry.
    pub async fn list_orphans(&self) -> Result<ListOrphansResponse, ClientError> {
        let url = self.base_url.join("/admin/orphans")?;
        let resp = self
            .http
            .get(url)
            .header(ADMIN_SECRET_HEADER, &self.secret)
            .send()
            .await?;
        parse_response(resp).await
    }
}
