//! Learner API client (frontend/backend-for-frontend → Coursepay server).
//!
//! All requests carry the learner's session token as a bearer
//! `Authorization` header; the server resolves it to a user through its
//! session store.

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::checkout::{
    InitializePaymentRequest, InitializePaymentResponse, VerifyPaymentRequest,
    VerifyPaymentResponse,
};
use crate::objects::coupon::{CouponValidationRequest, CouponValidationResponse};
use crate::objects::enrollment::{
    EnrollFreeRequest, EnrollmentListResponse, EnrollmentSummary, PurchaseListResponse,
};

/// Typed HTTP client for the learner-facing Coursepay API.
#[derive(Debug, Clone)]
pub struct UserClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl UserClient {
    /// Create a new `UserClient`.
    ///
    /// * `base_url` – root URL of the Coursepay server.
    /// * `token` – the learner's session token.
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /payments/initialize` – start a paid checkout and obtain the
    /// gateway authorization URL.
    pub async fn initialize_payment(
        &self,
        req: InitializePaymentRequest,
    ) -> Result<InitializePaymentResponse, ClientError> {
        let url = self.base_url.join("/payments/initialize")?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&req)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /payments/verify` – confirm a charge after the gateway
    /// redirect. Safe to call repeatedly; poll while the response is
    /// `pending`.
    pub async fn verify_payment(
        &self,
        reference: impl Into<compact_str::CompactString>,
    ) -> Result<VerifyPaymentResponse, ClientError> {
        let url = self.base_url.join("/payments/verify")?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&VerifyPaymentRequest {
                reference: reference.into(),
            })
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /payments/coupons/validate` – pre-check a discount code
    /// against a course.
    pub async fn validate_coupon(
        &self,
        req: CouponValidationRequest,
    ) -> Result<CouponValidationResponse, ClientError> {
        let url = self.base_url.join("/payments/coupons/validate")?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&req)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /enrollments` – enroll directly in a free course.
    pub async fn enroll_free(
        &self,
        req: EnrollFreeRequest,
    ) -> Result<EnrollmentSummary, ClientError> {
        let url = self.base_url.join("/enrollments")?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&req)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /enrollments` – list the caller's enrollments.
    pub async fn list_enrollments(&self) -> Result<EnrollmentListResponse, ClientError> {
        let url = self.base_url.join("/enrollments")?;
        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        parse_response(resp).await
    }

    /// `GET /purchases` – list the caller's completed purchases, newest
    /// first.
    pub async fn list_purchases(&self) -> Result<PurchaseListResponse, ClientError> {
        let url = self.base_url.join("/purchases")?;
        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        parse_response(resp).await
    }
}
