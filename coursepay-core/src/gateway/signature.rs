//! Webhook signature verification.
//!
//! The gateway signs every webhook delivery with HMAC-SHA512 over the raw
//! request body, hex-encoded in the `x-paystack-signature` header. A
//! missing header or any mismatch is an authentication failure, not
//! merely "unverified".

use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,
    #[error("signature mismatch")]
    Mismatch,
}

/// Compute the hex-encoded HMAC-SHA512 signature for a payload.
pub fn sign(secret: &[u8], raw_body: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut mac = match HmacSha512::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(raw_body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a webhook body against its signature header.
///
/// The comparison is constant-time over the hex encoding. Casing and
/// length variants of a valid signature are rejected.
pub fn verify(
    secret: &[u8],
    raw_body: &[u8],
    signature_header: Option<&str>,
) -> Result<(), SignatureError> {
    let provided = signature_header.ok_or(SignatureError::Missing)?;
    let expected = sign(secret, raw_body);
    if expected.as_bytes().ct_eq(provided.as_bytes()).into() {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
