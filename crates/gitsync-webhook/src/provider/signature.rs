//! Shared-secret checks used by the providers.
//!
//! Every comparison against the secret runs in constant time.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{HookError, HookResult};

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

/// Verifies a hex HMAC-SHA256 digest of `body`.
pub(crate) fn verify_sha256(secret: &str, body: &[u8], signature: &str) -> HookResult<()> {
    verify_mac::<HmacSha256>(secret, body, signature)
}

/// Verifies a `sha256=<hex>` or legacy `sha1=<hex>` signature header value.
pub(crate) fn verify_prefixed(secret: &str, body: &[u8], header: &str) -> HookResult<()> {
    if let Some(signature) = header.strip_prefix("sha256=") {
        verify_mac::<HmacSha256>(secret, body, signature)
    } else if let Some(signature) = header.strip_prefix("sha1=") {
        verify_mac::<HmacSha1>(secret, body, signature)
    } else {
        Err(HookError::InvalidSignature)
    }
}

/// Checks a plain token header against the secret.
pub(crate) fn verify_token(secret: &str, token: &str) -> HookResult<()> {
    if bool::from(token.as_bytes().ct_eq(secret.as_bytes())) {
        Ok(())
    } else {
        Err(HookError::InvalidToken)
    }
}

fn verify_mac<M: Mac + KeyInit>(secret: &str, body: &[u8], signature: &str) -> HookResult<()> {
    let expected = hex::decode(signature.trim()).map_err(|_| HookError::InvalidSignature)?;
    let mut mac =
        <M as KeyInit>::new_from_slice(secret.as_bytes()).map_err(|_| HookError::InvalidSignature)?;
    Mac::update(&mut mac, body);
    mac.verify_slice(&expected)
        .map_err(|_| HookError::InvalidSignature)
}

/// Hex HMAC-SHA256 of `body`, as a sender would compute it.
#[cfg(test)]
pub(crate) fn sign_sha256(secret: &str, body: &[u8]) -> String {
    let mut mac = <HmacSha256 as KeyInit>::new_from_slice(secret.as_bytes()).unwrap();
    Mac::update(&mut mac, body);
    hex::encode(mac.finalize().into_bytes())
}
