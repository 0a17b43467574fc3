//! Signed upload parameters.
//!
//! Direct client-style uploads authenticate with a short-lived token/expire
//! pair signed with the private key (HMAC-SHA1, hex). Parameters normally
//! come from a trusted server endpoint so the private key stays out of the
//! calling environment; when no endpoint is configured they can be generated
//! locally from signable secrets.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use uuid::Uuid;

use vidkit_core::{PluginError, PluginResult};

type HmacSha1 = Hmac<Sha1>;

/// Token lifetime for locally generated parameters.
const TOKEN_TTL_SECS: i64 = 3600;

/// Short-lived upload signature parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthParams {
    pub token: String,
    pub expire: i64,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl AuthParams {
    /// Present, unexpired, and signed.
    pub fn is_usable(&self) -> bool {
        !self.token.is_empty() && !self.signature.is_empty() && self.expire > Utc::now().timestamp()
    }
}

/// Generate signed upload parameters locally from the private key.
///
/// Signature is HMAC-SHA1 over `token + expire`, hex-encoded, matching what
/// the vendor's own SDKs produce.
pub fn generate_auth_params(public_key: &str, private_key: &str) -> AuthParams {
    let token = Uuid::new_v4().to_string();
    let expire = Utc::now().timestamp() + TOKEN_TTL_SECS;
    let signature = sign(&token, expire, private_key);

    AuthParams {
        token,
        expire,
        signature,
        public_key: Some(public_key.to_string()),
    }
}

/// Compute the upload signature for a token/expire pair.
pub fn sign(token: &str, expire: i64, private_key: &str) -> String {
    // HMAC accepts keys of any length; new_from_slice cannot fail here.
    let mut mac = HmacSha1::new_from_slice(private_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{}{}", token, expire).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Request signed upload parameters from the trusted auth endpoint.
#[tracing::instrument(skip(http))]
pub async fn fetch_auth_params(http: &reqwest::Client, endpoint: &str) -> PluginResult<AuthParams> {
    let response = http
        .get(endpoint)
        .header("Content-Type", "application/json")
        .send()
        .await
        .map_err(|err| PluginError::UploadFailed(format!("Auth endpoint request: {}", err)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PluginError::UploadFailed(format!(
            "Failed to fetch authentication parameters: {}",
            status
        )));
    }

    let params: AuthParams = response
        .json()
        .await
        .map_err(|err| PluginError::UploadFailed(format!("Malformed auth response: {}", err)))?;

    if !params.is_usable() {
        return Err(PluginError::UploadFailed(
            "Invalid authentication parameters received from server".to_string(),
        ));
    }

    Ok(params)
}
