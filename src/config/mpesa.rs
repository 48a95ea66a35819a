//! M-Pesa Daraja gateway configuration.

use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use super::Environment;

/// Daraja API configuration.
///
/// Consumer secret and passkey are held behind `Secret` so they never leak
/// through Debug output or logs.
#[derive(Debug, Clone, Deserialize)]
pub struct MpesaConfig {
    /// Daraja consumer key.
    pub consumer_key: String,

    /// Daraja consumer secret.
    pub consumer_secret: Secret<String>,

    /// Business shortcode (paybill/till number).
    pub shortcode: String,

    /// Lipa na M-Pesa online passkey.
    pub passkey: Secret<String>,

    /// OAuth token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// STK push endpoint.
    #[serde(default = "default_stk_push_url")]
    pub stk_push_url: String,

    /// Publicly reachable URL the gateway posts callbacks to.
    pub callback_url: String,

    /// Bound on each outbound gateway request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_token_url() -> String {
    "https://sandbox.safaricom.co.ke/oauth/v1/generate?grant_type=client_credentials".to_string()
}

fn default_stk_push_url() -> String {
    "https://sandbox.safaricom.co.ke/mpesa/stkpush/v1/processrequest".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl MpesaConfig {
    /// The outbound request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// True when pointed at the Safaricom sandbox.
    pub fn is_sandbox(&self) -> bool {
        self.stk_push_url.contains("sandbox")
    }

    /// Validate gateway configuration.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.consumer_key.is_empty() {
            return Err(ValidationError::MissingRequired("DUKANI__MPESA__CONSUMER_KEY"));
        }
        if self.consumer_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired(
                "DUKANI__MPESA__CONSUMER_SECRET",
            ));
        }
        if self.shortcode.is_empty() {
            return Err(ValidationError::MissingRequired("DUKANI__MPESA__SHORTCODE"));
        }
        if self.passkey.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("DUKANI__MPESA__PASSKEY"));
        }
        if self.callback_url.is_empty() {
            return Err(ValidationError::MissingRequired(
                "DUKANI__MPESA__CALLBACK_URL",
            ));
        }
        // The gateway refuses plain-HTTP callback URLs; catch it at boot
        // instead of at first checkout.
        if environment.is_deployed() && !self.callback_url.starts_with("https://") {
            return Err(ValidationError::InsecureCallbackUrl);
        }
        Ok(())
    }
}
