//! Daraja STK push client.
//!
//! Implements the two-call dance the Daraja API requires: fetch an OAuth
//! bearer token with the consumer credentials, then POST the password-
//! signed STK push. Both calls run under the configured request timeout;
//! a hung gateway surfaces as a retryable network error, never a stuck
//! checkout.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MpesaConfig;
use crate::ports::{GatewayError, PaymentGateway, PaymentRequest, StkPushAck};

/// Response code Daraja uses for an accepted push.
const RESPONSE_CODE_ACCEPTED: &str = "0";

/// STK push client against the Daraja REST API.
pub struct DarajaGateway {
    http: reqwest::Client,
    config: MpesaConfig,
}

impl DarajaGateway {
    /// Builds a gateway with a bounded-timeout HTTP client.
    pub fn new(config: MpesaConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GatewayError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    /// Fetches an OAuth access token with the consumer credentials.
    async fn access_token(&self) -> Result<String, GatewayError> {
        let response = self
            .http
            .get(&self.config.token_url)
            .basic_auth(
                &self.config.consumer_key,
                Some(self.config.consumer_secret.expose_secret()),
            )
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(GatewayError::authentication(format!(
                "token request returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::invalid_response(format!("bad token body: {}", e)))?;
        Ok(token.access_token)
    }

    /// Daraja password: `base64(shortcode + passkey + timestamp)`.
    fn password(&self, timestamp: &str) -> String {
        let material = format!(
            "{}{}{}",
            self.config.shortcode,
            self.config.passkey.expose_secret(),
            timestamp
        );
        BASE64.encode(material)
    }
}

#[async_trait]
impl PaymentGateway for DarajaGateway {
    async fn request_stk_push(&self, request: PaymentRequest) -> Result<StkPushAck, GatewayError> {
        let amount = request
            .amount
            .whole_units()
            .filter(|a| *a > 0)
            .ok_or_else(|| {
                GatewayError::rejected(format!("amount {} not chargeable", request.amount))
            })?;

        let token = self.access_token().await?;
        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();

        let payload = StkPushRequest {
            business_short_code: self.config.shortcode.clone(),
            password: self.password(&timestamp),
            timestamp,
            transaction_type: "CustomerPayBillOnline".to_string(),
            amount,
            party_a: request.phone.as_str().to_string(),
            party_b: self.config.shortcode.clone(),
            phone_number: request.phone.as_str().to_string(),
            call_back_url: self.config.callback_url.clone(),
            account_reference: request.account_reference,
            transaction_desc: request.description,
        };

        debug!(phone = %request.phone, amount, "sending STK push");

        let response = self
            .http
            .post(&self.config.stk_push_url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(request_error)?;

        let body: StkPushResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::invalid_response(format!("bad push body: {}", e)))?;

        match (body.response_code.as_deref(), body.checkout_request_id) {
            (Some(RESPONSE_CODE_ACCEPTED), Some(checkout_request_id)) => Ok(StkPushAck {
                checkout_request_id,
                merchant_request_id: body.merchant_request_id,
                customer_message: body.customer_message,
            }),
            _ => Err(GatewayError::rejected(
                body.error_message
                    .or(body.response_description)
                    .unwrap_or_else(|| "STK push rejected".to_string()),
            )),
        }
    }
}

fn request_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::network(format!("gateway timed out: {}", err))
    } else {
        GatewayError::network(format!("gateway unreachable: {}", err))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct StkPushRequest {
    #[serde(rename = "BusinessShortCode")]
    business_short_code: String,
    #[serde(rename = "Password")]
    password: String,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "TransactionType")]
    transaction_type: String,
    #[serde(rename = "Amount")]
    amount: u64,
    #[serde(rename = "PartyA")]
    party_a: String,
    #[serde(rename = "PartyB")]
    party_b: String,
    #[serde(rename = "PhoneNumber")]
    phone_number: String,
    #[serde(rename = "CallBackURL")]
    call_back_url: String,
    #[serde(rename = "AccountReference")]
    account_reference: String,
    #[serde(rename = "TransactionDesc")]
    transaction_desc: String,
}

#[derive(Debug, Deserialize)]
struct StkPushResponse {
    #[serde(rename = "ResponseCode", default)]
    response_code: Option<String>,
    #[serde(rename = "ResponseDescription", default)]
    response_description: Option<String>,
    #[serde(rename = "CheckoutRequestID", default)]
    checkout_request_id: Option<String>,
    #[serde(rename = "MerchantRequestID", default)]
    merchant_request_id: Option<String>,
    #[serde(rename = "CustomerMessage", default)]
    customer_message: Option<String>,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}
