//! # Wallet Service Client
//!
//! Typed request/response mapping to the Wallet Service HTTP+JSON API.
//!
//! Every call is a single round trip. Non-2xx responses surface the response
//! body verbatim as the error message; no server error is reinterpreted
//! client-side, and nothing here retries. Retry policy belongs to callers
//! that know whether a call is safe to repeat.

use crate::config::WalletConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prov_core::{
    BearerToken, Credential, Invoice, InvoiceRequest, InvoiceState, InvoiceStatus,
    ProvisionError, ProvisionResult, RefundReceipt, WalletApi, WalletSnapshot, MSATS_PER_SAT,
};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, instrument};

/// HTTP client for the Wallet Service balance/invoice API
pub struct WalletClient {
    config: WalletConfig,
    client: Client,
}

impl WalletClient {
    /// Create a new client for the configured Wallet Service
    pub fn new(config: WalletConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> ProvisionResult<Self> {
        let config = WalletConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Read the response body, mapping a failed status to `Remote` with the
    /// body text unchanged.
    async fn expect_success(response: Response) -> ProvisionResult<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!("Wallet service error: status={}, body={}", status, body);
            return Err(remote_error(status, body));
        }

        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: Option<&Credential>,
    ) -> ProvisionResult<T> {
        let mut request = self.client.get(self.config.url(path));
        if let Some(credential) = credential {
            request = request.bearer_auth(credential.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;
        let body = Self::expect_success(response).await?;
        decode(&body)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        credential: Option<&Credential>,
        body: Option<&B>,
    ) -> ProvisionResult<T> {
        let mut request = self.client.post(self.config.url(path));
        if let Some(credential) = credential {
            request = request.bearer_auth(credential.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;
        let body = Self::expect_success(response).await?;
        decode(&body)
    }
}

#[async_trait]
impl WalletApi for WalletClient {
    #[instrument(skip(self, request), fields(amount_sats = request.amount_sats, purpose = request.purpose.as_str()))]
    async fn create_invoice(&self, request: &InvoiceRequest) -> ProvisionResult<Invoice> {
        let body = CreateInvoiceBody {
            amount_sats: request.amount_sats,
            purpose: request.purpose.as_str(),
            api_key: request.credential.as_ref().map(Credential::as_str),
        };

        let wire: InvoiceWire = self
            .post_json("/v1/balance/lightning/invoice", None, Some(&body))
            .await?;

        debug!(invoice_id = %wire.invoice_id, "Invoice issued");

        Ok(Invoice {
            invoice_id: wire.invoice_id,
            payment_request: wire.bolt11,
            amount_sats: wire.amount_sats,
            expires_at: wire.expires_at,
            payment_hash: wire.payment_hash,
        })
    }

    #[instrument(skip(self))]
    async fn invoice_status(&self, invoice_id: &str) -> ProvisionResult<InvoiceStatus> {
        let path = format!("/v1/balance/lightning/invoice/{}/status", invoice_id);
        let wire: InvoiceStatusWire = self.get_json(&path, None).await?;
        Ok(wire.into_status())
    }

    #[instrument(skip(self, payment_request))]
    async fn recover_invoice(&self, payment_request: &str) -> ProvisionResult<InvoiceStatus> {
        let body = RecoverBody {
            bolt11: payment_request,
        };
        let wire: InvoiceStatusWire = self
            .post_json("/v1/balance/lightning/recover", None, Some(&body))
            .await?;
        Ok(wire.into_status())
    }

    #[instrument(skip(self, token))]
    async fn redeem_token(&self, token: &BearerToken) -> ProvisionResult<WalletSnapshot> {
        // Redemption is single-use on the server; this call is never retried.
        let response = self
            .client
            .get(self.config.url("/v1/balance/create"))
            .query(&[("initial_balance_token", token.as_str())])
            .send()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;

        let body = Self::expect_success(response).await?;
        let wire: CreateBalanceWire = decode(&body)?;

        let credential = Credential::parse(&wire.api_key).map_err(|_| {
            ProvisionError::Transport("wallet response carried a blank api_key".to_string())
        })?;

        debug!(credential = %credential, balance_msats = wire.balance, "Token redeemed");

        Ok(WalletSnapshot::new(credential, wire.balance, 0))
    }

    #[instrument(skip(self, credential), fields(credential = %credential))]
    async fn wallet_info(&self, credential: &Credential) -> ProvisionResult<WalletSnapshot> {
        let wire: BalanceInfoWire = self.get_json("/v1/balance/info", Some(credential)).await?;

        Ok(WalletSnapshot::new(
            credential.clone(),
            wire.balance,
            wire.reserved.unwrap_or(0),
        ))
    }

    #[instrument(skip(self, credential, token), fields(credential = %credential))]
    async fn top_up(&self, credential: &Credential, token: &BearerToken) -> ProvisionResult<u64> {
        let body = TopUpBody {
            cashu_token: token.as_str(),
        };
        let wire: TopUpWire = self
            .post_json("/v1/balance/topup", Some(credential), Some(&body))
            .await?;

        debug!(credited_msats = wire.msats, "Top-up accepted");

        Ok(wire.msats)
    }

    #[instrument(skip(self, credential), fields(credential = %credential))]
    async fn refund(&self, credential: &Credential) -> ProvisionResult<RefundReceipt> {
        let wire: RefundWire = self
            .post_json::<(), _>("/v1/balance/refund", Some(credential), None)
            .await?;

        let amount_msats = wire
            .msats
            .or_else(|| wire.sats.map(|sats| sats * MSATS_PER_SAT))
            .unwrap_or(0);

        Ok(RefundReceipt {
            token: wire.token.and_then(|t| BearerToken::parse(t).ok()),
            recipient: wire.recipient,
            amount_msats,
        })
    }
}

fn remote_error(status: StatusCode, body: String) -> ProvisionError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body
    };
    ProvisionError::Remote {
        status: status.as_u16(),
        message,
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> ProvisionResult<T> {
    serde_json::from_str(body)
        .map_err(|e| ProvisionError::Transport(format!("Failed to parse wallet response: {}", e)))
}

// =============================================================================
// Wallet Service Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct CreateInvoiceBody<'a> {
    amount_sats: u64,
    purpose: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RecoverBody<'a> {
    bolt11: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvoiceWire {
    invoice_id: String,
    bolt11: String,
    amount_sats: u64,
    expires_at: DateTime<Utc>,
    payment_hash: String,
}

#[derive(Debug, Deserialize)]
struct InvoiceStatusWire {
    status: InvoiceState,
    #[serde(default)]
    api_key: Option<String>,
    amount_sats: u64,
    #[serde(default)]
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl InvoiceStatusWire {
    fn into_status(self) -> InvoiceStatus {
        InvoiceStatus {
            state: self.status,
            credential: self.api_key.and_then(|key| Credential::parse(key).ok()),
            amount_sats: self.amount_sats,
            created_at: self.created_at,
            expires_at: self.expires_at,
            paid_at: self.paid_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateBalanceWire {
    api_key: String,
    balance: u64,
}

#[derive(Debug, Deserialize)]
struct BalanceInfoWire {
    balance: u64,
    #[serde(default)]
    reserved: Option<u64>,
}

#[derive(Debug, Serialize)]
struct TopUpBody<'a> {
    cashu_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TopUpWire {
    msats: u64,
}

#[derive(Debug, Deserialize)]
struct RefundWire {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    recipient: Option<String>,
    #[serde(default)]
    sats: Option<u64>,
    #[serde(default)]
    msats: Option<u64>,
}
