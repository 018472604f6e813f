//! # Wallet Service Seam
//!
//! Strategy trait over the external Wallet Service. The HTTP client in
//! `prov-wallet` is the production implementation; workflow tests substitute
//! call-counting mocks.
//!
//! No method retries on failure - retry policy belongs to callers that know
//! whether a call is safe to repeat (`invoice_status` is, `redeem_token` and
//! `top_up` are not).

use crate::credential::{BearerToken, Credential, RefundReceipt, WalletSnapshot};
use crate::error::ProvisionResult;
use crate::invoice::{Invoice, InvoiceRequest, InvoiceStatus};
use async_trait::async_trait;
use std::sync::Arc;

/// Typed operations of the Wallet Service balance/invoice API
#[async_trait]
pub trait WalletApi: Send + Sync {
    /// Request a new Lightning invoice.
    ///
    /// With purpose `create` the paid invoice mints a fresh credential;
    /// with purpose `topup` it credits `request.credential`.
    async fn create_invoice(&self, request: &InvoiceRequest) -> ProvisionResult<Invoice>;

    /// Query the current status of a previously issued invoice.
    /// Safe to repeat; the invoice poller calls this on every tick.
    async fn invoice_status(&self, invoice_id: &str) -> ProvisionResult<InvoiceStatus>;

    /// Look up an invoice by its BOLT11 payment request.
    ///
    /// A single query, not a poll - used to recover a credential from an
    /// invoice that was paid after the poll budget ran out.
    async fn recover_invoice(&self, payment_request: &str) -> ProvisionResult<InvoiceStatus>;

    /// Redeem a bearer token for a fresh credential and its opening balance.
    /// Single-use: the Wallet Service rejects an already-spent token.
    async fn redeem_token(&self, token: &BearerToken) -> ProvisionResult<WalletSnapshot>;

    /// Fetch the authoritative balance snapshot for a credential.
    async fn wallet_info(&self, credential: &Credential) -> ProvisionResult<WalletSnapshot>;

    /// Credit a token onto an existing credential.
    ///
    /// Returns the credited amount in millisatoshis. The value is
    /// informational; callers re-fetch `wallet_info` for the real balance.
    async fn top_up(&self, credential: &Credential, token: &BearerToken) -> ProvisionResult<u64>;

    /// Burn the credential, returning the residual balance as a receipt.
    /// Destructive and terminal; the credential is unusable afterwards.
    async fn refund(&self, credential: &Credential) -> ProvisionResult<RefundReceipt>;
}

/// Type alias for a shared wallet API handle (dynamic dispatch)
pub type BoxedWalletApi = Arc<dyn WalletApi>;
