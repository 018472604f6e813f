//! # Provisioning Orchestrator
//!
//! Composes the Wallet Service client, the invoice poller and the session
//! store into the user-facing workflows: create a credential (from an ecash
//! token or a paid invoice), top it up, resynchronize its balance, recover
//! it from an invoice paid after the poll gave up, and refund it.
//!
//! The session fields (active credential, last snapshot) are owned by
//! whichever flow completed last. Every operation is tagged with the
//! credential it was issued against; a result whose tag no longer matches
//! the session is returned to the caller but not installed.

use crate::poller::{await_invoice, InvoicePoll, PollOutcome, PollSchedule, Sleeper, TokioSleeper};
use prov_core::{
    BearerToken, BoxedSessionStore, BoxedWalletApi, Credential, Invoice, InvoiceRequest,
    InvoiceState, InvoiceStatus, ProvisionError, ProvisionResult, RefundReceipt, WalletSnapshot,
    CREDENTIAL_KEY,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Session-scoped provisioning state
#[derive(Debug, Clone, Default)]
pub struct ProvisionSession {
    /// The credential operations act on; `None` before creation and after
    /// refund
    pub credential: Option<Credential>,

    /// Last authoritative snapshot; replaced wholesale, never patched
    pub snapshot: Option<WalletSnapshot>,
}

/// Result of a completed top-up
#[derive(Debug, Clone)]
pub struct TopUp {
    /// Amount the service credited, in millisatoshis. Informational only;
    /// never added to a cached balance.
    pub credited_msats: u64,

    /// Post-top-up snapshot, fetched fresh from the service
    pub snapshot: WalletSnapshot,
}

/// Orchestrates the credential provisioning workflows.
///
/// Cheaply cloneable; clones share one session.
#[derive(Clone)]
pub struct Provisioner {
    wallet: BoxedWalletApi,
    store: BoxedSessionStore,
    sleeper: Arc<dyn Sleeper>,
    schedule: PollSchedule,
    session: Arc<Mutex<ProvisionSession>>,
}

impl Provisioner {
    /// Create an orchestrator with the default poll schedule.
    ///
    /// The active credential left behind by a previous session is restored
    /// from the store.
    pub fn new(wallet: BoxedWalletApi, store: BoxedSessionStore) -> Self {
        Self::with_schedule(wallet, store, PollSchedule::default())
    }

    /// Create an orchestrator with an explicit poll schedule
    pub fn with_schedule(
        wallet: BoxedWalletApi,
        store: BoxedSessionStore,
        schedule: PollSchedule,
    ) -> Self {
        let credential = store
            .get(CREDENTIAL_KEY)
            .and_then(|raw| Credential::parse(raw).ok());

        let session = ProvisionSession {
            credential,
            snapshot: None,
        };

        Self {
            wallet,
            store,
            sleeper: Arc::new(TokioSleeper),
            schedule,
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Builder: override the sleeper (tests drive the poller without timers)
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Current session state, as an immutable copy
    pub fn session(&self) -> ProvisionSession {
        self.lock().clone()
    }

    /// The credential operations currently act on
    pub fn active_credential(&self) -> Option<Credential> {
        self.lock().credential.clone()
    }

    /// Last installed snapshot
    pub fn snapshot(&self) -> Option<WalletSnapshot> {
        self.lock().snapshot.clone()
    }

    /// Adopt a pasted credential as the active one.
    ///
    /// Last write wins: any in-flight operation issued against the previous
    /// credential will find its tag stale and be discarded.
    pub fn set_credential(&self, raw: &str) -> ProvisionResult<Credential> {
        let credential = Credential::parse(raw)?;
        {
            let mut session = self.lock();
            if session.credential.as_ref() != Some(&credential) {
                // The cached snapshot belonged to the old credential.
                session.snapshot = None;
            }
            session.credential = Some(credential.clone());
        }
        self.store.put(CREDENTIAL_KEY, credential.as_str());
        Ok(credential)
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Create a fresh credential by redeeming an ecash token.
    ///
    /// Redemption is single-use on the server and never retried here; a
    /// failure is surfaced with the server's text unchanged.
    #[instrument(skip_all, fields(flow_id = %Uuid::new_v4()))]
    pub async fn create_from_token(&self, token: &str) -> ProvisionResult<WalletSnapshot> {
        // Fail fast on blank input, before any round trip.
        let token = BearerToken::parse(token)?;

        let snapshot = self.wallet.redeem_token(&token).await?;
        info!(credential = %snapshot.credential, "Credential created from token");

        self.adopt(snapshot.clone());
        Ok(snapshot)
    }

    /// Request a Lightning invoice that will mint a new credential once paid
    #[instrument(skip(self))]
    pub async fn request_create_invoice(&self, amount_sats: u64) -> ProvisionResult<Invoice> {
        ensure_amount(amount_sats)?;

        let invoice = self
            .wallet
            .create_invoice(&InvoiceRequest::create(amount_sats))
            .await?;
        info!(invoice_id = %invoice.invoice_id, amount_sats, "Create invoice issued");
        Ok(invoice)
    }

    /// Poll a create-invoice to a terminal state, then adopt the minted
    /// credential with a freshly fetched snapshot.
    #[instrument(skip(self), fields(flow_id = %Uuid::new_v4()))]
    pub async fn settle_create_invoice(&self, invoice_id: &str) -> ProvisionResult<WalletSnapshot> {
        let status = self.await_paid(invoice_id).await?;
        let credential = status.credential.ok_or_else(|| {
            ProvisionError::Transport("paid invoice carried no credential".to_string())
        })?;

        // Paid is authoritative for the credential, not the balance.
        let snapshot = self.wallet.wallet_info(&credential).await?;
        info!(credential = %credential, "Credential created from invoice");

        self.adopt(snapshot.clone());
        Ok(snapshot)
    }

    /// Recover a credential from an invoice paid after the poll budget ran
    /// out. One status query, not a poll.
    #[instrument(skip_all, fields(flow_id = %Uuid::new_v4()))]
    pub async fn recover_from_invoice(&self, payment_request: &str) -> ProvisionResult<WalletSnapshot> {
        let payment_request = payment_request.trim();
        if payment_request.is_empty() {
            return Err(ProvisionError::validation("payment request must not be empty"));
        }

        let status = self.wallet.recover_invoice(payment_request).await?;
        if status.state != InvoiceState::Paid {
            // The literal remote state lets the caller branch ("still
            // pending" vs "expired").
            return Err(ProvisionError::InvoiceNotPaid {
                state: status.state,
            });
        }
        let credential = status.credential.ok_or_else(|| {
            ProvisionError::Transport("paid invoice carried no credential".to_string())
        })?;

        let snapshot = self.wallet.wallet_info(&credential).await?;
        info!(credential = %credential, "Credential recovered from invoice");

        self.adopt(snapshot.clone());
        Ok(snapshot)
    }

    // =========================================================================
    // Top-up & sync
    // =========================================================================

    /// Credit an ecash token onto an existing credential, then immediately
    /// re-sync so the session reflects the service's post-top-up balance
    /// rather than a locally guessed one.
    #[instrument(skip_all, fields(flow_id = %Uuid::new_v4()))]
    pub async fn top_up(&self, credential: &str, token: &str) -> ProvisionResult<TopUp> {
        // Each blank input surfaces its own message.
        let credential = Credential::parse(credential)?;
        let token = BearerToken::parse(token)?;

        let credited_msats = self.wallet.top_up(&credential, &token).await?;
        info!(credential = %credential, credited_msats, "Top-up accepted");

        let snapshot = self.sync_parsed(&credential).await?;
        Ok(TopUp {
            credited_msats,
            snapshot,
        })
    }

    /// Request a Lightning invoice that will top up an existing credential
    #[instrument(skip(self, credential))]
    pub async fn request_top_up_invoice(
        &self,
        credential: &str,
        amount_sats: u64,
    ) -> ProvisionResult<Invoice> {
        let credential = Credential::parse(credential)?;
        ensure_amount(amount_sats)?;

        let invoice = self
            .wallet
            .create_invoice(&InvoiceRequest::top_up(amount_sats, credential.clone()))
            .await?;
        info!(invoice_id = %invoice.invoice_id, credential = %credential, amount_sats, "Top-up invoice issued");
        Ok(invoice)
    }

    /// Poll a top-up invoice to a terminal state, then re-sync the credited
    /// credential.
    #[instrument(skip(self, credential), fields(flow_id = %Uuid::new_v4()))]
    pub async fn settle_top_up_invoice(
        &self,
        credential: &str,
        invoice_id: &str,
    ) -> ProvisionResult<WalletSnapshot> {
        let credential = Credential::parse(credential)?;
        self.await_paid(invoice_id).await?;
        self.sync_parsed(&credential).await
    }

    /// Fetch the authoritative snapshot for a credential.
    ///
    /// Always a full fetch; the cached snapshot is never trusted because
    /// balances move out-of-band.
    #[instrument(skip_all)]
    pub async fn sync(&self, credential: &str) -> ProvisionResult<WalletSnapshot> {
        let credential = Credential::parse(credential)?;
        self.sync_parsed(&credential).await
    }

    // =========================================================================
    // Refund
    // =========================================================================

    /// Burn the credential and collect the residual balance.
    ///
    /// Destructive and terminal. On success the cached snapshot is discarded
    /// (absent, not zeroed) and the credential cleared from session and
    /// store; on failure both are left untouched since the remote state did
    /// not change. Not idempotent: refunding again surfaces the service's
    /// error.
    #[instrument(skip_all, fields(flow_id = %Uuid::new_v4()))]
    pub async fn refund(&self, credential: &str) -> ProvisionResult<RefundReceipt> {
        let credential = Credential::parse(credential)?;

        let receipt = self.wallet.refund(&credential).await?;
        info!(credential = %credential, amount_msats = receipt.amount_msats, "Credential refunded");

        let mut cleared = false;
        {
            let mut session = self.lock();
            if session.credential.as_ref() == Some(&credential) {
                session.credential = None;
                session.snapshot = None;
                cleared = true;
            }
        }
        if cleared {
            self.store.remove(CREDENTIAL_KEY);
        }

        Ok(receipt)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn await_paid(&self, invoice_id: &str) -> ProvisionResult<InvoiceStatus> {
        let invoice_id = invoice_id.trim();
        if invoice_id.is_empty() {
            return Err(ProvisionError::validation("invoice id must not be empty"));
        }

        let poll = InvoicePoll::new(invoice_id, self.schedule);
        match await_invoice(self.wallet.as_ref(), self.sleeper.as_ref(), poll).await {
            PollOutcome::Paid(status) => Ok(status),
            PollOutcome::Closed(status) => Err(ProvisionError::InvoiceNotPaid {
                state: status.state,
            }),
            PollOutcome::TimedOut { attempts } => Err(ProvisionError::PollTimeout { attempts }),
        }
    }

    async fn sync_parsed(&self, credential: &Credential) -> ProvisionResult<WalletSnapshot> {
        let snapshot = self.wallet.wallet_info(credential).await?;
        self.apply_if_current(credential, snapshot.clone());
        Ok(snapshot)
    }

    /// A completed create flow owns the session: last write wins.
    fn adopt(&self, snapshot: WalletSnapshot) {
        let credential = snapshot.credential.clone();
        {
            let mut session = self.lock();
            session.credential = Some(credential.clone());
            session.snapshot = Some(snapshot);
        }
        self.store.put(CREDENTIAL_KEY, credential.as_str());
    }

    /// Install a snapshot only if the session still points at the credential
    /// the fetch was issued against.
    fn apply_if_current(&self, issued_against: &Credential, snapshot: WalletSnapshot) {
        let mut session = self.lock();
        if session.credential.as_ref() != Some(issued_against) {
            debug!(credential = %issued_against, "Discarding snapshot for superseded credential");
            return;
        }
        session.snapshot = Some(snapshot);
    }

    fn lock(&self) -> MutexGuard<'_, ProvisionSession> {
        self.session.lock().expect("session lock poisoned")
    }
}

fn ensure_amount(amount_sats: u64) -> ProvisionResult<()> {
    if amount_sats == 0 {
        return Err(ProvisionError::validation("amount must be greater than zero"));
    }
    Ok(())
}

/// Short user-facing failure line for an operation: the server's text where
/// available, a fixed per-operation fallback otherwise.
pub fn failure_message(operation: &str, error: &ProvisionError) -> String {
    match error {
        ProvisionError::Remote { message, .. } if !message.trim().is_empty() => {
            message.trim().to_string()
        }
        ProvisionError::Validation(message) | ProvisionError::Configuration(message) => {
            message.clone()
        }
        ProvisionError::InvoiceNotPaid { state } => format!("Invoice is {}", state),
        ProvisionError::PollTimeout { .. } => {
            "Invoice not paid yet; keep the payment request to recover later".to_string()
        }
        _ => format!("{} failed", operation),
    }
}
