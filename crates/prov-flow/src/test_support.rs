//! Scripted Wallet Service mock shared by the poller and orchestrator tests.
//!
//! Call counters back the zero-network-call assertions; the status script is
//! consumed front to back with the last entry repeating, so "pending
//! forever" is a one-entry script.

use crate::poller::Sleeper;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use prov_core::{
    BearerToken, Credential, Invoice, InvoiceRequest, InvoiceState, InvoiceStatus,
    ProvisionError, ProvisionResult, RefundReceipt, WalletApi, WalletSnapshot,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Hook = Box<dyn FnOnce() + Send>;

/// One scripted response
pub(crate) enum Scripted<T> {
    Ok(T),
    Remote(u16, &'static str),
    Transport,
}

impl<T: Clone> Scripted<T> {
    fn produce(&self) -> ProvisionResult<T> {
        match self {
            Scripted::Ok(value) => Ok(value.clone()),
            Scripted::Remote(status, message) => Err(ProvisionError::Remote {
                status: *status,
                message: (*message).to_string(),
            }),
            Scripted::Transport => Err(ProvisionError::Transport("connection reset".to_string())),
        }
    }
}

#[derive(Default)]
pub(crate) struct MockWallet {
    invoice_response: Mutex<Option<Invoice>>,
    status_script: Mutex<Vec<Scripted<InvoiceStatus>>>,
    recover_response: Mutex<Option<Scripted<InvoiceStatus>>>,
    redeem_response: Mutex<Option<Scripted<WalletSnapshot>>>,
    info_response: Mutex<Option<Scripted<WalletSnapshot>>>,
    topup_response: Mutex<Option<Scripted<u64>>>,
    refund_response: Mutex<Option<Scripted<RefundReceipt>>>,
    info_hook: Mutex<Option<Hook>>,

    pub invoice_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub recover_calls: AtomicU32,
    pub redeem_calls: AtomicU32,
    pub info_calls: AtomicU32,
    pub topup_calls: AtomicU32,
    pub refund_calls: AtomicU32,
}

impl MockWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_invoice(&self, invoice: Invoice) {
        *self.invoice_response.lock().unwrap() = Some(invoice);
    }

    pub fn script_statuses(&self, script: Vec<Scripted<InvoiceStatus>>) {
        *self.status_script.lock().unwrap() = script;
    }

    pub fn respond_recover(&self, response: Scripted<InvoiceStatus>) {
        *self.recover_response.lock().unwrap() = Some(response);
    }

    pub fn respond_redeem(&self, response: Scripted<WalletSnapshot>) {
        *self.redeem_response.lock().unwrap() = Some(response);
    }

    pub fn respond_info(&self, response: Scripted<WalletSnapshot>) {
        *self.info_response.lock().unwrap() = Some(response);
    }

    pub fn respond_topup(&self, response: Scripted<u64>) {
        *self.topup_response.lock().unwrap() = Some(response);
    }

    pub fn respond_refund(&self, response: Scripted<RefundReceipt>) {
        *self.refund_response.lock().unwrap() = Some(response);
    }

    /// Run once, just before the next `wallet_info` responds; lets a test
    /// change the session while a sync is in flight.
    pub fn on_info(&self, hook: impl FnOnce() + Send + 'static) {
        *self.info_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn total_calls(&self) -> u32 {
        self.invoice_calls.load(Ordering::SeqCst)
            + self.status_calls.load(Ordering::SeqCst)
            + self.recover_calls.load(Ordering::SeqCst)
            + self.redeem_calls.load(Ordering::SeqCst)
            + self.info_calls.load(Ordering::SeqCst)
            + self.topup_calls.load(Ordering::SeqCst)
            + self.refund_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletApi for MockWallet {
    async fn create_invoice(&self, _request: &InvoiceRequest) -> ProvisionResult<Invoice> {
        self.invoice_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .invoice_response
            .lock()
            .unwrap()
            .clone()
            .expect("unscripted create_invoice call"))
    }

    async fn invoice_status(&self, _invoice_id: &str) -> ProvisionResult<InvoiceStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.status_script.lock().unwrap();
        if script.len() > 1 {
            script.remove(0).produce()
        } else {
            script.first().expect("unscripted invoice_status call").produce()
        }
    }

    async fn recover_invoice(&self, _payment_request: &str) -> ProvisionResult<InvoiceStatus> {
        self.recover_calls.fetch_add(1, Ordering::SeqCst);
        self.recover_response
            .lock()
            .unwrap()
            .as_ref()
            .expect("unscripted recover_invoice call")
            .produce()
    }

    async fn redeem_token(&self, _token: &BearerToken) -> ProvisionResult<WalletSnapshot> {
        self.redeem_calls.fetch_add(1, Ordering::SeqCst);
        self.redeem_response
            .lock()
            .unwrap()
            .as_ref()
            .expect("unscripted redeem_token call")
            .produce()
    }

    async fn wallet_info(&self, _credential: &Credential) -> ProvisionResult<WalletSnapshot> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.info_hook.lock().unwrap().take() {
            hook();
        }
        self.info_response
            .lock()
            .unwrap()
            .as_ref()
            .expect("unscripted wallet_info call")
            .produce()
    }

    async fn top_up(&self, _credential: &Credential, _token: &BearerToken) -> ProvisionResult<u64> {
        self.topup_calls.fetch_add(1, Ordering::SeqCst);
        self.topup_response
            .lock()
            .unwrap()
            .as_ref()
            .expect("unscripted top_up call")
            .produce()
    }

    async fn refund(&self, _credential: &Credential) -> ProvisionResult<RefundReceipt> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        self.refund_response
            .lock()
            .unwrap()
            .as_ref()
            .expect("unscripted refund call")
            .produce()
    }
}

/// Sleeper that returns immediately and counts how often it was asked to wait
#[derive(Default)]
pub(crate) struct InstantSleeper {
    pub sleeps: AtomicU32,
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, _period: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn status_with(state: InvoiceState, credential: Option<&str>) -> InvoiceStatus {
    let now = Utc::now();
    InvoiceStatus {
        state,
        credential: credential.map(|key| Credential::parse(key).unwrap()),
        amount_sats: 1000,
        created_at: now,
        expires_at: now + ChronoDuration::minutes(10),
        paid_at: (state == InvoiceState::Paid).then(|| now),
    }
}

pub(crate) fn paid_status(key: &str, amount_sats: u64) -> InvoiceStatus {
    let mut status = status_with(InvoiceState::Paid, Some(key));
    status.amount_sats = amount_sats;
    status
}

pub(crate) fn pending_status(amount_sats: u64) -> InvoiceStatus {
    let mut status = status_with(InvoiceState::Pending, None);
    status.amount_sats = amount_sats;
    status
}

pub(crate) fn invoice_for(invoice_id: &str, amount_sats: u64) -> Invoice {
    let now = Utc::now();
    Invoice {
        invoice_id: invoice_id.to_string(),
        payment_request: format!("lnbc{}n1pexample", amount_sats),
        amount_sats,
        expires_at: now + ChronoDuration::minutes(10),
        payment_hash: "deadbeef".to_string(),
    }
}

pub(crate) fn snapshot_for(key: &str, spendable_msats: u64, reserved_msats: u64) -> WalletSnapshot {
    WalletSnapshot::new(Credential::parse(key).unwrap(), spendable_msats, reserved_msats)
}
