//! # prov-flow
//!
//! Provisioning workflows for lightning-provision-rs.
//!
//! This crate composes the `WalletApi` client into the user-facing
//! credential workflows:
//!
//! - **Create** - redeem an ecash token, or issue a Lightning invoice and
//!   poll it to settlement
//! - **Top-up** - credit a token (or a paid invoice) onto an existing
//!   credential, then re-sync the authoritative balance
//! - **Sync** - fetch the balance snapshot fresh from the Wallet Service
//! - **Recover** - adopt a credential from an invoice paid after the poll
//!   budget ran out
//! - **Refund** - burn the credential and collect the residual balance
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use prov_flow::Provisioner;
//! use prov_core::MemorySessionStore;
//! use prov_wallet::WalletClient;
//! use std::sync::Arc;
//!
//! let wallet = Arc::new(WalletClient::from_env()?);
//! let store = Arc::new(MemorySessionStore::new());
//! let provisioner = Provisioner::new(wallet, store);
//!
//! let snapshot = provisioner.create_from_token(pasted_token).await?;
//! println!("{}", snapshot.display());
//! ```

pub mod orchestrator;
pub mod poller;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenience
pub use orchestrator::{failure_message, Provisioner, ProvisionSession, TopUp};
pub use poller::{
    await_invoice, InvoicePoll, PollOutcome, PollSchedule, Sleeper, TokioSleeper,
    MAX_POLL_ATTEMPTS, POLL_INTERVAL,
};
