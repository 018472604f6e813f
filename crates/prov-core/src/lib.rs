//! # prov-core
//!
//! Core types and traits for the lightning-provision credential workflow.
//!
//! This crate provides:
//! - `Credential`, `BearerToken`, `WalletSnapshot`, `RefundReceipt` for
//!   funded-account state
//! - `Invoice`, `InvoiceStatus`, `InvoiceRequest` for the Lightning payment
//!   boundary
//! - `WalletApi` trait, implemented by the HTTP client in `prov-wallet`
//! - `SessionStore` for the injected active-credential storage
//! - `ProvisionError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use prov_core::{BearerToken, Credential, WalletApi};
//!
//! // Redeem an ecash token for a fresh credential
//! let token = BearerToken::parse(pasted_token)?;
//! let snapshot = wallet.redeem_token(&token).await?;
//!
//! println!("credential {} holds {}", snapshot.credential, snapshot.display());
//! ```

pub mod credential;
pub mod error;
pub mod invoice;
pub mod session;
pub mod wallet_api;

// Re-exports for convenience
pub use credential::{BearerToken, Credential, RefundReceipt, WalletSnapshot, MSATS_PER_SAT};
pub use error::{ProvisionError, ProvisionResult};
pub use invoice::{Invoice, InvoicePurpose, InvoiceRequest, InvoiceState, InvoiceStatus};
pub use session::{BoxedSessionStore, MemorySessionStore, SessionStore, CREDENTIAL_KEY};
pub use wallet_api::{BoxedWalletApi, WalletApi};
