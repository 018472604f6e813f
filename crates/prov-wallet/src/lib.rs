//! # prov-wallet
//!
//! Wallet Service client for lightning-provision-rs.
//!
//! This crate maps the Wallet Service's HTTP+JSON balance/invoice API onto
//! the `WalletApi` trait from `prov-core`:
//!
//! - Lightning invoices: issue, poll status, recover by BOLT11
//! - Ecash: redeem a Cashu token into a fresh credential, top up an
//!   existing one
//! - Balance: authoritative snapshot fetch, destructive refund
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use prov_wallet::{WalletClient, WalletConfig};
//! use prov_core::{BearerToken, WalletApi};
//!
//! // Create client from environment (WALLET_SERVICE_URL)
//! let client = WalletClient::from_env()?;
//!
//! // Redeem a pasted token
//! let token = BearerToken::parse(input)?;
//! let snapshot = client.redeem_token(&token).await?;
//!
//! println!("{}: {}", snapshot.credential, snapshot.display());
//! ```

pub mod client;
pub mod config;

// Re-exports
pub use client::WalletClient;
pub use config::WalletConfig;
