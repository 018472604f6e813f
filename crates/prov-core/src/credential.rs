//! # Credential & Balance Types
//!
//! Bearer credential, ecash token and balance snapshot types.
//! The Wallet Service accounts in millisatoshis; helpers convert to sats
//! only for display.

use crate::error::{ProvisionError, ProvisionResult};
use serde::{Deserialize, Serialize};

/// Millisatoshis per satoshi
pub const MSATS_PER_SAT: u64 = 1_000;

/// An opaque bearer API key ("sk-...") identifying a funded account.
///
/// Created once per successful redemption, never mutated, logically
/// destroyed on refund. Blank input is rejected at parse time so no
/// operation ever carries an empty credential over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Parse a credential from user input, rejecting blank strings
    pub fn parse(raw: impl AsRef<str>) -> ProvisionResult<Self> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(ProvisionError::validation("credential must not be empty"));
        }
        Ok(Self(raw.to_string()))
    }

    /// The raw credential string (goes into the Authorization header)
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form safe for logs
    pub fn redacted(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return "…".to_string();
        }
        format!("{}…", chars[..6].iter().collect::<String>())
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

/// A single-use, transferable ecash (Cashu) token.
///
/// The Wallet Service is the sole arbiter of whether a token has already
/// been redeemed; redemption is never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Parse a token from user input, rejecting blank strings
    pub fn parse(raw: impl AsRef<str>) -> ProvisionResult<Self> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(ProvisionError::validation("token must not be empty"));
        }
        Ok(Self(raw.to_string()))
    }

    /// The raw token string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Authoritative balance state for a credential.
///
/// Always fetched wholesale from the Wallet Service and replaced wholesale;
/// never patched field-by-field or computed locally from deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    /// The credential this snapshot belongs to
    pub credential: Credential,

    /// Spendable balance in millisatoshis
    pub spendable_msats: u64,

    /// Balance reserved by in-flight requests, in millisatoshis
    pub reserved_msats: u64,
}

impl WalletSnapshot {
    pub fn new(credential: Credential, spendable_msats: u64, reserved_msats: u64) -> Self {
        Self {
            credential,
            spendable_msats,
            reserved_msats,
        }
    }

    /// Spendable balance in whole satoshis (rounded down)
    pub fn spendable_sats(&self) -> u64 {
        self.spendable_msats / MSATS_PER_SAT
    }

    /// Reserved balance in whole satoshis (rounded down)
    pub fn reserved_sats(&self) -> u64 {
        self.reserved_msats / MSATS_PER_SAT
    }

    /// Format for display (e.g., "1000 sats (+21 reserved)")
    pub fn display(&self) -> String {
        if self.reserved_msats == 0 {
            format!("{} sats", self.spendable_sats())
        } else {
            format!(
                "{} sats (+{} reserved)",
                self.spendable_sats(),
                self.reserved_sats()
            )
        }
    }
}

/// Produced once, at the moment a credential is burned.
///
/// The credential is unusable afterwards. `token` carries the residual
/// balance as a fresh ecash token; a deployment configured to pay out to a
/// Lightning address returns `recipient` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReceipt {
    /// Fresh bearer token holding the refunded balance
    pub token: Option<BearerToken>,

    /// Payout destination, when the deployment refunds off-band
    pub recipient: Option<String>,

    /// Refunded amount in millisatoshis
    pub amount_msats: u64,
}

impl RefundReceipt {
    /// Refunded amount in whole satoshis (rounded down)
    pub fn amount_sats(&self) -> u64 {
        self.amount_msats / MSATS_PER_SAT
    }
}
