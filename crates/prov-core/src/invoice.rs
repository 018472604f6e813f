//! # Invoice Types
//!
//! Lightning invoice types for the Wallet Service boundary.

use crate::credential::Credential;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an invoice is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoicePurpose {
    /// Fund a brand-new credential
    Create,
    /// Add balance to an existing credential
    TopUp,
}

impl InvoicePurpose {
    /// Wire value used by the Wallet Service
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoicePurpose::Create => "create",
            InvoicePurpose::TopUp => "topup",
        }
    }
}

/// Invoice state reported by the Wallet Service.
///
/// `Paid`, `Expired` and `Cancelled` are terminal and never revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceState {
    Pending,
    Paid,
    Expired,
    Cancelled,
}

impl InvoiceState {
    /// Returns true once the state can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvoiceState::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceState::Pending => "Pending",
            InvoiceState::Paid => "Paid",
            InvoiceState::Expired => "Expired",
            InvoiceState::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for InvoiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters for requesting a new invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRequest {
    /// Requested amount in satoshis
    pub amount_sats: u64,

    /// Create a new credential or top up an existing one
    pub purpose: InvoicePurpose,

    /// The credential being topped up; required iff `purpose` is `TopUp`
    pub credential: Option<Credential>,
}

impl InvoiceRequest {
    /// Invoice that will mint a fresh credential once paid
    pub fn create(amount_sats: u64) -> Self {
        Self {
            amount_sats,
            purpose: InvoicePurpose::Create,
            credential: None,
        }
    }

    /// Invoice that will credit an existing credential once paid
    pub fn top_up(amount_sats: u64, credential: Credential) -> Self {
        Self {
            amount_sats,
            purpose: InvoicePurpose::TopUp,
            credential: Some(credential),
        }
    }
}

/// A Lightning invoice issued by the Wallet Service, immutable once issued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Wallet Service identifier for status polling
    pub invoice_id: String,

    /// BOLT11 payment request the payer settles off-band
    pub payment_request: String,

    /// Invoiced amount in satoshis
    pub amount_sats: u64,

    /// Validity deadline set by the Lightning node
    pub expires_at: DateTime<Utc>,

    /// Payment hash of the underlying HTLC
    pub payment_hash: String,
}

impl Invoice {
    /// Whether the validity window has passed at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Current status of an invoice.
///
/// `credential` is present iff `state` is `Paid` with purpose `create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceStatus {
    pub state: InvoiceState,

    /// Credential minted by a paid create-invoice
    pub credential: Option<Credential>,

    pub amount_sats: u64,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    /// Settlement time, present once `state` is `Paid`
    pub paid_at: Option<DateTime<Utc>>,
}

impl InvoiceStatus {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_terminal_states() {
        assert!(!InvoiceState::Pending.is_terminal());
        assert!(InvoiceState::Paid.is_terminal());
        assert!(InvoiceState::Expired.is_terminal());
        assert!(InvoiceState::Cancelled.is_terminal());
    }

    #[test]
    fn test_purpose_wire_values() {
        assert_eq!(InvoicePurpose::Create.as_str(), "create");
        assert_eq!(InvoicePurpose::TopUp.as_str(), "topup");

        let json = serde_json::to_string(&InvoicePurpose::TopUp).unwrap();
        assert_eq!(json, "\"topup\"");
    }

    #[test]
    fn test_state_deserializes_lowercase() {
        let state: InvoiceState = serde_json::from_str("\"expired\"").unwrap();
        assert_eq!(state, InvoiceState::Expired);
        assert_eq!(state.to_string(), "Expired");
    }

    #[test]
    fn test_invoice_expiry() {
        let now = Utc::now();
        let invoice = Invoice {
            invoice_id: "inv_1".into(),
            payment_request: "lnbc10u1p...".into(),
            amount_sats: 1000,
            expires_at: now + Duration::minutes(10),
            payment_hash: "abcd".into(),
        };

        assert!(!invoice.is_expired(now));
        assert!(invoice.is_expired(now + Duration::minutes(11)));
    }

    #[test]
    fn test_top_up_request_carries_credential() {
        let cred = Credential::parse("sk-abc").unwrap();
        let request = InvoiceRequest::top_up(500, cred.clone());

        assert_eq!(request.purpose, InvoicePurpose::TopUp);
        assert_eq!(request.credential, Some(cred));
    }
}
