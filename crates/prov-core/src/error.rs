//! # Provisioning Error Types
//!
//! Typed error handling for the credential provisioning workflow.
//! All operations return `Result<T, ProvisionError>`.

use crate::invoice::InvoiceState;
use thiserror::Error;

/// Core error type for all provisioning operations
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Configuration errors (missing base URL, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Blank or malformed local input, rejected before any network call
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Network or body-decode error talking to the Wallet Service
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-2xx response from the Wallet Service.
    /// `message` is the response body verbatim; the server text is never
    /// rewritten client-side.
    #[error("Wallet service error [{status}]: {message}")]
    Remote { status: u16, message: String },

    /// Recover or settle attempted against an invoice that is not Paid
    #[error("Invoice is {state}, not paid")]
    InvoiceNotPaid { state: InvoiceState },

    /// Poll attempt budget exhausted while the invoice was still pending.
    /// Distinct from `InvoiceNotPaid { state: Expired }`: the invoice may
    /// still be payable and the caller should offer a manual recover path.
    #[error("Invoice still pending after {attempts} status checks")]
    PollTimeout { attempts: u32 },
}

impl ProvisionError {
    /// Returns true if repeating the failed call may succeed.
    ///
    /// Only transport failures qualify, and only the invoice poller acts on
    /// this; remote errors carry a server verdict and are never retried
    /// automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProvisionError::Transport(_))
    }

    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        ProvisionError::Validation(message.into())
    }
}

/// Result type alias for provisioning operations
pub type ProvisionResult<T> = Result<T, ProvisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ProvisionError::Transport("timeout".into()).is_retryable());
        assert!(!ProvisionError::Validation("blank".into()).is_retryable());
        assert!(!ProvisionError::Remote {
            status: 502,
            message: "mint unreachable".into()
        }
        .is_retryable());
        assert!(!ProvisionError::PollTimeout { attempts: 60 }.is_retryable());
    }

    #[test]
    fn test_remote_message_verbatim() {
        let err = ProvisionError::Remote {
            status: 409,
            message: "token already spent".into(),
        };
        assert!(err.to_string().contains("token already spent"));
        assert!(err.to_string().contains("409"));
    }

    #[test]
    fn test_not_paid_carries_state_name() {
        let err = ProvisionError::InvoiceNotPaid {
            state: InvoiceState::Expired,
        };
        assert!(err.to_string().contains("Expired"));
    }
}
