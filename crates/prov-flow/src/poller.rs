//! # Invoice Lifecycle Poller
//!
//! Polls an invoice's status until a terminal state or the attempt budget
//! runs out. The poll state is an explicit object advanced one observation
//! at a time, with the wait between attempts behind the `Sleeper` seam, so
//! the loop is unit-testable without real timers.

use async_trait::async_trait;
use prov_core::{InvoiceState, InvoiceStatus, ProvisionResult, WalletApi};
use std::time::Duration;
use tracing::{debug, warn};

/// Wait between status checks
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Attempt budget (~5 minutes at the default interval)
pub const MAX_POLL_ATTEMPTS: u32 = 60;

/// Pacing of one poll loop
#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}

/// How one poll loop ended
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Invoice settled; the only outcome that can carry a credential
    Paid(InvoiceStatus),

    /// Invoice reached Expired or Cancelled; not retried
    Closed(InvoiceStatus),

    /// Attempt budget exhausted while the invoice was still pending.
    /// The invoice may still be payable; callers surface a manual recover
    /// path rather than treating this like Expired.
    TimedOut { attempts: u32 },
}

/// Poll state for one invoice, advanced one observation at a time.
///
/// Holds nothing beyond its own counters, so two polls of different
/// invoices cannot interfere.
#[derive(Debug)]
pub struct InvoicePoll {
    invoice_id: String,
    attempt: u32,
    schedule: PollSchedule,
}

impl InvoicePoll {
    pub fn new(invoice_id: impl Into<String>, schedule: PollSchedule) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            attempt: 0,
            schedule,
        }
    }

    pub fn invoice_id(&self) -> &str {
        &self.invoice_id
    }

    /// Status checks made so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn interval(&self) -> Duration {
        self.schedule.interval
    }

    /// Record one status observation.
    ///
    /// Returns the outcome once the loop is over, `None` while it should
    /// keep going. A failed status check counts as one attempt but does not
    /// stop the loop; only the attempt budget does.
    pub fn observe(&mut self, result: ProvisionResult<InvoiceStatus>) -> Option<PollOutcome> {
        self.attempt += 1;

        match result {
            Ok(status) if status.state == InvoiceState::Paid => {
                debug!(invoice_id = %self.invoice_id, attempt = self.attempt, "Invoice paid");
                return Some(PollOutcome::Paid(status));
            }
            Ok(status) if status.state.is_terminal() => {
                debug!(invoice_id = %self.invoice_id, state = %status.state, "Invoice closed");
                return Some(PollOutcome::Closed(status));
            }
            Ok(_) => {
                debug!(invoice_id = %self.invoice_id, attempt = self.attempt, "Invoice still pending");
            }
            Err(e) => {
                warn!(invoice_id = %self.invoice_id, attempt = self.attempt, "Status check failed: {}", e);
            }
        }

        if self.attempt >= self.schedule.max_attempts {
            return Some(PollOutcome::TimedOut {
                attempts: self.attempt,
            });
        }

        None
    }
}

/// Clock seam for the wait between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, period: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// Drive one invoice to a terminal outcome.
///
/// Status checks are strictly sequential; there is never more than one
/// in-flight request per poll. Dropping the returned future between awaits
/// cancels the loop, so no observation can land after cancellation.
pub async fn await_invoice<W, S>(wallet: &W, sleeper: &S, mut poll: InvoicePoll) -> PollOutcome
where
    W: WalletApi + ?Sized,
    S: Sleeper + ?Sized,
{
    loop {
        let result = wallet.invoice_status(poll.invoice_id()).await;
        if let Some(outcome) = poll.observe(result) {
            return outcome;
        }
        sleeper.sleep(poll.interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{paid_status, pending_status, status_with, InstantSleeper, MockWallet, Scripted};
    use std::sync::atomic::Ordering;

    fn short_schedule(max_attempts: u32) -> PollSchedule {
        PollSchedule {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_paid_on_first_poll_stops_after_one_attempt() {
        let wallet = MockWallet::new();
        wallet.script_statuses(vec![Scripted::Ok(paid_status("sk-abc", 1000))]);
        let sleeper = InstantSleeper::default();

        let poll = InvoicePoll::new("inv_1", PollSchedule::default());
        let outcome = await_invoice(&wallet, &sleeper, poll).await;

        assert_eq!(wallet.status_calls.load(Ordering::SeqCst), 1);
        assert_eq!(sleeper.sleeps.load(Ordering::SeqCst), 0);
        match outcome {
            PollOutcome::Paid(status) => {
                assert_eq!(status.credential.unwrap().as_str(), "sk-abc");
            }
            other => panic!("expected Paid, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pending_forever_times_out_after_exactly_sixty_attempts() {
        let wallet = MockWallet::new();
        wallet.script_statuses(vec![Scripted::Ok(pending_status(1000))]);
        let sleeper = InstantSleeper::default();

        let poll = InvoicePoll::new("inv_1", PollSchedule::default());
        let outcome = await_invoice(&wallet, &sleeper, poll).await;

        assert_eq!(wallet.status_calls.load(Ordering::SeqCst), 60);
        assert!(matches!(outcome, PollOutcome::TimedOut { attempts: 60 }));
    }

    #[tokio::test]
    async fn test_expired_invoice_closes_without_retry() {
        let wallet = MockWallet::new();
        wallet.script_statuses(vec![
            Scripted::Ok(pending_status(1000)),
            Scripted::Ok(pending_status(1000)),
            Scripted::Ok(status_with(InvoiceState::Expired, None)),
        ]);
        let sleeper = InstantSleeper::default();

        let poll = InvoicePoll::new("inv_1", PollSchedule::default());
        let outcome = await_invoice(&wallet, &sleeper, poll).await;

        assert_eq!(wallet.status_calls.load(Ordering::SeqCst), 3);
        match outcome {
            PollOutcome::Closed(status) => assert_eq!(status.state, InvoiceState::Expired),
            other => panic!("expected Closed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failures_consume_attempts_but_do_not_stop_the_loop() {
        let wallet = MockWallet::new();
        wallet.script_statuses(vec![
            Scripted::Transport,
            Scripted::Transport,
            Scripted::Ok(paid_status("sk-abc", 1000)),
        ]);
        let sleeper = InstantSleeper::default();

        let poll = InvoicePoll::new("inv_1", PollSchedule::default());
        let outcome = await_invoice(&wallet, &sleeper, poll).await;

        assert_eq!(wallet.status_calls.load(Ordering::SeqCst), 3);
        assert!(matches!(outcome, PollOutcome::Paid(_)));
    }

    #[tokio::test]
    async fn test_custom_attempt_budget_is_honored() {
        let wallet = MockWallet::new();
        wallet.script_statuses(vec![Scripted::Ok(pending_status(1000))]);
        let sleeper = InstantSleeper::default();

        let poll = InvoicePoll::new("inv_1", short_schedule(5));
        let outcome = await_invoice(&wallet, &sleeper, poll).await;

        assert_eq!(wallet.status_calls.load(Ordering::SeqCst), 5);
        assert!(matches!(outcome, PollOutcome::TimedOut { attempts: 5 }));
    }

    #[test]
    fn test_observe_counts_failures_as_attempts() {
        let mut poll = InvoicePoll::new("inv_1", short_schedule(2));

        assert!(poll
            .observe(Err(prov_core::ProvisionError::Transport("reset".into())))
            .is_none());
        assert_eq!(poll.attempt(), 1);

        let outcome = poll.observe(Ok(pending_status(1000)));
        assert!(matches!(outcome, Some(PollOutcome::TimedOut { attempts: 2 })));
    }
}
