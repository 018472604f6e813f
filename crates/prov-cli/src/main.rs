//! # Lightning-Provision
//!
//! Command-line driver for the payment-to-credential provisioning
//! workflows. Stands in for the dashboard UI: every orchestrator operation
//! is one subcommand.
//!
//! ## Usage
//!
//! ```bash
//! # Point at the Wallet Service
//! export WALLET_SERVICE_URL=https://wallet.example.com
//!
//! # Redeem an ecash token into a fresh credential
//! lightning-provision create-token cashuA...
//!
//! # Or pay a Lightning invoice (prints the BOLT11, then waits)
//! lightning-provision create-invoice 1000
//!
//! # Later
//! lightning-provision sync --credential sk-...
//! lightning-provision refund --credential sk-...
//! ```

use clap::{Parser, Subcommand};
use prov_core::{MemorySessionStore, ProvisionError, ProvisionResult};
use prov_flow::{failure_message, Provisioner};
use prov_wallet::{WalletClient, WalletConfig};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "lightning-provision",
    version,
    about = "Provision API credentials from Lightning/ecash payments"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Redeem an ecash token into a fresh credential
    CreateToken {
        /// Cashu bearer token
        token: String,
    },

    /// Issue a create-invoice, wait for payment, print the new credential
    CreateInvoice {
        /// Invoice amount in satoshis
        amount_sats: u64,
    },

    /// Credit an ecash token onto an existing credential
    Topup {
        #[arg(long)]
        credential: String,
        #[arg(long)]
        token: String,
    },

    /// Issue a top-up invoice for an existing credential and wait for payment
    TopupInvoice {
        #[arg(long)]
        credential: String,
        /// Invoice amount in satoshis
        amount_sats: u64,
    },

    /// Fetch the authoritative balance snapshot
    Sync {
        #[arg(long)]
        credential: String,
    },

    /// Recover a credential from an invoice that was paid after polling
    /// gave up
    Recover {
        /// BOLT11 payment request of the paid invoice
        payment_request: String,
    },

    /// Burn the credential and collect the residual balance
    Refund {
        #[arg(long)]
        credential: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; workflows log through `tracing`, results go to
    // stdout.
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let config = WalletConfig::load()?;
    info!("Wallet service: {}", config.base_url);

    let wallet = Arc::new(WalletClient::new(config));
    let store = Arc::new(MemorySessionStore::new());
    let provisioner = Provisioner::new(wallet, store);

    match cli.command {
        Command::CreateToken { token } => {
            let snapshot = finish("Create", provisioner.create_from_token(&token).await)?;
            println!("credential: {}", snapshot.credential.as_str());
            println!("balance:    {}", snapshot.display());
        }

        Command::CreateInvoice { amount_sats } => {
            let invoice = finish(
                "Create",
                provisioner.request_create_invoice(amount_sats).await,
            )?;
            println!("pay this invoice (expires {}):", invoice.expires_at);
            println!("{}", invoice.payment_request);
            println!();

            match provisioner.settle_create_invoice(&invoice.invoice_id).await {
                Ok(snapshot) => {
                    println!("credential: {}", snapshot.credential.as_str());
                    println!("balance:    {}", snapshot.display());
                }
                Err(e) => {
                    if matches!(e, ProvisionError::PollTimeout { .. }) {
                        eprintln!("Once the invoice is paid, recover the credential with:");
                        eprintln!(
                            "  lightning-provision recover '{}'",
                            invoice.payment_request
                        );
                    }
                    anyhow::bail!(failure_message("Create", &e));
                }
            }
        }

        Command::Topup { credential, token } => {
            let top_up = finish("Top-up", provisioner.top_up(&credential, &token).await)?;
            println!("credited: {} msats", top_up.credited_msats);
            println!("balance:  {}", top_up.snapshot.display());
        }

        Command::TopupInvoice {
            credential,
            amount_sats,
        } => {
            let invoice = finish(
                "Top-up",
                provisioner
                    .request_top_up_invoice(&credential, amount_sats)
                    .await,
            )?;
            println!("pay this invoice (expires {}):", invoice.expires_at);
            println!("{}", invoice.payment_request);
            println!();

            let snapshot = finish(
                "Top-up",
                provisioner
                    .settle_top_up_invoice(&credential, &invoice.invoice_id)
                    .await,
            )?;
            println!("balance: {}", snapshot.display());
        }

        Command::Sync { credential } => {
            let snapshot = finish("Sync", provisioner.sync(&credential).await)?;
            println!("balance: {}", snapshot.display());
        }

        Command::Recover { payment_request } => {
            let snapshot = finish(
                "Recover",
                provisioner.recover_from_invoice(&payment_request).await,
            )?;
            println!("credential: {}", snapshot.credential.as_str());
            println!("balance:    {}", snapshot.display());
        }

        Command::Refund { credential } => {
            let receipt = finish("Refund", provisioner.refund(&credential).await)?;
            println!("refunded: {} sats", receipt.amount_sats());
            if let Some(token) = receipt.token {
                println!("token:    {}", token.as_str());
            }
            if let Some(recipient) = receipt.recipient {
                println!("paid out to: {}", recipient);
            }
        }
    }

    Ok(())
}

/// Map a workflow failure to the short user-facing message
fn finish<T>(operation: &str, result: ProvisionResult<T>) -> anyhow::Result<T> {
    result.map_err(|e| anyhow::anyhow!(failure_message(operation, &e)))
}
