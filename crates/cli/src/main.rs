//! Folio CLI - schema bootstrap and release management.
//!
//! The administrative trigger for the ledger: a scheduled job or an
//! operator runs one subcommand, it opens a pool, performs one unit of
//! work, and exits.
//!
//! # Usage
//!
//! ```bash
//! # Bootstrap the ledger schema
//! folio migrate
//!
//! # Upsert catalog state exported by the sync collaborator
//! folio sync --file products.json
//!
//! # List titles ready for release
//! folio ready
//!
//! # Finalize one release
//! folio release --isbn 9781234567897 --approver alice
//!
//! # Run the data-quality sweep
//! folio scan
//!
//! # Recompute presale totals
//! folio recompute
//!
//! # Show a title's lifecycle status
//! folio status --isbn 9781234567897
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
// Subcommand results go to stdout; that is the CLI's interface.
#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about = "Folio preorder ledger tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the idempotent schema bootstrap
    Migrate {
        /// Path to the DDL file
        #[arg(long, default_value = "crates/server/schema.sql")]
        schema: PathBuf,
    },
    /// Upsert a JSON batch of catalog products, then run the anomaly scan
    Sync {
        /// Path to a JSON array of catalog products
        #[arg(long)]
        file: PathBuf,
    },
    /// List titles ready for release
    Ready,
    /// Finalize the release of one title
    Release {
        /// ISBN-13 of the title
        #[arg(long)]
        isbn: String,

        /// Identifier of the approver
        #[arg(long)]
        approver: String,
    },
    /// Run the anomaly scan over tagged preorders
    Scan,
    /// Recompute presale totals into presales_log
    Recompute,
    /// Show the lifecycle status of one title
    Status {
        /// ISBN-13 of the title
        #[arg(long)]
        isbn: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}
