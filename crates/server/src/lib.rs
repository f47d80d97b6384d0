//! Folio server library.
//!
//! The preorder ledger and reconciliation service: webhook listener,
//! ingestion handlers, readiness analyzer, release finalizer, anomaly
//! scanner, and the Slack-style command surface, all over one `PostgreSQL`
//! store.
//!
//! Exposed as a library so the router can be exercised by the integration
//! tests and the repositories reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
