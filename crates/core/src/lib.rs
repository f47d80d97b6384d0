//! Folio Core - Shared types library.
//!
//! This crate provides the common types used across the Folio components:
//! - `server` - Webhook listener, ledger repositories, and command surface
//! - `cli` - Command-line tools for migrations and release management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. Inbound Shopify payloads are deserialized into the records in
//! [`events`] and normalized into ledger entries in one place, so the
//! repositories never touch loosely-typed JSON.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers and enums: ISBNs, title status, catalog rows
//! - [`events`] - Typed order/refund webhook payloads and their normalization

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod events;
pub mod types;

pub use events::*;
pub use types::*;
