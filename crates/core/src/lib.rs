//! Plaze Core - Shared domain types.
//!
//! This crate provides common types used across all Plaze components:
//! - `storefront` - Public-facing price portal and plaza admin panel
//! - `cli` - Command-line client for the price API
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. The REST backend stays the authority for every record; these
//! types only enforce what the client checks before submitting.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, coordinates, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
