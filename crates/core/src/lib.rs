//! Rebuild Together Core - Shared domain types.
//!
//! This crate provides the types used across the donation services:
//! - `server` - Webhook receiver, receipt generation, admin and donor APIs
//! - `cli` - Migrations, annual receipt runs, role management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, emails, money and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
