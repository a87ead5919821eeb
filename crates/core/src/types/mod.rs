//! Core types for the donation services.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Currency, Money, MoneyError, format_amount, parse_amount};
pub use status::*;
