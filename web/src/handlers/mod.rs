//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod addresses;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod payment_methods;
pub mod payments;
