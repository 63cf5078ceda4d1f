//! # Servease Booking Engine
//!
//! The non-UI core of the Servease home-services marketplace client: a
//! durable shopping cart, price breakdown computation, coupon application,
//! checkout assembly, and the booking lifecycle. The marketplace REST
//! backend (catalog, coupon rules, bookings, addresses) is an external
//! collaborator consumed through the traits in [`api`].
//!
//! ## Architecture
//!
//! - [`cart`] holds the customer's selections, persisted per profile through
//!   an injectable repository ([`persist`] is the SQLite implementation)
//! - [`pricing`] turns pre-discounted amounts into the fee/tax/total
//!   breakdown
//! - [`coupon`] tracks the last validation result for the active code
//! - [`checkout`] assembles and submits bookings from either flow
//! - [`lifecycle`] governs status transitions and provider assignment
//!
//! Modules are exposed so the integration suite can drive the whole engine
//! against in-memory collaborator fakes without a live backend.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod coupon;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod persist;
pub mod pricing;
pub mod schedule;

pub use error::Error;
