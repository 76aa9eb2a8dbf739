//! # tripdesk-core: Pure Business Logic for TripDesk
//!
//! This crate holds the booking reconciliation rules of the travel-agency
//! back office as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TripDesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Back-office web UI (forms, tables)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 backoffice-api (axum routes)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             tripdesk-db (repositories, transactions)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls pure rules                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tripdesk-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐    │   │
//! │  │   │ pricing  │ │installments│ │ companions │ │ commission │    │   │
//! │  │   └──────────┘ └────────────┘ └────────────┘ └────────────┘    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Trip, Customer, Booking, Commission, ...)
//! - [`input`] - Create/update payloads posted by the web UI
//! - [`money`] - Money type with integer arithmetic
//! - [`pricing`] - Booking total from base price, extras and discount
//! - [`installments`] - First-payment ratio policy and the three-installment plan
//! - [`companions`] - Symmetric companion link planning
//! - [`commission`] - Commission decisions on payment-status transitions
//! - [`validation`] - Field-level input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tripdesk_core::money::Money;
//! use tripdesk_core::pricing::PriceInputs;
//! use tripdesk_core::PaymentRatio;
//!
//! let breakdown = PriceInputs {
//!     base: Money::from_major(10_000),
//!     bag_extra: Money::from_major(500),
//!     discount: Money::from_major(300),
//!     ..PriceInputs::default()
//! }
//! .calculate()
//! .unwrap();
//!
//! assert_eq!(breakdown.total, Money::from_major(10_200));
//! assert_eq!(PaymentRatio::Half.first_payment(breakdown.total), Money::from_major(5_100));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commission;
pub mod companions;
pub mod error;
pub mod input;
pub mod installments;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use input::*;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of installments recorded against one booking.
pub const MAX_INSTALLMENTS: usize = 3;

/// Allowed difference between the submitted and the expected first payment.
///
/// Amounts are compared in cents, so one unit equals 0.01 of the currency.
pub const FIRST_PAYMENT_TOLERANCE_CENTS: i64 = 1;

/// Default page size for list endpoints.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Hard cap on page size for list endpoints.
pub const MAX_LIST_LIMIT: i64 = 500;
