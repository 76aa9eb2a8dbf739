//! # tripdesk-db: Database Layer for TripDesk
//!
//! This crate provides database access for the TripDesk back office.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TripDesk Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /bookings)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tripdesk-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (booking.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ BookingRepo   │    │ 001_initial_ │  │   │
//! │  │   │ Connection    │◄───│ CommissionRepo│    │   schema.sql │  │   │
//! │  │   │ Management    │    │ CustomerRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ pure rules                    │   │
//! │  │                                ▼                               │   │
//! │  │                          tripdesk-core                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ./tripdesk.db (DATABASE_PATH)                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (booking, commission, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tripdesk_db::{Database, DbConfig};
//!
//! // Create database (migrations run on startup)
//! let db = Database::new(DbConfig::new("path/to/tripdesk.db")).await?;
//!
//! // Use repositories
//! let detail = db.bookings().create_booking(request).await?;
//! let payable = db.commissions().summary(None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::booking::BookingRepository;
pub use repository::commission::CommissionRepository;
pub use repository::customer::CustomerRepository;
pub use repository::lead::{LeadConversion, LeadRepository};
pub use repository::trip::TripRepository;
pub use repository::user::UserRepository;
