//! Core types, storage ports, and service wiring for the jemput waste pickup manager.

/// Account registration, login, and administration.
pub mod accounts;
/// Saved assistant conversations.
pub mod history;
/// Built-in cities and custom pickup locations.
pub mod locations;
/// Domain models and identifiers shared by all crates.
pub mod model;
/// Traits describing the storage interfaces.
pub mod ports;
/// Technician double-booking and waste status rules.
pub mod schedule;
/// High-level service facade used by clients.
pub mod service;
/// Weight aggregates for charts.
pub mod stats;
/// Bundle of storage ports handed to the service.
pub mod stores;

pub use accounts::*;
pub use history::*;
pub use locations::*;
pub use model::*;
pub use ports::*;
pub use service::*;
pub use stores::*;
