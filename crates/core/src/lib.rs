//! # Cartable Core
//!
//! Business logic of the update pipeline:
//! - [`ports`]: capability traits the rest of the system is written
//!   against — the raw portal client, the resilient gateway, the event sink.
//! - [`diff`]: change detection between successive period snapshots.
//! - [`cache`]: the per-period snapshot cache.
//! - [`coordinator`]: orchestration of one poll cycle.
//!
//! Core depends only on ports (`Arc<dyn Trait>`), never on concrete
//! adapters, so every piece is testable with in-memory doubles.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod cache;
pub mod coordinator;
pub mod diff;
pub mod ports;

pub use cache::PeriodCache;
pub use coordinator::{CycleOutcome, UpdateCoordinator};
