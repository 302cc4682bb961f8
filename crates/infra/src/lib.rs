//! # Cartable Infra
//!
//! Adapters around the core pipeline:
//! - [`portal`]: session manager and the resilient portal client — the one
//!   place where rate limiting, circuit breaking, session reuse, and
//!   retries are composed around the raw provider capability.
//! - [`scheduling`]: the interval loop driving poll cycles.
//! - [`config`]: environment/file configuration loading.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod portal;
pub mod scheduling;

pub use portal::{ResilientPortalClient, SessionManager};
pub use scheduling::{PollScheduler, PollSchedulerConfig, SchedulerError};
