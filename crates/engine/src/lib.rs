// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! airlift-engine: the migration orchestrator. Job lifecycle state
//! machine, background task supervision, staged-import review flow,
//! rollback, recovery, and the event bus.

pub mod error;
pub mod event_bus;
pub mod service;

pub use error::ServiceError;
pub use event_bus::MigrationBus;
pub use service::{MigrationService, STALE_RECOVERY_ERROR};
