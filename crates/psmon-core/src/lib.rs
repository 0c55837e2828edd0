//! # psmon-core
//!
//! Worker lifecycle, registry, and handoff domain types for the telemetry
//! streaming service.
//!
//! - [`Worker`]: one pending or active monitoring session
//!   (pending → bound → closed)
//! - [`WorkerRegistry`]: process-wide token → worker map with atomic
//!   take-and-remove handoff
//! - Branded id newtypes ([`WorkerId`], [`SessionId`])

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod registry;
pub mod worker;

pub use errors::{RegistryError, WorkerError};
pub use ids::{SessionId, WorkerId};
pub use registry::WorkerRegistry;
pub use worker::{SessionHandle, Worker, WorkerState};
