//! # psmon-collect
//!
//! Snapshot producers for the telemetry stream.
//!
//! - [`SystemCollector`]: blocking host metrics (cpu, memory, disk, uptime,
//!   processes)
//! - [`InterfaceCollector`]: suspending network throughput sampling
//! - [`BlockingPool`]: bounded execution slots that keep blocking collection
//!   off the scheduler
//! - [`HostSource`] / [`NetworkSource`]: the seams the session layer consumes

#![deny(unsafe_code)]

pub mod error;
pub mod host;
pub mod network;
pub mod pool;
pub mod source;
pub mod units;

pub use error::CollectError;
pub use host::{HostOverview, HostSnapshot, SystemCollector};
pub use network::{InterfaceCollector, NetworkOverview, NetworkSnapshot};
pub use pool::{BlockingPool, DEFAULT_SLOTS};
pub use source::{HostSource, NetworkSource};
