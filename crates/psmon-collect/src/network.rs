//! Suspending network-metrics collector.
//!
//! Unlike the host collector this one never blocks: it reads interface
//! counters, suspends for one second on the scheduler, reads again, and
//! reports the delta. It therefore runs directly in a session's push loop
//! with no pool slot involved.

use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::Networks;
use tokio::time::sleep;

use crate::error::CollectError;
use crate::units::mib3;

/// Interval over which throughput deltas are measured.
const SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// One-second throughput reading for a single interface, in MiB.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceStats {
    /// Interface name.
    pub interface: String,
    /// MiB received over the window.
    #[serde(rename = "in")]
    pub inbound: f64,
    /// MiB sent over the window.
    #[serde(rename = "out")]
    pub outbound: f64,
}

/// Push-loop payload: throughput for the monitored interface.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSnapshot {
    /// Stats for the monitored interface.
    pub stats: InterfaceStats,
}

/// Cumulative counters for one interface.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InterfaceCounters {
    /// Bytes received since boot.
    pub bytes_recv: u64,
    /// Bytes sent since boot.
    pub bytes_sent: u64,
    /// Packets received since boot.
    pub packets_recv: u64,
    /// Packets sent since boot.
    pub packets_sent: u64,
}

/// Initial-fetch payload: every interface and its counters.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkOverview {
    /// Interface names, sorted.
    pub interfaces: Vec<String>,
    /// Cumulative counters per interface.
    pub statistics: BTreeMap<String, InterfaceCounters>,
}

/// Collector for network interface counters.
pub struct InterfaceCollector {
    networks: Mutex<Networks>,
    interface: Option<String>,
}

impl InterfaceCollector {
    /// Create a collector. `interface` pins the monitored NIC; when `None`
    /// the first non-loopback interface (by name order) is used.
    #[must_use]
    pub fn new(interface: Option<String>) -> Self {
        Self {
            networks: Mutex::new(Networks::new_with_refreshed_list()),
            interface,
        }
    }

    /// Measure one window of traffic on the monitored interface.
    pub async fn sample(&self) -> Result<NetworkSnapshot, CollectError> {
        let (name, rx_before, tx_before) = {
            let mut networks = self.networks.lock();
            networks.refresh(true);
            let name = self.target(&networks)?;
            let data = networks.list().get(&name).ok_or_else(|| {
                CollectError::Snapshot(format!("unknown interface: {name}"))
            })?;
            (name, data.total_received(), data.total_transmitted())
        };

        sleep(SAMPLE_WINDOW).await;

        let mut networks = self.networks.lock();
        networks.refresh(true);
        let data = networks.list().get(&name).ok_or_else(|| {
            CollectError::Snapshot(format!("interface disappeared: {name}"))
        })?;

        Ok(NetworkSnapshot {
            stats: InterfaceStats {
                inbound: mib3(data.total_received().saturating_sub(rx_before)),
                outbound: mib3(data.total_transmitted().saturating_sub(tx_before)),
                interface: name,
            },
        })
    }

    /// Every interface and its cumulative counters, for the one-shot HTTP
    /// fetch.
    #[must_use]
    pub fn overview(&self) -> NetworkOverview {
        let mut networks = self.networks.lock();
        networks.refresh(true);
        let mut interfaces: Vec<String> = networks.list().keys().cloned().collect();
        interfaces.sort();
        let statistics = networks
            .list()
            .iter()
            .map(|(name, data)| {
                (
                    name.clone(),
                    InterfaceCounters {
                        bytes_recv: data.total_received(),
                        bytes_sent: data.total_transmitted(),
                        packets_recv: data.total_packets_received(),
                        packets_sent: data.total_packets_transmitted(),
                    },
                )
            })
            .collect();
        NetworkOverview {
            interfaces,
            statistics,
        }
    }

    /// Resolve the monitored interface name.
    fn target(&self, networks: &Networks) -> Result<String, CollectError> {
        if let Some(name) = &self.interface {
            return Ok(name.clone());
        }
        let mut names: Vec<&String> = networks.list().keys().collect();
        names.sort();
        names
            .iter()
            .find(|name| !name.starts_with("lo"))
            .or_else(|| names.first())
            .map(|name| (*name).clone())
            .ok_or_else(|| CollectError::Snapshot("no network interfaces".into()))
    }
}
