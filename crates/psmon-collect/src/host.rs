//! Blocking host-metrics collector.
//!
//! Produces the flat cpu/mem/disk/uptime/processes payload the push loop
//! streams, plus a one-shot overview (user and platform identity added) for
//! the initial HTTP fetch. All readings come from `sysinfo`. CPU usage is
//! sampled over a one-second window between two refreshes — that window is
//! what paces the host push loop; there is no other delay in the cycle.

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::{
    Components, CpuRefreshKind, Disks, MemoryRefreshKind, ProcessRefreshKind, RefreshKind, System,
    UpdateKind, Users,
};

use crate::error::CollectError;
use crate::units::{gib, mib2, percent, round2};

/// Sampling window for CPU usage, matching the original one-second probe.
const SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Processes reported per snapshot.
const TOP_PROCESSES: usize = 10;

/// CPU usage, temperature, and frequency.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CpuStats {
    /// Usage percent over the sampling window.
    pub usage: f64,
    /// Package temperature in °C; 0.0 when no sensor is exposed.
    pub temp: f64,
    /// Current frequency in MHz.
    pub freq: f64,
}

/// Memory or disk occupancy in GiB.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageStats {
    /// Total capacity.
    pub total: f64,
    /// In use.
    pub used: f64,
    /// Free.
    pub free: f64,
    /// Used percent.
    pub percent: f64,
}

/// One process line in the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessStats {
    /// Process id.
    pub pid: u32,
    /// Process name.
    pub name: String,
    /// Owning user, `"unknown"` when the owner cannot be resolved.
    pub username: String,
    /// Resident memory in MiB.
    pub mem: f64,
}

/// Host identity block served by the overview endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlatformInfo {
    /// OS distribution name.
    pub distro: String,
    /// Kernel release.
    pub kernel: String,
    /// Humanized uptime.
    pub uptime: String,
}

/// Push-loop payload: one host metrics reading.
#[derive(Debug, Clone, Serialize)]
pub struct HostSnapshot {
    /// CPU reading.
    pub cpu: CpuStats,
    /// Memory reading.
    pub mem: UsageStats,
    /// Root filesystem reading.
    pub disk: UsageStats,
    /// Humanized uptime.
    pub uptime: String,
    /// Top processes by resident memory.
    pub processes: Vec<ProcessStats>,
}

/// Initial-fetch payload: the snapshot plus host identity.
#[derive(Debug, Clone, Serialize)]
pub struct HostOverview {
    /// CPU reading.
    pub cpu: CpuStats,
    /// Memory reading.
    pub mem: UsageStats,
    /// Root filesystem reading.
    pub disk: UsageStats,
    /// User the service runs as.
    pub user: String,
    /// OS identity.
    pub platform: PlatformInfo,
    /// Top processes by resident memory.
    pub processes: Vec<ProcessStats>,
}

/// Blocking host collector backed by one shared `sysinfo::System`.
///
/// Concurrent sessions serialize on the inner mutex, so the process keeps a
/// single view of the machine no matter how many streams are open.
pub struct SystemCollector {
    system: Mutex<System>,
}

impl SystemCollector {
    /// Create a collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_with_specifics(refresh_kind())),
        }
    }

    /// Collect one push-loop snapshot.
    ///
    /// Blocking: samples CPU usage over a one-second window. Run it through
    /// the pool, never on the scheduler.
    pub fn snapshot(&self) -> Result<HostSnapshot, CollectError> {
        let mut system = self.system.lock();
        system.refresh_specifics(refresh_kind());
        std::thread::sleep(SAMPLE_WINDOW.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        system.refresh_specifics(refresh_kind());

        Ok(HostSnapshot {
            cpu: collect_cpu(&system),
            mem: collect_memory(&system),
            disk: collect_disk(),
            uptime: format_uptime(System::uptime()),
            processes: collect_processes(&system, TOP_PROCESSES),
        })
    }

    /// Collect the one-shot overview served by the HTTP endpoint.
    ///
    /// Blocking, like [`SystemCollector::snapshot`].
    pub fn overview(&self) -> Result<HostOverview, CollectError> {
        let snapshot = self.snapshot()?;
        let user = {
            let system = self.system.lock();
            current_user(&system)
        };
        Ok(HostOverview {
            cpu: snapshot.cpu,
            mem: snapshot.mem,
            disk: snapshot.disk,
            user,
            platform: PlatformInfo {
                distro: System::name().unwrap_or_default(),
                kernel: System::kernel_version().unwrap_or_default(),
                uptime: snapshot.uptime,
            },
            processes: snapshot.processes,
        })
    }
}

impl Default for SystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn refresh_kind() -> RefreshKind {
    RefreshKind::nothing()
        .with_cpu(CpuRefreshKind::everything())
        .with_memory(MemoryRefreshKind::everything())
        .with_processes(
            ProcessRefreshKind::nothing()
                .with_memory()
                .with_user(UpdateKind::OnlyIfNotSet),
        )
}

#[allow(clippy::cast_precision_loss)]
fn collect_cpu(system: &System) -> CpuStats {
    let freq = system.cpus().first().map_or(0, sysinfo::Cpu::frequency);
    CpuStats {
        usage: round2(f64::from(system.global_cpu_usage())),
        temp: round2(f64::from(cpu_temperature())),
        freq: round2(freq as f64),
    }
}

/// Best-effort CPU package temperature; sensors are often absent in
/// containers and virtual machines.
fn cpu_temperature() -> f32 {
    let components = Components::new_with_refreshed_list();
    let mut fallback = None;
    for component in components.list() {
        let temp = component.temperature().unwrap_or(0.0);
        let label = component.label();
        if label.contains("coretemp") || label.contains("Package") || label.contains("Tctl") {
            return temp;
        }
        if fallback.is_none() && temp > 0.0 {
            fallback = Some(temp);
        }
    }
    fallback.unwrap_or(0.0)
}

fn collect_memory(system: &System) -> UsageStats {
    let total = system.total_memory();
    let used = system.used_memory();
    UsageStats {
        total: gib(total),
        used: gib(used),
        free: gib(system.free_memory()),
        percent: percent(used, total),
    }
}

/// Root filesystem occupancy; falls back to the largest disk when nothing
/// is mounted at `/`.
fn collect_disk() -> UsageStats {
    let disks = Disks::new_with_refreshed_list();
    let root = disks
        .list()
        .iter()
        .find(|disk| disk.mount_point() == Path::new("/"))
        .or_else(|| disks.list().iter().max_by_key(|disk| disk.total_space()));
    let Some(disk) = root else {
        return UsageStats::default();
    };
    let total = disk.total_space();
    let free = disk.available_space();
    let used = total.saturating_sub(free);
    UsageStats {
        total: gib(total),
        used: gib(used),
        free: gib(free),
        percent: percent(used, total),
    }
}

fn collect_processes(system: &System, limit: usize) -> Vec<ProcessStats> {
    let users = Users::new_with_refreshed_list();
    let mut processes: Vec<ProcessStats> = system
        .processes()
        .values()
        .map(|process| {
            let username = process
                .user_id()
                .and_then(|uid| users.get_user_by_id(uid))
                .map_or_else(|| String::from("unknown"), |user| user.name().to_string());
            ProcessStats {
                pid: process.pid().as_u32(),
                name: process.name().to_string_lossy().to_string(),
                username,
                mem: mib2(process.memory()),
            }
        })
        .collect();
    processes.sort_by(|a, b| b.mem.partial_cmp(&a.mem).unwrap_or(std::cmp::Ordering::Equal));
    processes.truncate(limit);
    processes
}

fn current_user(system: &System) -> String {
    let users = Users::new_with_refreshed_list();
    sysinfo::get_current_pid()
        .ok()
        .and_then(|pid| system.processes().get(&pid))
        .and_then(sysinfo::Process::user_id)
        .and_then(|uid| users.get_user_by_id(uid))
        .map(|user| user.name().to_string())
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| String::from("unknown"))
}

/// Humanize seconds as `"1 day, 2 hours, 3 minutes, 4 seconds"`, with
/// singular forms and leading segments elided while they are zero.
fn format_uptime(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days} {}, ", if days == 1 { "day" } else { "days" }));
    }
    if !out.is_empty() || hours > 0 {
        out.push_str(&format!(
            "{hours} {}, ",
            if hours == 1 { "hour" } else { "hours" }
        ));
    }
    if !out.is_empty() || minutes > 0 {
        out.push_str(&format!(
            "{minutes} {}, ",
            if minutes == 1 { "minute" } else { "minutes" }
        ));
    }
    out.push_str(&format!(
        "{seconds} {}",
        if seconds == 1 { "second" } else { "seconds" }
    ));
    out
}
