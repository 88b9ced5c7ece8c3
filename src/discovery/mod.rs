//! Read-only report of commonly tuned kernel settings on a running system.
//!
//! Every path is resolved under a root directory (normally `/`) so a report
//! can be taken from a mounted image or a test fixture. A file that is
//! missing, unreadable, or empty simply leaves its setting out.
mod devices;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::logging::Log;

/// sysctl keys collected from `/proc/sys`.
pub const SYSCTL_FIELDS: &[&str] = &[
    "fs.aio-max-nr",
    "fs.file-max",
    "fs.inotify.max_user_watches",
    "kernel.hung_task_timeout_secs",
    "kernel.nmi_watchdog",
    "kernel.numa_balancing",
    "kernel.panic_on_oops",
    "kernel.pid_max",
    "kernel.printk",
    "kernel.sched_autogroup_enabled",
    "kernel.sched_latency_ns",
    "kernel.sched_migration_cost_ns",
    "kernel.sched_min_granularity_ns",
    "kernel.sched_rt_runtime_us",
    "kernel.sched_wakeup_granularity_ns",
    "kernel.sem",
    "kernel.shmall",
    "kernel.shmmax",
    "kernel.shmmni",
    "kernel.timer_migration",
    "net.core.busy_poll",
    "net.core.busy_read",
    "net.core.rmem_default",
    "net.core.rmem_max",
    "net.core.wmem_default",
    "net.core.wmem_max",
    "net.ipv4.ip_local_port_range",
    "net.ipv4.tcp_fastopen",
    "net.ipv4.tcp_rmem",
    "net.ipv4.tcp_timestamps",
    "net.ipv4.tcp_window_scaling",
    "net.ipv4.tcp_wmem",
    "net.ipv4.udp_mem",
    "net.netfilter.nf_conntrack_max",
    "vm.dirty_background_bytes",
    "vm.dirty_background_ratio",
    "vm.dirty_bytes",
    "vm.dirty_expire_centisecs",
    "vm.dirty_ratio",
    "vm.dirty_writeback_centisecs",
    "vm.hugepages_treat_as_movable",
    "vm.laptop_mode",
    "vm.max_map_count",
    "vm.min_free_kbytes",
    "vm.stat_interval",
    "vm.swappiness",
    "vm.zone_reclaim_mode",
];

/// Dirty-page limits where `0` means "use the other knob".
const UNSET_WHEN_ZERO: &[&str] = &[
    "vm.dirty_background_bytes",
    "vm.dirty_background_ratio",
    "vm.dirty_ratio",
    "vm.dirty_bytes",
];

/// sysfs files reported verbatim under the `sysfs` section.
const SYSFS_FIELDS: &[&str] = &["/sys/kernel/mm/ksm/run", "/sys/kernel/ktimer_lockless_check"];

/// How a plugin value is pulled out of its file.
#[derive(Debug, Clone, Copy)]
enum Extract {
    Raw,
    /// The `[selected]` word of a choice list such as `always [madvise] never`.
    Selected,
}

/// Settings owned by tuned plugins: `(section, option, path, extract)`.
const PLUGIN_FIELDS: &[(&str, &str, &str, Extract)] = &[
    (
        "cpu",
        "min_perf_pct",
        "/sys/devices/system/cpu/intel_pstate/min_perf_pct",
        Extract::Raw,
    ),
    (
        "cpu",
        "max_perf_pct",
        "/sys/devices/system/cpu/intel_pstate/max_perf_pct",
        Extract::Raw,
    ),
    (
        "cpu",
        "no_turbo",
        "/sys/devices/system/cpu/intel_pstate/no_turbo",
        Extract::Raw,
    ),
    (
        "net",
        "nf_conntrack_hashsize",
        "/sys/module/nf_conntrack/parameters/hashsize",
        Extract::Raw,
    ),
    (
        "selinux",
        "avc_cache_threshold",
        "/sys/fs/selinux/avc/cache_threshold",
        Extract::Raw,
    ),
    (
        "vm",
        "transparent_hugepage",
        "/sys/kernel/mm/transparent_hugepage/enabled",
        Extract::Selected,
    ),
    (
        "vm",
        "transparent_hugepage.defrag",
        "/sys/kernel/mm/transparent_hugepage/defrag",
        Extract::Selected,
    ),
];

/// A named setting and its current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Setting {
    pub name: String,
    pub value: String,
}

impl Setting {
    fn new(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// A setting tied to one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSetting {
    pub device: String,
    pub value: String,
}

/// Everything found on the system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// `/proc/sys` values, keyed by sysctl name.
    pub sysctl: Vec<Setting>,
    /// Plain sysfs values, keyed by absolute path.
    pub sysfs: Vec<Setting>,
    /// Plugin settings grouped by plugin section.
    pub plugins: IndexMap<String, Vec<Setting>>,
    /// Values that depend on a particular device; informational only.
    pub device_specific: IndexMap<String, Vec<DeviceSetting>>,
}

impl Report {
    /// Convert the report into a desired-state document.
    ///
    /// Device-specific values are left out because device names differ from
    /// one machine to the next.
    #[must_use]
    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        let sections = [("sysctl", &self.sysctl), ("sysfs", &self.sysfs)]
            .into_iter()
            .chain(self.plugins.iter().map(|(name, s)| (name.as_str(), s)));
        for (section, settings) in sections {
            if settings.is_empty() {
                continue;
            }
            let items = settings
                .iter()
                .map(|s| json!({ "name": s.name, "value": s.value }))
                .collect();
            document.insert(section.to_string(), Value::Array(items));
        }
        Value::Object(document)
    }
}

/// Collects a [`Report`] from files under a root directory.
#[derive(Debug, Clone)]
pub struct Discovery {
    root: PathBuf,
}

impl Discovery {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Read every known setting.
    #[must_use]
    pub fn collect(&self, log: &dyn Log) -> Report {
        let report = Report {
            sysctl: self.sysctl(),
            sysfs: self.sysfs(),
            plugins: self.plugins(),
            device_specific: devices::collect(self, log),
        };
        log.debug(&format!(
            "found {} sysctl, {} sysfs and {} plugin setting(s)",
            report.sysctl.len(),
            report.sysfs.len(),
            report.plugins.values().map(Vec::len).sum::<usize>()
        ));
        report
    }

    fn sysctl(&self) -> Vec<Setting> {
        SYSCTL_FIELDS
            .iter()
            .filter_map(|&name| {
                let value = self.read(&format!("/proc/sys/{}", name.replace('.', "/")))?;
                if value == "0" && UNSET_WHEN_ZERO.contains(&name) {
                    return None;
                }
                Some(Setting::new(name, value))
            })
            .collect()
    }

    fn sysfs(&self) -> Vec<Setting> {
        SYSFS_FIELDS
            .iter()
            .filter_map(|&path| Some(Setting::new(path, self.read(path)?)))
            .collect()
    }

    fn plugins(&self) -> IndexMap<String, Vec<Setting>> {
        let mut plugins: IndexMap<String, Vec<Setting>> = IndexMap::new();
        for &(section, name, path, extract) in PLUGIN_FIELDS {
            let Some(raw) = self.read(path) else {
                continue;
            };
            let value = match extract {
                Extract::Raw => Some(raw),
                Extract::Selected => selected(&raw).map(String::from),
            };
            if let Some(value) = value {
                plugins
                    .entry(section.to_string())
                    .or_default()
                    .push(Setting::new(name, value));
            }
        }
        plugins
    }

    /// Resolve an absolute system path under the root.
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    /// Read a system file, trailing whitespace removed.
    fn read(&self, path: &str) -> Option<String> {
        read_value(&self.resolve(path))
    }
}

/// Contents of `path` without trailing whitespace, or `None` when the file
/// cannot be read or is blank.
fn read_value(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let value = content.trim_end();
    (!value.is_empty()).then(|| value.to_string())
}

/// The bracketed word in a sysfs choice list.
fn selected(choices: &str) -> Option<&str> {
    let start = choices.find('[')? + 1;
    let rest = choices.get(start..)?;
    let word = rest.get(..rest.find(']')?)?;
    (!word.is_empty() && !word.contains(char::is_whitespace)).then_some(word)
}
