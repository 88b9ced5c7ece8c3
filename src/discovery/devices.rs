//! Settings tied to individual devices (cpus, disks, SCSI hosts, USB).
use std::path::Path;

use indexmap::IndexMap;

use super::{DeviceSetting, Discovery, selected};
use crate::logging::Log;

const CPU_DIR: &str = "/sys/devices/system/cpu";
const BLOCK_DIR: &str = "/sys/block";
const SCSI_HOST_DIR: &str = "/sys/class/scsi_host";
const USB_DIR: &str = "/sys/bus/usb/devices";

/// Collect device-specific settings keyed by setting name.
pub(super) fn collect(discovery: &Discovery, log: &dyn Log) -> IndexMap<String, Vec<DeviceSetting>> {
    let mut found = Found::default();
    cpus(discovery, &mut found, log);
    blocks(discovery, &mut found, log);
    scsi_hosts(discovery, &mut found, log);
    usb(discovery, &mut found, log);
    found.0
}

#[derive(Default)]
struct Found(IndexMap<String, Vec<DeviceSetting>>);

impl Found {
    fn push(&mut self, setting: &str, device: &str, value: Option<String>) {
        if let Some(value) = value {
            self.0
                .entry(setting.to_string())
                .or_default()
                .push(DeviceSetting {
                    device: device.to_string(),
                    value,
                });
        }
    }
}

fn cpus(discovery: &Discovery, found: &mut Found, log: &dyn Log) {
    let mut cpus: Vec<(u32, String)> = entries(&discovery.resolve(CPU_DIR))
        .into_iter()
        .filter_map(|name| {
            let index = name.strip_prefix("cpu")?.parse().ok()?;
            Some((index, name))
        })
        .collect();
    cpus.sort_unstable();

    for (_, cpu) in &cpus {
        let governor = discovery.read(&format!("{CPU_DIR}/{cpu}/cpufreq/scaling_governor"));
        if let Some(governor) = &governor {
            found.push(
                "sampling_down_factor",
                cpu,
                discovery.read(&format!("{CPU_DIR}/cpufreq/{governor}/sampling_down_factor")),
            );
        }
        found.push("cpu_governor", cpu, governor);
    }
    log.debug(&format!("found {} cpu(s)", cpus.len()));
}

fn blocks(discovery: &Discovery, found: &mut Found, log: &dyn Log) {
    let blocks = entries(&discovery.resolve(BLOCK_DIR));
    for block in &blocks {
        let queue = format!("{BLOCK_DIR}/{block}/queue");
        let Some(schedulers) = discovery.read(&format!("{queue}/scheduler")) else {
            continue;
        };
        found.push(
            "disk_elevator",
            block,
            selected(&schedulers).map(String::from),
        );
        found.push(
            "disk_read_ahead_kb",
            block,
            discovery.read(&format!("{queue}/read_ahead_kb")),
        );
        found.push(
            "disk_scheduler_quantum",
            block,
            discovery.read(&format!("{queue}/iosched/quantum")),
        );
    }
    log.debug(&format!("found {} block device(s)", blocks.len()));
}

fn scsi_hosts(discovery: &Discovery, found: &mut Found, log: &dyn Log) {
    let hosts = entries(&discovery.resolve(SCSI_HOST_DIR));
    for host in &hosts {
        found.push(
            "scsi_host_alpm",
            host,
            discovery.read(&format!(
                "{SCSI_HOST_DIR}/{host}/link_power_management_policy"
            )),
        );
    }
    log.debug(&format!("found {} scsi host(s)", hosts.len()));
}

fn usb(discovery: &Discovery, found: &mut Found, log: &dyn Log) {
    let devices = entries(&discovery.resolve(USB_DIR));
    for device in &devices {
        found.push(
            "usb_autosuspend",
            device,
            discovery.read(&format!("{USB_DIR}/{device}/power/autosuspend")),
        );
    }
    log.debug(&format!("found {} usb device(s)", devices.len()));
}

/// Sorted entry names of a directory; empty if it cannot be read.
fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter_map(|e| e.file_name().into_string().ok())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
