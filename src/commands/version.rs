//! Command: print version information.

/// Version string, from `KERNEL_SETTINGS_VERSION` at build time when set.
#[must_use]
pub fn version() -> &'static str {
    option_env!("KERNEL_SETTINGS_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the kernel-settings version to stdout.
pub fn run() {
    println!("kernel-settings {}", version());
}
