//! Kernel settings engine.
//!
//! Merges a declarative desired-state document into a tuned profile and
//! reports whether anything changed and whether a reboot is needed. Running
//! the same document twice changes nothing the second time.
//!
//! The public API is organised into these layers:
//!
//! - **[`config`]**: engine settings, document loading and validation
//! - **[`profile`]**: the profile model, merge engine, storage and activation
//! - **[`discovery`]**: read-only report of current system settings
//! - **[`commands`]**: top-level subcommand orchestration (`apply`, `validate`, `show`, `report`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod profile;
