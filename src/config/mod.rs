//! Engine settings and desired-state input.
//!
//! - [`settings`]: per-invocation engine settings (TOML)
//! - [`document`]: reading YAML / JSON / TOML desired-state documents
//! - [`validation`]: structural checks producing a [`desired::DesiredState`]
//! - [`ini`]: the INI dialect used by tuned profiles
pub mod desired;
pub mod document;
pub mod ini;
pub mod messages;
pub mod settings;
pub mod toml_loader;
pub mod validation;
