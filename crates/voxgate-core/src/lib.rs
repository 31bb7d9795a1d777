//! Configuration loading and secret redaction for the voxgate gateway.

pub mod config;
pub mod redact;

pub use config::{Config, ConfigError, ProviderKind};
