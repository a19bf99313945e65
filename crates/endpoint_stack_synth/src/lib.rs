//! Filesystem and process integration for the endpoint stack.
//!
//! This crate owns everything `endpoint_stack_core` deliberately leaves out:
//! resolving and staging code bundles, loading configuration from files and
//! the environment, writing the cloud assembly, and logging setup.

pub mod adapters;
pub mod assembly_writer;
pub mod commands;
pub mod settings;
pub mod telemetry;
