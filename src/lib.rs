//! # Groom - A CLI backlog groomer
//!
//! Groom takes a batch of raw tracker tickets and turns it into a groomed
//! backlog: items grouped into epics, rewritten as well-formed stories, bugs,
//! features and spikes, scored for effort, ROI, risk and priority, and
//! cross-checked for dependencies between them.
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a .groom.yml with team capacity and sprint goals
//! groom init --velocity 40 --goal "Improve user onboarding flow"
//!
//! # Groom an export and print the backlog
//! groom run backlog.json
//!
//! # Machine-readable result
//! groom run backlog.csv --format json
//!
//! # Compare a raw ticket with what it became
//! groom source backlog.json BUG-002
//! ```
//!
//! ## Modules
//!
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: `.groom.yml` loading and validation
//! - [`error`]: Error types and result aliases
//! - [`export`]: CSV, digest and tracker sinks
//! - [`ingest`]: Reading JSON, YAML and CSV ticket exports
//! - [`model`]: Raw records, processed items, epics and issues
//! - [`pipeline`]: The staged grooming pipeline
//! - [`search`]: Filters over processed items
//! - [`sprint`]: Sprint readiness and recommendation
//! - [`validation`]: Input validation utilities

/// Command-line interface definitions using clap.
pub mod cli;

/// Configuration loading and management.
///
/// Handles `.groom.yml` files and project discovery.
pub mod config;

/// Error types and result aliases.
///
/// Defines the `GroomError` enum and `Result<T>` type alias.
pub mod error;

pub mod export;
pub mod ingest;
pub mod logging;

/// Data models for the pipeline.
pub mod model;

pub mod pipeline;
pub mod search;
pub mod sprint;

/// Input validation utilities.
///
/// Validates ids and ticket text before they enter the pipeline.
pub mod validation;
