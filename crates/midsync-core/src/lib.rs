//! midsync Core - Domain model and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - remote identifiers, server paths, checksums, the
//!   remote store model, `DiffReport`, `MirrorSummary` and `SyncSettings`
//! - **Port definitions** - Traits for adapters: `IRemoteStore`,
//!   `ILocalFileSystem`, `IConfirmation`, `IReportPresenter`
//! - **Configuration** - YAML configuration file and run settings resolution
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure data and validation with no I/O.
//! Ports define trait interfaces that adapter crates implement; the
//! synchronization engine in `midsync-sync` drives them.

pub mod config;
pub mod domain;
pub mod ports;
