//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the synchronization
//! engine depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Remote folder/item store (Midas web API)
//! - [`ILocalFileSystem`] - Local directory listing and checksums
//! - [`IConfirmation`] - Yes/no decisions before irreversible steps
//! - [`IReportPresenter`] - Rendering of diff reports and mirror summaries

pub mod confirmation;
pub mod local_filesystem;
pub mod presenter;
pub mod remote_store;

pub use confirmation::{FixedAnswer, IConfirmation};
pub use local_filesystem::{is_hidden, ILocalFileSystem, LocalLevel, HIDDEN_PREFIX};
pub use presenter::{IReportPresenter, ReportStage};
pub use remote_store::IRemoteStore;
