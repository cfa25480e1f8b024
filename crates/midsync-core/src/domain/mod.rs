//! Domain entities and business logic
//!
//! This module contains the core domain types for midsync:
//! - Newtypes for remote identifiers, server paths and checksums
//! - The remote store model (listings, item details, principals, sessions)
//! - The diff report and mirror summary
//! - Run settings
//! - Domain-specific error types

pub mod errors;
pub mod newtypes;
pub mod remote;
pub mod report;
pub mod settings;

// Re-export commonly used types
pub use errors::DomainError;
pub use newtypes::*;
pub use remote::{
    Bitstream, CommunityInfo, FolderDetail, FolderListing, FolderRef, ItemDetail, ItemRef,
    Revision, Session, UserInfo,
};
pub use report::{
    DeletionDecision, DiffReport, LocalFileEntry, MirrorAction, MirrorFailure, MirrorOutcome,
    MirrorSummary, NeedsUpdate, OnlyLocal, OnlyRemote, RemoteFolderEntry, RemoteItemEntry,
    Unverified, UnverifiedEntry, UpdateEntry,
};
pub use settings::{normalize_endpoint, Credentials, SyncMode, SyncSettings, DEFAULT_APP_NAME};
