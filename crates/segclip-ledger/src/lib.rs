//! Flat-file ledger of uploaded videos.
//!
//! The ledger is one JSON document (`{ "videos": [...] }`) that is the
//! single source of truth. Every operation reloads the whole file,
//! mutates an in-memory copy and rewrites the whole file. That trades
//! performance for crash safety; concurrent processes sharing one store
//! file are not supported.

pub mod error;
pub mod ledger;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{CleanupReport, RecordUpdate, RemoteFileCheck, VideoLedger};
