//! # BPMN revisions
//!
//! `bpmn-revisions` keeps versioned revisions of Business Process Model and Notation (BPMN) 2.0
//! process definitions.
//!
//! - Validate a definition before it is stored: structure, reachability, gateways, events and tasks.
//! - Repair benign omissions such as an `ioSpecification` without `outputSet`.
//! - Compare two definitions and classify the change as MAJOR, MINOR or PATCH.
//! - Every process has exactly one current revision and an append-only history.
//! - Concurrent writers on the same process are detected, never silently overwritten.
//!
//! This is not an execution engine. Documents are inspected, never run.
//!
//! ## Example
//!
//! ### Cargo.toml
//! ```toml
//! [dependencies]
//! bpmn-revisions = "0.1"
//! log = "0.4"
//! pretty_env_logger = "0.5"
//! ```
//! ### main.rs
//!
//! ```
//! use bpmn_revisions::{ChangeType, VersionManager};
//!
//! static ORDER: &str = include_str!("../tests/files/order.bpmn");
//! static ORDER_ARCHIVE: &str = include_str!("../tests/files/order_archive.bpmn");
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     pretty_env_logger::init();
//!
//!     let manager = VersionManager::in_memory();
//!     let first = manager.create_version("order", ORDER, "alice", "Initial version")?;
//!     let second = manager.create_version("order", ORDER_ARCHIVE, "bob", "Archive step")?;
//!     assert_eq!(second.change(), ChangeType::Minor);
//!
//!     // Roll back
//!     manager.activate("order", &first.version())?;
//!     for entry in manager.history("order")? {
//!         println!("{entry}");
//!     }
//!     Ok(())
//! }
//! ```

mod api;
mod bpmn;
mod compare;
mod document;
mod error;
mod manager;
mod normalize;
mod store;
mod validation;
mod version;

pub use api::{ChangeType, CurrentDefinition, HistoryEntry, Revision, RevisionStatus};
pub use bpmn::{ActivityType, EventType, GatewayType, NodeKind, Symbol};
pub use compare::{
    AttributeChange, ComparisonResult, VersionComparison, classify, compare, compare_documents,
    compare_versions, has_significant_changes,
};
pub use document::{EventDefinition, Flow, Node, ParsedDocument, ProcessInfo};
pub use error::{Error, ErrorKind, Result};
pub use manager::VersionManager;
pub use normalize::{needs_normalization, normalize};
pub use store::{Commit, MemoryStore, RevisionStore};
pub use validation::{ValidationOutcome, validate, validate_all, validate_document};
pub use version::Version;
