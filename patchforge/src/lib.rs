//! Patchforge - version-state coordination for binary asset patches.
//!
//! This library manages the lifecycle of a binary patch applied to a
//! user-owned asset file: discovering which remote versions are
//! compatible with the file's current content, downloading a chosen
//! patch, applying it, detecting which version is currently applied
//! purely from content hashes, and reverting to the original.
//!
//! The core pieces:
//! - [`coordinator::VersionCoordinator`] - single-flight operation
//!   orchestration over the session state
//! - [`identity`] - content-hash identity and applied-state detection
//! - [`patch`] - the reversible byte combination
//! - [`backup`] - pristine backup create/restore
//! - [`version`] - catalog entries, selection and on-disk layout
//! - [`net`] / [`files`] - the external service seams

pub mod backup;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod files;
pub mod hash;
pub mod identity;
pub mod net;
pub mod patch;
pub mod session;
pub mod version;

pub use config::EngineConfig;
pub use coordinator::{ApplyStage, VersionCoordinator};
pub use error::{EngineError, EngineResult};
pub use files::{FileManagerService, LocalFileManager};
pub use net::{HttpNetworkService, NetworkService};
pub use session::{OpCategory, SessionSnapshot};
pub use version::{Catalog, Scope, VersionEntry, VersionLayout};
