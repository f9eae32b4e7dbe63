//! Session state owned by the coordinator.
//!
//! All mutable engine state lives here, single-writer (the
//! coordinator), multi-reader (snapshots). The four single-flight
//! flags are the central invariant: each goes `false -> true` at
//! operation entry, rejecting re-entry, and back to `false` on every
//! exit path.

use std::fmt;

use crate::error::{EngineError, EngineResult};
use crate::version::{Catalog, VersionEntry};

/// The four single-flight operation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCategory {
    /// Catalog fetch.
    Fetch,
    /// Patch archive download.
    Download,
    /// Version payload deletion.
    Delete,
    /// Apply or reset.
    Apply,
}

impl OpCategory {
    /// All categories, in flag order.
    pub const ALL: [OpCategory; 4] = [Self::Fetch, Self::Download, Self::Delete, Self::Apply];

    fn index(self) -> usize {
        match self {
            Self::Fetch => 0,
            Self::Download => 1,
            Self::Delete => 2,
            Self::Apply => 3,
        }
    }
}

impl fmt::Display for OpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Download => "download",
            Self::Delete => "delete",
            Self::Apply => "apply",
        };
        write!(f, "{}", name)
    }
}

/// Mutable session state, exclusively owned by the coordinator.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Hash used to query the remote catalog (pristine content).
    pub identity_hash: Option<String>,

    /// Hash of the target file as it exists right now.
    pub current_file_hash: Option<String>,

    /// Last fetched catalog; replaced wholesale, never merged.
    pub catalog: Option<Catalog>,

    /// Version currently detected as applied, re-derived from content.
    pub applied_version: Option<VersionEntry>,

    /// Version the next apply/download acts on.
    pub selected_version: Option<VersionEntry>,

    in_flight: [bool; 4],
    errors: [Option<String>; 4],
}

impl SessionState {
    /// Mark an operation category as entered.
    ///
    /// Rejects re-entry while the same category is mid-flight, and
    /// clears the category's sticky error for the new attempt.
    pub fn begin(&mut self, category: OpCategory) -> EngineResult<()> {
        let slot = &mut self.in_flight[category.index()];
        if *slot {
            return Err(EngineError::OperationInFlight(category));
        }
        *slot = true;
        self.errors[category.index()] = None;
        Ok(())
    }

    /// Clear an operation category's in-flight flag.
    pub fn finish(&mut self, category: OpCategory) {
        self.in_flight[category.index()] = false;
    }

    /// Whether an operation of this category is in flight.
    pub fn is_in_flight(&self, category: OpCategory) -> bool {
        self.in_flight[category.index()]
    }

    /// Record the sticky error message for a category.
    ///
    /// Displayed until the next attempt of the same category clears it.
    pub fn set_error(&mut self, category: OpCategory, message: impl Into<String>) {
        self.errors[category.index()] = Some(message.into());
    }

    /// The sticky error message for a category, if any.
    pub fn error(&self, category: OpCategory) -> Option<&str> {
        self.errors[category.index()].as_deref()
    }

    /// Replace the applied version, skipping the assignment when the
    /// newly resolved version has the same identity as the recorded
    /// one. The skip avoids spurious change notifications downstream.
    ///
    /// Returns true if the value changed.
    pub fn update_applied(&mut self, resolved: Option<VersionEntry>) -> bool {
        if self.applied_version == resolved {
            return false;
        }
        self.applied_version = resolved;
        true
    }

    /// Drop all state derived from the catalog and the target file.
    ///
    /// Used when no identity hash can be computed: the engine clears
    /// rather than guesses.
    pub fn clear_derived(&mut self) {
        self.identity_hash = None;
        self.current_file_hash = None;
        self.catalog = None;
        self.applied_version = None;
        self.selected_version = None;
    }

    /// Cheap copyable view for observers.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            identity_hash: self.identity_hash.clone(),
            current_file_hash: self.current_file_hash.clone(),
            catalog_len: self.catalog.as_ref().map(|c| c.versions.len()),
            applied_version: self.applied_version.clone(),
            selected_version: self.selected_version.clone(),
            in_flight: self.in_flight,
            errors: self.errors.clone(),
        }
    }
}

/// Read-only view of the session published to observers.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub identity_hash: Option<String>,
    pub current_file_hash: Option<String>,
    /// Number of catalog entries, or `None` when no catalog is held.
    pub catalog_len: Option<usize>,
    pub applied_version: Option<VersionEntry>,
    pub selected_version: Option<VersionEntry>,
    in_flight: [bool; 4],
    errors: [Option<String>; 4],
}

impl SessionSnapshot {
    /// Whether an operation of this category was in flight.
    pub fn is_in_flight(&self, category: OpCategory) -> bool {
        self.in_flight[category.index()]
    }

    /// The sticky error message for a category, if any.
    pub fn error(&self, category: OpCategory) -> Option<&str> {
        self.errors[category.index()].as_deref()
    }
}
