//! Version catalog: entries, selection logic and on-disk layout.

mod catalog;
mod entry;
mod layout;

pub(crate) use layout::sanitize;

pub use catalog::{Catalog, CatalogResponse};
pub use entry::{Scope, VersionEntry};
pub use layout::{
    VersionLayout, AVATAR_DEFAULT_FILE, AVATAR_PATCHED_FILE, CUSTOM_LOGIC_FILE, LOGIC_PACKAGE_FILE,
    PATCH_FILE,
};
