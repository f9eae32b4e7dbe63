//! CLI command implementations.

pub mod apply;
pub mod common;
pub mod delete;
pub mod download;
pub mod fetch;
pub mod reset;
pub mod status;
pub mod versions;
