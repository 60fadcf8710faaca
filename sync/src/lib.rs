//! WebAssembly artefact synchronisation library.
//!
//! This crate fetches prebuilt WebAssembly bundles from a package server and
//! places their files in a source tree before packaging. It is used by the
//! `wasm-artefact-sync` CLI binary and can be driven programmatically, for
//! example from a build script or a test harness.
//!
//! # Modules
//!
//! - [`artefact_name`] - Semantic wrappers for bundle names and versions
//! - [`bundle`] - Bundle descriptors and their file naming convention
//! - [`checksum`] - SHA-256 pins for downloaded archives
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration of bundle sets and transport
//! - [`context`] - Detection of automated (CI) execution
//! - [`error`] - Configuration and CLI error types
//! - [`extract`] - Archive extraction with path traversal guards
//! - [`fetch`] - Archive download over HTTP
//! - [`manifest`] - Archive-to-destination file mappings
//! - [`orchestrator`] - The fetch, extract and place pipeline
//! - [`output`] - Progress and dry-run output
//! - [`placer`] - Copying staged files to their destinations
//! - [`presence`] - Presence check that short-circuits downloads
//! - [`staging`] - Scoped temporary staging areas
//! - [`url_template`] - Download URL templates

pub mod artefact_name;
pub mod bundle;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod placer;
pub mod presence;
pub mod staging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod url_template;
