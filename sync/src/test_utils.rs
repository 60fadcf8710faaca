//! Shared test utilities for building archives and bundle fixtures.
//!
//! Available to unit tests and, through the `test-support` feature, to
//! integration tests.

use crate::bundle::{BundleDescriptor, ManifestConvention};
use crate::manifest::Manifest;
use camino::Utf8Path;
use std::io::{Cursor, Write};
use std::path::Path;

/// Build an in-memory zip archive from `(path, contents)` pairs.
///
/// # Panics
///
/// Panics if the archive cannot be written.
#[must_use]
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(contents).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Write a zip archive to `path`.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    std::fs::write(path, zip_bytes(entries)).expect("write zip archive");
}

/// Write a `.tar.zst` archive to `path`.
///
/// # Panics
///
/// Panics if the archive cannot be written.
pub fn write_tar_zst(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create archive");
    let encoder = zstd::Encoder::new(file, 0).expect("zstd encoder");
    let encoder = append_tar_entries(encoder, entries);
    encoder.finish().expect("zstd finish");
}

/// Write a `.tar.gz` archive to `path`.
///
/// # Panics
///
/// Panics if the archive cannot be written.
pub fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create archive");
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let encoder = append_tar_entries(encoder, entries);
    encoder.finish().expect("gzip finish");
}

fn append_tar_entries<W: Write>(writer: W, entries: &[(&str, &[u8])]) -> W {
    let mut builder = tar::Builder::new(writer);
    for (name, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *contents)
            .expect("append tar entry");
    }
    builder.into_inner().expect("tar finish")
}

/// The convention used by the CloudProof WebAssembly archives.
#[must_use]
pub fn cloudproof_convention() -> ManifestConvention {
    ManifestConvention::new("wasm32-unknown-unknown", "cloudproof_")
}

/// A descriptor for `name` following [`cloudproof_convention`].
#[must_use]
pub fn cloudproof_bundle(name: &str) -> BundleDescriptor {
    BundleDescriptor::new(name, cloudproof_convention())
}

/// Archive entries satisfying `manifest`, each file holding distinct bytes
/// derived from its source path.
#[must_use]
pub fn archive_entries_for(manifest: &Manifest) -> Vec<(String, Vec<u8>)> {
    manifest
        .iter()
        .map(|entry| {
            (
                entry.source.to_string(),
                format!("contents of {}", entry.source).into_bytes(),
            )
        })
        .collect()
}

/// Zip archive bytes satisfying `manifest`.
#[must_use]
pub fn zip_for_manifest(manifest: &Manifest) -> Vec<u8> {
    let owned = archive_entries_for(manifest);
    let entries: Vec<(&str, &[u8])> = owned
        .iter()
        .map(|(name, contents)| (name.as_str(), contents.as_slice()))
        .collect();
    zip_bytes(&entries)
}

/// Create every destination of `manifest` with placeholder contents.
///
/// # Panics
///
/// Panics if a file cannot be created.
pub fn populate_destinations(manifest: &Manifest) {
    for entry in manifest {
        if let Some(parent) = entry.destination.parent() {
            std::fs::create_dir_all(parent).expect("create destination parent");
        }
        std::fs::write(&entry.destination, b"already here").expect("write destination");
    }
}

/// Whether `dir` exists and has no entries.
///
/// # Panics
///
/// Panics if the directory cannot be read.
#[must_use]
pub fn is_empty_dir(dir: &Utf8Path) -> bool {
    std::fs::read_dir(dir)
        .expect("read staging parent")
        .next()
        .is_none()
}
