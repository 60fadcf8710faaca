//! Archive extraction into a staging tree.
//!
//! Supports the container formats prebuilt bundles are published in and
//! guards every entry against path traversal (zip-slip). Tar link entries are
//! rejected outright; bundles never need them. The destination is
//! wiped before extraction so nothing from an earlier attempt survives.

use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

/// Trait for extracting archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use wasm_artefact_sync::extract::AutoExtractor;
///
/// let extractor = AutoExtractor;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Any existing `dest_dir` is removed first. Returns the archive-relative
    /// paths of the extracted files.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape the destination directory, [`ExtractionError::EmptyArchive`] if
    /// no files are found, [`ExtractionError::Corrupt`] for unreadable
    /// containers and [`ExtractionError::Io`] on I/O failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<String>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive is not a valid container or is truncated.
    #[error("corrupt archive {path}: {reason}")]
    Corrupt {
        /// The archive file.
        path: String,
        /// What the decoder reported.
        reason: String,
    },

    /// The archive file name does not identify a supported format.
    #[error("unsupported archive format: {name}")]
    UnsupportedFormat {
        /// The archive file name.
        name: String,
    },

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Container formats recognised from the archive file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// A zip file.
    Zip,
    /// A tar stream compressed with zstd.
    TarZstd,
    /// A tar stream compressed with gzip.
    TarGzip,
}

impl ArchiveKind {
    /// Detect the format from a file name's extension.
    ///
    /// ```
    /// use wasm_artefact_sync::extract::ArchiveKind;
    ///
    /// assert_eq!(ArchiveKind::from_file_name("wasm.zip"), Some(ArchiveKind::Zip));
    /// assert_eq!(ArchiveKind::from_file_name("fpe.tgz"), Some(ArchiveKind::TarGzip));
    /// assert_eq!(ArchiveKind::from_file_name("wasm.rar"), None);
    /// ```
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.zst") || lower.ends_with(".tzst") {
            Some(Self::TarZstd)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGzip)
        } else {
            None
        }
    }
}

/// Default extractor choosing the decoder from the archive's file name.
pub struct AutoExtractor;

impl ArchiveExtractor for AutoExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<String>, ExtractionError> {
        let name = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = ArchiveKind::from_file_name(&name)
            .ok_or(ExtractionError::UnsupportedFormat { name })?;

        reset_dir(dest_dir)?;
        let extracted = match kind {
            ArchiveKind::Zip => extract_zip(archive_path, dest_dir)?,
            ArchiveKind::TarZstd => {
                let decoder = zstd::Decoder::new(fs::File::open(archive_path)?)?;
                extract_tar(decoder, archive_path, dest_dir)?
            }
            ArchiveKind::TarGzip => {
                let decoder = flate2::read::GzDecoder::new(fs::File::open(archive_path)?);
                extract_tar(decoder, archive_path, dest_dir)?
            }
        };

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }
        Ok(extracted)
    }
}

/// Remove `dir` if present and recreate it empty.
fn reset_dir(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<Vec<String>, ExtractionError> {
    let corrupt = |e: zip::result::ZipError| ExtractionError::Corrupt {
        path: archive_path.display().to_string(),
        reason: e.to_string(),
    };
    let mut archive = zip::ZipArchive::new(fs::File::open(archive_path)?).map_err(corrupt)?;
    let mut extracted = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(corrupt)?;
        let entry_path = entry
            .enclosed_name()
            .ok_or_else(|| ExtractionError::PathTraversal {
                path: entry.name().to_owned(),
            })?;
        validate_entry_path(&entry_path)?;

        let dest_path = dest_dir.join(&entry_path);
        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&dest_path)?;
        io::copy(&mut entry, &mut out).map_err(|e| ExtractionError::Corrupt {
            path: archive_path.display().to_string(),
            reason: e.to_string(),
        })?;
        extracted.push(relative_name(&entry_path));
    }

    Ok(extracted)
}

fn extract_tar<R: Read>(
    reader: R,
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<String>, ExtractionError> {
    let corrupt = |e: io::Error| ExtractionError::Corrupt {
        path: archive_path.display().to_string(),
        reason: e.to_string(),
    };
    let mut archive = tar::Archive::new(reader);
    let mut extracted = Vec::new();

    for entry_result in archive.entries().map_err(corrupt)? {
        let mut entry = entry_result.map_err(corrupt)?;
        let entry_path: PathBuf = entry.path().map_err(corrupt)?.into_owned();
        validate_entry_path(&entry_path)?;
        let entry_type = entry.header().entry_type();
        if entry_type.is_symlink() || entry_type.is_hard_link() {
            return Err(ExtractionError::PathTraversal {
                path: entry_path.display().to_string(),
            });
        }

        // `unpack_in` refuses targets that resolve outside `dest_dir`.
        if !entry.unpack_in(dest_dir).map_err(corrupt)? {
            return Err(ExtractionError::PathTraversal {
                path: entry_path.display().to_string(),
            });
        }

        if entry.header().entry_type().is_file() {
            extracted.push(relative_name(&entry_path));
        }
    }

    Ok(extracted)
}

/// Forward-slash form of an archive path, independent of the host platform.
fn relative_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Validate that an entry path does not escape the destination directory via
/// `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{write_tar_gz, write_tar_zst, write_zip};
    use rstest::rstest;

    fn sample_entries() -> Vec<(&'static str, &'static [u8])> {
        vec![
            ("wasm32-unknown-unknown/fpe/cloudproof_fpe.js", b"js glue".as_slice()),
            (
                "wasm32-unknown-unknown/fpe/cloudproof_fpe_bg.wasm",
                b"\0asm\x01".as_slice(),
            ),
        ]
    }

    #[rstest]
    #[case::zip("wasm.zip", write_zip as fn(&Path, &[(&str, &[u8])]))]
    #[case::tar_zst("wasm.tar.zst", write_tar_zst as fn(&Path, &[(&str, &[u8])]))]
    #[case::tar_gz("wasm.tar.gz", write_tar_gz as fn(&Path, &[(&str, &[u8])]))]
    fn extracts_every_supported_format(
        #[case] file_name: &str,
        #[case] write: fn(&Path, &[(&str, &[u8])]),
    ) {
        let temp = tempfile::tempdir().expect("temp dir");
        let archive = temp.path().join(file_name);
        write(&archive, &sample_entries());
        let dest = temp.path().join("out");

        let mut files = AutoExtractor.extract(&archive, &dest).expect("extract");
        files.sort();

        assert_eq!(
            files,
            vec![
                "wasm32-unknown-unknown/fpe/cloudproof_fpe.js",
                "wasm32-unknown-unknown/fpe/cloudproof_fpe_bg.wasm",
            ]
        );
        let wasm = fs::read(dest.join("wasm32-unknown-unknown/fpe/cloudproof_fpe_bg.wasm"))
            .expect("read extracted");
        assert_eq!(wasm, b"\0asm\x01");
    }

    #[test]
    fn stale_staging_content_is_removed() {
        let temp = tempfile::tempdir().expect("temp dir");
        let archive = temp.path().join("wasm.zip");
        write_zip(&archive, &sample_entries());
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).expect("create dest");
        fs::write(dest.join("leftover.txt"), b"old").expect("write leftover");

        AutoExtractor.extract(&archive, &dest).expect("extract");

        assert!(!dest.join("leftover.txt").exists());
    }

    #[test]
    fn truncated_zip_is_corrupt() {
        let temp = tempfile::tempdir().expect("temp dir");
        let archive = temp.path().join("wasm.zip");
        fs::write(&archive, b"PK\x03\x04 truncated").expect("write");

        let result = AutoExtractor.extract(&archive, &temp.path().join("out"));
        assert!(matches!(result, Err(ExtractionError::Corrupt { .. })));
    }

    #[test]
    fn html_error_page_is_corrupt() {
        let temp = tempfile::tempdir().expect("temp dir");
        let archive = temp.path().join("wasm.tar.gz");
        fs::write(&archive, b"<html>Not Found</html>").expect("write");

        let result = AutoExtractor.extract(&archive, &temp.path().join("out"));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let temp = tempfile::tempdir().expect("temp dir");
        let archive = temp.path().join("wasm.7z");
        fs::write(&archive, b"whatever").expect("write");

        let result = AutoExtractor.extract(&archive, &temp.path().join("out"));
        assert!(matches!(
            result,
            Err(ExtractionError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn empty_archive_is_rejected() {
        let temp = tempfile::tempdir().expect("temp dir");
        let archive = temp.path().join("empty.zip");
        write_zip(&archive, &[]);

        let result = AutoExtractor.extract(&archive, &temp.path().join("out"));
        assert!(matches!(result, Err(ExtractionError::EmptyArchive)));
    }

    #[test]
    fn tar_link_entries_cannot_redirect_writes() {
        let temp = tempfile::tempdir().expect("temp dir");
        let outside = temp.path().join("outside");
        fs::create_dir_all(&outside).expect("create outside dir");
        let archive = temp.path().join("wasm.tar.gz");

        let file = fs::File::create(&archive).expect("create archive");
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut link = tar::Header::new_gnu();
        link.set_entry_type(tar::EntryType::Symlink);
        link.set_size(0);
        link.set_mode(0o777);
        link.set_link_name(&outside).expect("link target");
        link.set_cksum();
        builder
            .append_data(&mut link, "link", io::empty())
            .expect("append link");
        let payload = b"escaped";
        let mut header = tar::Header::new_gnu();
        header.set_size(payload.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "link/evil.txt", payload.as_slice())
            .expect("append file");
        builder
            .into_inner()
            .expect("tar finish")
            .finish()
            .expect("gzip finish");

        let result = AutoExtractor.extract(&archive, &temp.path().join("out"));

        assert!(
            matches!(result, Err(ExtractionError::PathTraversal { .. })),
            "expected PathTraversal, got {result:?}"
        );
        assert!(!outside.join("evil.txt").exists());
    }

    #[rstest]
    #[case::parent_dir("../escape.txt")]
    #[case::nested_parent("foo/../../escape.txt")]
    #[case::absolute("/etc/passwd")]
    fn rejects_path_traversal(#[case] bad_path: &str) {
        let result = validate_entry_path(Path::new(bad_path));
        assert!(
            matches!(result, Err(ExtractionError::PathTraversal { .. })),
            "expected PathTraversal for {bad_path}"
        );
    }

    #[test]
    fn accepts_normal_paths() {
        assert!(validate_entry_path(Path::new("wasm32-unknown-unknown/fpe/a.js")).is_ok());
    }
}
