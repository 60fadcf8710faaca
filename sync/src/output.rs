//! Output formatting for the sync CLI.
//!
//! Progress lines go to an injected writer (stderr in the binary) so tests can
//! capture them. Diagnostic detail goes through the `log` facade instead.

use crate::orchestrator::{SyncOutcome, SyncPlan};
use crate::presence::Presence;
use std::fmt::Display;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort progress output; ignore write failures.
    }
}

/// One-line summary of a bundle set's outcome.
///
/// ```
/// use wasm_artefact_sync::artefact_name::Version;
/// use wasm_artefact_sync::orchestrator::SyncOutcome;
/// use wasm_artefact_sync::output::outcome_message;
///
/// let outcome = SyncOutcome::Synced {
///     version: Version::from("v2.4.0"),
///     placed: 1,
///     attempts: 1,
/// };
/// assert_eq!(
///     outcome_message("cloudproof-wasm", &outcome),
///     "cloudproof-wasm: placed 1 file from v2.4.0",
/// );
/// ```
#[must_use]
pub fn outcome_message(label: &str, outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Satisfied => format!("{label}: files are present, skipping download"),
        SyncOutcome::Synced {
            version, placed, ..
        } => {
            let plural = if *placed == 1 { "file" } else { "files" };
            format!("{label}: placed {placed} {plural} from {version}")
        }
        SyncOutcome::Failed { failures } => {
            let tried: Vec<String> = failures.iter().map(|f| f.version.to_string()).collect();
            format!(
                "{label}: could not be synchronised (tried {})",
                tried.join(", ")
            )
        }
    }
}

/// Describe a plan and the current presence of its files for `--dry-run`.
#[must_use]
pub fn dry_run_text(plan: &SyncPlan, presence: &Presence) -> String {
    let mut lines = vec![
        format!("Bundle set: {}", plan.label),
        format!("URL template: {}", plan.url_template),
        format!("Primary version: {}", plan.primary_version),
        format!(
            "Fallback version: {}",
            plan.fallback_version
                .as_ref()
                .map_or_else(|| "(none)".to_owned(), ToString::to_string)
        ),
        format!("Destination root: {}", plan.destination_root),
        "Bundles:".to_owned(),
    ];
    for bundle in &plan.bundles {
        lines.push(format!("  - {}", bundle.name));
    }
    match presence {
        Presence::Complete => lines.push("Status: all files present".to_owned()),
        Presence::Incomplete { missing } => {
            lines.push(format!("Status: {} file(s) missing", missing.len()));
            for path in missing {
                lines.push(format!("  - {path}"));
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artefact_name::Version;
    use crate::fetch::FetchError;
    use crate::orchestrator::{AttemptError, AttemptFailure};
    use rstest::rstest;

    #[rstest]
    #[case::singular(1, "placed 1 file from")]
    #[case::plural(24, "placed 24 files from")]
    fn synced_message_pluralises(#[case] placed: usize, #[case] expected: &str) {
        let outcome = SyncOutcome::Synced {
            version: Version::from("v1"),
            placed,
            attempts: 1,
        };
        assert!(outcome_message("set", &outcome).contains(expected));
    }

    #[test]
    fn failure_message_lists_tried_versions() {
        let failure = |version: &str| AttemptFailure {
            version: Version::from(version),
            url: format!("https://example.test/{version}/wasm.zip"),
            error: AttemptError::Transport(FetchError::NotFound {
                url: format!("https://example.test/{version}/wasm.zip"),
            }),
        };
        let outcome = SyncOutcome::Failed {
            failures: vec![failure("v2.4.0"), failure("last_build")],
        };
        let message = outcome_message("cloudproof-wasm", &outcome);
        assert!(message.contains("v2.4.0, last_build"));
    }

    #[test]
    fn write_failures_are_ignored() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        write_stderr_line(&mut Broken, "ignored");
    }
}
