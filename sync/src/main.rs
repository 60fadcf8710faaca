//! `wasm-artefact-sync` CLI entrypoint.
//!
//! Loads the bundle set configuration, then synchronises each selected set in
//! order. A failed set is reported on stderr; the process only exits with
//! status 1 for it when `--strict` is given.

use camino::Utf8PathBuf;
use clap::Parser;
use log::{debug, error};
use std::io::Write;
use wasm_artefact_sync::cli::Cli;
use wasm_artefact_sync::config::SyncConfig;
use wasm_artefact_sync::error::{Result, SyncError};
use wasm_artefact_sync::extract::AutoExtractor;
use wasm_artefact_sync::fetch::LazyHttpFetcher;
use wasm_artefact_sync::orchestrator::{SyncOrchestrator, SyncOutcome, SyncPlan};
use wasm_artefact_sync::output::{dry_run_text, outcome_message, write_stderr_line};
use wasm_artefact_sync::presence::check_presence;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_filter().as_str()),
    )
    .init();

    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let cwd = Utf8PathBuf::try_from(std::env::current_dir()?).map_err(|e| {
        SyncError::InvalidConfig {
            reason: format!("current directory is not valid UTF-8: {e}"),
        }
    })?;
    let mut config = SyncConfig::discover(cli.config.as_deref(), &cwd)?;
    cli.apply_overrides(&mut config);
    let plans = config.plans(&cli.sets)?;

    if cli.dry_run {
        print_dry_run(&plans, stderr);
        return Ok(());
    }

    let context = cli.execution_context(&config.ci_env_var);
    debug!("execution context: {context:?}");
    let fetcher = LazyHttpFetcher::new(config.transport());
    let extractor = AutoExtractor;
    let orchestrator = SyncOrchestrator::new(&fetcher, &extractor, context)
        .with_staging_parent(config.staging_dir.clone())
        .quiet(cli.quiet);

    let failed = sync_all(&orchestrator, &plans, cli.quiet, stderr);
    failure_verdict(&failed, cli.strict, stderr)
}

/// Prints each plan and its presence status without side effects.
fn print_dry_run(plans: &[SyncPlan], stderr: &mut dyn Write) {
    write_stderr_line(stderr, "Dry run - no files will be downloaded");
    for plan in plans {
        write_stderr_line(stderr, "");
        let presence = check_presence(&plan.manifest());
        write_stderr_line(stderr, dry_run_text(plan, &presence));
    }
}

/// Runs every plan in order and returns the labels of the failed ones.
fn sync_all(
    orchestrator: &SyncOrchestrator<'_>,
    plans: &[SyncPlan],
    quiet: bool,
    stderr: &mut dyn Write,
) -> Vec<String> {
    let mut failed = Vec::new();
    for plan in plans {
        let outcome = orchestrator.sync(plan, stderr);
        let already_reported = matches!(outcome, SyncOutcome::Satisfied);
        if !already_reported && (!quiet || !outcome.is_success()) {
            write_stderr_line(stderr, outcome_message(&plan.label, &outcome));
        }
        if !outcome.is_success() {
            failed.push(plan.label.clone());
        }
    }
    failed
}

/// Maps the failed sets to the run result. Failures are fatal only with
/// `--strict`.
fn failure_verdict(failed: &[String], strict: bool, stderr: &mut dyn Write) -> Result<()> {
    if failed.is_empty() {
        return Ok(());
    }
    let err = SyncError::SetsFailed {
        count: failed.len(),
        names: failed.join(", "),
    };
    if strict {
        return Err(err);
    }
    error!("{err}");
    write_stderr_line(stderr, err);
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}
