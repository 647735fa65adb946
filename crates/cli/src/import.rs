//! `loanrec import` and `loanrec reset`.

use std::path::PathBuf;

use serde::Serialize;

use loanrec_io::{import_files, FileOutcome};
use loanrec_recon::model::BatchReport;
use loanrec_recon::{ColumnAliases, Dataset, DatasetStore};

use crate::exit_codes::{EXIT_IMPORT_FILE_ERROR, EXIT_IMPORT_ROWS_SKIPPED};
use crate::{CliError, Context};

#[derive(Serialize)]
struct FileSummary<'a> {
    path: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a BatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a FileOutcome> for FileSummary<'a> {
    fn from(outcome: &'a FileOutcome) -> Self {
        let path = outcome.path.display().to_string();
        match &outcome.result {
            Ok(report) => Self { path, ok: true, report: Some(report), error: None },
            Err(e) => Self { path, ok: false, report: None, error: Some(e.to_string()) },
        }
    }
}

fn print_report(report: &BatchReport) {
    eprintln!(
        "{}: {} rows read, {} merged, {} skipped ({} new, {} updated)",
        report.source_file,
        report.rows_read,
        report.rows_merged,
        report.rows_skipped,
        report.records_created,
        report.records_updated,
    );
    for (reason, count) in &report.skip_reasons {
        eprintln!("  skipped {count}: {reason}");
    }
    if report.coerced_values > 0 {
        eprintln!("  {} unparseable numeric value(s) read as 0", report.coerced_values);
    }
    if report.clamped_values > 0 {
        eprintln!("  {} negative value(s) clamped to 0", report.clamped_values);
    }
    for warning in &report.collisions {
        eprintln!("  warning: {warning}");
    }
}

pub(crate) fn cmd_import(
    ctx: &Context,
    files: Vec<PathBuf>,
    json: bool,
    strict: bool,
) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let outcomes = import_files(&store, &files);

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    let skipped: usize = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .map(|r| r.rows_skipped)
        .sum();

    if failed < outcomes.len() {
        ctx.save(&store.snapshot())?;
    }

    if json {
        let summaries: Vec<FileSummary> = outcomes.iter().map(FileSummary::from).collect();
        let out = serde_json::to_string_pretty(&summaries).map_err(|e| CliError::io(e.to_string()))?;
        println!("{out}");
    } else {
        for outcome in &outcomes {
            match &outcome.result {
                Ok(report) => print_report(report),
                Err(e) => eprintln!("{e}"),
            }
        }
        eprintln!(
            "dataset: {} employees ({})",
            store.snapshot().len(),
            ctx.snapshot_path.display()
        );
    }

    if failed > 0 {
        return Err(CliError::new(
            EXIT_IMPORT_FILE_ERROR,
            format!("{} of {} files could not be read", failed, outcomes.len()),
        ));
    }
    if strict && skipped > 0 {
        return Err(CliError::new(
            EXIT_IMPORT_ROWS_SKIPPED,
            format!("{skipped} malformed row(s) skipped"),
        )
        .with_hint("rows need an employee number or a name"));
    }
    Ok(())
}

pub(crate) fn cmd_reset(ctx: &Context, yes: bool) -> Result<(), CliError> {
    if !yes {
        return Err(CliError::usage("reset clears every merged record")
            .with_hint("pass --yes to confirm"));
    }
    // An unreadable snapshot must still be resettable, so start from an empty one.
    let loaded = loanrec_io::snapshot::load(&ctx.snapshot_path).ok();
    let previous = loaded.as_ref().map(Dataset::len);
    let store = DatasetStore::with_dataset(loaded.unwrap_or_default(), ColumnAliases::default());
    store.reset();
    ctx.save(&store.snapshot())?;
    match previous {
        Some(n) => eprintln!("cleared {n} records"),
        None => eprintln!("replaced unreadable dataset with an empty one"),
    }
    Ok(())
}
