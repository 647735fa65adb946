//! `loanrec export`: write the merged dataset as a CSV or XLSX report.

use std::path::{Path, PathBuf};

use clap::ValueEnum;

use loanrec_recon::model::LoanStatus;
use loanrec_recon::query::LoanFilter;

use crate::exit_codes::EXIT_EXPORT_WRITE;
use crate::{CliError, Context};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

pub(crate) fn cmd_export(
    ctx: &Context,
    output: PathBuf,
    format: Option<ExportFormat>,
    status: Option<LoanStatus>,
    division: Option<String>,
) -> Result<(), CliError> {
    let format = format
        .or_else(|| ExportFormat::from_path(&output))
        .ok_or_else(|| {
            CliError::usage(format!("cannot tell the report format of {}", output.display()))
                .with_hint("use a .csv or .xlsx file name, or pass --format")
        })?;

    let store = ctx.open_store()?;
    let records = store.find(&LoanFilter {
        status,
        division,
        ..LoanFilter::default()
    });

    let written = match format {
        ExportFormat::Csv => loanrec_io::csv::export(&records, &output),
        ExportFormat::Xlsx => loanrec_io::xlsx::export(&records, &output),
    };
    written.map_err(|e| CliError::new(EXIT_EXPORT_WRITE, e.to_string()))?;

    eprintln!("wrote {} records to {}", records.len(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a.CSV")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("laporan.xlsx")), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_path(Path::new("laporan.pdf")), None);
    }
}
