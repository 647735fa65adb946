// loanrec CLI - headless employee loan reconciliation
//
// Every command loads the saved dataset, works on it, and (for writes)
// saves it back before exiting.

mod exit_codes;
mod export;
mod import;
mod report;
mod util;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use loanrec_config::Settings;
use loanrec_io::snapshot;
use loanrec_recon::model::LoanStatus;
use loanrec_recon::{ColumnAliases, Dataset, DatasetStore};

use exit_codes::{
    EXIT_COLUMN_CONFIG, EXIT_ERROR, EXIT_SNAPSHOT_READ, EXIT_SNAPSHOT_WRITE, EXIT_SUCCESS,
    EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "loanrec")]
#[command(about = "Reconcile employee loan records from legacy DBF, spreadsheet and CSV files")]
#[command(version)]
struct Cli {
    /// Directory holding the merged dataset (overrides data.dir)
    #[arg(long, global = true, env = "LOANREC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Settings file (default: <config dir>/loanrec/settings.json)
    #[arg(long, global = true, env = "LOANREC_CONFIG")]
    config: Option<PathBuf>,

    /// Column alias TOML file (overrides columns.aliasFile)
    #[arg(long, global = true)]
    columns: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read source files and merge their rows into the dataset
    #[command(after_help = "\
Examples:
  loanrec import PINJAM.DBF
  loanrec import 2019/*.DBF tranche_2024.xlsx
  loanrec import koperasi.csv --json")]
    Import {
        /// Source files (.dbf, .xlsx, .xls, .xlsm, .ods, .csv, .tsv), merged in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Per-file reports as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Fail (exit 4) when any row was skipped as malformed
        #[arg(long)]
        strict: bool,
    },

    /// Clear the dataset
    Reset {
        /// Confirm; without it nothing is cleared
        #[arg(long)]
        yes: bool,
    },

    /// List merged records
    #[command(after_help = "\
Examples:
  loanrec list --search budi
  loanrec list --status berjalan --division Gudang
  loanrec list --sort loan --top 10
  loanrec list --page 2 --per-page 50")]
    List {
        /// Case-insensitive match on employee name or number
        #[arg(long, short = 's')]
        search: Option<String>,

        /// Case-insensitive match on employee name only
        #[arg(long)]
        name: Option<String>,

        /// Employee number (substring unless --exact-id)
        #[arg(long)]
        id: Option<String>,

        /// Require --id to match the whole employee number
        #[arg(long, requires = "id")]
        exact_id: bool,

        /// Whole division name
        #[arg(long)]
        division: Option<String>,

        /// lunas, berjalan or belum_bayar
        #[arg(long, value_parser = parse_status)]
        status: Option<LoanStatus>,

        #[arg(long, value_enum, default_value = "insertion")]
        sort: SortArg,

        /// Keep only the first N results after sorting
        #[arg(long)]
        top: Option<usize>,

        /// Page number, 1-based
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page (default: view.pageSize)
        #[arg(long)]
        per_page: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Show one employee with the source rows that built the record
    Show {
        /// Employee number, or part of a name
        query: String,

        #[arg(long)]
        json: bool,
    },

    /// Totals, status distribution and top rankings
    Dashboard {
        /// Entries per ranking (default: dashboard.topN)
        #[arg(long)]
        top: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Distinct division names
    Divisions,

    /// Write the (optionally filtered) dataset as a report
    #[command(after_help = "\
Examples:
  loanrec export laporan.xlsx
  loanrec export berjalan.csv --status berjalan")]
    Export {
        /// Output file
        output: PathBuf,

        /// Output format (default: from the file extension)
        #[arg(long, short = 'f', value_enum)]
        format: Option<export::ExportFormat>,

        #[arg(long, value_parser = parse_status)]
        status: Option<LoanStatus>,

        #[arg(long)]
        division: Option<String>,
    },

    /// Check a column alias file and print the effective aliases
    ValidateColumns {
        /// Alias TOML file (default: --columns or columns.aliasFile)
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum SortArg {
    /// First-sighting order
    Insertion,
    /// Largest total loan first
    Loan,
    /// Employee name A-Z
    Name,
}

fn parse_status(s: &str) -> Result<LoanStatus, String> {
    s.parse()
}

fn init_logging(settings: &Settings, verbose: bool) {
    let env = env_logger::Env::default().default_filter_or(settings.log_level.as_str());
    let mut builder = env_logger::Builder::from_env(env);
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    init_logging(&settings, cli.verbose);

    let ctx = Context {
        snapshot_path: settings.snapshot_path(cli.data_dir.as_deref()),
        columns: cli.columns.or_else(|| settings.alias_file.clone()),
        settings,
    };
    log::debug!("dataset: {}", ctx.snapshot_path.display());

    let result = match cli.command {
        Commands::Import { files, json, strict } => import::cmd_import(&ctx, files, json, strict),
        Commands::Reset { yes } => import::cmd_reset(&ctx, yes),
        Commands::List {
            search,
            name,
            id,
            exact_id,
            division,
            status,
            sort,
            top,
            page,
            per_page,
            json,
        } => {
            let filter = report::build_filter(search, name, id, exact_id, division, status, sort, top);
            report::cmd_list(&ctx, filter, page, per_page, json)
        }
        Commands::Show { query, json } => report::cmd_show(&ctx, &query, json),
        Commands::Dashboard { top, json } => report::cmd_dashboard(&ctx, top, json),
        Commands::Divisions => report::cmd_divisions(&ctx),
        Commands::Export { output, format, status, division } => {
            export::cmd_export(&ctx, output, format, status, division)
        }
        Commands::ValidateColumns { file } => cmd_validate_columns(&ctx, file),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Shared command context
// ============================================================================

pub(crate) struct Context {
    pub settings: Settings,
    pub snapshot_path: PathBuf,
    /// Alias file in effect, if any.
    pub columns: Option<PathBuf>,
}

impl Context {
    pub fn aliases(&self) -> Result<ColumnAliases, CliError> {
        let Some(path) = &self.columns else {
            return Ok(ColumnAliases::default());
        };
        load_aliases(path)
    }

    /// Restore the saved dataset into a store using the configured aliases.
    pub fn open_store(&self) -> Result<DatasetStore, CliError> {
        let aliases = self.aliases()?;
        let dataset = snapshot::load(&self.snapshot_path).map_err(|e| {
            CliError::new(EXIT_SNAPSHOT_READ, e.to_string())
                .with_hint("move the file aside or run `loanrec reset --yes` to start over")
        })?;
        Ok(DatasetStore::with_dataset(dataset, aliases))
    }

    pub fn save(&self, dataset: &Dataset) -> Result<(), CliError> {
        snapshot::save(dataset, &self.snapshot_path)
            .map_err(|e| CliError::new(EXIT_SNAPSHOT_WRITE, e.to_string()))
    }
}

fn load_aliases(path: &std::path::Path) -> Result<ColumnAliases, CliError> {
    let text = fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_COLUMN_CONFIG, format!("cannot read {}: {}", path.display(), e))
    })?;
    ColumnAliases::from_toml(&text)
        .map_err(|e| CliError::new(EXIT_COLUMN_CONFIG, format!("{}: {}", path.display(), e)))
}

// ============================================================================
// validate-columns
// ============================================================================

fn cmd_validate_columns(ctx: &Context, file: Option<PathBuf>) -> Result<(), CliError> {
    let (aliases, origin) = match file.or_else(|| ctx.columns.clone()) {
        Some(path) => {
            let aliases = load_aliases(&path)?;
            (aliases, path.display().to_string())
        }
        None => (ColumnAliases::default(), "built-in defaults".to_string()),
    };

    println!("column aliases ({origin}):");
    let fields = [
        ("employee_id", &aliases.employee_id),
        ("employee_name", &aliases.employee_name),
        ("division", &aliases.division),
        ("loan_amount", &aliases.loan_amount),
        ("tenor", &aliases.tenor),
        ("installment_amount", &aliases.installment_amount),
        ("installments_paid", &aliases.installments_paid),
    ];
    for (field, names) in fields {
        println!("  {:<20} {}", field, names.join(", "));
    }
    println!("  {:<20} {}*", "payment columns", aliases.payment_prefix);
    Ok(())
}
