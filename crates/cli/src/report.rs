//! Read-only views: `list`, `show`, `dashboard`, `divisions`.

use loanrec_recon::dashboard::DashboardSummary;
use loanrec_recon::model::{LoanStatus, MergedLoanRecord};
use loanrec_recon::query::{self, IdMatch, LoanFilter, SortOrder};

use crate::exit_codes::EXIT_NOT_FOUND;
use crate::util::{format_rupiah, pad_left, pad_right};
use crate::{CliError, Context, SortArg};

#[allow(clippy::too_many_arguments)]
pub(crate) fn build_filter(
    search: Option<String>,
    name: Option<String>,
    id: Option<String>,
    exact_id: bool,
    division: Option<String>,
    status: Option<LoanStatus>,
    sort: SortArg,
    top: Option<usize>,
) -> LoanFilter {
    LoanFilter {
        search,
        name,
        employee_id: id.map(|id| if exact_id { IdMatch::Exact(id) } else { IdMatch::Contains(id) }),
        division,
        status,
        sort: match sort {
            SortArg::Insertion => SortOrder::Insertion,
            SortArg::Loan => SortOrder::LoanAmountDesc,
            SortArg::Name => SortOrder::NameAsc,
        },
        limit: top,
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    println!("{out}");
    Ok(())
}

// ============================================================================
// list
// ============================================================================

const W_ID: usize = 10;
const W_NAME: usize = 24;
const W_DIV: usize = 14;
const W_AMOUNT: usize = 16;
const W_COUNT: usize = 5;

fn print_table(records: &[MergedLoanRecord]) {
    println!(
        "{}  {}  {}  {}  {}  {}  {}  {}  Status",
        pad_right("No. Peg", W_ID),
        pad_right("Nama", W_NAME),
        pad_right("Divisi", W_DIV),
        pad_left("Pinjaman", W_AMOUNT),
        pad_left("Tenor", W_COUNT),
        pad_left("Bayar", W_COUNT),
        pad_left("Sisa", W_COUNT),
        pad_left("Sisa Pinjaman", W_AMOUNT),
    );
    for r in records {
        println!(
            "{}  {}  {}  {}  {}  {}  {}  {}  {}",
            pad_right(&r.employee_id, W_ID),
            pad_right(&r.employee_name, W_NAME),
            pad_right(&r.division, W_DIV),
            pad_left(&format_rupiah(r.total_loan_cents), W_AMOUNT),
            pad_left(&r.total_tenor.to_string(), W_COUNT),
            pad_left(&r.total_installments_paid.to_string(), W_COUNT),
            pad_left(&r.remaining_installments.to_string(), W_COUNT),
            pad_left(&format_rupiah(r.remaining_balance_cents), W_AMOUNT),
            r.status.label(),
        );
    }
}

pub(crate) fn cmd_list(
    ctx: &Context,
    filter: LoanFilter,
    page: usize,
    per_page: Option<usize>,
    json: bool,
) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let records = store.find(&filter);
    let page = query::paginate(&records, page, per_page.unwrap_or(ctx.settings.page_size));

    if json {
        return print_json(&page);
    }

    print_table(&page.items);
    eprintln!(
        "page {}/{} ({} records)",
        page.page,
        page.total_pages.max(1),
        page.total_items
    );
    Ok(())
}

// ============================================================================
// show
// ============================================================================

fn print_detail(r: &MergedLoanRecord) {
    println!("{} {}", r.employee_id, r.employee_name);
    println!("  identity:        {}", r.identity_key);
    println!("  division:        {}", r.division);
    println!("  total loan:      {}", format_rupiah(r.total_loan_cents));
    println!("  installment:     {}", format_rupiah(r.total_installment_cents));
    println!(
        "  installments:    {} of {} paid, {} remaining",
        r.total_installments_paid, r.total_tenor, r.remaining_installments
    );
    println!("  remaining:       {}", format_rupiah(r.remaining_balance_cents));
    println!("  status:          {}", r.status.label());
    println!("  sources:");
    for c in &r.contributions {
        println!(
            "    {} row {}: loan {}, tenor {}, installment {}, paid {}",
            c.source_file,
            c.row,
            format_rupiah(c.loan_amount_cents),
            c.tenor,
            format_rupiah(c.installment_amount_cents),
            c.installments_paid,
        );
    }
}

pub(crate) fn cmd_show(ctx: &Context, query: &str, json: bool) -> Result<(), CliError> {
    let store = ctx.open_store()?;

    let by_id = store.find(&LoanFilter {
        employee_id: Some(IdMatch::Exact(query.to_string())),
        ..LoanFilter::default()
    });
    let matches = if by_id.is_empty() {
        store.find(&LoanFilter {
            name: Some(query.to_string()),
            ..LoanFilter::default()
        })
    } else {
        by_id
    };

    if matches.is_empty() {
        return Err(CliError::new(EXIT_NOT_FOUND, format!("no employee matches '{query}'"))
            .with_hint("try `loanrec list --search` with part of the name"));
    }

    if json {
        return print_json(&matches);
    }
    for (i, r) in matches.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_detail(r);
    }
    Ok(())
}

// ============================================================================
// dashboard
// ============================================================================

pub(crate) fn cmd_dashboard(ctx: &Context, top: Option<usize>, json: bool) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let summary = DashboardSummary::compute(&store.all_records(), top.unwrap_or(ctx.settings.top_n));

    if json {
        return print_json(&summary);
    }

    println!("employees:        {}", summary.employee_count);
    println!("total loans:      {}", format_rupiah(summary.total_loan_cents));
    println!("outstanding:      {}", format_rupiah(summary.total_remaining_cents));
    println!();
    println!("by status:");
    for status in LoanStatus::ALL {
        let count = summary.status_counts.get(&status).copied().unwrap_or(0);
        let share = summary.status_percentages.get(&status).copied().unwrap_or(0.0);
        let remaining = summary.status_remaining_cents.get(&status).copied().unwrap_or(0);
        println!(
            "  {}  {}  {}  {}",
            pad_right(status.label(), 12),
            pad_left(&count.to_string(), 6),
            pad_left(&format!("{share:.1}%"), 6),
            pad_left(&format_rupiah(remaining), W_AMOUNT),
        );
    }

    println!();
    println!("top borrowers:");
    for (i, b) in summary.top_borrowers.iter().enumerate() {
        println!(
            "  {:>2}. {}  {}  {}",
            i + 1,
            pad_right(&b.employee_name, W_NAME),
            pad_right(&b.division, W_DIV),
            pad_left(&format_rupiah(b.total_loan_cents), W_AMOUNT),
        );
    }

    println!();
    println!("divisions by borrowers:");
    for d in &summary.top_divisions_by_borrowers {
        println!("  {}  {}", pad_right(&d.division, W_NAME), pad_left(&d.borrowers.to_string(), 6));
    }

    println!();
    println!("divisions by loan amount:");
    for d in &summary.top_divisions_by_loan {
        println!(
            "  {}  {}",
            pad_right(&d.division, W_NAME),
            pad_left(&format_rupiah(d.total_loan_cents), W_AMOUNT)
        );
    }
    Ok(())
}

// ============================================================================
// divisions
// ============================================================================

pub(crate) fn cmd_divisions(ctx: &Context) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    for division in query::divisions(&store.all_records()) {
        println!("{division}");
    }
    Ok(())
}
