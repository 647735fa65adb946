// End-to-end tests for the `loanrec` binary.
// Run with: cargo test -p loanrec-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Runs against an isolated data dir and settings file.
fn loanrec(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_loanrec"));
    cmd.env("LOANREC_CONFIG", home.join("settings.json"))
        .env("LOANREC_DATA_DIR", home.join("data"))
        .env_remove("RUST_LOG");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    loanrec(home).args(args).output().expect("run loanrec")
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn seed(home: &TempDir) {
    let a = write(
        home,
        "tranche_a.csv",
        "NOPEG;NAMA;BAGIAN;JML;LAMA;CICIL;ANGSURAN_KE\n\
         E001;Budi Santoso;Gudang;12000000;12;1000000;4\n\
         E002;Siti Aminah;Keuangan;6000000;6;1000000;6\n\
         ;;;500;;;\n",
    );
    let b = write(
        home,
        "tranche_b.csv",
        "NOPEG;NAMA;BAGIAN;JML;ANGSURAN_KE\nE001;Budi Santoso;Gudang;0;2\n",
    );
    let out = run(home.path(), &["import", a.to_str().unwrap(), b.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
}

// ---------------------------------------------------------------------------
// import
// ---------------------------------------------------------------------------

#[test]
fn import_persists_merged_dataset() {
    let home = tempfile::tempdir().unwrap();
    seed(&home);

    let out = run(home.path(), &["list", "--json"]);
    assert!(out.status.success());
    let page: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(page["total_items"], 2);

    let budi = &page["items"][0];
    assert_eq!(budi["employee_id"], "E001");
    assert_eq!(budi["total_installments_paid"], 6);
    assert_eq!(budi["remaining_balance_cents"], 600_000_000i64);
    assert_eq!(budi["status"], "BERJALAN");
    assert_eq!(page["items"][1]["status"], "LUNAS");
}

#[test]
fn import_json_reports_each_file() {
    let home = tempfile::tempdir().unwrap();
    let good = write(&home, "ok.csv", "NOPEG,JML\nE9,100\n,\n");
    let out = run(
        home.path(),
        &["import", "--json", good.to_str().unwrap(), "missing.dbf"],
    );

    assert_eq!(out.status.code(), Some(3), "unreadable file exits 3");
    let reports: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(reports[0]["ok"], true);
    assert_eq!(reports[0]["report"]["rows_merged"], 1);
    assert_eq!(reports[1]["ok"], false);

    // The readable file was still saved.
    let list = run(home.path(), &["list", "--json"]);
    let page: serde_json::Value = serde_json::from_str(&stdout(&list)).unwrap();
    assert_eq!(page["total_items"], 1);
}

#[test]
fn strict_import_fails_on_skipped_rows() {
    let home = tempfile::tempdir().unwrap();
    let file = write(&home, "a.csv", "NOPEG,NAMA,JML\nE1,A,1\n,,5\n");
    let out = run(home.path(), &["import", "--strict", file.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(4));
}

// ---------------------------------------------------------------------------
// queries
// ---------------------------------------------------------------------------

#[test]
fn list_filters_by_status_and_search() {
    let home = tempfile::tempdir().unwrap();
    seed(&home);

    let out = run(home.path(), &["list", "--status", "lunas", "--json"]);
    let page: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(page["total_items"], 1);
    assert_eq!(page["items"][0]["employee_id"], "E002");

    let out = run(home.path(), &["list", "--search", "budi"]);
    let text = stdout(&out);
    assert!(text.contains("Budi Santoso"));
    assert!(!text.contains("Siti"));
}

#[test]
fn show_unknown_employee_exits_not_found() {
    let home = tempfile::tempdir().unwrap();
    seed(&home);
    let out = run(home.path(), &["show", "E404"]);
    assert_eq!(out.status.code(), Some(13));

    let out = run(home.path(), &["show", "e001"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("tranche_b.csv row 1"));
}

#[test]
fn dashboard_json_totals() {
    let home = tempfile::tempdir().unwrap();
    seed(&home);
    let out = run(home.path(), &["dashboard", "--json"]);
    let summary: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(summary["employee_count"], 2);
    assert_eq!(summary["total_loan_cents"], 1_800_000_000i64);
    assert_eq!(summary["total_remaining_cents"], 600_000_000i64);
    assert_eq!(summary["status_counts"]["BELUM_BAYAR"], 0);
    assert_eq!(summary["status_percentages"]["LUNAS"], 50.0);
}

// ---------------------------------------------------------------------------
// export / reset / config
// ---------------------------------------------------------------------------

#[test]
fn export_csv_and_xlsx() {
    let home = tempfile::tempdir().unwrap();
    seed(&home);

    let csv = home.path().join("laporan.csv");
    let out = run(home.path(), &["export", csv.to_str().unwrap(), "--status", "berjalan"]);
    assert!(out.status.success());
    let content = fs::read_to_string(&csv).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.contains("E001,Budi Santoso,Gudang,12000000,12,6,6,6000000,Berjalan"));

    let xlsx = home.path().join("laporan.xlsx");
    assert!(run(home.path(), &["export", xlsx.to_str().unwrap()]).status.success());
    assert!(fs::metadata(&xlsx).unwrap().len() > 100);

    let bad = run(home.path(), &["export", "laporan.pdf"]);
    assert_eq!(bad.status.code(), Some(2));
}

#[test]
fn reset_requires_confirmation() {
    let home = tempfile::tempdir().unwrap();
    seed(&home);

    let out = run(home.path(), &["reset"]);
    assert_eq!(out.status.code(), Some(2));

    assert!(run(home.path(), &["reset", "--yes"]).status.success());
    let out = run(home.path(), &["list", "--json"]);
    let page: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(page["total_items"], 0);
}

#[test]
fn corrupt_snapshot_is_reported() {
    let home = tempfile::tempdir().unwrap();
    fs::create_dir_all(home.path().join("data")).unwrap();
    fs::write(home.path().join("data/dataset.json"), "garbage").unwrap();

    let out = run(home.path(), &["list"]);
    assert_eq!(out.status.code(), Some(10));
    assert!(run(home.path(), &["reset", "--yes"]).status.success());
    assert!(run(home.path(), &["list"]).status.success());
}

#[test]
fn validate_columns_rejects_empty_alias_list() {
    let home = tempfile::tempdir().unwrap();
    let good = write(&home, "good.toml", "loan_amount = [\"PLAFON\"]\n");
    let out = run(home.path(), &["validate-columns", good.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("PLAFON"));

    let bad = write(&home, "bad.toml", "tenor = []\n");
    let out = run(home.path(), &["validate-columns", bad.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(20));
}

#[test]
fn custom_columns_apply_to_import() {
    let home = tempfile::tempdir().unwrap();
    let aliases = write(&home, "cols.toml", "employee_id = [\"ID_KARY\"]\nloan_amount = [\"PLAFON\"]\n");
    let file = write(&home, "kop.csv", "ID_KARY,PLAFON\n77,500000\n");
    let out = run(
        home.path(),
        &["--columns", aliases.to_str().unwrap(), "import", file.to_str().unwrap()],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let out = run(home.path(), &["list", "--json"]);
    let page: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(page["items"][0]["employee_id"], "77");
    assert_eq!(page["items"][0]["total_loan_cents"], 50_000_000);
}
