// Integration tests for `ledgerx recon` and `ledgerx schemas`: exit codes,
// file outputs, and config-relative input resolution.
//
// Run with: cargo test -p ledgerx-cli --test recon_cli -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn ledgerx() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ledgerx"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("LEDGERX_LOG");
    cmd
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const INTERNAL_CSV: &str = "\
transaction_id,amount_value,currency_code,status,created_on
TXN001,15000,NGN,success,2026-01-15 10:00:00
TXN002,12000,NGN,failed,2026-01-15 11:00:00
TXN004,9000,USD,success,2026-01-15 12:00:00
";

const PAYSTACK_JSON: &str = r#"{
  "status": true,
  "data": [
    {"id": "TXN001", "amount": 1500000, "currency": "NGN", "status": "success", "created_at": "2026-01-15T10:00:00.000Z"},
    {"id": "TXN003", "amount": 900000, "currency": "NGN", "status": "success", "created_at": "2026-01-15T10:30:00.000Z"},
    {"id": "TXN004", "amount": 900000, "currency": "USD", "status": "failed", "created_at": "2026-01-15T12:00:00.000Z"}
  ]
}"#;

const CONFIG: &str = r#"
name = "daily-paystack"

[sources.internal]
schema = "internal"
file = "internal.csv"

[sources.gateway]
schema = "paystack"
file = "paystack.json"
"#;

/// Write a config plus its two source files into a fresh temp dir.
fn workspace(config: &str, internal: &str, gateway: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("internal.csv"), internal).unwrap();
    std::fs::write(dir.path().join("paystack.json"), gateway).unwrap();
    let config_path = dir.path().join("daily.recon.toml");
    std::fs::write(&config_path, config).unwrap();
    (dir, config_path)
}

fn run_recon(config_path: &Path, extra: &[&str]) -> Output {
    ledgerx()
        .args(["recon", "run"])
        .arg(config_path)
        .args(extra)
        .output()
        .expect("ledgerx recon run")
}

// ===========================================================================
// recon run
// ===========================================================================

#[test]
fn discrepancies_exit_3_with_tally() {
    let (_dir, config) = workspace(CONFIG, INTERNAL_CSV, PAYSTACK_JSON);
    let output = run_recon(&config, &[]);

    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("recon 'daily-paystack': 4 rows, 1 matched, 3 issues, 0 unprocessable"), "{err}");
    assert!(err.contains("error: 3 discrepancies found"));
    assert!(output.stdout.is_empty(), "stdout should be empty without --json/--summary");
}

#[test]
fn all_matched_exits_0() {
    let internal = "\
transaction_id,amount_value,currency_code,status,created_on
TXN001,15000,NGN,success,2026-01-15 10:00:00
";
    let gateway = r#"[{"id": "TXN001", "amount": 1500000, "currency": "NGN", "status": "success", "created_at": "2026-01-15T10:04:00Z"}]"#;
    let (_dir, config) = workspace(CONFIG, internal, gateway);
    let output = run_recon(&config, &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn unprocessable_only_exits_6() {
    let internal = "\
transaction_id,amount_value,currency_code,status,created_on
TXN001,15000,NGN,success,2026-01-15 10:00:00
";
    let gateway = r#"[
        {"id": "TXN001", "amount": 1500000, "currency": "NGN", "status": "success", "created_at": "2026-01-15T10:00:00Z"},
        {"id": "TXN009", "amount": 100, "currency": "NAIRA", "status": "success", "created_at": "2026-01-15T10:00:00Z"}
    ]"#;
    let (_dir, config) = workspace(CONFIG, internal, gateway);
    let output = run_recon(&config, &[]);

    assert_eq!(output.status.code(), Some(6), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn ragged_row_exits_6_not_5() {
    let internal = "\
transaction_id,amount_value,currency_code,status,created_on
TXN001,15000,NGN,success,2026-01-15 10:00:00
TXN002,12000
";
    let gateway = r#"[{"id": "TXN001", "amount": 1500000, "currency": "NGN", "status": "success", "created_at": "2026-01-15T10:00:00Z"}]"#;
    let (_dir, config) = workspace(CONFIG, internal, gateway);
    let output = run_recon(&config, &[]);

    assert_eq!(output.status.code(), Some(6), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("1 rows, 1 matched, 0 issues, 1 unprocessable"));
}

#[test]
fn writes_json_and_csv_files() {
    let (dir, config) = workspace(CONFIG, INTERNAL_CSV, PAYSTACK_JSON);
    let json_path = dir.path().join("report.json");
    let csv_path = dir.path().join("report.csv");

    let output = run_recon(
        &config,
        &["--output", json_path.to_str().unwrap(), "--csv", csv_path.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(3));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(report["summary"]["total"], 4);
    assert_eq!(report["summary"]["counts"]["missing_in_internal"], 1);

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("tx_id,amount,status_internal"));
    assert_eq!(lines.count(), 4);
}

#[test]
fn summary_goes_to_stdout() {
    let (_dir, config) = workspace(CONFIG, INTERNAL_CSV, PAYSTACK_JSON);
    let output = run_recon(&config, &["--summary"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Reconciliation report: daily-paystack"));
    assert!(stdout.contains("- TXN004 [status_mismatch]"));
    assert!(stdout.contains("- TXN003 [missing_in_internal]"));
}

#[test]
fn missing_input_file_exits_5() {
    let (dir, config) = workspace(CONFIG, INTERNAL_CSV, PAYSTACK_JSON);
    std::fs::remove_file(dir.path().join("paystack.json")).unwrap();

    let output = run_recon(&config, &[]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("paystack.json"));
}

#[test]
fn malformed_gateway_document_exits_5() {
    let (_dir, config) = workspace(CONFIG, INTERNAL_CSV, r#"{"items": []}"#);
    let output = run_recon(&config, &[]);
    assert_eq!(output.status.code(), Some(5), "stderr: {}", stderr(&output));
}

#[test]
fn unknown_schema_exits_4() {
    let bad = CONFIG.replace("schema = \"paystack\"", "schema = \"flutterwave\"");
    let (_dir, config) = workspace(&bad, INTERNAL_CSV, PAYSTACK_JSON);
    let output = run_recon(&config, &[]);

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("unknown schema 'flutterwave'"));
}

#[test]
fn source_without_file_exits_4_with_hint() {
    let no_file = CONFIG.replace("file = \"paystack.json\"\n", "");
    let (_dir, config) = workspace(&no_file, INTERNAL_CSV, PAYSTACK_JSON);
    let output = run_recon(&config, &[]);

    assert_eq!(output.status.code(), Some(4));
    let err = stderr(&output);
    assert!(err.contains("sources.gateway: no file configured"));
    assert!(err.contains("hint:"));
}

// ===========================================================================
// recon validate
// ===========================================================================

#[test]
fn validate_accepts_good_config() {
    let (_dir, config) = workspace(CONFIG, INTERNAL_CSV, PAYSTACK_JSON);
    let output = ledgerx().args(["recon", "validate"]).arg(&config).output().unwrap();

    assert!(output.status.success());
    assert!(stderr(&output).contains("config 'daily-paystack' valid"));
    assert!(stderr(&output).contains("statuses: failed, pending, success"));
}

#[test]
fn validate_lists_configured_statuses() {
    let extended = format!("{CONFIG}\n[status_vocabulary]\nrefunded = [\"refund\"]\n");
    let (_dir, config) = workspace(&extended, INTERNAL_CSV, PAYSTACK_JSON);
    let output = ledgerx().args(["recon", "validate"]).arg(&config).output().unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("statuses: failed, pending, refunded, success"));
}

#[test]
fn validate_rejects_bad_timezone() {
    let bad = format!("{CONFIG}\n[normalize]\ndefault_timezone = \"Lagos\"\n");
    let (_dir, config) = workspace(&bad, INTERNAL_CSV, PAYSTACK_JSON);
    let output = ledgerx().args(["recon", "validate"]).arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("default_timezone"));
}

#[test]
fn validate_rejects_conflicting_vocabulary() {
    let bad = format!("{CONFIG}\n[status_vocabulary]\nfailed = [\"paid\"]\n");
    let (_dir, config) = workspace(&bad, INTERNAL_CSV, PAYSTACK_JSON);
    let output = ledgerx().args(["recon", "validate"]).arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("'paid'"));
}

// ===========================================================================
// schemas / usage
// ===========================================================================

#[test]
fn schemas_table_lists_builtins() {
    let output = ledgerx().arg("schemas").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["internal", "mock", "paystack", "stripe"] {
        assert!(stdout.lines().any(|l| l.starts_with(name)), "missing {name} in:\n{stdout}");
    }
}

#[test]
fn unknown_flag_is_usage_error() {
    let output = ledgerx().args(["recon", "run", "--bogus"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
