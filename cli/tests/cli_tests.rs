use assert_cmd::Command;
use predicates::prelude::*;

fn relay_cli() -> Command {
    Command::cargo_bin("relay-cli").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    relay_cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("health"))
        .stdout(predicate::str::contains("audit"))
        .stdout(predicate::str::contains("balance"))
        .stdout(predicate::str::contains("mappings"));
}

#[test]
fn test_balance_requires_account() {
    relay_cli().arg("balance").assert().failure();
}

#[test]
fn test_run_refuses_to_start_without_chains() {
    relay_cli()
        .arg("run")
        .env_remove("STELLAR_ACCOUNT")
        .env_remove("XRPL_ACCOUNT")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no chains configured"));
}

#[test]
fn test_mappings_reports_missing_file() {
    relay_cli()
        .args(["mappings", "--mappings", "/definitely/not/here.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("here.json"));
}

#[test]
fn test_mappings_prints_tables() {
    let path = std::env::temp_dir().join(format!("relay-cli-mappings-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{
            "stellar": {
                "accounts": {"GDEST": "acct:treasury:X"},
                "assets": {"native": "XLM"}
            },
            "xrpl": {}
        }"#,
    )
    .unwrap();

    relay_cli()
        .arg("mappings")
        .arg("--mappings")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("acct:treasury:X"))
        .stdout(predicate::str::contains("nothing mapped"));

    relay_cli()
        .arg("mappings")
        .arg("--json")
        .arg("--mappings")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"accounts\""));

    let _ = std::fs::remove_file(&path);
}
