mod common;

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::str::contains;

fn write_request(dir: &Path, dimension: &str) -> String {
    let path = dir.join(format!("{dimension}.json"));
    fs::write(
        &path,
        format!(r#"{{"datasetId":"ledger","view":"AgedDebt","dimension":"{dimension}"}}"#),
    )
    .unwrap();
    shell_words::quote(&path.display().to_string()).into_owned()
}

fn cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("debt_rollup_cli").unwrap();
    cmd.env("DEBT_ROLLUP_HOME", home)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn script_mode_runs_basic_flow() {
    let home = common::temp_dir();
    let dataset = shell_words::quote(&common::write_sample_json().display().to_string()).into_owned();
    let request = write_request(&home, "Station");
    let input = format!(
        "load ledger {dataset}\n\
         datasets\n\
         rollup {request}\n\
         table {request}\n\
         list ledger --page-size 2\n\
         version\n\
         rolup\n\
         exit\n\
         datasets\n"
    );

    cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Loaded dataset `ledger`"))
        .stdout(contains("\"percentOfTotal\": \"92.59\""))
        .stdout(contains("Central"))
        .stdout(contains("Next cursor:"))
        .stdout(contains("debt_rollup 0.1.0"))
        .stdout(contains("Suggestion: `rollup`?"))
        .stdout(contains("Exiting shell."));
}

#[test]
fn errors_are_reported_and_the_shell_continues() {
    let home = common::temp_dir();
    let request = write_request(&home, "Adid");
    let dataset = shell_words::quote(&common::write_sample_json().display().to_string()).into_owned();
    let input = format!(
        "rollup {request}\nload ledger {dataset}\nlist ledger --page-size 0\nversion\n"
    );

    cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stderr(contains("Dataset not found: ledger"))
        .stderr(contains("pageSize must be at least 1"))
        .stdout(contains("debt_rollup 0.1.0"));
}

#[test]
fn station_names_come_from_the_config_file() {
    let home = common::temp_dir();
    fs::write(
        home.join("config.json"),
        r#"{"businessAreas":{"6210":"Capital","6220":"Northern","6230":"Southern"}}"#,
    )
    .unwrap();
    let dataset = shell_words::quote(&common::write_sample_json().display().to_string()).into_owned();
    let request = write_request(&home, "Station");
    let input = format!("load ledger {dataset}\nrollup {request}\nexit\n");

    cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("\"station\": \"Capital\""));
}

#[test]
fn config_save_writes_a_starter_file() {
    let home = common::temp_dir();
    cli(&home)
        .write_stdin("config path\nconfig save\nexit\n")
        .assert()
        .success()
        .stdout(contains("config.json"))
        .stdout(contains("Configuration saved to"));

    let saved = fs::read_to_string(home.join("config.json")).unwrap();
    let config = debt_rollup::config::EngineConfig::from_json(&saved).unwrap();
    assert_eq!(config, debt_rollup::config::EngineConfig::default());
}
