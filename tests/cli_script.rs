use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const SCRIPT_VAR: &str = "INVENTORY_CORE_CLI_SCRIPT";
const HOME_VAR: &str = "INVENTORY_CORE_HOME";

fn run_script(home: &TempDir, input: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("inventory_core_cli").expect("binary exists");
    cmd.env(SCRIPT_VAR, "1")
        .env(HOME_VAR, home.path())
        .env("NO_COLOR", "1")
        .write_stdin(input)
        .assert()
}

#[test]
fn script_mode_runs_basic_flow() {
    let home = TempDir::new().unwrap();
    run_script(
        &home,
        "item add Mug 10 5\nsale record Mug 2 15\nreport all\nexit\n",
    )
    .success()
    .stdout(contains("Item `Mug` added"))
    .stdout(contains("Sold 2 x `Mug` for $30.00"))
    .stdout(contains("3 left in stock"))
    .stdout(contains("Revenue     : $30.00"))
    .stdout(contains("Profit      : $10.00"))
    .stdout(contains("Capital     : $20.00"));
}

#[test]
fn state_persists_between_runs() {
    let home = TempDir::new().unwrap();
    run_script(&home, "item add Lamp 20 4\nsale record Lamp 1 35\n").success();

    run_script(&home, "item list\nranking profit\n")
        .success()
        .stdout(contains("Lamp"))
        .stdout(contains("$15.00"));
    assert!(home.path().join("inventory.json").exists());
}

#[test]
fn overselling_is_reported() {
    let home = TempDir::new().unwrap();
    run_script(&home, "item add Mug 10 1\nsale record Mug 3 15\nitem show Mug\n")
        .success()
        .stdout(contains("Not enough stock for `Mug`"))
        .stdout(contains("Sold").not());
}

#[test]
fn unknown_command_suggests_closest_match() {
    let home = TempDir::new().unwrap();
    run_script(&home, "itme list\n")
        .success()
        .stdout(contains("Unknown command `itme`"))
        .stdout(contains("Suggestion: `item`?"));
}

#[test]
fn bad_arguments_print_usage() {
    let home = TempDir::new().unwrap();
    run_script(&home, "sale record\n")
        .success()
        .stdout(contains("Usage: sale record"));
}

#[test]
fn empty_ranking_has_placeholder() {
    let home = TempDir::new().unwrap();
    run_script(&home, "ranking\n")
        .success()
        .stdout(contains("No sales recorded yet."));
}

#[test]
fn config_changes_are_saved() {
    let home = TempDir::new().unwrap();
    run_script(&home, "config set currency EUR\n")
        .success()
        .stdout(contains("Configuration updated: currency = EUR"));

    run_script(&home, "config show\n")
        .success()
        .stdout(contains("EUR"));
}

#[test]
fn backups_can_be_created_and_listed() {
    let home = TempDir::new().unwrap();
    run_script(&home, "item add Mug 10 5\nbackup create nightly\nbackup list\n")
        .success()
        .stdout(contains("Backup `inventory_"))
        .stdout(contains("nightly"));
}
