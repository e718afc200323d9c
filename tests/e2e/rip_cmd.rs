//! `autoripper rip`: one reconciliation cycle from the command line.

use serde_json::json;

use crate::common::cli::CliRunner;
use crate::common::fixtures::{DVD_ROW, TestEnv, drive_row};
use crate::common::logging::LogVerifier;

fn runner(env: &TestEnv, rows: &[&str], whipper: &str) -> CliRunner {
    let makemkvcon = env.fake_makemkvcon(rows);
    CliRunner::new().with_settings(&env.write_settings(&makemkvcon, whipper, "true"))
}

#[test]
fn dry_run_reports_decision_without_ripping() {
    let env = TestEnv::new();
    let output = env.destination().join("dvd");

    runner(&env, &[DVD_ROW], "whipper")
        .run(&["--format", "json", "rip", "/dev/sr0", "--dry-run"])
        .assert_success()
        .assert_json_field("/dry_run", &json!(true))
        .assert_json_field("/reconciliation/outcome", &json!("dispatch"))
        .assert_json_field("/reconciliation/media", &json!("dvd"))
        .assert_json_field("/reconciliation/drive_index", &json!("DRV:0"))
        .assert_json_field(
            "/reconciliation/output_path",
            &json!(output.display().to_string()),
        );

    assert_eq!(env.calls("makemkvcon"), vec!["-r --cache=1 info disc:"]);
    assert!(!env.destination().exists());
}

#[test]
fn unknown_device_is_skipped_with_warning() {
    let env = TestEnv::new();

    let result = runner(&env, &[DVD_ROW], "whipper")
        .run(&["--format", "json", "rip", "/dev/sr7"]);

    result
        .assert_success()
        .assert_json_field("/reconciliation/outcome", &json!("skip"))
        .assert_json_field("/reconciliation/reason", &json!("unmatched"))
        .assert_json_field("/reconciliation/dev_name", &json!("/dev/sr7"));
    LogVerifier::from_stderr(&result.stderr)
        .assert_warn("No drive status")
        .assert_no_errors();
}

#[test]
fn dvd_rip_runs_tool_and_ejects() {
    let env = TestEnv::new();
    let output = env.destination().join("dvd");

    let result = runner(&env, &[DVD_ROW], "whipper")
        .run(&["--format", "json", "rip", "/dev/sr0"]);

    result
        .assert_success()
        .assert_json_field("/report/kind", &json!("video"))
        .assert_json_field("/report/exit_code", &json!(0))
        .assert_json_field("/report/ejected", &json!(true));
    assert!(output.is_dir());
    assert_eq!(
        env.calls("makemkvcon").last().cloned(),
        Some(format!("-r mkv disc:0 all {}", output.display()))
    );
    LogVerifier::from_stderr(&result.stderr).assert_info("Copy complete");
}

#[test]
fn open_tray_is_skipped() {
    let env = TestEnv::new();
    let row = drive_row(0, 1, 0, "/dev/sr0");

    let result = runner(&env, &[&row], "whipper").run(&["rip", "/dev/sr0"]);

    result.assert_success().assert_stdout_contains("Skipped");
    LogVerifier::from_stderr(&result.stderr).assert_info("The media was ejected");
    assert_eq!(env.calls("makemkvcon").len(), 1);
}

#[test]
fn audio_rip_on_unidentifiable_drive_is_not_fatal() {
    let env = TestEnv::new();
    let row = drive_row(0, 2, 0, "/dev/srtest9");
    let whipper = env.fake_whipper(0);

    let result = runner(&env, &[&row], &whipper.display().to_string())
        .run(&["--robot", "rip", "/dev/srtest9"]);

    result.assert_exit_code(1);
    let error = result
        .stderr
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .find(|value| value.get("error") == Some(&json!(true)))
        .expect("JSON error object on stderr");
    assert_eq!(error["fatal"], json!(false));
    assert!(env.calls("whipper").is_empty());
    assert!(env.destination().join("audio").is_dir());
}
