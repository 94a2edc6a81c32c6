//! NVS generation through a real child process.
//!
//! `sh` stands in for the partition tool, so these only run on unix.
#![cfg(unix)]

use std::fs;

use serde_json::json;

use crate::common::cli::CliRunner;
use crate::common::{write_firmware, write_input, write_settings, FAKE_NVS_TOOL};

fn uiflow2_input(dir: &std::path::Path) -> std::path::PathBuf {
    write_input(
        dir,
        "nvs.json",
        &json!({
            "server": "uiflow2.m5stack.com",
            "wifi_networks": [{ "ssid": "home", "pwd": "pw" }],
            "timezone": "CST-8",
            "boot_option": 1,
        }),
    )
}

#[test]
fn uiflow2_nvs_writes_csv_and_image() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path(), FAKE_NVS_TOOL, 10);
    let input = uiflow2_input(dir.path());

    let cli = CliRunner::new().with_settings(&settings);
    let result = cli.run_robot(&[
        "pack",
        "--config-type",
        "uiflow2_nvs",
        "--input",
        input.to_str().unwrap(),
    ]);
    let _ = result
        .assert_success()
        .assert_json_field("/result/address", &json!("0x9000"))
        .assert_json_field("/result/size", &json!(0x6000));

    let out = dir.path().join("out");
    let csv = fs::read_to_string(out.join("uiflow2.csv")).unwrap();
    assert!(csv.starts_with("key,type,encoding,value\nuiflow,namespace,,\n"));
    assert!(csv.contains("\npswd0,data,string,pw\n"));
    assert!(csv.ends_with("\nboot_option,data,u8,1"));
    assert_eq!(fs::read(out.join("uiflow2-cfg.bin")).unwrap().len(), 0x6000);
}

#[test]
fn uiflow2_nvs_mixes_into_firmware() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path(), FAKE_NVS_TOOL, 10);
    let input = uiflow2_input(dir.path());
    let firmware = write_firmware(dir.path(), 0x18000);

    let cli = CliRunner::new().with_settings(&settings);
    let result = cli.run_robot(&[
        "pack",
        "--config-type",
        "uiflow2_nvs",
        "--input",
        input.to_str().unwrap(),
        "--firmware",
        firmware.to_str().unwrap(),
    ]);
    let _ = result
        .assert_success()
        .assert_json_field("/result/address", &json!("0x0"));

    let merged = fs::read(dir.path().join("out/uiflow2-mixin.bin")).unwrap();
    assert_eq!(merged.len(), 0x18000);
    assert!(merged[..0x9000].iter().all(|&b| b == 0xA5));
    assert!(merged[0x9000..0xF000].iter().all(|&b| b == 0xFF));
    assert!(merged[0xF000..].iter().all(|&b| b == 0xA5));
}

#[test]
fn failing_tool_reports_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path(), "echo 'partition too small' >&2; exit 4", 10);
    let input = uiflow2_input(dir.path());

    let cli = CliRunner::new().with_settings(&settings);
    let result = cli.run_robot(&[
        "pack",
        "--config-type",
        "uiflow2_nvs",
        "--input",
        input.to_str().unwrap(),
    ]);
    let _ = result.assert_exit_code(1);

    let err = result.stderr_json();
    assert_eq!(err["kind"], json!("external_tool"));
    let message = err["message"].as_str().unwrap();
    assert!(message.contains("status 4"));
    assert!(message.contains("partition too small"));
}

#[test]
fn hung_tool_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path(), "sleep 30", 1);
    let input = uiflow2_input(dir.path());

    let cli = CliRunner::new().with_settings(&settings);
    let result = cli.run_robot(&[
        "pack",
        "--config-type",
        "uiflow2_nvs",
        "--input",
        input.to_str().unwrap(),
    ]);
    let _ = result
        .assert_exit_code(1)
        .assert_duration_under(std::time::Duration::from_secs(15));
    assert!(result.stderr_json()["message"]
        .as_str()
        .unwrap()
        .contains("did not finish within 1s"));
}

#[test]
fn openai_nvs_merges_into_firmware() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path(), FAKE_NVS_TOOL, 10);
    let input = write_input(
        dir.path(),
        "openai.json",
        &json!({ "ssid": "lab", "pwd": "pw", "openaiKey": "sk-test" }),
    );
    let firmware = write_firmware(dir.path(), 0x10000);

    let cli = CliRunner::new().with_settings(&settings);
    let _ = cli
        .run_robot(&[
            "pack",
            "--config-type",
            "openai_nvs",
            "--input",
            input.to_str().unwrap(),
            "--firmware",
            firmware.to_str().unwrap(),
        ])
        .assert_success()
        .assert_json_field("/result/address", &json!("0x0"));

    let out = dir.path().join("out");
    let csv = fs::read_to_string(out.join("openai.csv")).unwrap();
    assert!(csv.starts_with("key,type,encoding,value\nconfig,namespace,,\n"));
    assert!(csv.ends_with("\nopenaikey,data,string,sk-test"));
    assert_eq!(fs::read(out.join("openai-mixin.bin")).unwrap().len(), 0x10000);
}

#[test]
fn failing_tool_leaves_requested_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    // Writes part of an image, then fails.
    let settings = write_settings(dir.path(), r#"printf partial > "$2"; exit 1"#, 10);
    let input = uiflow2_input(dir.path());
    let target = dir.path().join("nvs.bin");

    let cli = CliRunner::new().with_settings(&settings);
    let _ = cli
        .run(&[
            "pack",
            "--config-type",
            "uiflow2_nvs",
            "--input",
            input.to_str().unwrap(),
            "--output",
            target.to_str().unwrap(),
        ])
        .assert_exit_code(1);

    assert!(!target.exists());
    let leftovers: Vec<_> = fs::read_dir(dir.path().join("out"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}
