//! NVS image generation through the generator seam.

use std::fs;

use serde_json::{json, Map, Value};

use m5cfg::error::{CfgError, DecodeError, EncodingError, ExternalToolError, ValidationError};
use m5cfg::nvs::mock::{MockBehavior, MockGenerator};
use m5cfg::nvs::{NVS_OFFSET, NVS_PARTITION_SIZE};
use m5cfg::packer::Packer;

fn packer_with(mock: &MockGenerator) -> (tempfile::TempDir, Packer) {
    let dir = tempfile::tempdir().unwrap();
    let packer = Packer::new(dir.path().join("out"), Box::new(mock.clone())).unwrap();
    (dir, packer)
}

fn obj(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn uiflow2_options() -> Map<String, Value> {
    obj(json!({
        "server": "uiflow2.m5stack.com",
        "wifi_networks": [{ "ssid": "home", "password": "pw" }],
        "sntp0": "pool.ntp.org",
        "timezone": "UTC",
        "bootOpt": 1,
    }))
}

#[test]
fn uiflow2_csv_pads_networks_to_three() {
    let mock = MockGenerator::new();
    let (_dir, packer) = packer_with(&mock);
    let out = packer.pack_uiflow2_nvs(&uiflow2_options(), None, None).unwrap();

    assert_eq!(out.address, "0x9000");
    assert_eq!(out.path, packer.out_dir().join("uiflow2-cfg.bin"));
    assert_eq!(out.size, u64::from(NVS_PARTITION_SIZE));

    let call = mock.last_invocation().unwrap();
    assert_eq!(call.partition_size, 0x6000);
    assert_eq!(call.csv_path, packer.out_dir().join("uiflow2.csv"));
    let expected = "key,type,encoding,value\n\
                    uiflow,namespace,,\n\
                    server,data,string,uiflow2.m5stack.com\n\
                    ssid0,data,string,home\n\
                    pswd0,data,string,pw\n\
                    ssid1,data,string,\n\
                    pswd1,data,string,\n\
                    ssid2,data,string,\n\
                    pswd2,data,string,\n\
                    sntp0,data,string,pool.ntp.org\n\
                    sntp1,data,string,\n\
                    sntp2,data,string,\n\
                    tz,data,string,UTC\n\
                    boot_option,data,u8,1";
    assert_eq!(call.csv, expected);
}

#[test]
fn four_networks_never_reach_the_generator() {
    let mock = MockGenerator::new();
    let (_dir, packer) = packer_with(&mock);
    let mut options = uiflow2_options();
    options.insert(
        "wifi_networks".into(),
        json!([{ "ssid": "a" }, { "ssid": "b" }, { "ssid": "c" }, { "ssid": "d" }]),
    );

    let err = packer.pack_uiflow2_nvs(&options, None, None).unwrap_err();
    assert!(matches!(
        err,
        CfgError::Validation(ValidationError::TooManyNetworks { count: 4 })
    ));
    assert!(mock.invocations().is_empty());
}

#[test]
fn missing_boot_option_is_reported() {
    let mock = MockGenerator::new();
    let (_dir, packer) = packer_with(&mock);
    let err = packer
        .pack_uiflow2_nvs(&obj(json!({ "server": "s", "timezone": "UTC" })), None, None)
        .unwrap_err();
    match err {
        CfgError::Validation(ValidationError::MissingFields { fields, .. }) => {
            assert_eq!(fields, vec!["bootOpt"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn generator_failure_propagates_status_and_stderr() {
    let mock = MockGenerator::with_behavior(MockBehavior::Fail {
        status: 2,
        stderr: "No module named 'esp_idf_nvs_partition_gen'".to_string(),
    });
    let (_dir, packer) = packer_with(&mock);
    let err = packer.pack_uiflow2_nvs(&uiflow2_options(), None, None).unwrap_err();

    assert_eq!(err.kind(), "external_tool");
    match err {
        CfgError::ExternalTool(ExternalToolError::Failed { status, stderr, .. }) => {
            assert_eq!(status, Some(2));
            assert!(stderr.contains("esp_idf_nvs_partition_gen"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn generator_timeout_propagates() {
    let mock = MockGenerator::with_behavior(MockBehavior::Timeout);
    let (_dir, packer) = packer_with(&mock);
    let err = packer.pack_uiflow2_nvs(&uiflow2_options(), None, None).unwrap_err();
    assert!(matches!(
        err,
        CfgError::ExternalTool(ExternalToolError::Timeout { .. })
    ));
}

#[test]
fn stamplc_table_and_mixin() {
    let mock = MockGenerator::new();
    let (dir, packer) = packer_with(&mock);
    let firmware_path = dir.path().join("fw.bin");
    fs::write(&firmware_path, vec![0xA5u8; 0x20000]).unwrap();

    let options = obj(json!({ "ssid": "plc", "pwd": "p,w", "ufusr": "me", "ufpswd": "x" }));
    let out = packer
        .pack_stamplc_nvs(&options, None, Some(&firmware_path))
        .unwrap();

    assert_eq!(out.address, "0x0");
    assert_eq!(out.path, packer.out_dir().join("stamplc-mixin.bin"));
    let merged = fs::read(&out.path).unwrap();
    assert_eq!(merged.len(), 0x20000);

    let csv = mock.last_invocation().unwrap().csv;
    assert!(csv.contains("\npswd,data,string,\"p,w\""));

    let nvs = &merged[NVS_OFFSET..NVS_OFFSET + NVS_PARTITION_SIZE as usize];
    assert!(nvs.starts_with(b"key,type,encoding,value"));
    assert!(merged[..NVS_OFFSET].iter().all(|&b| b == 0xA5));
    assert!(merged[NVS_OFFSET + NVS_PARTITION_SIZE as usize..]
        .iter()
        .all(|&b| b == 0xA5));
}

#[test]
fn short_firmware_is_rejected_before_generating() {
    let mock = MockGenerator::new();
    let (dir, packer) = packer_with(&mock);
    let firmware_path = dir.path().join("fw.bin");
    fs::write(&firmware_path, vec![0u8; 0x1000]).unwrap();

    let err = packer
        .pack_uiflow2_nvs(&uiflow2_options(), None, Some(&firmware_path))
        .unwrap_err();
    assert!(matches!(
        err,
        CfgError::Decode(DecodeError::InvalidSize { expected: 0xF000, actual: 0x1000 })
    ));
    assert!(mock.invocations().is_empty());
}

#[test]
fn wrong_size_image_cannot_be_mixed() {
    let mock = MockGenerator::with_behavior(MockBehavior::WrongSize(0x5000));
    let (dir, packer) = packer_with(&mock);
    let firmware_path = dir.path().join("fw.bin");
    fs::write(&firmware_path, vec![0u8; 0x10000]).unwrap();

    let err = packer
        .pack_uiflow2_nvs(&uiflow2_options(), None, Some(&firmware_path))
        .unwrap_err();
    assert!(matches!(
        err,
        CfgError::Encoding(EncodingError::ImageSizeMismatch { expected: 0x6000, actual: 0x5000 })
    ));
}
