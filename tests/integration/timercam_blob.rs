//! TimerCam blob generation and read-back through the packer.

use std::fs;

use serde_json::{json, Map, Value};

use m5cfg::codec::block::BLOCK_SIZE;
use m5cfg::codec::checksum;
use m5cfg::codec::timercam::{self, Mode};
use m5cfg::error::{CfgError, DecodeError, EncodingError, ValidationError};
use m5cfg::nvs::mock::MockGenerator;
use m5cfg::packer::Packer;

fn packer() -> (tempfile::TempDir, Packer) {
    let dir = tempfile::tempdir().unwrap();
    let packer = Packer::new(dir.path().join("out"), Box::new(MockGenerator::new())).unwrap();
    (dir, packer)
}

fn obj(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

/// A complete option set for `mode`, with a valid resolution.
fn full_options(mode: Mode) -> Map<String, Value> {
    let mut options = Map::new();
    options.insert("mode".into(), json!(mode.as_str()));
    for field in mode.required_fields() {
        let value = match *field {
            "image_size" => json!(5),
            "size" => json!(11),
            "wake_time" | "interval" => json!(60),
            other => json!(format!("{other}-value")),
        };
        options.insert((*field).to_string(), value);
    }
    options
}

#[test]
fn rtsp_block_is_byte_exact() {
    let (_dir, packer) = packer();
    let out = packer
        .pack_timercam(
            &obj(json!({ "mode": "rtsp", "wifi_ssid": "Net", "wifi_pwd": "Pass", "extra": 1 })),
            None,
        )
        .unwrap();
    assert_eq!(out.address, "0x3ff000");

    let block = fs::read(&out.path).unwrap();
    let payload = br#"{"wifi_ssid":"Net","wifi_pwd":"Pass"}"#;
    let len = payload.len();
    assert_eq!(block.len(), BLOCK_SIZE);
    assert_eq!(usize::from(u16::from_be_bytes([block[0], block[1]])), len);
    assert_eq!(&block[2..2 + len], payload);
    assert_eq!(block[2 + len], checksum::compute(&block[..2 + len]));
    assert!(block[3 + len..].iter().all(|&b| b == 0xFF));
}

#[test]
fn every_mode_produces_one_sector() {
    let (_dir, packer) = packer();
    for mode in Mode::ALL {
        let out = packer.pack_timercam(&full_options(mode), None).unwrap();
        assert_eq!(out.size, BLOCK_SIZE as u64, "{mode}");
        assert_eq!(out.path, packer.out_dir().join(mode.file_name()));
        assert_eq!(fs::read(&out.path).unwrap().len(), BLOCK_SIZE);
    }
}

#[test]
fn payload_keeps_schema_order_and_drops_unknown_keys() {
    let mut options = full_options(Mode::Smb);
    options.insert("comment".into(), json!("ignored"));
    let block = timercam::encode(&options).unwrap();
    let fields = timercam::decode(&block).unwrap();

    let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
    assert_eq!(keys, Mode::Smb.required_fields());
}

#[test]
fn read_back_writes_payload_json() {
    let (_dir, packer) = packer();
    let blob = packer.pack_timercam(&full_options(Mode::Basic), None).unwrap();
    let out = packer.unpack_timercam(&blob.path, None).unwrap();

    assert_eq!(out.path, packer.out_dir().join("timercam.json"));
    assert_eq!(out.config["image_size"], json!(5));
    assert_eq!(out.config["ssid"], json!("ssid-value"));
}

#[test]
fn basic_mode_without_wake_time_lists_it() {
    let mut options = full_options(Mode::Basic);
    options.remove("wake_time");
    match timercam::encode(&options).unwrap_err() {
        CfgError::Validation(ValidationError::MissingFields { fields, .. }) => {
            assert_eq!(fields, vec!["wake_time"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn resolution_is_checked_before_missing_fields() {
    let options = obj(json!({ "mode": "s3", "size": 5 }));
    let err = timercam::encode(&options).unwrap_err();
    assert!(matches!(
        err,
        CfgError::Validation(ValidationError::InvalidResolution { mode: Mode::S3, .. })
    ));
    let message = err.to_string();
    assert!(message.contains("8: 640x480"));
    assert!(message.contains("14: 1920x1080"));
}

#[test]
fn unknown_mode_names_the_valid_ones() {
    let err = timercam::encode(&obj(json!({ "mode": "ftp" }))).unwrap_err();
    assert!(matches!(
        err,
        CfgError::Validation(ValidationError::UnknownMode { .. })
    ));
}

#[test]
fn oversized_payload_is_rejected_without_writing() {
    let (_dir, packer) = packer();
    let options = obj(json!({
        "mode": "rtsp",
        "wifi_ssid": "n".repeat(4100),
        "wifi_pwd": "p",
    }));
    let err = packer.pack_timercam(&options, None).unwrap_err();
    assert!(matches!(
        err,
        CfgError::Encoding(EncodingError::PayloadTooLarge { max: 4093, .. })
    ));
    assert!(!packer.out_dir().join("timercam-rtsp.cfg").exists());
}

#[test]
fn corrupted_block_fails_checksum() {
    let mut block = timercam::encode(&full_options(Mode::Rtsp)).unwrap();
    block[4] ^= 0x20;
    assert!(matches!(
        timercam::decode(&block).unwrap_err(),
        DecodeError::ChecksumMismatch { field: "payload", .. }
    ));
}

#[test]
fn largest_payload_still_fits() {
    let (_dir, packer) = packer();
    // {"wifi_ssid":"","wifi_pwd":"p"} adds 31 bytes around the SSID.
    let options = obj(json!({
        "mode": "rtsp",
        "wifi_ssid": "n".repeat(4093 - 31),
        "wifi_pwd": "p",
    }));
    let out = packer.pack_timercam(&options, None).unwrap();
    let block = fs::read(&out.path).unwrap();
    assert_eq!(u16::from_be_bytes([block[0], block[1]]), 4093);
    assert_eq!(block[4095], checksum::compute(&block[..4095]));
}
