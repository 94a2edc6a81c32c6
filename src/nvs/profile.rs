//! Firmware-specific NVS key sets.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::{NvsTable, NAMESPACE};

use crate::error::ValidationError;
use crate::input::require_fields;

/// Namespace read by the OpenAI demo firmware.
pub const OPENAI_NAMESPACE: &str = "config";

/// Firmware keeps three WiFi slots.
pub const MAX_WIFI_NETWORKS: usize = 3;

/// One saved WiFi network. Missing values read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNetwork {
    #[serde(default)]
    pub ssid: String,
    #[serde(default, alias = "pwd")]
    pub password: String,
}

/// UIFlow2 settings stored in NVS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uiflow2Config {
    pub server: String,
    #[serde(default)]
    pub wifi_networks: Vec<WifiNetwork>,
    #[serde(default)]
    pub sntp0: String,
    #[serde(default)]
    pub sntp1: String,
    #[serde(default)]
    pub sntp2: String,
    pub timezone: String,
    pub boot_option: u8,
}

impl Uiflow2Config {
    const REQUIRED: [&'static str; 2] = ["server", "timezone"];

    /// Parse from a raw option map, reporting every missing field at once.
    pub fn from_options(options: &Map<String, Value>) -> Result<Self, ValidationError> {
        const CONTEXT: &str = "UIFlow2 NVS config";

        let mut missing = match require_fields(options, &Self::REQUIRED, CONTEXT) {
            Err(ValidationError::MissingFields { fields, .. }) => fields,
            _ => Vec::new(),
        };
        if !options.contains_key("boot_option") && !options.contains_key("bootOpt") {
            missing.push("bootOpt".to_string());
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields {
                context: CONTEXT.to_string(),
                fields: missing,
            });
        }

        // `boot_option` wins when both spellings are given.
        let mut options = options.clone();
        if let Some(legacy) = options.remove("bootOpt") {
            if options.contains_key("boot_option") {
                debug!("Ignoring bootOpt, boot_option is set");
            } else {
                options.insert("boot_option".to_string(), legacy);
            }
        }
        deserialize(&options, CONTEXT)
    }

    /// Build the `uiflow` namespace table, padding WiFi slots to three.
    pub fn to_table(&self) -> Result<NvsTable, ValidationError> {
        if self.wifi_networks.len() > MAX_WIFI_NETWORKS {
            return Err(ValidationError::TooManyNetworks {
                count: self.wifi_networks.len(),
            });
        }

        let empty = WifiNetwork::default();
        let mut table = NvsTable::new(NAMESPACE);
        table.push_string("server", &self.server);
        for slot in 0..MAX_WIFI_NETWORKS {
            let network = self.wifi_networks.get(slot).unwrap_or(&empty);
            table
                .push_string(&format!("ssid{slot}"), &network.ssid)
                .push_string(&format!("pswd{slot}"), &network.password);
        }
        table
            .push_string("sntp0", &self.sntp0)
            .push_string("sntp1", &self.sntp1)
            .push_string("sntp2", &self.sntp2)
            .push_string("tz", &self.timezone)
            .push_u8("boot_option", self.boot_option);

        debug!(
            networks = self.wifi_networks.len(),
            rows = table.entries().len(),
            "Built UIFlow2 NVS table"
        );
        Ok(table)
    }
}

/// StampPLC settings stored in NVS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampPlcConfig {
    pub ssid: String,
    pub pwd: String,
    pub ufusr: String,
    pub ufpswd: String,
}

impl StampPlcConfig {
    const REQUIRED: [&'static str; 4] = ["ssid", "pwd", "ufusr", "ufpswd"];

    pub fn from_options(options: &Map<String, Value>) -> Result<Self, ValidationError> {
        require_fields(options, &Self::REQUIRED, "StampPLC NVS config")?;
        deserialize(options, "StampPLC NVS config")
    }

    pub fn to_table(&self) -> NvsTable {
        let mut table = NvsTable::new(NAMESPACE);
        table
            .push_string("ssid", &self.ssid)
            .push_string("pswd", &self.pwd)
            .push_string("ufusr", &self.ufusr)
            .push_string("ufpswd", &self.ufpswd);
        table
    }
}

/// Settings for the OpenAI demo firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub ssid: String,
    pub pwd: String,
    #[serde(rename = "openaiKey")]
    pub openai_key: String,
}

impl OpenAiConfig {
    const REQUIRED: [&'static str; 3] = ["ssid", "pwd", "openaiKey"];

    pub fn from_options(options: &Map<String, Value>) -> Result<Self, ValidationError> {
        require_fields(options, &Self::REQUIRED, "OpenAI NVS config")?;
        deserialize(options, "OpenAI NVS config")
    }

    pub fn to_table(&self) -> NvsTable {
        let mut table = NvsTable::new(OPENAI_NAMESPACE);
        table
            .push_string("wifi_ssid", &self.ssid)
            .push_string("wifi_password", &self.pwd)
            .push_string("openaikey", &self.openai_key);
        table
    }
}

fn deserialize<T: serde::de::DeserializeOwned>(
    options: &Map<String, Value>,
    context: &str,
) -> Result<T, ValidationError> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| {
        ValidationError::InvalidField {
            field: context.to_string(),
            reason: e.to_string(),
        }
    })
}
