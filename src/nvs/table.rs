//! CSV table consumed by the NVS partition generator.

use std::fmt::Write as _;

/// Value encoding column of a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    String,
    U8,
}

impl Encoding {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::U8 => "u8",
        }
    }
}

/// One `key,data,<encoding>,<value>` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NvsEntry {
    pub key: String,
    pub encoding: Encoding,
    pub value: String,
}

/// A single-namespace NVS table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NvsTable {
    namespace: String,
    entries: Vec<NvsEntry>,
}

impl NvsTable {
    pub const HEADER: &'static str = "key,type,encoding,value";

    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn entries(&self) -> &[NvsEntry] {
        &self.entries
    }

    pub fn push_string(&mut self, key: &str, value: &str) -> &mut Self {
        self.push(key, Encoding::String, value.to_string())
    }

    pub fn push_u8(&mut self, key: &str, value: u8) -> &mut Self {
        self.push(key, Encoding::U8, value.to_string())
    }

    fn push(&mut self, key: &str, encoding: Encoding, value: String) -> &mut Self {
        self.entries.push(NvsEntry {
            key: key.to_string(),
            encoding,
            value,
        });
        self
    }

    /// Value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Render as CSV. No trailing newline.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(Self::HEADER);
        let _ = write!(out, "\n{},namespace,,", escape(&self.namespace));
        for entry in &self.entries {
            let _ = write!(
                out,
                "\n{},data,{},{}",
                escape(&entry.key),
                entry.encoding.as_str(),
                escape(&entry.value)
            );
        }
        out
    }
}

/// Quote a CSV cell when it would otherwise split the row.
fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
