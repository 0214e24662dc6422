use serde::{Deserialize, Serialize};

use super::encoding::decode;

/// TTL used for new TXT records when the name has no existing records.
pub const DEFAULT_TXT_TTL: u32 = 300;

/// Position of the serial within an SOA record's data (mname, rname, serial, ...).
const SOA_SERIAL_INDEX: usize = 2;

/// Envelope shared by every UAPI response.
#[derive(Debug, Default, Deserialize)]
pub struct UapiResponse {
    #[serde(default)]
    pub errors: Option<Vec<String>>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default)]
    pub messages: Option<Vec<String>>,
    #[serde(default)]
    pub status: i64,
}

impl UapiResponse {
    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or_default()
    }

    pub fn warnings(&self) -> &[String] {
        self.warnings.as_deref().unwrap_or_default()
    }

    pub fn messages(&self) -> &[String] {
        self.messages.as_deref().unwrap_or_default()
    }
}

// https://api.docs.cpanel.net/openapi/cpanel/operation/dns-parse_zone/
#[derive(Debug, Default, Deserialize)]
pub struct ParseZoneResponse {
    #[serde(flatten)]
    pub envelope: UapiResponse,
    #[serde(default)]
    pub data: Option<Vec<WireZoneRecord>>,
}

/// A zone entry exactly as `parse_zone` sends it: textual fields are base64.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireZoneRecord {
    #[serde(default)]
    pub line_index: u32,
    #[serde(rename = "type", default)]
    pub entry_type: String, // "record", "comment", "control"
    #[serde(default)]
    pub record_type: Option<String>, // "SOA", "TXT", ...
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub dname_b64: Option<String>,
    #[serde(default)]
    pub data_b64: Option<Vec<String>>, // SOA carries several, TXT one
    #[serde(default)]
    pub text_b64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordType {
    Soa,
    Txt,
    Other(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::Soa => "SOA",
            RecordType::Txt => "TXT",
            RecordType::Other(other) => other.as_str(),
        }
    }
}

impl From<&str> for RecordType {
    fn from(value: &str) -> Self {
        match value {
            "SOA" => RecordType::Soa,
            "TXT" => RecordType::Txt,
            other => RecordType::Other(other.to_string()),
        }
    }
}

/// A zone entry with its name, data and free text decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRecord {
    /// Deletion handle; not a content key.
    pub line_index: u32,
    pub record_type: RecordType,
    pub ttl: u32,
    pub name: String,
    pub data: Vec<String>,
    pub text: String,
}

impl ZoneRecord {
    pub fn from_wire(wire: &WireZoneRecord) -> Self {
        Self {
            line_index: wire.line_index,
            record_type: RecordType::from(wire.record_type.as_deref().unwrap_or_default()),
            ttl: wire.ttl,
            name: wire.dname_b64.as_deref().map(decode).unwrap_or_default(),
            data: wire
                .data_b64
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|d| decode(d))
                .collect(),
            text: wire.text_b64.as_deref().map(decode).unwrap_or_default(),
        }
    }

    /// First data value, which is the whole content of a TXT record.
    pub fn value(&self) -> Option<&str> {
        self.data.first().map(String::as_str)
    }

    fn is_txt_named(&self, name: &str) -> bool {
        self.record_type == RecordType::Txt && self.name == name
    }
}

/// Outcome of scanning a zone before presenting a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentLookup<'a> {
    /// Record that already carries the exact name and value.
    pub existing: Option<&'a ZoneRecord>,
    /// TTL of the first same-named TXT record, or the default.
    pub ttl: u32,
}

/// Decoded snapshot of a zone. Fetched fresh per operation and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSnapshot {
    pub records: Vec<ZoneRecord>,
}

impl ZoneSnapshot {
    pub fn from_wire(records: &[WireZoneRecord]) -> Self {
        Self {
            records: records.iter().map(ZoneRecord::from_wire).collect(),
        }
    }

    /// Serial of the first SOA record, or an empty string when there is none.
    pub fn serial(&self) -> String {
        self.records
            .iter()
            .find(|r| r.record_type == RecordType::Soa)
            .and_then(|soa| soa.data.get(SOA_SERIAL_INDEX))
            .cloned()
            .unwrap_or_default()
    }

    pub fn find_for_present(&self, name: &str, value: &str) -> PresentLookup<'_> {
        let mut ttl = None;
        for record in self.records.iter().filter(|r| r.is_txt_named(name)) {
            // All records sharing a name must share a TTL, so reuse what other
            // ACME clients already wrote.
            let first_ttl = *ttl.get_or_insert(record.ttl);
            if record.value() == Some(value) {
                return PresentLookup {
                    existing: Some(record),
                    ttl: first_ttl,
                };
            }
        }

        PresentLookup {
            existing: None,
            ttl: ttl.unwrap_or(DEFAULT_TXT_TTL),
        }
    }

    /// Line index of the TXT record matching both name and value. With
    /// duplicates, the last one in zone order.
    pub fn find_for_delete(&self, name: &str, value: &str) -> Option<u32> {
        self.records
            .iter()
            .rev()
            .find(|r| r.is_txt_named(name) && r.value() == Some(value))
            .map(|r| r.line_index)
    }
}

// https://api.docs.cpanel.net/openapi/cpanel/operation/dns-mass_edit_zone/
#[derive(Debug, Serialize)]
pub struct ZoneRecordAdd<'a> {
    pub dname: &'a str,
    pub ttl: u32,
    pub record_type: &'a str,
    pub data: [&'a str; 1],
}
