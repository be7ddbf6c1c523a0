use serde::{Deserialize, Serialize};
use std::fmt;

/// Display text for a field the scale did not send.
pub const ABSENT: &str = "-";
/// Display text for a mandatory weight field the scale did not send.
pub const UNREADABLE: &str = "ERROR";

/// One value read from the scale.
///
/// The wire format has no nulls, only the `"-"` and `"ERROR"` sentinels.
/// They are folded into variants at the parsing boundary and turned back
/// into text only for display and label output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Field {
    Present(String),
    #[default]
    Absent,
    Unreadable,
}

impl Field {
    pub fn from_wire(text: &str) -> Self {
        match text {
            ABSENT => Field::Absent,
            UNREADABLE => Field::Unreadable,
            other => Field::Present(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Field::Present(text) => text,
            Field::Absent => ABSENT,
            Field::Unreadable => UNREADABLE,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Field::Present(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Field {
    fn from(text: &str) -> Self {
        Field::from_wire(text)
    }
}

impl From<String> for Field {
    fn from(text: String) -> Self {
        Field::from_wire(&text)
    }
}

impl From<Field> for String {
    fn from(field: Field) -> Self {
        field.as_str().to_string()
    }
}

/// A full reading from one scale poll. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Measurement {
    pub net: Field,
    pub gross: Field,
    pub tare: Field,
    pub serial: Field,
    pub ticket: Field,
}

impl Measurement {
    pub fn audit_line(&self) -> String {
        format!(
            "READ | Net:{} | Gross:{} | Tare:{} | Serial:{} | Ticket:{}",
            self.net, self.gross, self.tare, self.serial, self.ticket
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleEndpoint {
    pub name: String,
    pub url: String,
}

impl ScaleEndpoint {
    pub fn selection_status(&self) -> String {
        format!("Selected Scale: {}  →  {}", self.name, self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterEndpoint {
    pub name: String,
    pub ip: String,
    pub port: u16,
}

impl PrinterEndpoint {
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Test,
    PlainData,
    BarcodeData,
}

impl std::str::FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(TemplateKind::Test),
            "plain" | "plain_data" => Ok(TemplateKind::PlainData),
            "barcode" | "barcode_data" => Ok(TemplateKind::BarcodeData),
            other => Err(format!(
                "unknown template '{}', expected test, plain or barcode",
                other
            )),
        }
    }
}

/// Finished label markup, sent to a printer as UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDocument(String);

impl LabelDocument {
    pub(crate) fn new(markup: String) -> Self {
        Self(markup)
    }

    /// Wrap text an operator edited before printing. Surrounding whitespace
    /// is dropped and an empty document is refused.
    pub fn from_text(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LabelDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
