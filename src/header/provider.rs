use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{SignalError, SignalResult};

/// Read-only access to the header document that accompanies a signal file.
///
/// Values are handed over as loosely typed as the document stores them; they
/// are normalized once by [`super::ingest`] and never looked up again.
pub trait HeaderProvider {
    /// Duration of one frame in seconds
    fn frame_length(&self) -> f64;

    /// Duration of one epoch in seconds
    fn epoch_length(&self) -> f64;

    /// Byte order token, `big` or `little` in any case
    fn endian(&self) -> &str;

    /// Source records in on-disk channel order
    fn sources(&self) -> &[SourceRecord];

    /// Epoch numbers listed by the header's epoch enumeration
    fn epoch_numbers(&self) -> Vec<u64>;
}

impl<T: HeaderProvider + ?Sized> HeaderProvider for &T {
    fn frame_length(&self) -> f64 {
        (**self).frame_length()
    }

    fn epoch_length(&self) -> f64 {
        (**self).epoch_length()
    }

    fn endian(&self) -> &str {
        (**self).endian()
    }

    fn sources(&self) -> &[SourceRecord] {
        (**self).sources()
    }

    fn epoch_numbers(&self) -> Vec<u64> {
        (**self).epoch_numbers()
    }
}

impl<T: HeaderProvider + ?Sized> HeaderProvider for Arc<T> {
    fn frame_length(&self) -> f64 {
        (**self).frame_length()
    }

    fn epoch_length(&self) -> f64 {
        (**self).epoch_length()
    }

    fn endian(&self) -> &str {
        (**self).endian()
    }

    fn sources(&self) -> &[SourceRecord] {
        (**self).sources()
    }

    fn epoch_numbers(&self) -> Vec<u64> {
        (**self).epoch_numbers()
    }
}

/// One source entry as written in the header document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceRecord {
    pub source_name: String,
    pub sample_width: u64,
    pub sample_frequency: u64,
    /// Raw signedness token; only the literal `"true"` means signed
    #[serde(default, deserialize_with = "token")]
    pub signed: Option<String>,
}

impl SourceRecord {
    pub fn new(name: &str, sample_width: u64, sample_frequency: u64, signed: bool) -> Self {
        Self {
            source_name: name.to_string(),
            sample_width,
            sample_frequency,
            signed: Some(signed.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EpochRecord {
    pub epoch_number: u64,
}

/// Header document in its JSON form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XdfHeader {
    #[serde(default)]
    pub id: Option<String>,
    pub frame_length: f64,
    pub epoch_length: f64,
    pub endian: String,
    pub sources: Vec<SourceRecord>,
    #[serde(default)]
    pub epochs: Vec<EpochRecord>,
}

impl XdfHeader {
    pub fn from_json_str(json: &str) -> SignalResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a header document from disk
    pub fn load(path: impl AsRef<Path>) -> SignalResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| SignalError::io(path, e))?;
        Self::from_json_str(&json)
    }
}

impl HeaderProvider for XdfHeader {
    fn frame_length(&self) -> f64 {
        self.frame_length
    }

    fn epoch_length(&self) -> f64 {
        self.epoch_length
    }

    fn endian(&self) -> &str {
        &self.endian
    }

    fn sources(&self) -> &[SourceRecord] {
        &self.sources
    }

    fn epoch_numbers(&self) -> Vec<u64> {
        self.epochs.iter().map(|e| e.epoch_number).collect()
    }
}

/// Accepts `"Signed": "true"` as well as `"Signed": true`, keeping the token text
fn token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Token {
        Text(String),
        Flag(bool),
    }

    Ok(Option::<Token>::deserialize(deserializer)?.map(|t| match t {
        Token::Text(s) => s,
        Token::Flag(b) => b.to_string(),
    }))
}
