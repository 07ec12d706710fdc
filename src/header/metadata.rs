use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::provider::{HeaderProvider, SourceRecord};
use crate::error::{SignalError, SignalResult};

/// Byte significance convention of multi-byte samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    Big,
    Little,
}

impl FromStr for ByteOrder {
    type Err = SignalError;

    fn from_str(s: &str) -> SignalResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "big" => Ok(ByteOrder::Big),
            "little" => Ok(ByteOrder::Little),
            other => Err(SignalError::metadata(format!(
                "Unknown byte order '{}', expected 'big' or 'little'",
                other
            ))),
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Big => write!(f, "big"),
            ByteOrder::Little => write!(f, "little"),
        }
    }
}

/// Recording-wide parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderMetadata {
    /// Seconds per frame
    pub frame_length: f64,
    /// Seconds per epoch
    pub epoch_length: f64,
    pub byte_order: ByteOrder,
}

impl HeaderMetadata {
    pub fn new(frame_length: f64, epoch_length: f64, byte_order: ByteOrder) -> SignalResult<Self> {
        Self::validate_duration("FrameLength", frame_length)?;
        Self::validate_duration("EpochLength", epoch_length)?;

        Ok(Self {
            frame_length,
            epoch_length,
            byte_order,
        })
    }

    fn validate_duration(key: &str, value: f64) -> SignalResult<()> {
        if !value.is_finite() || value <= 0.0 {
            return Err(SignalError::metadata(format!(
                "{} must be a positive number of seconds, got {}",
                key, value
            )));
        }
        Ok(())
    }
}

/// One recorded channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    /// Bytes per sample
    pub sample_width: usize,
    /// Samples per second
    pub sample_frequency: u32,
    pub signed: bool,
}

impl SourceDescriptor {
    pub fn new(name: &str, sample_width: usize, sample_frequency: u32, signed: bool) -> Self {
        Self {
            name: name.to_string(),
            sample_width,
            sample_frequency,
            signed,
        }
    }

    /// Normalize a raw source record. Zero widths and frequencies are let
    /// through here and rejected by the schema builder.
    pub fn from_record(record: &SourceRecord) -> SignalResult<Self> {
        let sample_width = usize::try_from(record.sample_width).map_err(|_| {
            SignalError::metadata(format!(
                "Source '{}' sample width {} is out of range",
                record.source_name, record.sample_width
            ))
        })?;
        let sample_frequency = u32::try_from(record.sample_frequency).map_err(|_| {
            SignalError::metadata(format!(
                "Source '{}' sample frequency {} is out of range",
                record.source_name, record.sample_frequency
            ))
        })?;

        Ok(Self {
            name: record.source_name.clone(),
            sample_width,
            sample_frequency,
            signed: record.signed.as_deref() == Some("true"),
        })
    }
}

/// Typed metadata of one recording
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingMetadata {
    pub header: HeaderMetadata,
    pub sources: Vec<SourceDescriptor>,
}

/// Convert provider values into typed metadata.
///
/// This is the only place header tokens are interpreted.
pub fn ingest<H: HeaderProvider + ?Sized>(provider: &H) -> SignalResult<RecordingMetadata> {
    let byte_order: ByteOrder = provider.endian().parse()?;
    let header = HeaderMetadata::new(provider.frame_length(), provider.epoch_length(), byte_order)?;

    let sources = provider
        .sources()
        .iter()
        .map(SourceDescriptor::from_record)
        .collect::<SignalResult<Vec<_>>>()?;

    Ok(RecordingMetadata { header, sources })
}
