use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SignalError, SignalResult};
use crate::header::{ByteOrder, HeaderMetadata, RecordingMetadata, SourceDescriptor};

/// Largest sample width that still decodes into a [`Sample`](super::Sample)
pub const MAX_SAMPLE_WIDTH: usize = 16;

/// Tolerance used when checking that a product or ratio of durations is whole
pub(crate) const INTEGRAL_TOLERANCE: f64 = 1e-9;

/// Position and encoding of one channel inside every frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLayout {
    pub name: String,
    pub sample_width: usize,
    pub sample_frequency: u32,
    pub signed: bool,
    /// Byte offset of the channel from the start of a frame
    pub offset: usize,
    /// Bytes the channel occupies in one frame
    pub width: usize,
}

/// Byte layout of a recording, derived once from its metadata.
///
/// Channels keep descriptor order: the first listed source occupies the
/// earliest bytes of every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrameSchema")]
pub struct FrameSchema {
    frame_length: f64,
    epoch_length: f64,
    byte_order: ByteOrder,
    frame_width: usize,
    channels: Vec<ChannelLayout>,
}

/// Unchecked serde form of [`FrameSchema`]
#[derive(Debug, Deserialize)]
struct RawFrameSchema {
    frame_length: f64,
    epoch_length: f64,
    byte_order: ByteOrder,
    frame_width: usize,
    channels: Vec<ChannelLayout>,
}

impl TryFrom<RawFrameSchema> for FrameSchema {
    type Error = SignalError;

    /// Re-check a layout that did not come from [`FrameSchema::build`]
    fn try_from(raw: RawFrameSchema) -> SignalResult<Self> {
        HeaderMetadata::new(raw.frame_length, raw.epoch_length, raw.byte_order)?;

        let mut seen = HashSet::with_capacity(raw.channels.len());
        let mut offset = 0usize;

        for c in &raw.channels {
            check_encoding(&c.name, c.sample_width, c.sample_frequency, c.signed)?;
            if !seen.insert(c.name.as_str()) {
                return Err(SignalError::metadata(format!(
                    "Duplicate channel name '{}'",
                    c.name
                )));
            }
            if c.offset != offset {
                return Err(SignalError::metadata(format!(
                    "Channel '{}' starts at byte {}, expected {}",
                    c.name, c.offset, offset
                )));
            }
            if c.width == 0 || c.width % c.sample_width != 0 {
                return Err(SignalError::metadata(format!(
                    "Channel '{}' width {} is not a whole number of {}-byte samples",
                    c.name, c.width, c.sample_width
                )));
            }

            offset = offset.checked_add(c.width).ok_or_else(|| {
                SignalError::metadata("Frame width overflows the address space")
            })?;
        }

        if offset == 0 || offset != raw.frame_width {
            return Err(SignalError::metadata(format!(
                "Frame width {} does not match the channel widths (sum {})",
                raw.frame_width, offset
            )));
        }

        Ok(Self {
            frame_length: raw.frame_length,
            epoch_length: raw.epoch_length,
            byte_order: raw.byte_order,
            frame_width: raw.frame_width,
            channels: raw.channels,
        })
    }
}

/// Per-channel encoding checks shared by the builder and deserialization.
///
/// Unsigned samples of the full width would not fit the signed sample type.
fn check_encoding(name: &str, sample_width: usize, sample_frequency: u32, signed: bool) -> SignalResult<()> {
    if sample_frequency == 0 {
        return Err(SignalError::metadata(format!(
            "Source '{}' sample frequency has 0 value",
            name
        )));
    }
    if sample_width == 0 {
        return Err(SignalError::metadata(format!(
            "Source '{}' sample width has 0 value",
            name
        )));
    }
    if sample_width > MAX_SAMPLE_WIDTH || (sample_width == MAX_SAMPLE_WIDTH && !signed) {
        return Err(SignalError::metadata(format!(
            "Source '{}' {} {}-byte samples do not fit a 128-bit integer",
            name,
            if signed { "signed" } else { "unsigned" },
            sample_width
        )));
    }
    Ok(())
}

impl FrameSchema {
    /// Derive and validate the layout.
    ///
    /// Rejects zero frequencies, zero widths, widths that do not fit a
    /// 128-bit sample, fractional channel widths, duplicate names and an
    /// empty frame.
    pub fn build(header: &HeaderMetadata, sources: &[SourceDescriptor]) -> SignalResult<Self> {
        let mut seen = HashSet::with_capacity(sources.len());
        let mut channels = Vec::with_capacity(sources.len());
        let mut offset = 0usize;

        for source in sources {
            check_encoding(
                &source.name,
                source.sample_width,
                source.sample_frequency,
                source.signed,
            )?;
            if !seen.insert(source.name.as_str()) {
                return Err(SignalError::metadata(format!(
                    "Duplicate source name '{}'",
                    source.name
                )));
            }

            let width = Self::channel_width(source, header.frame_length)?;

            channels.push(ChannelLayout {
                name: source.name.clone(),
                sample_width: source.sample_width,
                sample_frequency: source.sample_frequency,
                signed: source.signed,
                offset,
                width,
            });

            offset = offset.checked_add(width).ok_or_else(|| {
                SignalError::metadata("Frame width overflows the address space")
            })?;
        }

        if offset == 0 {
            return Err(SignalError::metadata("Frame width has 0 value"));
        }

        debug!(
            frame_width = offset,
            channels = channels.len(),
            byte_order = %header.byte_order,
            "Built frame schema"
        );

        Ok(Self {
            frame_length: header.frame_length,
            epoch_length: header.epoch_length,
            byte_order: header.byte_order,
            frame_width: offset,
            channels,
        })
    }

    pub fn from_metadata(metadata: &RecordingMetadata) -> SignalResult<Self> {
        Self::build(&metadata.header, &metadata.sources)
    }

    /// SampleWidth × SampleFrequency × FrameLength, which must be a whole,
    /// non-zero number of bytes
    fn channel_width(source: &SourceDescriptor, frame_length: f64) -> SignalResult<usize> {
        let bytes = source.sample_width as f64 * source.sample_frequency as f64 * frame_length;
        let rounded = bytes.round();

        if (bytes - rounded).abs() > INTEGRAL_TOLERANCE * rounded.max(1.0) {
            return Err(SignalError::metadata(format!(
                "Source '{}' occupies {} bytes per frame, not a whole number",
                source.name, bytes
            )));
        }
        if rounded < 1.0 || rounded >= usize::MAX as f64 {
            return Err(SignalError::metadata(format!(
                "Source '{}' channel width {} is out of range",
                source.name, bytes
            )));
        }

        Ok(rounded as usize)
    }

    pub fn frame_length(&self) -> f64 {
        self.frame_length
    }

    pub fn epoch_length(&self) -> f64 {
        self.epoch_length
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Bytes per frame across all channels
    pub fn frame_width(&self) -> usize {
        self.frame_width
    }

    pub fn channels(&self) -> &[ChannelLayout] {
        &self.channels
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.name == name)
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelLayout> {
        self.channels.iter().find(|c| c.name == name)
    }
}
