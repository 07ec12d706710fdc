use std::collections::HashMap;

use tracing::debug;

use super::schema::{FrameSchema, INTEGRAL_TOLERANCE};
use super::slicer::RawFrame;
use crate::config::TruncationPolicy;
use crate::error::{SignalError, SignalResult};

/// Per-channel byte buffers of consecutive epochs, in chronological order
pub type EpochBuffers = HashMap<String, Vec<Vec<u8>>>;

/// Number of frames that make up one epoch.
///
/// EpochLength must be a whole multiple of FrameLength; anything else would
/// produce misaligned epochs and is rejected.
pub fn frames_per_epoch(schema: &FrameSchema) -> SignalResult<usize> {
    let ratio = schema.epoch_length() / schema.frame_length();
    let rounded = ratio.round();

    if !ratio.is_finite()
        || rounded < 1.0
        || (ratio - rounded).abs() > INTEGRAL_TOLERANCE * rounded.max(1.0)
    {
        return Err(SignalError::structural(format!(
            "Incompatible epoch/frame length: {}s epochs are not a whole number of {}s frames",
            schema.epoch_length(),
            schema.frame_length()
        )));
    }

    Ok(rounded as usize)
}

/// Groups sliced frames into per-channel epoch buffers
pub struct EpochAssembler<'a> {
    schema: &'a FrameSchema,
    frames: &'a [RawFrame],
    data: &'a [u8],
    policy: TruncationPolicy,
}

impl<'a> EpochAssembler<'a> {
    pub fn new(schema: &'a FrameSchema, frames: &'a [RawFrame], data: &'a [u8]) -> Self {
        Self {
            schema,
            frames,
            data,
            policy: TruncationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TruncationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of complete epochs. Under the strict policy leftover frames
    /// are an error instead of being dropped.
    pub fn epoch_count(&self) -> SignalResult<usize> {
        let per_epoch = frames_per_epoch(self.schema)?;
        let leftover = self.frames.len() % per_epoch;

        if leftover > 0 {
            if self.policy.is_strict() {
                return Err(SignalError::structural(format!(
                    "{} trailing frames do not fill a {}-frame epoch",
                    leftover, per_epoch
                )));
            }
            debug!(leftover, per_epoch, "Dropping frames of incomplete epoch");
        }

        Ok(self.frames.len() / per_epoch)
    }

    /// Epoch buffers of the channel at `channel` (schema order)
    pub fn assemble_channel(&self, channel: usize) -> SignalResult<Vec<Vec<u8>>> {
        let layout = self.schema.channels().get(channel).ok_or_else(|| {
            SignalError::structural(format!("Channel index {} out of range", channel))
        })?;
        let per_epoch = frames_per_epoch(self.schema)?;
        let epochs = self.epoch_count()?;

        let mut buffers = Vec::with_capacity(epochs);

        for run in self.frames.chunks_exact(per_epoch) {
            let mut buffer = Vec::with_capacity(layout.width * per_epoch);

            for frame in run {
                let bytes = frame
                    .span(channel)
                    .and_then(|span| self.data.get(span.clone()))
                    .ok_or_else(|| {
                        SignalError::structural(format!(
                            "Frame {} has no bytes for channel '{}'",
                            frame.index(),
                            layout.name
                        ))
                    })?;
                buffer.extend_from_slice(bytes);
            }

            buffers.push(buffer);
        }

        Ok(buffers)
    }

    /// Epoch buffers of every channel
    pub fn assemble(&self) -> SignalResult<EpochBuffers> {
        let mut result = HashMap::with_capacity(self.schema.channels().len());

        for (idx, layout) in self.schema.channels().iter().enumerate() {
            result.insert(layout.name.clone(), self.assemble_channel(idx)?);
        }

        Ok(result)
    }
}
