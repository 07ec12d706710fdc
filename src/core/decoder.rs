use super::schema::{ChannelLayout, MAX_SAMPLE_WIDTH};
use crate::error::{SignalError, SignalResult};
use crate::header::ByteOrder;

/// One decoded sample; wide enough for every unsigned width below 16 bytes
pub type Sample = i128;

/// Converts epoch byte buffers into integer samples.
///
/// Samples are fixed-width two's-complement (or unsigned) integers; no
/// scaling or calibration is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleDecoder {
    sample_width: usize,
    byte_order: ByteOrder,
    signed: bool,
}

impl SampleDecoder {
    pub fn new(sample_width: usize, byte_order: ByteOrder, signed: bool) -> Self {
        Self {
            sample_width,
            byte_order,
            signed,
        }
    }

    pub fn for_channel(layout: &ChannelLayout, byte_order: ByteOrder) -> Self {
        Self::new(layout.sample_width, byte_order, layout.signed)
    }

    /// Decode `buffer` into one integer per `sample_width` bytes, in order
    pub fn decode(&self, buffer: &[u8]) -> SignalResult<Vec<Sample>> {
        let fits = self.sample_width < MAX_SAMPLE_WIDTH
            || (self.sample_width == MAX_SAMPLE_WIDTH && self.signed);
        if self.sample_width == 0 || !fits {
            return Err(SignalError::structural(format!(
                "{} sample width {} is not between 1 and {} bytes",
                if self.signed { "Signed" } else { "Unsigned" },
                self.sample_width,
                if self.signed { MAX_SAMPLE_WIDTH } else { MAX_SAMPLE_WIDTH - 1 }
            )));
        }
        if buffer.len() % self.sample_width != 0 {
            return Err(SignalError::structural(format!(
                "Malformed sample buffer: {} bytes is not a multiple of sample width {}",
                buffer.len(),
                self.sample_width
            )));
        }

        Ok(buffer
            .chunks_exact(self.sample_width)
            .map(|chunk| self.decode_sample(chunk))
            .collect())
    }

    fn decode_sample(&self, chunk: &[u8]) -> Sample {
        let raw = match self.byte_order {
            ByteOrder::Big => chunk.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128),
            ByteOrder::Little => chunk.iter().rev().fold(0u128, |acc, &b| (acc << 8) | b as u128),
        };

        if self.signed {
            // Sign-extend from the top bit of the sample
            let shift = 128 - 8 * chunk.len() as u32;
            ((raw << shift) as i128) >> shift
        } else {
            raw as i128
        }
    }
}
