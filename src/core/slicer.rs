use std::ops::Range;

use tracing::{debug, warn};

use super::schema::{ChannelLayout, FrameSchema};
use crate::config::TruncationPolicy;
use crate::error::{SignalError, SignalResult};

/// Location of one frame's channel slices inside the raw buffer.
///
/// Spans are absolute byte ranges, one per channel in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    index: usize,
    spans: Vec<Range<usize>>,
}

impl RawFrame {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn span(&self, channel: usize) -> Option<&Range<usize>> {
        self.spans.get(channel)
    }

    pub fn spans(&self) -> &[Range<usize>] {
        &self.spans
    }
}

/// Borrowed view of a frame as a channel name → bytes mapping
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    frame: &'a RawFrame,
    schema: &'a FrameSchema,
    data: &'a [u8],
}

impl<'a> FrameView<'a> {
    pub fn new(frame: &'a RawFrame, schema: &'a FrameSchema, data: &'a [u8]) -> Self {
        Self {
            frame,
            schema,
            data,
        }
    }

    pub fn index(&self) -> usize {
        self.frame.index
    }

    /// Raw bytes of the channel at `channel` (schema order)
    pub fn channel(&self, channel: usize) -> Option<&'a [u8]> {
        self.frame
            .span(channel)
            .and_then(|span| self.data.get(span.clone()))
    }

    pub fn get(&self, name: &str) -> Option<&'a [u8]> {
        self.schema
            .channel_index(name)
            .and_then(|idx| self.channel(idx))
    }

    pub fn len(&self) -> usize {
        self.frame.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.spans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a [u8])> + 'a {
        let schema = self.schema;
        let data = self.data;
        let frame = self.frame;

        schema
            .channels()
            .iter()
            .zip(frame.spans())
            .filter_map(move |(layout, span)| {
                data.get(span.clone()).map(|bytes| (layout.name.as_str(), bytes))
            })
    }
}

/// Output of [`FrameSlicer::slice`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicedFrames {
    pub frames: Vec<RawFrame>,
    /// Trailing bytes that did not fill a whole frame
    pub discarded: usize,
}

/// Splits a raw buffer into frames and each frame into channel slices
pub struct FrameSlicer<'a> {
    schema: &'a FrameSchema,
    policy: TruncationPolicy,
}

impl<'a> FrameSlicer<'a> {
    pub fn new(schema: &'a FrameSchema) -> Self {
        Self {
            schema,
            policy: TruncationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TruncationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Slice `data` into `floor(len / frame_width)` frames.
    ///
    /// A trailing partial frame is dropped under the permissive policy and
    /// rejected under the strict one.
    pub fn slice(&self, data: &[u8]) -> SignalResult<SlicedFrames> {
        let frame_width = self.schema.frame_width();
        if frame_width == 0 {
            return Err(SignalError::metadata("Frame width has 0 value"));
        }

        let frame_count = data.len() / frame_width;
        let discarded = data.len() - frame_count * frame_width;

        if discarded > 0 {
            if self.policy.is_strict() {
                return Err(SignalError::structural(format!(
                    "{} trailing bytes do not fill a {}-byte frame",
                    discarded, frame_width
                )));
            }
            warn!(
                discarded,
                frame_width, "Discarding trailing bytes of incomplete frame"
            );
        }

        let frames = (0..frame_count)
            .map(|index| {
                let base = index * frame_width;
                let spans = self
                    .schema
                    .channels()
                    .iter()
                    .map(|c| self.channel_span(base, c))
                    .collect::<SignalResult<Vec<_>>>()?;
                Ok(RawFrame { index, spans })
            })
            .collect::<SignalResult<Vec<_>>>()?;

        debug!(frames = frames.len(), bytes = data.len(), "Sliced signal buffer");

        Ok(SlicedFrames { frames, discarded })
    }

    /// Absolute span of `channel` in the frame starting at `base`; it must
    /// stay inside that frame
    fn channel_span(&self, base: usize, channel: &ChannelLayout) -> SignalResult<Range<usize>> {
        let frame_end = base + self.schema.frame_width();
        let start = base.checked_add(channel.offset);
        let end = start.and_then(|s| s.checked_add(channel.width));

        match (start, end) {
            (Some(start), Some(end)) if end <= frame_end => Ok(start..end),
            _ => Err(SignalError::metadata(format!(
                "Channel '{}' ({} bytes at offset {}) does not fit a {}-byte frame",
                channel.name,
                channel.width,
                channel.offset,
                self.schema.frame_width()
            ))),
        }
    }
}
