//! Decode session over one raw signal file

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::DecodeOptions;
use crate::core::{
    frames_per_epoch, EpochAssembler, EpochBuffers, FrameSchema, FrameSlicer, FrameView, RawFrame,
    Sample, SampleDecoder,
};
use crate::error::{SignalError, SignalResult};
use crate::header::{ingest, HeaderProvider};

/// Decoded samples keyed by channel name; outer vector is epochs, inner is
/// samples, both in chronological order
pub type NumericView = HashMap<String, Vec<Vec<Sample>>>;

/// Which channels a retrieval call covers.
///
/// Names that are not among the recording's sources are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChannelSelector {
    #[default]
    All,
    One(String),
    Many(Vec<String>),
}

impl ChannelSelector {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            ChannelSelector::All => true,
            ChannelSelector::One(n) => n == name,
            ChannelSelector::Many(names) => names.iter().any(|n| n == name),
        }
    }
}

impl From<&str> for ChannelSelector {
    fn from(name: &str) -> Self {
        ChannelSelector::One(name.to_string())
    }
}

impl From<String> for ChannelSelector {
    fn from(name: String) -> Self {
        ChannelSelector::One(name)
    }
}

impl From<Vec<String>> for ChannelSelector {
    fn from(names: Vec<String>) -> Self {
        ChannelSelector::Many(names)
    }
}

impl From<&[&str]> for ChannelSelector {
    fn from(names: &[&str]) -> Self {
        ChannelSelector::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ChannelSelector {
    fn from(names: [&str; N]) -> Self {
        ChannelSelector::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<S: Into<ChannelSelector>> From<Option<S>> for ChannelSelector {
    fn from(selector: Option<S>) -> Self {
        selector.map(Into::into).unwrap_or_default()
    }
}

/// A raw signal file paired with its header.
///
/// The whole file is read once at construction and sliced into frames; the
/// schema, bytes and frame slices are never mutated afterwards, so retrieval
/// calls can run concurrently through `&self`.
pub struct Signal<H> {
    header: H,
    path: PathBuf,
    schema: FrameSchema,
    options: DecodeOptions,
    data: Vec<u8>,
    frames: Vec<RawFrame>,
    discarded: usize,
}

impl<H: HeaderProvider> Signal<H> {
    pub fn open(header: H, path: impl AsRef<Path>) -> SignalResult<Self> {
        Self::open_with(header, path, DecodeOptions::default())
    }

    /// Validate the header, read `path` in one go and slice it into frames.
    ///
    /// Metadata is checked before the file is touched.
    pub fn open_with(header: H, path: impl AsRef<Path>, options: DecodeOptions) -> SignalResult<Self> {
        let metadata = ingest(&header)?;
        let schema = FrameSchema::from_metadata(&metadata)?;

        let path = path.as_ref().to_path_buf();
        let data = fs::read(&path).map_err(|e| SignalError::io(&path, e))?;

        let sliced = FrameSlicer::new(&schema)
            .with_policy(options.truncation)
            .slice(&data)?;

        let signal = Self {
            header,
            path,
            schema,
            options,
            data,
            frames: sliced.frames,
            discarded: sliced.discarded,
        };
        signal.report_epoch_layout();

        Ok(signal)
    }

    fn report_epoch_layout(&self) {
        let Ok(per_epoch) = frames_per_epoch(&self.schema) else {
            // Surfaced as an error on retrieval
            return;
        };

        let leftover = self.frames.len() % per_epoch;
        if leftover > 0 && !self.options.truncation.is_strict() {
            warn!(
                path = ?self.path,
                leftover,
                per_epoch,
                "Trailing frames do not fill an epoch and will be dropped"
            );
        }

        let decoded = self.frames.len() / per_epoch;
        match self.expected_epoch_count() {
            Some(expected) if expected != decoded => warn!(
                path = ?self.path,
                expected,
                decoded,
                "Epoch count differs from header epoch enumeration"
            ),
            _ => debug!(path = ?self.path, epochs = decoded, "Opened signal"),
        }
    }

    fn assembler(&self) -> EpochAssembler<'_> {
        EpochAssembler::new(&self.schema, &self.frames, &self.data)
            .with_policy(self.options.truncation)
    }

    /// Per-channel integer samples, grouped by epoch
    pub fn numeric_view(&self, selector: impl Into<ChannelSelector>) -> SignalResult<NumericView> {
        let selector = selector.into();
        let assembler = self.assembler();
        // Fail on an unusable epoch/frame ratio even when nothing is selected
        frames_per_epoch(&self.schema)?;

        let mut view = HashMap::new();
        for (idx, layout) in self.schema.channels().iter().enumerate() {
            if !selector.matches(&layout.name) {
                continue;
            }

            let decoder = SampleDecoder::for_channel(layout, self.schema.byte_order());
            let epochs = assembler
                .assemble_channel(idx)?
                .iter()
                .map(|buffer| decoder.decode(buffer))
                .collect::<SignalResult<Vec<_>>>()?;

            view.insert(layout.name.clone(), epochs);
        }

        Ok(view)
    }

    /// Per-channel raw epoch bytes, before sample decoding
    pub fn epoch_buffers(&self, selector: impl Into<ChannelSelector>) -> SignalResult<EpochBuffers> {
        let selector = selector.into();
        let assembler = self.assembler();
        frames_per_epoch(&self.schema)?;

        let mut buffers = HashMap::new();
        for (idx, layout) in self.schema.channels().iter().enumerate() {
            if selector.matches(&layout.name) {
                buffers.insert(layout.name.clone(), assembler.assemble_channel(idx)?);
            }
        }

        Ok(buffers)
    }

    /// Number of complete epochs in the file
    pub fn epoch_count(&self) -> SignalResult<usize> {
        self.assembler().epoch_count()
    }

    /// Highest epoch number in the header's epoch enumeration
    pub fn expected_epoch_count(&self) -> Option<usize> {
        self.header
            .epoch_numbers()
            .into_iter()
            .max()
            .and_then(|n| usize::try_from(n).ok())
    }

    /// Check the decoded epoch count against the header's enumeration
    pub fn verify_epoch_count(&self) -> SignalResult<usize> {
        let decoded = self.epoch_count()?;

        match self.expected_epoch_count() {
            Some(expected) if expected != decoded => Err(SignalError::structural(format!(
                "Header lists {} epochs but the signal holds {}",
                expected, decoded
            ))),
            _ => Ok(decoded),
        }
    }

    /// Export to a standard clinical format (EDF). Not implemented.
    pub fn to_standard_format(&self) -> SignalResult<()> {
        Err(SignalError::NotSupported(
            "export to a standard clinical format is not implemented".to_string(),
        ))
    }
}

impl<H> Signal<H> {
    pub fn header(&self) -> &H {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &FrameSchema {
        &self.schema
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Bytes past the last complete frame
    pub fn discarded_bytes(&self) -> usize {
        self.discarded
    }

    pub fn frame(&self, index: usize) -> Option<FrameView<'_>> {
        self.frames
            .get(index)
            .map(|f| FrameView::new(f, &self.schema, &self.data))
    }

    pub fn frames(&self) -> impl Iterator<Item = FrameView<'_>> + '_ {
        self.frames
            .iter()
            .map(move |f| FrameView::new(f, &self.schema, &self.data))
    }
}

impl<H> fmt::Debug for Signal<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("path", &self.path)
            .field("frame_width", &self.schema.frame_width())
            .field("channels", &self.schema.channels().len())
            .field("frames", &self.frames.len())
            .field("discarded", &self.discarded)
            .finish()
    }
}
