pub mod decoder;
pub mod epoch;
pub mod schema;
pub mod slicer;

pub use decoder::{Sample, SampleDecoder};
pub use epoch::{frames_per_epoch, EpochAssembler, EpochBuffers};
pub use schema::{ChannelLayout, FrameSchema, MAX_SAMPLE_WIDTH};
pub use slicer::{FrameSlicer, FrameView, RawFrame, SlicedFrames};
