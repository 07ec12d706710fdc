//! Decoder for raw multi-channel physiological recordings.
//!
//! A recording is a flat file of fixed-width frames; each frame holds one
//! time slice of every channel back to back. Nothing in the file describes
//! the layout, so it is derived entirely from the accompanying header:
//!
//! - [`header`]: the header provider seam and the one place its loosely
//!   typed values are normalized
//! - [`core`]: frame schema, frame slicing, epoch assembly and sample decoding
//! - [`signal`]: the [`Signal`] facade owning the raw bytes of one file

pub mod config;
pub mod core;
pub mod error;
pub mod header;
pub mod signal;

pub use crate::core::Sample;
pub use config::{DecodeOptions, TruncationPolicy};
pub use error::{SignalError, SignalResult};
pub use header::{ByteOrder, HeaderProvider, SourceDescriptor, XdfHeader};
pub use signal::{ChannelSelector, NumericView, Signal};
