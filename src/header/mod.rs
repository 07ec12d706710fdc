pub mod metadata;
pub mod provider;

pub use metadata::{ingest, ByteOrder, HeaderMetadata, RecordingMetadata, SourceDescriptor};
pub use provider::{EpochRecord, HeaderProvider, SourceRecord, XdfHeader};
