use std::sync::Arc;

use xdfsignal::core::FrameSchema;
use xdfsignal::header::{ingest, SourceRecord};
use xdfsignal::{ByteOrder, SignalError, XdfHeader};

fn header(endian: &str, sources: Vec<SourceRecord>) -> XdfHeader {
    XdfHeader {
        id: Some("study".to_string()),
        frame_length: 1.0,
        epoch_length: 30.0,
        endian: endian.to_string(),
        sources,
        epochs: Vec::new(),
    }
}

#[test]
fn test_schema_from_header_document() {
    let h = header(
        "Big",
        vec![
            SourceRecord::new("FP1", 2, 200, true),
            SourceRecord::new("FP2", 2, 200, true),
            SourceRecord::new("Pleth", 1, 25, false),
        ],
    );

    let metadata = ingest(&h).unwrap();
    let schema = FrameSchema::from_metadata(&metadata).unwrap();

    assert_eq!(schema.byte_order(), ByteOrder::Big);
    assert_eq!(schema.frame_width(), 400 + 400 + 25);

    let offsets: Vec<usize> = schema.channels().iter().map(|c| c.offset).collect();
    assert_eq!(offsets, vec![0, 400, 800]);
    assert!(!schema.channel("Pleth").unwrap().signed);
}

#[test]
fn test_unknown_endian_rejected() {
    let h = header("network", vec![SourceRecord::new("FP1", 2, 200, true)]);
    assert!(matches!(ingest(&h), Err(SignalError::Metadata(_))));
}

#[test]
fn test_shared_provider() {
    let h = Arc::new(header("little", vec![SourceRecord::new("FP1", 2, 200, true)]));

    let metadata = ingest(&h).unwrap();
    assert_eq!(metadata.sources.len(), 1);
    assert_eq!(metadata.header.byte_order, ByteOrder::Little);
}

#[test]
fn test_schema_serializes() {
    let h = header("little", vec![SourceRecord::new("FP1", 2, 200, true)]);
    let schema = FrameSchema::from_metadata(&ingest(&h).unwrap()).unwrap();

    let json = serde_json::to_value(&schema).unwrap();
    assert_eq!(json["frame_width"], 400);
    assert_eq!(json["channels"][0]["name"], "FP1");

    let back: FrameSchema = serde_json::from_value(json).unwrap();
    assert_eq!(back, schema);
}
