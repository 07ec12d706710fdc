use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::tempdir;
use xdfsignal::{ChannelSelector, DecodeOptions, Signal, SignalError, XdfHeader};

fn write_recording(dir: &Path, header: serde_json::Value, data: &[u8]) -> (XdfHeader, PathBuf) {
    let header_path = dir.join("recording.json");
    let signal_path = dir.join("recording.nkamp");

    fs::write(&header_path, serde_json::to_string_pretty(&header).unwrap()).unwrap();
    fs::write(&signal_path, data).unwrap();

    (XdfHeader::load(&header_path).unwrap(), signal_path)
}

fn fp1_header(epochs: &[u64]) -> serde_json::Value {
    json!({
        "FrameLength": 1,
        "EpochLength": 30,
        "Endian": "little",
        "Sources": [
            {"SourceName": "FP1", "SampleWidth": 2, "SampleFrequency": 100, "Signed": "true"}
        ],
        "Epochs": epochs.iter().map(|n| json!({"EpochNumber": n})).collect::<Vec<_>>()
    })
}

/// FP1 (2-byte, 4 Hz, signed) and SpO2 (1-byte, 1 Hz, unsigned), big-endian,
/// 1 s frames, 2 s epochs, 4 frames
fn mixed_recording() -> (serde_json::Value, Vec<u8>) {
    let header = json!({
        "FrameLength": 1,
        "EpochLength": 2,
        "Endian": "BIG",
        "Sources": [
            {"SourceName": "FP1", "SampleWidth": 2, "SampleFrequency": 4, "Signed": "true"},
            {"SourceName": "SpO2", "SampleWidth": 1, "SampleFrequency": 1, "Signed": "false"}
        ],
        "Epochs": [{"EpochNumber": 1}, {"EpochNumber": 2}]
    });

    let mut data = Vec::new();
    for frame in 0..4i16 {
        for sample in 0..4i16 {
            data.extend_from_slice(&((frame * 4 + sample) * -100).to_be_bytes());
        }
        data.push(if frame == 3 { 0xFF } else { 90 + frame as u8 });
    }

    (header, data)
}

#[test]
fn test_single_channel_thirty_second_epoch() {
    let dir = tempdir().unwrap();
    let data: Vec<u8> = (0..3000i16)
        .flat_map(|i| (i - 1500).to_le_bytes())
        .collect();
    assert_eq!(data.len(), 6000);

    let (header, path) = write_recording(dir.path(), fp1_header(&[1]), &data);
    let signal = Signal::open(header, &path).unwrap();

    assert_eq!(signal.schema().frame_width(), 200);
    assert_eq!(signal.frame_count(), 30);
    assert_eq!(signal.discarded_bytes(), 0);

    let view = signal.numeric_view("FP1").unwrap();
    let epochs = &view["FP1"];

    assert_eq!(epochs.len(), 1);
    assert_eq!(epochs[0].len(), 3000);
    assert_eq!(epochs[0][0], -1500);
    assert_eq!(epochs[0][1500], 0);
    assert_eq!(epochs[0][2999], 1499);
}

#[test]
fn test_mixed_channels_decode() {
    let dir = tempdir().unwrap();
    let (header, data) = mixed_recording();
    let (header, path) = write_recording(dir.path(), header, &data);

    let signal = Signal::open(header, &path).unwrap();
    assert_eq!(signal.schema().frame_width(), 9);
    assert_eq!(signal.frame_count(), 4);

    let view = signal.numeric_view(ChannelSelector::All).unwrap();
    assert_eq!(view.len(), 2);

    assert_eq!(
        view["FP1"],
        vec![
            vec![0, -100, -200, -300, -400, -500, -600, -700],
            vec![-800, -900, -1000, -1100, -1200, -1300, -1400, -1500],
        ]
    );
    assert_eq!(view["SpO2"], vec![vec![90, 91], vec![92, 255]]);
}

#[test]
fn test_numeric_epoch_length_matches_rate() {
    let dir = tempdir().unwrap();
    let (header, data) = mixed_recording();
    let (header, path) = write_recording(dir.path(), header, &data);

    let signal = Signal::open(header, &path).unwrap();
    let view = signal.numeric_view(ChannelSelector::All).unwrap();

    for layout in signal.schema().channels() {
        let expected = layout.sample_frequency as usize * signal.schema().epoch_length() as usize;
        assert!(view[&layout.name].iter().all(|epoch| epoch.len() == expected));
    }
}

#[test]
fn test_unknown_channels_ignored() {
    let dir = tempdir().unwrap();
    let (header, data) = mixed_recording();
    let (header, path) = write_recording(dir.path(), header, &data);
    let signal = Signal::open(header, &path).unwrap();

    let view = signal.numeric_view("O2").unwrap();
    assert!(view.is_empty());

    let view = signal.numeric_view(["SpO2", "O2"]).unwrap();
    assert_eq!(view.len(), 1);
    assert!(view.contains_key("SpO2"));
    assert!(!view.contains_key("O2"));
}

#[test]
fn test_repeated_views_are_equal() {
    let dir = tempdir().unwrap();
    let (header, data) = mixed_recording();
    let (header, path) = write_recording(dir.path(), header, &data);
    let signal = Signal::open(header, &path).unwrap();

    let first = signal.numeric_view(ChannelSelector::All).unwrap();
    let mut second = signal.numeric_view(ChannelSelector::All).unwrap();
    assert_eq!(first, second);

    // Results are independently owned
    second.get_mut("FP1").unwrap()[0][0] = 42;
    assert_eq!(first["FP1"][0][0], 0);
    assert_eq!(signal.numeric_view("FP1").unwrap()["FP1"][0][0], 0);
}

#[test]
fn test_zero_frequency_fails_before_reading() {
    let dir = tempdir().unwrap();
    let header = XdfHeader::from_json_str(
        &json!({
            "FrameLength": 1,
            "EpochLength": 30,
            "Endian": "little",
            "Sources": [
                {"SourceName": "FP1", "SampleWidth": 2, "SampleFrequency": 0, "Signed": "true"}
            ]
        })
        .to_string(),
    )
    .unwrap();

    // The signal file does not exist; metadata is rejected first
    let result = Signal::open(header, dir.path().join("missing.nkamp"));
    assert!(matches!(result, Err(SignalError::Metadata(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let header = XdfHeader::from_json_str(&fp1_header(&[]).to_string()).unwrap();

    let result = Signal::open(header, dir.path().join("missing.nkamp"));
    assert!(matches!(result, Err(SignalError::Io { .. })));
}

#[test]
fn test_non_integral_epoch_ratio() {
    let dir = tempdir().unwrap();
    let header = json!({
        "FrameLength": 7,
        "EpochLength": 30,
        "Endian": "little",
        "Sources": [
            {"SourceName": "FP1", "SampleWidth": 1, "SampleFrequency": 1, "Signed": "true"}
        ]
    });
    let (header, path) = write_recording(dir.path(), header, &[0u8; 70]);

    // Construction succeeds, retrieval does not
    let signal = Signal::open(header, &path).unwrap();
    assert_eq!(signal.frame_count(), 10);

    assert!(matches!(
        signal.numeric_view(ChannelSelector::All),
        Err(SignalError::Structural(_))
    ));
    assert!(matches!(
        signal.numeric_view("nothing"),
        Err(SignalError::Structural(_))
    ));
}

#[test]
fn test_trailing_bytes_permissive_and_strict() {
    let dir = tempdir().unwrap();
    let (header, mut data) = mixed_recording();
    data.extend_from_slice(&[1, 2, 3]);
    let (header, path) = write_recording(dir.path(), header, &data);

    let signal = Signal::open(header.clone(), &path).unwrap();
    assert_eq!(signal.frame_count(), 4);
    assert_eq!(signal.discarded_bytes(), 3);
    assert_eq!(signal.numeric_view("SpO2").unwrap()["SpO2"].len(), 2);

    let result = Signal::open_with(header, &path, DecodeOptions::strict());
    assert!(matches!(result, Err(SignalError::Structural(_))));
}

#[test]
fn test_partial_epoch_permissive_and_strict() {
    let dir = tempdir().unwrap();
    let (header, data) = mixed_recording();
    // Three frames: one full epoch plus half of another
    let (header, path) = write_recording(dir.path(), header, &data[..27]);

    let signal = Signal::open(header.clone(), &path).unwrap();
    assert_eq!(signal.frame_count(), 3);
    assert_eq!(signal.epoch_count().unwrap(), 1);
    assert_eq!(signal.numeric_view("SpO2").unwrap()["SpO2"], vec![vec![90, 91]]);

    let strict = Signal::open_with(header, &path, DecodeOptions::strict()).unwrap();
    assert!(matches!(
        strict.numeric_view("SpO2"),
        Err(SignalError::Structural(_))
    ));
}

#[test]
fn test_epoch_count_against_header() {
    let dir = tempdir().unwrap();
    let (header, data) = mixed_recording();
    let (header, path) = write_recording(dir.path(), header, &data);

    let signal = Signal::open(header, &path).unwrap();
    assert_eq!(signal.expected_epoch_count(), Some(2));
    assert_eq!(signal.verify_epoch_count().unwrap(), 2);

    let data = vec![0u8; 6000];
    let (header, path) = write_recording(dir.path(), fp1_header(&[1, 2, 3]), &data);
    let signal = Signal::open(header, &path).unwrap();
    assert_eq!(signal.epoch_count().unwrap(), 1);
    assert!(matches!(
        signal.verify_epoch_count(),
        Err(SignalError::Structural(_))
    ));
}

#[test]
fn test_frame_views() {
    let dir = tempdir().unwrap();
    let (header, data) = mixed_recording();
    let (header, path) = write_recording(dir.path(), header, &data);
    let signal = Signal::open(header, &path).unwrap();

    let frames: Vec<_> = signal.frames().collect();
    assert_eq!(frames.len(), 4);
    assert!(frames.iter().all(|f| f.len() == 2));

    let last = signal.frame(3).unwrap();
    assert_eq!(last.get("SpO2").unwrap(), &[0xFF]);
    assert_eq!(last.get("FP1").unwrap().len(), 8);
    assert!(signal.frame(4).is_none());
}

#[test]
fn test_epoch_buffers() {
    let dir = tempdir().unwrap();
    let (header, data) = mixed_recording();
    let (header, path) = write_recording(dir.path(), header, &data);
    let signal = Signal::open(header, &path).unwrap();

    let buffers = signal.epoch_buffers("SpO2").unwrap();
    assert_eq!(buffers.len(), 1);
    assert_eq!(buffers["SpO2"], vec![vec![90, 91], vec![92, 0xFF]]);
}

#[test]
fn test_concurrent_views() {
    let dir = tempdir().unwrap();
    let (header, data) = mixed_recording();
    let (header, path) = write_recording(dir.path(), header, &data);
    let signal = Signal::open(header, &path).unwrap();
    let expected = signal.numeric_view(ChannelSelector::All).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| signal.numeric_view(ChannelSelector::All).unwrap()))
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_export_not_supported() {
    let dir = tempdir().unwrap();
    let (header, data) = mixed_recording();
    let (header, path) = write_recording(dir.path(), header, &data);
    let signal = Signal::open(header, &path).unwrap();

    assert!(matches!(
        signal.to_standard_format(),
        Err(SignalError::NotSupported(_))
    ));
}

#[test]
fn test_unsigned_eight_byte_channel() {
    let dir = tempdir().unwrap();
    let header = json!({
        "FrameLength": 1,
        "EpochLength": 1,
        "Endian": "big",
        "Sources": [
            {"SourceName": "X", "SampleWidth": 8, "SampleFrequency": 1, "Signed": "false"}
        ],
        "Epochs": [{"EpochNumber": 1}, {"EpochNumber": 2}]
    });
    let mut data = vec![0, 0, 0, 0, 0, 0, 0, 5];
    data.extend_from_slice(&[0xFF; 8]);

    let (header, path) = write_recording(dir.path(), header, &data);
    let signal = Signal::open(header, &path).unwrap();
    let view = signal.numeric_view("X").unwrap();

    assert_eq!(view["X"], vec![vec![5], vec![u64::MAX as i128]]);
}
