use zframe::{compressor, frame_info, frame_size, Compressor, CompressionOptions, Error, FlushMode};

#[test]
fn should_read_frame_info() {
    let data = vec![b'q'; 10_000];
    let compressed = compressor::compress(&data, None, None).expect("to compress");

    let info = frame_info(&compressed).expect("to read header");
    assert_eq!(info.decompressed_size, Some(10_000));
    assert_eq!(info.dictionary_id, 0);
    assert!(!info.has_checksum);
    assert!(info.header_size > 0);
    assert!(info.window_size >= 10_000);

    //Header alone is enough.
    let header = &compressed[..info.header_size as usize];
    assert_eq!(frame_info(header).expect("to read header"), info);
    assert!(matches!(frame_info(&header[..header.len() - 1]).unwrap_err(), Error::InsufficientData(_)));
}

#[test]
fn should_report_unknown_size_of_streamed_frame() {
    let mut compressor = Compressor::new(None, None, Some(&CompressionOptions::new().checksum(true))).expect("to create compressor");
    let mut compressed = compressor.compress(b"streamed", FlushMode::FlushBlock).expect("to compress");
    compressed.extend(compressor.flush(FlushMode::FlushFrame).expect("to flush"));

    let info = frame_info(&compressed).expect("to read header");
    assert_eq!(info.decompressed_size, None);
    assert!(info.has_checksum);
}

#[test]
fn should_find_frame_size() {
    let first = compressor::compress(b"first frame", None, None).expect("to compress");
    let second = compressor::compress(b"second frame is a bit longer", None, None).expect("to compress");
    let mut both = first.clone();
    both.extend_from_slice(&second);

    assert_eq!(frame_size(&both).expect("to find size"), first.len());
    assert_eq!(frame_size(&both[first.len()..]).expect("to find size"), second.len());
    assert!(matches!(frame_size(&first[..first.len() - 1]).unwrap_err(), Error::InsufficientData(_)));
}

#[test]
fn should_reject_corrupted_header() {
    let mut compressed = compressor::compress(b"frame", None, None).expect("to compress");
    compressed[0] ^= 0xff;
    assert!(frame_info(&compressed).unwrap_err().is_data());
    assert!(frame_size(&compressed).unwrap_err().is_data());
}
