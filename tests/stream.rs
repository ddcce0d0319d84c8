use std::io::{BufRead, Cursor, Read, Seek, SeekFrom, Write};

use zframe::{compressor, BufferedCompressedStream, Error, FlushMode, OpenMode, ReadOptions, WriteOptions};
use zframe::decompressor::read::{FrameMode, FrameReader};

fn sample_text() -> String {
    let mut text = String::new();
    for idx in 0..1_000 {
        text.push_str(&format!("record {idx:04} of the compressed stream\n"));
    }
    text
}

#[test]
fn should_write_and_read_lines() {
    let text = sample_text();
    let mut stream = BufferedCompressedStream::writer(Vec::new(), WriteOptions::new().level(7)).expect("to create stream");
    assert!(stream.is_writable());
    stream.write_all(text.as_bytes()).expect("to write");
    assert_eq!(stream.tell().expect("to tell"), text.len() as u64);
    let compressed = stream.into_inner().expect("to finish");

    let stream = BufferedCompressedStream::reader(compressed.as_slice(), ReadOptions::new().buffer_size(100)).expect("to create stream");
    assert!(stream.is_readable());
    let lines = stream.lines().collect::<Result<Vec<_>, _>>().expect("to read lines");
    assert_eq!(lines.len(), 1_000);
    assert_eq!(lines[42], "record 0042 of the compressed stream");
}

#[test]
fn should_seek_within_decompressed_data() {
    let text = sample_text();
    let compressed = compressor::compress(text.as_bytes(), None, None).expect("to compress");

    let mut stream = BufferedCompressedStream::reader(Cursor::new(compressed), ReadOptions::new()).expect("to create stream");
    let mut buffer = [0u8; 11];

    assert_eq!(stream.seek(SeekFrom::Start(1000)).expect("to seek"), 1000);
    stream.read_exact(&mut buffer).expect("to read");
    assert_eq!(&buffer, &text.as_bytes()[1000..1011]);
    assert_eq!(stream.tell().expect("to tell"), 1011);

    //Backward seek restarts decoding
    assert_eq!(stream.seek(SeekFrom::Current(-511)).expect("to seek"), 500);
    stream.read_exact(&mut buffer).expect("to read");
    assert_eq!(&buffer, &text.as_bytes()[500..511]);

    assert_eq!(stream.seek(SeekFrom::End(-11)).expect("to seek"), text.len() as u64 - 11);
    stream.read_exact(&mut buffer).expect("to read");
    assert_eq!(&buffer, &text.as_bytes()[text.len() - 11..]);

    //Seeking past the end stops at the end
    assert_eq!(stream.seek(SeekFrom::Start(u64::MAX / 2)).expect("to seek"), text.len() as u64);
    assert_eq!(stream.read(&mut buffer).expect("to read"), 0);
}

#[test]
fn should_peek_without_advancing() {
    let compressed = compressor::compress(b"peek at me", None, None).expect("to compress");
    let mut stream = BufferedCompressedStream::reader(compressed.as_slice(), ReadOptions::new()).expect("to create stream");

    assert_eq!(stream.peek().expect("to peek"), b"peek at me");
    assert_eq!(stream.tell().expect("to tell"), 0);

    let mut output = String::new();
    stream.read_to_string(&mut output).expect("to read");
    assert_eq!(output, "peek at me");
    assert!(stream.peek().expect("to peek").is_empty());
}

#[test]
fn should_close_after_error() {
    let mut compressed = compressor::compress(sample_text().as_bytes(), None, None).expect("to compress");
    let len = compressed.len();
    compressed.truncate(len / 2);

    let mut stream = BufferedCompressedStream::reader(compressed.as_slice(), ReadOptions::new()).expect("to create stream");
    let mut output = Vec::new();
    assert!(stream.read_to_end(&mut output).is_err());
    assert!(stream.is_closed());
    assert!(matches!(stream.tell().unwrap_err(), Error::InvalidState(_)));
    assert!(stream.read(&mut [0u8; 4]).is_err());
    stream.close().expect("closing closed stream is fine");
}

#[test]
fn should_reject_wrong_direction() {
    let mut stream = BufferedCompressedStream::writer(Cursor::new(Vec::new()), WriteOptions::new()).expect("to create stream");
    assert!(stream.read(&mut [0u8; 4]).is_err());
    //Wrong direction doesn't close stream
    assert!(stream.is_writable());

    let compressed = compressor::compress(b"data", None, None).expect("to compress");
    let mut stream = BufferedCompressedStream::reader(Cursor::new(compressed.clone()), ReadOptions::new()).expect("to create stream");
    assert!(stream.write(b"data").is_err());
    assert!(stream.is_readable());

    let error = BufferedCompressedStream::reader(compressed.as_slice(), ReadOptions::new().buffer_size(0)).err().expect("to fail");
    assert!(matches!(error, Error::InvalidArgument(_)));
}

#[test]
fn should_flush_blocks_and_frames() {
    let mut stream = BufferedCompressedStream::writer(Vec::new(), WriteOptions::new()).expect("to create stream");
    stream.write_all(b"first").expect("to write");
    stream.flush().expect("to flush");
    stream.write_all(b" second").expect("to write");
    stream.flush_mode(FlushMode::FlushFrame).expect("to end frame");
    stream.flush_mode(FlushMode::FlushFrame).expect("to do nothing");
    stream.write_all(b" third").expect("to write");

    let compressed = stream.into_inner().expect("to finish");
    let first = zframe::frame_size(&compressed).expect("to find frame");
    assert!(first < compressed.len());
    let output = zframe::decompressor::decompress(&compressed, None, None).expect("to decompress");
    assert_eq!(output, b"first second third");
}

#[test]
fn should_close_on_invalid_flush_mode() {
    let mut stream = BufferedCompressedStream::writer(Vec::new(), WriteOptions::new()).expect("to create stream");
    stream.write_all(b"data").expect("to write");
    let error = stream.flush_mode(FlushMode::Continue).unwrap_err();
    assert!(matches!(error, Error::InvalidArgument(_)));
    assert!(stream.is_closed());
    assert!(stream.write(b"more").is_err());
}

#[test]
fn should_read_single_frame() {
    let mut compressed = compressor::compress(b"first", None, None).expect("to compress");
    compressed.extend(compressor::compress(b"second", None, None).expect("to compress"));

    let mut reader = FrameReader::new(compressed.as_slice(), FrameMode::Single, None, None).expect("to create reader");
    let mut output = Vec::new();
    reader.read_to_end(&mut output).expect("to read");
    assert_eq!(output, b"first");
    assert!(reader.is_finished());
    assert_eq!(reader.position(), 5);

    let mut reader = FrameReader::new(compressed.as_slice(), FrameMode::Concatenated, None, None).expect("to create reader");
    let mut output = Vec::new();
    reader.read_to_end(&mut output).expect("to read");
    assert_eq!(output, b"firstsecond");
}

#[test]
fn should_open_files() {
    let dir = tempfile::tempdir().expect("to create temp dir");
    let path = dir.path().join("data.zst");

    let mut stream = BufferedCompressedStream::open(&path, OpenMode::Write(WriteOptions::new())).expect("to open");
    stream.write_all(b"first frame\n").expect("to write");
    stream.close().expect("to close");
    assert!(stream.is_closed());

    let error = BufferedCompressedStream::open(&path, OpenMode::Exclusive(WriteOptions::new())).err().expect("to fail");
    assert!(matches!(error, Error::Io(_)));

    {
        let mut stream = BufferedCompressedStream::open(&path, OpenMode::Append(WriteOptions::new().level(1))).expect("to open");
        stream.write_all(b"second frame\n").expect("to write");
        //Frame is finished on drop
    }

    let stream = BufferedCompressedStream::open(&path, OpenMode::Read(ReadOptions::new())).expect("to open");
    let lines = stream.lines().collect::<Result<Vec<_>, _>>().expect("to read lines");
    assert_eq!(lines, ["first frame", "second frame"]);

    let stream = BufferedCompressedStream::open(&path, OpenMode::Read(ReadOptions::new().frames(FrameMode::Single))).expect("to open");
    let lines = stream.lines().collect::<Result<Vec<_>, _>>().expect("to read lines");
    assert_eq!(lines, ["first frame"]);

    let mut stream = BufferedCompressedStream::open(&path, OpenMode::Read(ReadOptions::new())).expect("to open");
    stream.seek(SeekFrom::Start(6)).expect("to seek");
    let mut output = String::new();
    stream.read_to_string(&mut output).expect("to read");
    assert_eq!(output, "frame\nsecond frame\n");
}

#[test]
fn should_reject_missing_file() {
    let dir = tempfile::tempdir().expect("to create temp dir");
    let error = BufferedCompressedStream::open(dir.path().join("missing.zst"), OpenMode::Read(ReadOptions::new())).err().expect("to fail");
    assert!(matches!(error, Error::Io(_)));
}

#[test]
fn should_report_data_error_on_peek() {
    let mut stream = BufferedCompressedStream::reader(&b"not a zstd frame at all"[..], ReadOptions::new()).expect("to create stream");
    let error = stream.peek().unwrap_err();
    assert!(error.is_data());
    assert!(stream.is_closed());
}

#[test]
fn should_fail_single_frame_truncated_in_header() {
    let compressed = compressor::compress(b"cut short", None, None).expect("to compress");

    let mut reader = FrameReader::new(&compressed[..3], FrameMode::Single, None, None).expect("to create reader");
    let mut output = Vec::new();
    let error = reader.read_to_end(&mut output).unwrap_err();
    assert_eq!(error.kind(), std::io::ErrorKind::InvalidData);
    assert!(output.is_empty());

    let mut reader = FrameReader::new(&[][..], FrameMode::Single, None, None).expect("to create reader");
    assert_eq!(reader.read_to_end(&mut output).expect("to read"), 0);
}
