//! Buffered compressed stream
//!
//!File-like wrapper that either decompresses from source or compresses into sink.
//!First failure closes the stream, it never attempts to resynchronize.

use zstd_sys as sys;

use core::mem;
use std::fs;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::compressor::write::FrameWriter;
use crate::decompressor::read::{FrameMode, FrameReader};
use crate::dict::Dictionary;
use crate::encoder::{Compressor, FlushMode};
use crate::error::{Error, Result};
use crate::params::{CompressionOptions, DecompressionOptions};

const CLOSED: Error = Error::InvalidState("stream is closed");
const NOT_READABLE: Error = Error::InvalidState("stream is not opened for reading");
const NOT_WRITABLE: Error = Error::InvalidState("stream is not opened for writing");

#[derive(Clone, Debug, Default)]
///Options of reading stream
pub struct ReadOptions {
    frames: FrameMode,
    dictionary: Option<Dictionary>,
    options: Option<DecompressionOptions>,
    buffer_size: Option<usize>,
}

impl ReadOptions {
    #[inline(always)]
    ///Creates default options: all frames are read, no dictionary.
    pub const fn new() -> Self {
        Self {
            frames: FrameMode::Concatenated,
            dictionary: None,
            options: None,
            buffer_size: None,
        }
    }

    #[inline(always)]
    ///Sets how many frames to read
    pub fn frames(mut self, frames: FrameMode) -> Self {
        self.frames = frames;
        self
    }

    #[inline(always)]
    ///Sets dictionary
    pub fn dictionary(mut self, dictionary: Dictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    #[inline(always)]
    ///Sets decompression parameters
    pub fn options(mut self, options: DecompressionOptions) -> Self {
        self.options = Some(options);
        self
    }

    #[inline(always)]
    ///Sets size of read-ahead buffer of decompressed data
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }
}

#[derive(Clone, Debug, Default)]
///Options of writing stream
pub struct WriteOptions {
    level: Option<i32>,
    dictionary: Option<Dictionary>,
    options: Option<CompressionOptions>,
}

impl WriteOptions {
    #[inline(always)]
    ///Creates default options: default level, no dictionary.
    pub const fn new() -> Self {
        Self {
            level: None,
            dictionary: None,
            options: None,
        }
    }

    #[inline(always)]
    ///Sets compression level
    pub fn level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    #[inline(always)]
    ///Sets dictionary
    pub fn dictionary(mut self, dictionary: Dictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    #[inline(always)]
    ///Sets compression parameters
    pub fn options(mut self, options: CompressionOptions) -> Self {
        self.options = Some(options);
        self
    }
}

#[derive(Clone, Debug)]
///Describes how to open file
pub enum OpenMode {
    ///Open existing file for reading.
    Read(ReadOptions),
    ///Create file for writing, truncating existing one.
    Write(WriteOptions),
    ///Create file for writing, appending new frames to existing content.
    Append(WriteOptions),
    ///Create new file for writing, failing if it exists.
    Exclusive(WriteOptions),
}

enum State<S> {
    Closed,
    Reading(BufReader<FrameReader<S>>),
    Writing {
        writer: FrameWriter<S>,
        //Captured when sink is known to be `Write`, so that drop can finish frame.
        finish: fn(&mut FrameWriter<S>) -> Result<usize>,
    },
}

///Buffered compressed stream
///
///Reading stream decompresses data from source, supporting [BufRead] and emulated [Seek].
///Writing stream compresses everything written into sink, immediately passing output.
///
///Dropping writing stream finishes frame, ignoring errors. Use [close](Self::close) to observe them.
///
///## Usage
///
///```rust
///use std::io::{BufRead, Write};
///use zframe::{BufferedCompressedStream, ReadOptions, WriteOptions};
///
///let mut stream = BufferedCompressedStream::writer(Vec::new(), WriteOptions::new().level(5)).expect("to create stream");
///stream.write_all(b"first line\nsecond line\n").expect("to write");
///let compressed = stream.into_inner().expect("to finish");
///
///let stream = BufferedCompressedStream::reader(compressed.as_slice(), ReadOptions::new()).expect("to create stream");
///let lines = stream.lines().collect::<Result<Vec<_>, _>>().expect("to read lines");
///assert_eq!(lines, ["first line", "second line"]);
///```
pub struct BufferedCompressedStream<S> {
    state: State<S>,
}

impl<S: Read> BufferedCompressedStream<S> {
    ///Creates stream decompressing from `source`
    pub fn reader(source: S, options: ReadOptions) -> Result<Self> {
        let capacity = match options.buffer_size {
            Some(0) => return Err(Error::invalid_argument("buffer size must be positive")),
            Some(size) => size,
            None => unsafe { sys::ZSTD_DStreamOutSize() },
        };
        let reader = FrameReader::new(source, options.frames, options.dictionary, options.options)?;

        tracing::debug!(frames = ?options.frames, capacity, "stream opened for reading");
        Ok(Self {
            state: State::Reading(BufReader::with_capacity(capacity, reader)),
        })
    }
}

impl<S: Write> BufferedCompressedStream<S> {
    ///Creates stream compressing into `sink`
    pub fn writer(sink: S, options: WriteOptions) -> Result<Self> {
        let compressor = Compressor::new(options.level, options.dictionary, options.options.as_ref())?;

        tracing::debug!(level = compressor.level(), "stream opened for writing");
        Ok(Self {
            state: State::Writing {
                writer: FrameWriter::new(compressor, sink),
                finish: FrameWriter::finish_frame,
            },
        })
    }

    ///Ends current block or frame and flushes sink.
    ///
    ///Does nothing if previous operation already ended block or frame in the same way, or when
    ///stream is opened for reading.
    pub fn flush_mode(&mut self, mode: FlushMode) -> Result<()> {
        let result = match &mut self.state {
            State::Closed => return Err(CLOSED),
            State::Reading(_) => return Ok(()),
            State::Writing { writer, .. } => match writer.flush_mode(mode) {
                Ok(_) => writer.writer_mut().flush().map_err(Error::from),
                Err(error) => Err(error),
            },
        };
        self.guard(result)
    }
}

impl BufferedCompressedStream<fs::File> {
    ///Opens file at `path` according to `mode`
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let mut open_options = fs::OpenOptions::new();
        let options = match mode {
            OpenMode::Read(options) => {
                let file = open_options.read(true).open(path)?;
                tracing::debug!(path = %path.display(), "file opened");
                return Self::reader(file, options);
            },
            OpenMode::Write(options) => {
                open_options.write(true).create(true).truncate(true);
                options
            },
            OpenMode::Append(options) => {
                open_options.append(true).create(true);
                options
            },
            OpenMode::Exclusive(options) => {
                open_options.write(true).create_new(true);
                options
            },
        };

        let file = open_options.open(path)?;
        tracing::debug!(path = %path.display(), "file opened");
        Self::writer(file, options)
    }
}

impl<S> BufferedCompressedStream<S> {
    #[inline(always)]
    ///Returns whether stream is closed
    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    #[inline(always)]
    ///Returns whether stream decompresses
    pub fn is_readable(&self) -> bool {
        matches!(self.state, State::Reading(_))
    }

    #[inline(always)]
    ///Returns whether stream compresses
    pub fn is_writable(&self) -> bool {
        matches!(self.state, State::Writing { .. })
    }

    #[inline]
    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(error) = &result {
            tracing::debug!(%error, "stream closed after error");
            self.state = State::Closed;
        }
        result
    }

    ///Finishes frame when writing and releases source or sink.
    ///
    ///Closing already closed stream does nothing.
    pub fn close(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, State::Closed) {
            State::Closed | State::Reading(_) => Ok(()),
            State::Writing { mut writer, finish } => {
                finish(&mut writer)?;
                tracing::debug!(total_in = writer.total_in(), "stream closed");
                Ok(())
            },
        }
    }

    ///Finishes frame when writing and returns source or sink.
    ///
    ///In reading mode, source may be positioned past the data consumed, due to read-ahead.
    pub fn into_inner(mut self) -> Result<S> {
        match mem::replace(&mut self.state, State::Closed) {
            State::Closed => Err(CLOSED),
            State::Reading(reader) => Ok(reader.into_inner().into_inner()),
            State::Writing { mut writer, finish } => {
                finish(&mut writer)?;
                Ok(writer.take())
            },
        }
    }

    ///Returns position within decompressed data, or number of bytes written.
    pub fn tell(&self) -> Result<u64> {
        match &self.state {
            State::Closed => Err(CLOSED),
            State::Reading(reader) => {
                let buffered = reader.buffer().len() as u64;
                Ok(reader.get_ref().position() - buffered)
            },
            State::Writing { writer, .. } => Ok(writer.total_in()),
        }
    }
}

impl<S: Read> BufferedCompressedStream<S> {
    ///Returns buffered decompressed data without advancing position.
    ///
    ///Returns at least one byte, unless all data is read.
    pub fn peek(&mut self) -> Result<&[u8]> {
        self.fill()?;
        match &mut self.state {
            State::Reading(reader) => Ok(reader.buffer()),
            State::Closed => Err(CLOSED),
            State::Writing { .. } => Err(NOT_READABLE),
        }
    }

    fn fill(&mut self) -> Result<()> {
        let result = match &mut self.state {
            State::Closed => return Err(CLOSED),
            State::Writing { .. } => return Err(NOT_READABLE),
            State::Reading(reader) => reader.fill_buf().map(|_| ()),
        };
        self.guard(result.map_err(Error::from_io))
    }
}

impl<S: Read> Read for BufferedCompressedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = match &mut self.state {
            State::Closed => return Err(CLOSED.into()),
            State::Writing { .. } => return Err(NOT_READABLE.into()),
            State::Reading(reader) => reader.read(buf),
        };
        self.guard(result.map_err(Error::from_io)).map_err(Into::into)
    }
}

impl<S: Read> BufRead for BufferedCompressedStream<S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.fill().map_err(io::Error::from)?;
        match &mut self.state {
            State::Reading(reader) => Ok(reader.buffer()),
            State::Closed => Err(CLOSED.into()),
            State::Writing { .. } => Err(NOT_READABLE.into()),
        }
    }

    #[inline]
    fn consume(&mut self, amount: usize) {
        if let State::Reading(reader) = &mut self.state {
            reader.consume(amount);
        }
    }
}

impl<S: Read + Seek> Seek for BufferedCompressedStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let result = match &mut self.state {
            State::Closed => return Err(CLOSED.into()),
            State::Writing { .. } => return Err(NOT_READABLE.into()),
            State::Reading(reader) => reader.seek(pos),
        };
        self.guard(result.map_err(Error::from_io)).map_err(Into::into)
    }
}

impl<S: Write> Write for BufferedCompressedStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = match &mut self.state {
            State::Closed => return Err(CLOSED.into()),
            State::Reading(_) => return Err(NOT_WRITABLE.into()),
            State::Writing { writer, .. } => writer.push(buf, FlushMode::Continue),
        };
        self.guard(result).map(|_| buf.len()).map_err(Into::into)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.flush_mode(FlushMode::FlushBlock).map_err(Into::into)
    }
}

impl<S> Drop for BufferedCompressedStream<S> {
    fn drop(&mut self) {
        if let State::Writing { writer, finish } = &mut self.state {
            if let Err(error) = finish(writer) {
                tracing::debug!(%error, "unable to finish frame on drop");
            }
        }
    }
}
