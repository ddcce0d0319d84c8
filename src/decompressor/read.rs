//!Reader decompressor.

use zstd_sys as sys;

use std::io::{self, Read, Seek, SeekFrom};

use crate::decoder::{Decompressor, EndlessDecompressor};
use crate::dict::Dictionary;
use crate::error::{Error, Result};
use crate::params::DecompressionOptions;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
///Describes how many frames are read from source
pub enum FrameMode {
    ///Stop after first frame, keeping the rest of source untouched.
    Single,
    #[default]
    ///Read all frames until source ends.
    Concatenated,
}

enum Decoder {
    Single(Decompressor),
    Concatenated(EndlessDecompressor),
}

impl Decoder {
    #[inline]
    fn new(mode: FrameMode, dictionary: Option<Dictionary>, options: Option<&DecompressionOptions>) -> Result<Self> {
        match mode {
            FrameMode::Single => Decompressor::new(dictionary, options).map(Self::Single),
            FrameMode::Concatenated => EndlessDecompressor::new(dictionary, options).map(Self::Concatenated),
        }
    }

    #[inline]
    fn needs_input(&self) -> bool {
        match self {
            Self::Single(decoder) => decoder.needs_input(),
            Self::Concatenated(decoder) => decoder.needs_input(),
        }
    }

    #[inline]
    fn decompress(&mut self, input: &[u8], max_output: usize) -> Result<Vec<u8>> {
        match self {
            Self::Single(decoder) => decoder.decompress(input, Some(max_output)),
            Self::Concatenated(decoder) => decoder.decompress(input, Some(max_output)),
        }
    }
}

///Decompressing reader
///
///Pulls compressed bytes from underlying reader on demand.
///When underlying reader implements [Seek], position within decompressed data can be changed
///by re-decoding: backward seek restarts from the beginning of the source.
///
///## Usage
///
///```rust
///use std::io::Read;
///use zframe::{compressor, decompressor::read::{FrameReader, FrameMode}};
///
///let compressed = compressor::compress(b"lazy dog", None, None).expect("to compress");
///let mut reader = FrameReader::new(compressed.as_slice(), FrameMode::Concatenated, None, None).expect("to create reader");
///let mut output = String::new();
///reader.read_to_string(&mut output).expect("to read");
///assert_eq!(output, "lazy dog");
///```
pub struct FrameReader<R> {
    reader: R,
    decoder: Decoder,
    mode: FrameMode,
    dictionary: Option<Dictionary>,
    options: Option<DecompressionOptions>,
    buffer: Box<[u8]>,
    total_in: u64,
    pos: u64,
    size: Option<u64>,
    finished: bool,
}

impl<R> FrameReader<R> {
    #[inline]
    ///Returns reference to underlying reader
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    #[inline]
    ///Consumes self and returns underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    #[inline(always)]
    ///Returns position within decompressed data
    pub fn position(&self) -> u64 {
        self.pos
    }

    #[inline(always)]
    ///Returns whether all data is read
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    ///Returns bytes that follow the frame in [FrameMode::Single].
    ///
    ///Only bytes already pulled from underlying reader are reported.
    pub fn unused_data(&self) -> &[u8] {
        match &self.decoder {
            Decoder::Single(decoder) => decoder.unused_data(),
            Decoder::Concatenated(_) => &[],
        }
    }
}

impl<R: Read> FrameReader<R> {
    ///Creates new instance
    pub fn new(reader: R, mode: FrameMode, dictionary: Option<Dictionary>, options: Option<DecompressionOptions>) -> Result<Self> {
        let decoder = Decoder::new(mode, dictionary.clone(), options.as_ref())?;
        let buffer_size = unsafe {
            sys::ZSTD_DStreamInSize()
        };

        Ok(Self {
            reader,
            decoder,
            mode,
            dictionary,
            options,
            buffer: vec![0; buffer_size].into_boxed_slice(),
            total_in: 0,
            pos: 0,
            size: None,
            finished: false,
        })
    }

    fn fill(&mut self) -> io::Result<usize> {
        loop {
            match self.reader.read(&mut self.buffer) {
                Ok(size) => break Ok(size),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => break Err(error),
            }
        }
    }

    fn finish(&mut self) -> usize {
        self.finished = true;
        self.size = Some(self.pos);
        0
    }

    ///Reads decompressed data into `output`, returning number of bytes written.
    ///
    ///Returns `0` only once all data is read.
    pub fn read_data(&mut self, output: &mut [u8]) -> Result<usize> {
        if output.is_empty() || self.finished {
            return Ok(0);
        }

        loop {
            if let Decoder::Single(decoder) = &self.decoder {
                if decoder.eof() {
                    return Ok(self.finish());
                }
            }

            //Fresh decoder doesn't ask for input until it sees some
            let size = match self.total_in == 0 || self.decoder.needs_input() {
                true => {
                    let size = self.fill()?;
                    if size == 0 {
                        let complete = match &self.decoder {
                            Decoder::Single(_) => self.total_in == 0,
                            Decoder::Concatenated(decoder) => decoder.at_frame_edge(),
                        };
                        return match complete {
                            true => Ok(self.finish()),
                            false => Err(Error::data("compressed stream ended before the end of a frame")),
                        };
                    }
                    self.total_in += size as u64;
                    size
                },
                false => 0,
            };

            let data = self.decoder.decompress(&self.buffer[..size], output.len())?;
            if !data.is_empty() {
                output[..data.len()].copy_from_slice(&data);
                self.pos += data.len() as u64;
                return Ok(data.len());
            }
        }
    }

    fn skip(&mut self, mut size: u64) -> Result<()> {
        let mut scratch = [0u8; 8 * 1024];
        while size > 0 {
            let chunk = size.min(scratch.len() as u64) as usize;
            match self.read_data(&mut scratch[..chunk])? {
                0 => break,
                read => size -= read as u64,
            }
        }
        Ok(())
    }
}

impl<R: Read + Seek> FrameReader<R> {
    fn rewind(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.decoder = Decoder::new(self.mode, self.dictionary.clone(), self.options.as_ref())?;
        self.total_in = 0;
        self.pos = 0;
        self.finished = false;
        Ok(())
    }

    ///Moves to `target` position within decompressed data, stopping at the end.
    pub fn seek_data(&mut self, target: SeekFrom) -> Result<u64> {
        let target = match target {
            SeekFrom::Start(offset) => offset,
            SeekFrom::Current(offset) => self.pos.checked_add_signed(offset).ok_or_else(|| Error::invalid_argument("seek before start of data"))?,
            SeekFrom::End(offset) => {
                let size = match self.size {
                    Some(size) => size,
                    None => {
                        self.skip(u64::MAX)?;
                        self.pos
                    }
                };
                size.checked_add_signed(offset).ok_or_else(|| Error::invalid_argument("seek before start of data"))?
            },
        };

        if target < self.pos {
            self.rewind()?;
        }
        let target = match self.size {
            Some(size) => target.min(size),
            None => target,
        };
        self.skip(target - self.pos)?;

        tracing::debug!(target, pos = self.pos, "seek");
        Ok(self.pos)
    }
}

impl<R: Read> Read for FrameReader<R> {
    #[inline(always)]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_data(buf).map_err(Into::into)
    }
}

impl<R: Read + Seek> Seek for FrameReader<R> {
    #[inline]
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Current(0) => Ok(self.pos),
            pos => self.seek_data(pos).map_err(Into::into),
        }
    }
}
