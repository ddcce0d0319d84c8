//!Writer compressor.

use crate::encoder::{Compressor, FlushMode};
use crate::error::{Error, Result};

use std::io::{self, Write};

///Compressing writer
///
///It writes compressed data to supplied writer as soon as [Compressor] emits it.
///You can finish frame by calling [push](Self::push) with [FlushMode::FlushFrame] or [finish](Self::finish).
///
///## Usage
///
///```rust
///use zframe::{Compressor, FlushMode, compressor::write::FrameWriter, decompressor};
///
///let compressor = Compressor::new(None, None, None).expect("to create compressor");
///let mut writer = FrameWriter::new(compressor, Vec::new());
///writer.push(b"some data", FlushMode::Continue).expect("to compress");
///let compressed = writer.finish().expect("to finish frame");
///assert_eq!(decompressor::decompress(&compressed, None, None).expect("to decompress"), b"some data");
///```
pub struct FrameWriter<W> {
    compressor: Compressor,
    writer: W,
    output: Vec<u8>,
    total_in: u64,
}

impl<W: Write> FrameWriter<W> {
    #[inline]
    ///Creates new instance
    pub fn new(compressor: Compressor, writer: W) -> Self {
        Self {
            compressor,
            writer,
            output: Vec::new(),
            total_in: 0,
        }
    }

    #[inline]
    ///Returns reference to underlying compressor
    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    #[inline]
    ///Returns reference to underlying writer
    pub fn writer(&self) -> &W {
        &self.writer
    }

    #[inline]
    ///Returns mutable reference to underlying writer
    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    ///Pushes chunk to compressor, writing whatever it emits.
    ///
    ///Returns number of compressed bytes written.
    ///
    ///If underlying writer fails, compressed data of this call is lost.
    pub fn push(&mut self, data: &[u8], mode: FlushMode) -> Result<usize> {
        self.output.clear();
        self.compressor.compress_into(data, &mut self.output, mode)?;
        self.total_in += data.len() as u64;
        self.writer.write_all(&self.output)?;
        Ok(self.output.len())
    }

    ///Ends current block or frame, unless previous operation already did so.
    ///
    ///Returns number of compressed bytes written.
    pub fn flush_mode(&mut self, mode: FlushMode) -> Result<usize> {
        if mode == FlushMode::Continue {
            return Err(Error::invalid_argument("flush mode must be FlushBlock or FlushFrame"));
        } else if self.compressor.last_mode() == mode {
            return Ok(0);
        }

        self.push(&[], mode)
    }

    #[inline]
    ///Finishes current frame and returns underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.finish_frame()?;
        Ok(self.writer)
    }

    #[inline]
    ///Enables automatic finish of the frame on drop.
    pub fn auto_finish(self) -> AutoFinish<W> {
        AutoFinish {
            inner: self,
        }
    }

    ///Finishes current frame, if any, and flushes underlying writer.
    ///
    ///Returns number of compressed bytes written.
    pub fn finish_frame(&mut self) -> Result<usize> {
        let written = self.flush_mode(FlushMode::FlushFrame)?;
        self.writer.flush()?;
        Ok(written)
    }
}

impl<W> FrameWriter<W> {
    #[inline(always)]
    ///Returns number of uncompressed bytes pushed so far
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    #[inline]
    ///Consumes self and returns underlying writer, discarding anything not flushed.
    pub fn take(self) -> W {
        self.writer
    }
}

impl<W: Write> Write for FrameWriter<W> {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf, FlushMode::Continue)?;
        Ok(buf.len())
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.flush_mode(FlushMode::FlushBlock)?;
        self.writer.flush()
    }
}

///Wrapper over [FrameWriter] that finishes frame on drop if it is left open.
///
///# Note:
///
///There is no buffering involved, as soon as data is ready, it is written.
///Errors on drop are ignored, use [FrameWriter::finish] to observe them.
pub struct AutoFinish<W: Write> {
    inner: FrameWriter<W>,
}

impl<W: Write> AutoFinish<W> {
    #[inline]
    ///Returns reference to underlying compressor
    pub fn compressor(&self) -> &Compressor {
        &self.inner.compressor
    }

    #[inline]
    ///Returns reference to underlying writer
    pub fn writer(&self) -> &W {
        &self.inner.writer
    }

    #[inline]
    ///Pushes chunk to underlying compressor.
    pub fn push(&mut self, data: &[u8], mode: FlushMode) -> Result<usize> {
        self.inner.push(data, mode)
    }
}

impl<W: Write> Drop for AutoFinish<W> {
    fn drop(&mut self) {
        if self.inner.compressor.last_mode() != FlushMode::FlushFrame {
            let _ = self.inner.push(&[], FlushMode::FlushFrame);
            let _ = self.inner.writer.flush();
        }
    }
}

impl<W: Write> Write for AutoFinish<W> {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    #[inline(always)]
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
