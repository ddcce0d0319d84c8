//! Compressor state machine

use zstd_sys as sys;

use core::ffi::c_void;
use core::ptr;
use std::io;

use crate::buffer::OutputBuffer;
use crate::dict::Dictionary;
use crate::error::{Error, Result};
use crate::params::{self, CompressionOptions, CompressionParameter};
use crate::{mem, utils};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
///Describes how much of buffered data must be emitted
pub enum FlushMode {
    ///Compress as usual, output may be held back internally.
    Continue,
    ///Emit everything buffered, ending current block.
    ///
    ///Decoder is able to reconstruct all data fed so far, frame stays open.
    FlushBlock,
    ///Emit everything buffered and close current frame.
    ///
    ///Next input starts new frame.
    FlushFrame,
}

impl FlushMode {
    #[inline(always)]
    const fn into_zstd(self) -> sys::ZSTD_EndDirective {
        match self {
            Self::Continue => sys::ZSTD_EndDirective::ZSTD_e_continue,
            Self::FlushBlock => sys::ZSTD_EndDirective::ZSTD_e_flush,
            Self::FlushFrame => sys::ZSTD_EndDirective::ZSTD_e_end,
        }
    }
}

///Destination of compressed bytes
trait Sink {
    fn spare(&mut self) -> sys::ZSTD_outBuffer_s;
    fn commit(&mut self, output: &sys::ZSTD_outBuffer_s);
}

impl Sink for OutputBuffer<'_> {
    #[inline(always)]
    fn spare(&mut self) -> sys::ZSTD_outBuffer_s {
        OutputBuffer::spare(self)
    }

    #[inline(always)]
    fn commit(&mut self, output: &sys::ZSTD_outBuffer_s) {
        OutputBuffer::commit(self, output)
    }
}

#[cfg(feature = "bytes")]
struct BufSink<'a, B> {
    buf: &'a mut B,
    written: usize,
}

#[cfg(feature = "bytes")]
impl<B: bytes::BufMut> Sink for BufSink<'_, B> {
    #[inline]
    fn spare(&mut self) -> sys::ZSTD_outBuffer_s {
        if !self.buf.has_remaining_mut() {
            return sys::ZSTD_outBuffer_s {
                dst: ptr::null_mut(),
                size: 0,
                pos: 0,
            };
        }

        let chunk = self.buf.chunk_mut();
        sys::ZSTD_outBuffer_s {
            dst: chunk.as_mut_ptr() as *mut c_void,
            size: chunk.len(),
            pos: 0,
        }
    }

    #[inline]
    fn commit(&mut self, output: &sys::ZSTD_outBuffer_s) {
        unsafe {
            self.buf.advance_mut(output.pos);
        }
        self.written += output.pos;
    }
}

///zstd compressor
///
///Emits compressed data incrementally, letting caller decide where blocks and frames end via
///[FlushMode].
///
///## Usage
///
///```rust
///use zframe::{Compressor, FlushMode, decompressor};
///
///let mut compressor = Compressor::new(Some(3), None, None).expect("to create compressor");
///let mut output = compressor.compress(b"first chunk ", FlushMode::Continue).expect("to compress");
///output.extend(compressor.compress(b"second chunk", FlushMode::FlushBlock).expect("to compress"));
///output.extend(compressor.flush(FlushMode::FlushFrame).expect("to finish frame"));
///assert_eq!(compressor.last_mode(), FlushMode::FlushFrame);
///
///let data = decompressor::decompress(&output, None, None).expect("to decompress");
///assert_eq!(data, b"first chunk second chunk");
///```
pub struct Compressor {
    ctx: ptr::NonNull<sys::ZSTD_CCtx>,
    last_mode: FlushMode,
    level: i32,
    //Must outlive `ctx` as tables are referenced
    dictionary: Option<Dictionary>,
}

unsafe impl Send for Compressor {}

impl Compressor {
    ///Creates new compressor
    ///
    ///Arguments
    ///
    ///- `level` - Compression level, must be within [compression_levels](crate::compression_levels). Uses default when `None`.
    ///- `dictionary` - Dictionary to attach, according to its [AttachMode](crate::AttachMode).
    ///- `options` - Advanced parameters, cannot carry compression level when `level` is set.
    pub fn new(level: Option<i32>, dictionary: Option<Dictionary>, options: Option<&CompressionOptions>) -> Result<Self> {
        let levels = params::compression_levels();
        if let Some(level) = level {
            if !levels.contains(level) {
                return Err(Error::invalid_argument(format!("compression level {level} is out of range, it should be {} <= level <= {}", levels.min, levels.max)));
            }
            if options.and_then(|options| options.get(CompressionParameter::CompressionLevel)).is_some() {
                return Err(Error::invalid_argument("only one of level or options' compression level can be set"));
            }
        }

        let ctx = unsafe {
            sys::ZSTD_createCCtx_advanced(mem::custom_mem())
        };
        let ctx = match ptr::NonNull::new(ctx) {
            Some(ctx) => ctx,
            None => return Err(io::Error::new(io::ErrorKind::OutOfMemory, "unable to allocate zstd compression context").into()),
        };

        let mut compressor = Self {
            ctx,
            last_mode: FlushMode::FlushFrame,
            level: levels.default,
            dictionary: None,
        };

        if let Some(options) = options {
            options.apply(ctx)?;
            match options.get(CompressionParameter::CompressionLevel) {
                //0 is alias of default
                Some(0) | None => (),
                Some(level) => compressor.level = levels.clamp(level),
            }
        }
        if let Some(level) = level {
            CompressionOptions::new().level(level).apply(ctx)?;
            compressor.level = level;
        }

        if let Some(dictionary) = dictionary {
            dictionary.attach_compressor(ctx, compressor.level)?;
            compressor.dictionary = Some(dictionary);
        }

        tracing::debug!(level = compressor.level, dictionary_id = compressor.dictionary.as_ref().map(Dictionary::id), "compressor created");
        Ok(compressor)
    }

    #[inline(always)]
    ///Returns mode of the last successful operation.
    ///
    ///Fresh compressor and compressor after error report [FlushMode::FlushFrame] as they are on
    ///frame boundary.
    pub fn last_mode(&self) -> FlushMode {
        self.last_mode
    }

    #[inline(always)]
    ///Returns compression level used for digested dictionary tables
    pub fn level(&self) -> i32 {
        self.level
    }

    #[inline(always)]
    ///Returns attached dictionary, if any.
    pub fn dictionary(&self) -> Option<&Dictionary> {
        self.dictionary.as_ref()
    }

    ///Compresses `input` returning whatever output `mode` requires to be emitted.
    ///
    ///With [FlushMode::Continue] output may be empty.
    pub fn compress(&mut self, input: &[u8], mode: FlushMode) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.compress_into(input, &mut output, mode)?;
        Ok(output)
    }

    ///Emits buffered data, ending block or frame depending on `mode`.
    pub fn flush(&mut self, mode: FlushMode) -> Result<Vec<u8>> {
        if mode == FlushMode::Continue {
            return Err(Error::invalid_argument("flush mode must be FlushBlock or FlushFrame"));
        }

        self.compress(&[], mode)
    }

    ///Compresses `input` appending output to `output`.
    ///
    ///Returns number of bytes appended. On error `output` is left as it was.
    pub fn compress_into(&mut self, input: &[u8], output: &mut Vec<u8>, mode: FlushMode) -> Result<usize> {
        let start = output.len();
        let mut sink = OutputBuffer::new(output, None);
        if mode != FlushMode::Continue {
            sink.reserve(unsafe { sys::ZSTD_compressBound(input.len()) });
        }

        let result = self.stream(input, &mut sink, mode);
        let written = sink.written();
        match result {
            Ok(()) => Ok(written),
            Err(error) => {
                output.truncate(start);
                Err(error)
            }
        }
    }

    #[cfg(feature = "bytes")]
    ///Compresses `input` into `output` buffer, iterating through all spare capacity chunks if
    ///necessary
    ///
    ///Requires `bytes` feature
    ///
    ///Returns number of bytes written. Fails if `output` runs out of space.
    pub fn compress_buf(&mut self, input: &[u8], output: &mut impl bytes::BufMut, mode: FlushMode) -> Result<usize> {
        let mut sink = BufSink {
            buf: output,
            written: 0,
        };
        self.stream(input, &mut sink, mode)?;
        Ok(sink.written)
    }

    ///Sets size of content of the next frame to be written into its header.
    ///
    ///Must be called on frame boundary. Feeding different amount of data fails compression.
    pub fn set_pledged_input_size(&mut self, size: Option<u64>) -> Result<()> {
        if self.last_mode != FlushMode::FlushFrame {
            return Err(Error::InvalidState("pledged input size can only be set at the start of a frame"));
        }

        let result = unsafe {
            sys::ZSTD_CCtx_setPledgedSrcSize(self.ctx.as_ptr(), size.unwrap_or(utils::CONTENT_SIZE_UNKNOWN))
        };
        match utils::is_error(result) {
            true => Err(Error::Configuration(format!("Unable to set pledged input size: {}", utils::error_name(result)))),
            false => Ok(()),
        }
    }

    fn stream<S: Sink>(&mut self, input: &[u8], sink: &mut S, mode: FlushMode) -> Result<()> {
        let mut input = sys::ZSTD_inBuffer_s {
            src: input.as_ptr() as *const c_void,
            size: input.len(),
            pos: 0,
        };

        loop {
            let mut output = sink.spare();
            if output.size == 0 {
                self.reset();
                return Err(Error::invalid_argument("output buffer has no space left"));
            }

            let result = unsafe {
                sys::ZSTD_compressStream2(self.ctx.as_ptr(), &mut output, &mut input, mode.into_zstd())
            };
            sink.commit(&output);

            if utils::is_error(result) {
                self.reset();
                return Err(Error::zstd("Unable to compress zstd data", result));
            }

            if input.pos == input.size {
                //0 means everything is flushed.
                //Workers may hold back output in Continue mode, which is fine as long as zstd
                //had room to write.
                if result == 0 || (mode == FlushMode::Continue && output.pos < output.size) {
                    break;
                }
            }
        }

        tracing::trace!(input = input.size, ?mode, "compressed");
        self.last_mode = mode;
        Ok(())
    }

    fn reset(&mut self) {
        self.last_mode = FlushMode::FlushFrame;
        let result = unsafe {
            sys::ZSTD_CCtx_reset(self.ctx.as_ptr(), sys::ZSTD_ResetDirective::ZSTD_reset_session_only)
        };
        debug_assert_eq!(result, 0);
        tracing::debug!("compressor session reset after error");
    }
}

impl Drop for Compressor {
    #[inline]
    fn drop(&mut self) {
        let result = unsafe {
            sys::ZSTD_freeCCtx(self.ctx.as_ptr())
        };
        debug_assert_eq!(result, 0);
    }
}
