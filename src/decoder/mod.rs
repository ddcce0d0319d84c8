//! Decompressor state machines
//!
//!Both [Decompressor] and [EndlessDecompressor] drive the same [Session], differing only in what
//!happens once frame ends.

use zstd_sys as sys;

use core::ffi::c_void;
use core::ptr;
use std::io;

use crate::buffer::OutputBuffer;
use crate::dict::Dictionary;
use crate::error::{Error, Result};
use crate::params::DecompressionOptions;
use crate::{mem, utils};

mod single;
pub use single::Decompressor;
mod endless;
pub use endless::EndlessDecompressor;

///Outcome of single decoding step
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    ///Output window is filled, decoder may hold more output.
    NeedOutput,
    ///Everything decoded so far is flushed, frame is not complete yet.
    NeedInput,
    ///Frame is complete and fully flushed.
    FrameEnd,
}

///Decompression session
pub(crate) struct Session {
    ctx: ptr::NonNull<sys::ZSTD_DCtx>,
    //Must outlive `ctx` as tables are referenced
    dictionary: Option<Dictionary>,
}

unsafe impl Send for Session {}

impl Session {
    pub fn new(dictionary: Option<Dictionary>, options: Option<&DecompressionOptions>) -> Result<Self> {
        let ctx = unsafe {
            sys::ZSTD_createDCtx_advanced(mem::custom_mem())
        };
        let ctx = match ptr::NonNull::new(ctx) {
            Some(ctx) => ctx,
            None => return Err(io::Error::new(io::ErrorKind::OutOfMemory, "unable to allocate zstd decompression context").into()),
        };

        let mut session = Self {
            ctx,
            dictionary: None,
        };

        if let Some(options) = options {
            options.apply(ctx)?;
        }
        if let Some(dictionary) = dictionary {
            dictionary.attach_decompressor(ctx)?;
            session.dictionary = Some(dictionary);
        }

        tracing::debug!(dictionary_id = session.dictionary.as_ref().map(Dictionary::id), "decompression session created");
        Ok(session)
    }

    #[inline]
    ///Runs single `ZSTD_decompressStream` over `input`, appending into `output`.
    pub fn step(&mut self, input: &mut sys::ZSTD_inBuffer_s, output: &mut OutputBuffer<'_>) -> Result<Step> {
        let mut out = output.spare();
        let result = unsafe {
            sys::ZSTD_decompressStream(self.ctx.as_ptr(), &mut out, input)
        };
        output.commit(&out);

        if utils::is_error(result) {
            let message = match utils::error_code(result) {
                utils::ERROR_DICTIONARY_WRONG => match self.dictionary.as_ref() {
                    Some(dictionary) => format!("Unable to decompress zstd data: {} (attached dictionary id is {})", utils::error_name(result), dictionary.id()),
                    None => format!("Unable to decompress zstd data: {} (no dictionary attached)", utils::error_name(result)),
                },
                _ => format!("Unable to decompress zstd data: {}", utils::error_name(result)),
            };
            return Err(Error::data(message));
        }

        if result == 0 {
            Ok(Step::FrameEnd)
        } else if out.pos == out.size {
            Ok(Step::NeedOutput)
        } else {
            Ok(Step::NeedInput)
        }
    }

    #[inline]
    ///Drops progress of current frame, keeping parameters and dictionary
    pub fn reset(&mut self) {
        let result = unsafe {
            sys::ZSTD_DCtx_reset(self.ctx.as_ptr(), sys::ZSTD_ResetDirective::ZSTD_reset_session_only)
        };
        debug_assert_eq!(result, 0);
    }
}

impl Drop for Session {
    #[inline]
    fn drop(&mut self) {
        let result = unsafe {
            sys::ZSTD_freeDCtx(self.ctx.as_ptr())
        };
        debug_assert_eq!(result, 0);
    }
}

///Input left unconsumed by previous call
#[derive(Default)]
pub(crate) struct PendingInput {
    data: Vec<u8>,
}

impl PendingInput {
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    ///Runs `step` over pending bytes followed by `input`, storing whatever is not consumed.
    ///
    ///`step` receives zstd view over input, advancing its `pos` by consumed bytes.
    pub fn feed<T>(&mut self, input: &[u8], step: impl FnOnce(&mut sys::ZSTD_inBuffer_s) -> T) -> T {
        let use_pending = !self.data.is_empty();
        if use_pending {
            self.data.extend_from_slice(input);
        }

        let source = match use_pending {
            true => self.data.as_slice(),
            false => input,
        };
        let mut buffer = sys::ZSTD_inBuffer_s {
            src: source.as_ptr() as *const c_void,
            size: source.len(),
            pos: 0,
        };
        let result = step(&mut buffer);

        match use_pending {
            true => {
                self.data.drain(..buffer.pos);
            },
            false => self.data.extend_from_slice(&input[buffer.pos..]),
        }

        result
    }
}

const MAX_CAPACITY_HINT: usize = 16 * 1024 * 1024;

#[inline]
///Estimates size of output when `input` starts with complete frame with known size.
pub(crate) fn frame_capacity_hint(input: &[u8]) -> Option<usize> {
    let size = unsafe {
        sys::ZSTD_getFrameContentSize(input.as_ptr() as *const c_void, input.len())
    };
    //Unknown and error are the two largest values
    if size >= u64::MAX - 1 {
        return None;
    }

    let frame_size = unsafe {
        sys::ZSTD_findFrameCompressedSize(input.as_ptr() as *const c_void, input.len())
    };
    match utils::is_error(frame_size) {
        true => None,
        //Header is not verified against content until decoded
        false => Some(size.min(MAX_CAPACITY_HINT as u64) as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_keep_unconsumed_input() {
        let mut pending = PendingInput::default();
        pending.feed(b"abcdef", |input| input.pos = 2);
        assert_eq!(pending.as_slice(), b"cdef");

        pending.feed(b"gh", |input| {
            assert_eq!(input.size, 6);
            input.pos = 5;
        });
        assert_eq!(pending.as_slice(), b"h");

        pending.feed(b"", |input| input.pos = input.size);
        assert!(pending.is_empty());
    }

    #[test]
    fn should_cap_capacity_hint() {
        let mut frame = vec![0x28, 0xb5, 0x2f, 0xfd, 0xe0];
        frame.extend_from_slice(&(1u64 << 50).to_le_bytes());
        frame.extend_from_slice(&[0x01, 0x00, 0x00]);
        assert_eq!(frame_capacity_hint(&frame), Some(MAX_CAPACITY_HINT));
        assert_eq!(frame_capacity_hint(b"not a frame"), None);
    }
}
