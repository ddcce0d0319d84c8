use crate::buffer::OutputBuffer;
use crate::dict::Dictionary;
use crate::error::{Error, Result};
use crate::params::DecompressionOptions;
use super::{PendingInput, Session, Step};

///Single frame decompressor
///
///Stops once first frame is complete, keeping everything after it as [unused_data](Self::unused_data).
///
///## Usage
///
///```rust
///use zframe::{Decompressor, compressor};
///
///let mut compressed = compressor::compress(b"frame content", None, None).expect("to compress");
///compressed.extend_from_slice(b"trailer");
///
///let mut decompressor = Decompressor::new(None, None).expect("to create decompressor");
///let mut output = Vec::new();
///for chunk in compressed.chunks(4) {
///    output.extend(decompressor.decompress(chunk, None).expect("to decompress"));
///}
///assert!(decompressor.eof());
///assert_eq!(output, b"frame content");
///assert_eq!(decompressor.unused_data(), b"trailer");
///```
pub struct Decompressor {
    session: Session,
    pending: PendingInput,
    unused_data: Vec<u8>,
    eof: bool,
    needs_input: bool,
    failed: bool,
}

impl Decompressor {
    #[inline]
    ///Creates new decompressor, attaching `dictionary` if provided.
    pub fn new(dictionary: Option<Dictionary>, options: Option<&DecompressionOptions>) -> Result<Self> {
        Ok(Self {
            session: Session::new(dictionary, options)?,
            pending: PendingInput::default(),
            unused_data: Vec::new(),
            eof: false,
            needs_input: false,
            failed: false,
        })
    }

    #[inline(always)]
    ///Returns whether frame is complete.
    pub fn eof(&self) -> bool {
        self.eof
    }

    #[inline(always)]
    ///Returns whether decompressor needs more input to make progress.
    ///
    ///`false` before first call, when frame is complete or when previous call stopped due to `max_output`.
    pub fn needs_input(&self) -> bool {
        self.needs_input
    }

    #[inline(always)]
    ///Returns bytes following end of frame, empty until [eof](Self::eof).
    pub fn unused_data(&self) -> &[u8] {
        &self.unused_data
    }

    ///Decompresses `input` returning up to `max_output` bytes.
    ///
    ///Input that cannot be processed within `max_output` is retained and processed first on the
    ///next call, which can be made with empty `input`.
    ///Once frame is complete, further input is appended to [unused_data](Self::unused_data).
    ///
    ///## Errors
    ///
    ///[Error::Data] on corrupted input or dictionary mismatch, carrying output produced within
    ///this call. After it decompressor is unusable and every call fails with [Error::InvalidState].
    pub fn decompress(&mut self, input: &[u8], max_output: Option<usize>) -> Result<Vec<u8>> {
        if self.failed {
            return Err(Error::InvalidState("decompressor failed on corrupted data earlier"));
        } else if self.eof {
            self.unused_data.extend_from_slice(input);
            return Ok(Vec::new());
        }

        let mut output = Vec::new();
        let session = &mut self.session;
        let eof = &mut self.eof;
        let result: Result<()> = self.pending.feed(input, |input| {
            let mut buffer = OutputBuffer::new(&mut output, max_output);
            while !buffer.is_full() {
                match session.step(input, &mut buffer)? {
                    Step::FrameEnd => {
                        *eof = true;
                        break;
                    },
                    Step::NeedOutput => continue,
                    Step::NeedInput => if input.pos == input.size {
                        break;
                    },
                }
            }

            Ok(())
        });

        if let Err(error) = result {
            self.failed = true;
            self.needs_input = false;
            self.pending.clear();
            return Err(match error {
                Error::Data { message, .. } => Error::Data {
                    message,
                    partial_output: output,
                },
                error => error,
            });
        }

        let has_unconsumed = !self.pending.is_empty();
        if self.eof {
            tracing::debug!(unused = self.pending.as_slice().len(), "frame end reached");
            self.unused_data.extend_from_slice(self.pending.as_slice());
            self.pending.clear();
        }

        self.needs_input = !(self.eof || has_unconsumed || max_output == Some(output.len()));
        tracing::trace!(input = input.len(), output = output.len(), eof = self.eof, "decompressed");
        Ok(output)
    }
}
