use crate::buffer::OutputBuffer;
use crate::dict::Dictionary;
use crate::error::{Error, Result};
use crate::params::DecompressionOptions;
use super::{frame_capacity_hint, PendingInput, Session, Step};

///Multi frame decompressor
///
///Concatenates output of all frames fed into it, restarting transparently on frame boundaries.
///
///## Usage
///
///```rust
///use zframe::{EndlessDecompressor, compressor};
///
///let mut compressed = compressor::compress(b"first ", None, None).expect("to compress");
///compressed.extend(compressor::compress(b"second", None, None).expect("to compress"));
///
///let mut decompressor = EndlessDecompressor::new(None, None).expect("to create decompressor");
///assert!(decompressor.at_frame_edge());
///let output = decompressor.decompress(&compressed, None).expect("to decompress");
///assert_eq!(output, b"first second");
///assert!(decompressor.at_frame_edge());
///```
pub struct EndlessDecompressor {
    session: Session,
    pending: PendingInput,
    at_frame_edge: bool,
    needs_input: bool,
}

impl EndlessDecompressor {
    #[inline]
    ///Creates new decompressor, attaching `dictionary` if provided.
    ///
    ///Dictionary attached as prefix applies to first frame only.
    pub fn new(dictionary: Option<Dictionary>, options: Option<&DecompressionOptions>) -> Result<Self> {
        Ok(Self {
            session: Session::new(dictionary, options)?,
            pending: PendingInput::default(),
            at_frame_edge: true,
            needs_input: false,
        })
    }

    #[inline(always)]
    ///Returns whether all input fed so far ends exactly on frame boundary.
    pub fn at_frame_edge(&self) -> bool {
        self.at_frame_edge
    }

    #[inline(always)]
    ///Returns whether decompressor needs more input to make progress.
    ///
    ///`false` before first call or when previous call stopped mid-frame due to `max_output`.
    pub fn needs_input(&self) -> bool {
        self.needs_input
    }

    ///Decompresses `input` returning up to `max_output` bytes.
    ///
    ///Input that cannot be processed within `max_output` is retained and processed first on the
    ///next call.
    ///
    ///## Errors
    ///
    ///[Error::Data] on corrupted input or dictionary mismatch, carrying output of frames completed
    ///within this call. Session is reset afterwards, next input is expected to start new frame.
    pub fn decompress(&mut self, input: &[u8], max_output: Option<usize>) -> Result<Vec<u8>> {
        if self.at_frame_edge && self.pending.is_empty() && input.is_empty() {
            return Ok(Vec::new());
        }

        let capacity_hint = match self.at_frame_edge && self.pending.is_empty() {
            true => frame_capacity_hint(input),
            false => None,
        };

        let mut output = Vec::new();
        let session = &mut self.session;
        let at_frame_edge = &mut self.at_frame_edge;
        let result: Result<()> = self.pending.feed(input, |input| {
            let mut buffer = OutputBuffer::new(&mut output, max_output);
            if let Some(capacity) = capacity_hint {
                buffer.reserve(capacity);
            }

            while !buffer.is_full() {
                let step = session.step(input, &mut buffer)?;
                *at_frame_edge = step == Step::FrameEnd;

                match step {
                    Step::FrameEnd => {
                        tracing::debug!(output = buffer.written(), "frame boundary");
                        if input.pos == input.size {
                            break;
                        }
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
            self.session.reset();
            self.pending.clear();
            self.at_frame_edge = true;
            self.needs_input = true;
            return Err(match error {
                Error::Data { message, .. } => Error::Data {
                    message,
                    partial_output: output,
                },
                error => error,
            });
        }

        if self.pending.is_empty() {
            self.needs_input = !(max_output == Some(output.len()) && !self.at_frame_edge);
        } else {
            self.needs_input = false;
            self.at_frame_edge = false;
        }

        tracing::trace!(input = input.len(), output = output.len(), at_frame_edge = self.at_frame_edge, "decompressed");
        Ok(output)
    }
}
