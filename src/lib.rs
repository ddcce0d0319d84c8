//!Streaming zstd frame protocol
//!
//!Layer between raw byte buffers and zstd codec, giving exact control over block and frame
//!boundaries:
//!
//!- [Compressor] emits block or frame delimited output on demand via [FlushMode].
//!- [Decompressor] decodes single frame from arbitrary chunks, keeping bytes after it.
//!- [EndlessDecompressor] decodes concatenated frames transparently.
//!- [Dictionary] is shared content attached as digested tables, raw content or prefix.
//!- [frame_info] and [frame_size] inspect frames without decoding them.
//!- [BufferedCompressedStream] is seekable file-like wrapper over both directions.
//!
//!All codec memory is allocated via Rust's global allocator.
//!
//!## Features
//!
//!All features are off by default.
//!
//!- `zstdmt` - Enables multi-threaded compression (`nbWorkers` parameter).
//!- `bytes` - Enables [Compressor::compress_buf] writing into `bytes::BufMut`.
//!
//!## Usage
//!
//!```rust
//!use zframe::{Compressor, FlushMode, EndlessDecompressor};
//!
//!let mut compressor = Compressor::new(Some(3), None, None).expect("to create compressor");
//!let mut compressed = compressor.compress(b"first frame", FlushMode::FlushFrame).expect("to compress");
//!compressed.extend(compressor.compress(b", second frame", FlushMode::FlushFrame).expect("to compress"));
//!
//!let mut decompressor = EndlessDecompressor::new(None, None).expect("to create decompressor");
//!let output = decompressor.decompress(&compressed, None).expect("to decompress");
//!assert_eq!(output, b"first frame, second frame");
//!assert!(decompressor.at_frame_edge());
//!```

#![warn(missing_docs)]
#![cfg_attr(feature = "cargo-clippy", allow(clippy::style))]

pub(crate) mod utils;
mod buffer;
pub mod mem;
mod error;
pub use error::{Error, Result};
pub mod params;
pub use params::{compression_levels, supports_multithread, version, version_number, CompressionLevels, CompressionOptions, CompressionParameter, DecompressionOptions, DecompressionParameter, Strategy};
mod dict;
pub use dict::{AttachMode, Dictionary};
mod frame;
pub use frame::{frame_info, frame_size, FrameInfo};
pub mod encoder;
pub use encoder::{Compressor, FlushMode};
pub mod decoder;
pub use decoder::{Decompressor, EndlessDecompressor};
pub mod compressor;
pub mod decompressor;
pub mod stream;
pub use stream::{BufferedCompressedStream, OpenMode, ReadOptions, WriteOptions};
pub use decompressor::read::FrameMode;
