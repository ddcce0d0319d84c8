//! High level compression API

pub mod write;

use zstd_sys as sys;

use std::io;

use crate::dict::Dictionary;
use crate::encoder::{Compressor, FlushMode};
use crate::error::Result;
use crate::params::{self, CompressionOptions};

///Compresses `data` into single frame
///
///`level` is clamped into [compression_levels](crate::compression_levels), default is used when `None`.
pub fn compress(data: &[u8], level: Option<i32>, dictionary: Option<&Dictionary>) -> Result<Vec<u8>> {
    let level = level.map(|level| params::compression_levels().clamp(level));
    let mut compressor = Compressor::new(level, dictionary.cloned(), None)?;
    compressor.compress(data, FlushMode::FlushFrame)
}

///Compresses `data` into single frame using advanced `options`
pub fn compress_with_options(data: &[u8], options: &CompressionOptions, dictionary: Option<&Dictionary>) -> Result<Vec<u8>> {
    let mut compressor = Compressor::new(None, dictionary.cloned(), Some(options))?;
    compressor.compress(data, FlushMode::FlushFrame)
}

///Compresses everything from `reader` into single frame written to `writer`
///
///Returns number of bytes read and written.
pub fn compress_stream<R: io::Read, W: io::Write>(mut reader: R, writer: W, level: Option<i32>, dictionary: Option<&Dictionary>) -> Result<(u64, u64)> {
    let mut writer = write::FrameWriter::new(Compressor::new(level, dictionary.cloned(), None)?, writer);
    let mut buffer = vec![0; unsafe { sys::ZSTD_CStreamInSize() }];
    let mut written = 0u64;

    loop {
        let size = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(size) => size,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error.into()),
        };
        written += writer.push(&buffer[..size], FlushMode::Continue)? as u64;
    }
    //Empty input still produces valid frame
    written += writer.push(&[], FlushMode::FlushFrame)? as u64;
    writer.writer_mut().flush()?;

    tracing::debug!(read = writer.total_in(), written, "stream compressed");
    Ok((writer.total_in(), written))
}
