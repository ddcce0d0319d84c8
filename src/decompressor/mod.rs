//!High level Decompression API

pub mod read;

use zstd_sys as sys;

use std::io;

use crate::decoder::EndlessDecompressor;
use crate::dict::Dictionary;
use crate::error::{Error, Result};
use crate::params::DecompressionOptions;

const TRUNCATED: &str = "compressed data ended before the end-of-stream marker was reached";

///Decompresses all frames in `data`, concatenating their output.
///
///## Errors
///
///[Error::Data] if `data` is empty, corrupted or ends in the middle of frame.
pub fn decompress(data: &[u8], dictionary: Option<&Dictionary>, options: Option<&DecompressionOptions>) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(Error::data(TRUNCATED));
    }

    let mut decompressor = EndlessDecompressor::new(dictionary.cloned(), options)?;
    let output = decompressor.decompress(data, None)?;
    match decompressor.at_frame_edge() {
        true => Ok(output),
        false => Err(Error::Data {
            message: TRUNCATED.to_owned(),
            partial_output: output,
        }),
    }
}

///Decompresses all frames from `reader` into `writer`
///
///Output is produced in bounded chunks, so memory usage doesn't depend on size of data.
///
///Returns number of bytes read and written.
pub fn decompress_stream<R: io::Read, W: io::Write>(mut reader: R, mut writer: W, dictionary: Option<&Dictionary>) -> Result<(u64, u64)> {
    let mut decompressor = EndlessDecompressor::new(dictionary.cloned(), None)?;
    let (input_size, output_size) = unsafe {
        (sys::ZSTD_DStreamInSize(), sys::ZSTD_DStreamOutSize())
    };
    let mut buffer = vec![0; input_size];
    let mut read = 0u64;
    let mut written = 0u64;

    loop {
        let size = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(size) => size,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error.into()),
        };
        read += size as u64;

        let mut input = &buffer[..size];
        loop {
            let output = decompressor.decompress(input, Some(output_size))?;
            input = &[];
            writer.write_all(&output)?;
            written += output.len() as u64;

            if decompressor.needs_input() {
                break;
            }
        }
    }

    if read == 0 || !decompressor.at_frame_edge() {
        return Err(Error::data(TRUNCATED));
    }

    writer.flush()?;
    tracing::debug!(read, written, "stream decompressed");
    Ok((read, written))
}
