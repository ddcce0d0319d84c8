//! Frame introspection

use zstd_sys as sys;

use core::ffi::c_void;

use crate::error::{Error, Result};
use crate::utils;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
///Information stored in frame header
pub struct FrameInfo {
    ///Size of content when it is written into header.
    pub decompressed_size: Option<u64>,
    ///Id of dictionary required to decompress, `0` when none or not written.
    pub dictionary_id: u32,
    ///Size of header itself.
    pub header_size: u32,
    ///Window size required for decompression.
    pub window_size: u64,
    ///Whether frame ends with checksum of content.
    pub has_checksum: bool,
}

///Reads header of the frame at the start of `buffer`
///
///Only header bytes are required, the rest of frame may be absent.
///
///## Errors
///
///- [Error::InsufficientData] when `buffer` is shorter than header.
///- [Error::Data] when header is corrupted.
pub fn frame_info(buffer: &[u8]) -> Result<FrameInfo> {
    let mut header = utils::FrameHeader::zeroed();
    let result = unsafe {
        utils::ZSTD_getFrameHeader(&mut header, buffer.as_ptr() as *const c_void, buffer.len())
    };

    if utils::is_error(result) {
        return Err(Error::zstd("Unable to read zstd frame header", result));
    } else if result > 0 {
        return Err(Error::InsufficientData(format!("zstd frame header requires {result} bytes, but only {} provided", buffer.len())));
    }

    Ok(FrameInfo {
        decompressed_size: match header.frame_content_size {
            utils::CONTENT_SIZE_UNKNOWN => None,
            size => Some(size),
        },
        dictionary_id: header.dict_id,
        header_size: header.header_size,
        window_size: header.window_size,
        has_checksum: header.checksum_flag != 0,
    })
}

///Returns compressed size of the complete frame at the start of `buffer`
///
///## Errors
///
///- [Error::InsufficientData] when frame is truncated.
///- [Error::Data] when frame is corrupted.
pub fn frame_size(buffer: &[u8]) -> Result<usize> {
    let result = unsafe {
        sys::ZSTD_findFrameCompressedSize(buffer.as_ptr() as *const c_void, buffer.len())
    };

    if utils::is_error(result) {
        match utils::error_code(result) {
            utils::ERROR_SRC_SIZE_WRONG => Err(Error::InsufficientData(format!("zstd frame is truncated, only {} bytes provided", buffer.len()))),
            _ => Err(Error::zstd("Unable to find zstd frame size", result)),
        }
    } else {
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_require_header_bytes() {
        assert!(matches!(frame_info(&[]).unwrap_err(), Error::InsufficientData(_)));
        assert!(matches!(frame_info(&[0x28, 0xb5]).unwrap_err(), Error::InsufficientData(_)));
        assert!(matches!(frame_size(&[0x28, 0xb5, 0x2f]).unwrap_err(), Error::InsufficientData(_)));
    }

    #[test]
    fn should_reject_bad_magic() {
        assert!(frame_info(b"definitely not zstd").unwrap_err().is_data());
        assert!(frame_size(b"definitely not zstd").unwrap_err().is_data());
    }
}
