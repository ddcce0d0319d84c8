use zstd_sys as sys;

use core::ffi::{c_char, c_int, c_uint, c_ulonglong, c_void, CStr};

//Raw integer keys instead of bindgen enums, as keys may come from user.
#[allow(clashing_extern_declarations)]
extern "C" {
    pub fn ZSTD_getErrorCode(result: usize) -> i32;
    pub fn ZSTD_CCtx_setParameter(cctx: *mut sys::ZSTD_CCtx, param: c_int, value: c_int) -> usize;
    pub fn ZSTD_DCtx_setParameter(dctx: *mut sys::ZSTD_DCtx, param: c_int, value: c_int) -> usize;
    pub fn ZSTD_cParam_getBounds(param: c_int) -> Bounds;
    pub fn ZSTD_dParam_getBounds(param: c_int) -> Bounds;
    pub fn ZSTD_getFrameHeader(header: *mut FrameHeader, src: *const c_void, src_size: usize) -> usize;
}

#[repr(C)]
#[derive(Copy, Clone)]
///`ZSTD_bounds`
pub struct Bounds {
    pub error: usize,
    pub lower_bound: c_int,
    pub upper_bound: c_int,
}

#[repr(C)]
#[derive(Copy, Clone)]
///`ZSTD_frameHeader`
pub struct FrameHeader {
    pub frame_content_size: c_ulonglong,
    pub window_size: c_ulonglong,
    pub block_size_max: c_uint,
    //ZSTD_frameType_e
    pub frame_type: c_int,
    pub header_size: c_uint,
    pub dict_id: c_uint,
    pub checksum_flag: c_uint,
    pub _reserved1: c_uint,
    pub _reserved2: c_uint,
}

impl FrameHeader {
    #[inline(always)]
    pub const fn zeroed() -> Self {
        Self {
            frame_content_size: 0,
            window_size: 0,
            block_size_max: 0,
            frame_type: 0,
            header_size: 0,
            dict_id: 0,
            checksum_flag: 0,
            _reserved1: 0,
            _reserved2: 0,
        }
    }
}

//https://github.com/facebook/zstd/blob/dev/lib/zstd_errors.h
pub const ERROR_SRC_SIZE_WRONG: i32 = 72;
pub const ERROR_DICTIONARY_WRONG: i32 = 32;

//ZSTD_CONTENTSIZE_UNKNOWN
pub const CONTENT_SIZE_UNKNOWN: u64 = u64::MAX;

#[inline(always)]
pub fn is_error(code: usize) -> bool {
    unsafe { sys::ZSTD_isError(code) != 0 }
}

#[inline(always)]
pub fn error_code(code: usize) -> i32 {
    unsafe { ZSTD_getErrorCode(code) }
}

#[inline]
pub fn convert_c_str(ptr: *const c_char) -> Option<&'static str> {
    if ptr.is_null() {
        return None;
    }

    let text = unsafe { CStr::from_ptr(ptr) };
    text.to_str().ok()
}

#[inline]
///Returns zstd's description of error `code`
pub fn error_name(code: usize) -> &'static str {
    let name = unsafe {
        sys::ZSTD_getErrorName(code)
    };
    convert_c_str(name).unwrap_or("Unknown error")
}

#[inline]
///Returns zdict's description of error `code`
pub fn zdict_error_name(code: usize) -> &'static str {
    let name = unsafe {
        sys::ZDICT_getErrorName(code)
    };
    convert_c_str(name).unwrap_or("Unknown error")
}

#[inline]
pub fn version_string() -> &'static str {
    let version = unsafe {
        sys::ZSTD_versionString()
    };
    convert_c_str(version).unwrap_or("unknown")
}
