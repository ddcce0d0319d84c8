//! Shared dictionary
//!
//!Dictionary content is immutable and shared by reference count between all views and all
//!sessions it is attached to.
//!Digested tables are produced lazily: one compression table per level and a single
//!decompression table.

use zstd_sys as sys;

use core::ffi::{c_uint, c_void};
use core::{fmt, ptr};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::error::{Error, Result};
use crate::{mem, params, utils};

const MIN_CONTENT_SIZE: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
///Describes how dictionary is attached to codec session
pub enum AttachMode {
    ///Content is pre-processed once per compression level and re-used.
    ///
    ///Fastest to attach, compression parameters are dictated by the level the table was
    ///produced with.
    Digested,
    ///Content is re-processed on every attach.
    ///
    ///Slower to attach, but honors all compression parameters of the session.
    Undigested,
    ///Content is used as raw window preceding the data.
    ///
    ///No dictionary id is written and only first frame after attach is affected.
    Prefix,
}

struct CompressionTable(ptr::NonNull<sys::ZSTD_CDict>);

unsafe impl Send for CompressionTable {}
unsafe impl Sync for CompressionTable {}

impl Drop for CompressionTable {
    #[inline]
    fn drop(&mut self) {
        unsafe {
            sys::ZSTD_freeCDict(self.0.as_ptr());
        }
    }
}

struct DecompressionTable(ptr::NonNull<sys::ZSTD_DDict>);

unsafe impl Send for DecompressionTable {}
unsafe impl Sync for DecompressionTable {}

impl Drop for DecompressionTable {
    #[inline]
    fn drop(&mut self) {
        unsafe {
            sys::ZSTD_freeDDict(self.0.as_ptr());
        }
    }
}

struct Inner {
    //Tables reference content, so they are declared first to be dropped first.
    compression: Mutex<HashMap<i32, CompressionTable>>,
    decompression: OnceLock<DecompressionTable>,
    content: Box<[u8]>,
    id: u32,
    raw: bool,
}

#[derive(Clone)]
///zstd dictionary
///
///Cloning and changing view via [as_digested](Self::as_digested),
///[as_undigested](Self::as_undigested) or [as_prefix](Self::as_prefix) never copies content.
pub struct Dictionary {
    inner: Arc<Inner>,
    mode: AttachMode,
}

impl Dictionary {
    ///Creates dictionary from `content`
    ///
    ///When `is_raw` is `false`, content must be in zstd dictionary format, carrying non-zero id.
    ///Otherwise content is treated as raw data with id `0`.
    pub fn new(content: impl Into<Box<[u8]>>, is_raw: bool, mode: AttachMode) -> Result<Self> {
        let content = content.into();
        if content.len() < MIN_CONTENT_SIZE {
            return Err(Error::InvalidDictionary(format!("dictionary content must be at least {MIN_CONTENT_SIZE} bytes, got {}", content.len())));
        }

        let id = match is_raw {
            true => 0,
            false => {
                let id = unsafe {
                    sys::ZSTD_getDictID_fromDict(content.as_ptr() as *const c_void, content.len())
                };
                if id == 0 {
                    return Err(Error::InvalidDictionary("content is not zstd dictionary, use is_raw to load it as raw content".to_owned()));
                }
                id
            }
        };

        tracing::debug!(id, size = content.len(), is_raw, "dictionary loaded");
        Ok(Self {
            inner: Arc::new(Inner {
                compression: Mutex::new(HashMap::new()),
                decompression: OnceLock::new(),
                content,
                id,
                raw: is_raw,
            }),
            mode,
        })
    }

    ///Trains dictionary of up to `target_size` bytes on provided `samples`
    ///
    ///Returned dictionary uses [AttachMode::Digested].
    pub fn train<T: AsRef<[u8]>>(samples: &[T], target_size: usize) -> Result<Self> {
        let (buffer, sizes) = concat_samples(samples, target_size)?;
        let mut content = Vec::with_capacity(target_size);

        let result = unsafe {
            sys::ZDICT_trainFromBuffer(content.as_mut_ptr() as *mut c_void, target_size, buffer.as_ptr() as *const c_void, sizes.as_ptr(), sizes.len() as c_uint)
        };
        if unsafe { sys::ZDICT_isError(result) } != 0 {
            return Err(Error::Dictionary(format!("Unable to train zstd dictionary: {}", utils::zdict_error_name(result))));
        }

        unsafe {
            content.set_len(result);
        }
        tracing::debug!(samples = sizes.len(), size = result, "dictionary trained");
        Self::new(content, false, AttachMode::Digested)
    }

    ///Finalizes `base` content into zstd dictionary of up to `target_size` bytes, tuned for
    ///`level` using `samples`
    ///
    ///Returned dictionary uses [AttachMode::Digested].
    pub fn finalize<T: AsRef<[u8]>>(base: &Dictionary, samples: &[T], target_size: usize, level: i32) -> Result<Self> {
        if params::version_number() < 10405 {
            return Err(Error::UnsupportedOperation(format!("finalizing dictionary requires zstd v1.4.5 or newer, linked v{}", params::version())));
        }

        let (buffer, sizes) = concat_samples(samples, target_size)?;
        let mut content = Vec::with_capacity(target_size);
        let parameters = sys::ZDICT_params_t {
            compressionLevel: level,
            notificationLevel: 0,
            dictID: 0,
        };

        let result = unsafe {
            sys::ZDICT_finalizeDictionary(
                content.as_mut_ptr() as *mut c_void,
                target_size,
                base.content().as_ptr() as *const c_void,
                base.len(),
                buffer.as_ptr() as *const c_void,
                sizes.as_ptr(),
                sizes.len() as c_uint,
                parameters,
            )
        };
        if unsafe { sys::ZDICT_isError(result) } != 0 {
            return Err(Error::Dictionary(format!("Unable to finalize zstd dictionary: {}", utils::zdict_error_name(result))));
        }

        unsafe {
            content.set_len(result);
        }
        tracing::debug!(samples = sizes.len(), size = result, level, "dictionary finalized");
        Self::new(content, false, AttachMode::Digested)
    }

    #[inline(always)]
    ///Returns dictionary id, `0` for raw content.
    pub fn id(&self) -> u32 {
        self.inner.id
    }

    #[inline(always)]
    ///Returns dictionary content
    pub fn content(&self) -> &[u8] {
        &self.inner.content
    }

    #[inline(always)]
    ///Returns size of content
    pub fn len(&self) -> usize {
        self.inner.content.len()
    }

    #[inline(always)]
    ///Returns whether content is empty, which is never the case for valid dictionary.
    pub fn is_empty(&self) -> bool {
        self.inner.content.is_empty()
    }

    #[inline(always)]
    ///Returns attach mode of this view
    pub fn mode(&self) -> AttachMode {
        self.mode
    }

    #[inline(always)]
    ///Returns whether content was loaded as raw
    pub fn is_raw(&self) -> bool {
        self.inner.raw
    }

    #[inline]
    ///Returns view that attaches digested tables
    pub fn as_digested(&self) -> Self {
        self.with_mode(AttachMode::Digested)
    }

    #[inline]
    ///Returns view that attaches content, re-processing it every time
    pub fn as_undigested(&self) -> Self {
        self.with_mode(AttachMode::Undigested)
    }

    #[inline]
    ///Returns view that attaches content as prefix
    pub fn as_prefix(&self) -> Self {
        self.with_mode(AttachMode::Prefix)
    }

    #[inline]
    fn with_mode(&self, mode: AttachMode) -> Self {
        Self {
            inner: self.inner.clone(),
            mode,
        }
    }

    #[inline(always)]
    fn content_type(&self) -> sys::ZSTD_dictContentType_e {
        match self.inner.raw {
            true => sys::ZSTD_dictContentType_e::ZSTD_dct_rawContent,
            false => sys::ZSTD_dictContentType_e::ZSTD_dct_fullDict,
        }
    }

    fn compression_table(&self, level: i32) -> Result<ptr::NonNull<sys::ZSTD_CDict>> {
        let mut tables = self.inner.compression.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = tables.get(&level) {
            return Ok(table.0);
        }

        let table = unsafe {
            let params = sys::ZSTD_getCParams(level, 0, self.len());
            sys::ZSTD_createCDict_advanced(
                self.content().as_ptr() as *const c_void,
                self.len(),
                sys::ZSTD_dictLoadMethod_e::ZSTD_dlm_byRef,
                self.content_type(),
                params,
                mem::custom_mem(),
            )
        };
        match ptr::NonNull::new(table) {
            Some(table) => {
                tracing::debug!(id = self.id(), level, "dictionary digested for compression");
                tables.insert(level, CompressionTable(table));
                Ok(table)
            },
            None => Err(Error::Dictionary("Unable to create zstd compression dictionary".to_owned())),
        }
    }

    fn decompression_table(&self) -> Result<ptr::NonNull<sys::ZSTD_DDict>> {
        if let Some(table) = self.inner.decompression.get() {
            return Ok(table.0);
        }

        let table = unsafe {
            sys::ZSTD_createDDict_advanced(
                self.content().as_ptr() as *const c_void,
                self.len(),
                sys::ZSTD_dictLoadMethod_e::ZSTD_dlm_byRef,
                self.content_type(),
                mem::custom_mem(),
            )
        };
        match ptr::NonNull::new(table) {
            Some(table) => {
                tracing::debug!(id = self.id(), "dictionary digested for decompression");
                let table = DecompressionTable(table);
                Ok(self.inner.decompression.get_or_init(move || table).0)
            },
            None => Err(Error::Dictionary("Unable to create zstd decompression dictionary".to_owned())),
        }
    }

    ///Attaches to compression session.
    ///
    ///Session must keep clone of dictionary as long as it is attached.
    pub(crate) fn attach_compressor(&self, ctx: ptr::NonNull<sys::ZSTD_CCtx>, level: i32) -> Result<()> {
        let result = match self.mode {
            AttachMode::Digested => {
                let table = self.compression_table(level)?;
                unsafe {
                    sys::ZSTD_CCtx_refCDict(ctx.as_ptr(), table.as_ptr())
                }
            },
            AttachMode::Undigested => unsafe {
                sys::ZSTD_CCtx_loadDictionary_advanced(
                    ctx.as_ptr(),
                    self.content().as_ptr() as *const c_void,
                    self.len(),
                    sys::ZSTD_dictLoadMethod_e::ZSTD_dlm_byRef,
                    self.content_type(),
                )
            },
            AttachMode::Prefix => unsafe {
                sys::ZSTD_CCtx_refPrefix(ctx.as_ptr(), self.content().as_ptr() as *const c_void, self.len())
            },
        };

        match utils::is_error(result) {
            true => Err(Error::Dictionary(format!("Unable to load zstd dictionary or prefix for compression: {}", utils::error_name(result)))),
            false => Ok(()),
        }
    }

    ///Attaches to decompression session.
    ///
    ///Session must keep clone of dictionary as long as it is attached.
    pub(crate) fn attach_decompressor(&self, ctx: ptr::NonNull<sys::ZSTD_DCtx>) -> Result<()> {
        let result = match self.mode {
            AttachMode::Digested => {
                let table = self.decompression_table()?;
                unsafe {
                    sys::ZSTD_DCtx_refDDict(ctx.as_ptr(), table.as_ptr())
                }
            },
            AttachMode::Undigested => unsafe {
                sys::ZSTD_DCtx_loadDictionary_advanced(
                    ctx.as_ptr(),
                    self.content().as_ptr() as *const c_void,
                    self.len(),
                    sys::ZSTD_dictLoadMethod_e::ZSTD_dlm_byRef,
                    self.content_type(),
                )
            },
            AttachMode::Prefix => unsafe {
                sys::ZSTD_DCtx_refPrefix(ctx.as_ptr(), self.content().as_ptr() as *const c_void, self.len())
            },
        };

        match utils::is_error(result) {
            true => Err(Error::Dictionary(format!("Unable to load zstd dictionary or prefix for decompression: {}", utils::error_name(result)))),
            false => Ok(()),
        }
    }
}

fn concat_samples<T: AsRef<[u8]>>(samples: &[T], target_size: usize) -> Result<(Vec<u8>, Vec<usize>)> {
    if target_size == 0 {
        return Err(Error::invalid_argument("dictionary size must be positive"));
    }

    let total = samples.iter().map(|sample| sample.as_ref().len()).sum::<usize>();
    if total == 0 {
        return Err(Error::invalid_argument("samples must contain at least one non-empty sample"));
    }
    if samples.len() > c_uint::MAX as usize {
        return Err(Error::invalid_argument("too many samples"));
    }

    let mut buffer = Vec::with_capacity(total);
    let mut sizes = Vec::with_capacity(samples.len());
    for sample in samples {
        let sample = sample.as_ref();
        buffer.extend_from_slice(sample);
        sizes.push(sample.len());
    }

    Ok((buffer, sizes))
}

impl PartialEq for Dictionary {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode && (Arc::ptr_eq(&self.inner, &other.inner) || self.content() == other.content())
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Dictionary").field("id", &self.id()).field("size", &self.len()).field("mode", &self.mode).finish()
    }
}

impl fmt::Display for Dictionary {
    #[inline]
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "<Dictionary id={} size={}>", self.id(), self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_short_content() {
        let error = Dictionary::new(&b"abc"[..], true, AttachMode::Prefix).unwrap_err();
        assert!(matches!(error, Error::InvalidDictionary(_)));
    }

    #[test]
    fn should_reject_content_without_magic() {
        let error = Dictionary::new(vec![b'x'; 64], false, AttachMode::Digested).unwrap_err();
        assert!(matches!(error, Error::InvalidDictionary(_)));

        let dict = Dictionary::new(vec![b'x'; 64], true, AttachMode::Digested).expect("raw content");
        assert_eq!(dict.id(), 0);
        assert!(dict.is_raw());
    }

    #[test]
    fn should_share_content_between_views() {
        let dict = Dictionary::new(vec![b'y'; 32], true, AttachMode::Digested).expect("raw content");
        let prefix = dict.as_prefix();
        let undigested = prefix.as_undigested();

        assert_eq!(prefix.mode(), AttachMode::Prefix);
        assert_eq!(undigested.mode(), AttachMode::Undigested);
        assert_eq!(prefix.content().as_ptr(), dict.content().as_ptr());
        assert_eq!(undigested.content().as_ptr(), dict.content().as_ptr());
        assert_eq!(undigested.as_digested(), dict);
        assert_ne!(prefix, dict);
        assert_eq!(dict.to_string(), "<Dictionary id=0 size=32>");
    }

    #[test]
    fn should_validate_training_arguments() {
        let samples: [&[u8]; 0] = [];
        assert!(matches!(Dictionary::train(&samples, 1024).unwrap_err(), Error::InvalidArgument(_)));
        assert!(matches!(Dictionary::train(&[b"", b""], 1024).unwrap_err(), Error::InvalidArgument(_)));
        assert!(matches!(Dictionary::train(&[b"data"], 0).unwrap_err(), Error::InvalidArgument(_)));
    }

    #[test]
    fn should_be_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dictionary>();
    }
}
