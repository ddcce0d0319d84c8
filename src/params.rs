//! Tuning parameters
//!
//!For meaning of each knob refer to `http://facebook.github.io/zstd/zstd_manual.html#Chapter5`

use zstd_sys as sys;

use core::ffi::c_int;
use core::fmt;
use core::ops::RangeInclusive;
use core::ptr;

use crate::error::{Error, Result};
use crate::utils;

macro_rules! parameters {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:literal => $text:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(i32)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant = $value,
            )+
        }

        impl $name {
            ///All known parameters
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            #[inline(always)]
            ///Returns zstd's name of parameter
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            #[inline]
            ///Looks up parameter by raw zstd key
            pub fn from_raw(key: i32) -> Option<Self> {
                match key {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            #[inline(always)]
            fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt.write_str(self.name())
            }
        }
    };
}

parameters! {
    ///Compression parameters
    pub enum CompressionParameter {
        ///Compression level, negative values are fast levels.
        CompressionLevel = 100 => "compressionLevel",
        ///Maximum back-reference distance as power of 2.
        WindowLog = 101 => "windowLog",
        ///Size of initial probe table as power of 2.
        HashLog = 102 => "hashLog",
        ///Size of multi-probe search table as power of 2.
        ChainLog = 103 => "chainLog",
        ///Number of search attempts as power of 2.
        SearchLog = 104 => "searchLog",
        ///Minimum size of searched matches.
        MinMatch = 105 => "minMatch",
        ///Strategy dependent match length target.
        TargetLength = 106 => "targetLength",
        ///See [Strategy].
        Strategy = 107 => "strategy",
        ///Long distance matching toggle.
        EnableLongDistanceMatching = 160 => "enableLongDistanceMatching",
        ///Long distance matching table size as power of 2.
        LdmHashLog = 161 => "ldmHashLog",
        ///Long distance matching minimum match size.
        LdmMinMatch = 162 => "ldmMinMatch",
        ///Long distance matching bucket size as power of 2.
        LdmBucketSizeLog = 163 => "ldmBucketSizeLog",
        ///Frequency of inserting entries into long distance matching table.
        LdmHashRateLog = 164 => "ldmHashRateLog",
        ///Write content size into frame header when known.
        ContentSizeFlag = 200 => "contentSizeFlag",
        ///Write 32-bit checksum of content at the end of frame.
        ChecksumFlag = 201 => "checksumFlag",
        ///Write dictionary id into frame header.
        DictIdFlag = 202 => "dictIDFlag",
        ///Number of worker threads, requires `zstdmt` feature.
        NbWorkers = 400 => "nbWorkers",
        ///Size of compression job when using workers.
        JobSize = 401 => "jobSize",
        ///Overlap between jobs as fraction of window.
        OverlapLog = 402 => "overlapLog",
    }
}

parameters! {
    ///Decompression parameters
    pub enum DecompressionParameter {
        ///Refuse frames requiring window above this power of 2.
        WindowLogMax = 100 => "windowLogMax",
    }
}

impl CompressionParameter {
    ///Returns range of valid values for this parameter in linked zstd library.
    pub fn bounds(self) -> Result<RangeInclusive<i32>> {
        let bounds = unsafe {
            utils::ZSTD_cParam_getBounds(self as c_int)
        };
        match utils::is_error(bounds.error) {
            true => Err(Error::Configuration(format!("Unable to get zstd compression parameter bounds: {}", utils::error_name(bounds.error)))),
            false => Ok(bounds.lower_bound..=bounds.upper_bound),
        }
    }
}

impl DecompressionParameter {
    ///Returns range of valid values for this parameter in linked zstd library.
    pub fn bounds(self) -> Result<RangeInclusive<i32>> {
        let bounds = unsafe {
            utils::ZSTD_dParam_getBounds(self as c_int)
        };
        match utils::is_error(bounds.error) {
            true => Err(Error::Configuration(format!("Unable to get zstd decompression parameter bounds: {}", utils::error_name(bounds.error)))),
            false => Ok(bounds.lower_bound..=bounds.upper_bound),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(i32)]
///Possible enumeration of strategies from fastest to slowest
pub enum Strategy {
    ///As name implies
    Default = 0,
    ///ZSTD_fast
    Fast = 1,
    ///ZSTD_dfast
    DFast = 2,
    ///ZSTD_greedy
    Greedy = 3,
    ///ZSTD_lazy
    Lazy = 4,
    ///ZSTD_lazy2
    Lazy2 = 5,
    ///ZSTD_btlazy2
    BtLazy2 = 6,
    ///ZSTD_btopt
    BtOpt = 7,
    ///ZSTD_btultra
    BtUltra = 8,
    ///ZSTD_btultra2
    BtUltra2 = 9,
}

fn parameter_error(kind: &str, name: Option<&'static str>, key: c_int, value: c_int, bounds: utils::Bounds) -> Error {
    let unknown;
    let name = match name {
        Some(name) => name,
        None => {
            unknown = format!("unknown parameter (key {key})");
            unknown.as_str()
        }
    };

    let version = utils::version_string();
    if utils::is_error(bounds.error) {
        Error::Configuration(format!("zstd {kind} parameter \"{name}\" is invalid (zstd v{version})"))
    } else {
        Error::Configuration(format!(
            "error when setting zstd {kind} parameter \"{name}\", it should be {} <= value <= {}, provided value is {value} (zstd v{version}, {}-bit build)",
            bounds.lower_bound,
            bounds.upper_bound,
            usize::BITS,
        ))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
///Compression options.
///
///Ordered map of parameter to value, applied in insertion order.
///
///```rust
///use zframe::{CompressionOptions, CompressionParameter, Strategy};
///
///let options = CompressionOptions::new().level(10).strategy(Strategy::Lazy).checksum(true);
///assert_eq!(options.get(CompressionParameter::CompressionLevel), Some(10));
///```
pub struct CompressionOptions {
    entries: Vec<(c_int, c_int)>,
}

impl CompressionOptions {
    #[inline(always)]
    ///Creates new empty value
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    ///Sets `param` to `value`, replacing previous value.
    pub fn set(self, param: CompressionParameter, value: i32) -> Self {
        self.set_raw(param as i32, value)
    }

    ///Sets raw zstd parameter `key`.
    ///
    ///Unknown keys are reported when options are applied.
    pub fn set_raw(mut self, key: i32, value: i32) -> Self {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    #[inline]
    ///Returns value of `param` if set
    pub fn get(&self, param: CompressionParameter) -> Option<i32> {
        self.entries.iter().find(|(key, _)| *key == param as i32).map(|(_, value)| *value)
    }

    #[inline(always)]
    ///Returns whether nothing is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    ///Sets level
    pub fn level(self, level: i32) -> Self {
        self.set(CompressionParameter::CompressionLevel, level)
    }

    #[inline]
    ///Sets strategy
    pub fn strategy(self, strategy: Strategy) -> Self {
        self.set(CompressionParameter::Strategy, strategy as i32)
    }

    #[inline]
    ///Sets window_log
    pub fn window_log(self, window_log: i32) -> Self {
        self.set(CompressionParameter::WindowLog, window_log)
    }

    #[inline]
    ///Sets whether to write checksum
    pub fn checksum(self, enabled: bool) -> Self {
        self.set(CompressionParameter::ChecksumFlag, enabled as i32)
    }

    #[inline]
    ///Sets whether to write content size
    pub fn content_size(self, enabled: bool) -> Self {
        self.set(CompressionParameter::ContentSizeFlag, enabled as i32)
    }

    #[inline]
    ///Sets whether to write dictionary id
    pub fn dictionary_id(self, enabled: bool) -> Self {
        self.set(CompressionParameter::DictIdFlag, enabled as i32)
    }

    #[inline]
    ///Sets number of worker threads
    pub fn workers(self, workers: i32) -> Self {
        self.set(CompressionParameter::NbWorkers, workers)
    }

    pub(crate) fn apply(&self, ctx: ptr::NonNull<sys::ZSTD_CCtx>) -> Result<()> {
        for &(key, value) in self.entries.iter() {
            let result = unsafe {
                utils::ZSTD_CCtx_setParameter(ctx.as_ptr(), key, value)
            };
            if utils::is_error(result) {
                let bounds = unsafe {
                    utils::ZSTD_cParam_getBounds(key)
                };
                let name = CompressionParameter::from_raw(key).map(CompressionParameter::name);
                return Err(parameter_error("compression", name, key, value, bounds));
            }
            tracing::trace!(key, value, "compression parameter set");
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
///Decompression options.
pub struct DecompressionOptions {
    entries: Vec<(c_int, c_int)>,
}

impl DecompressionOptions {
    #[inline(always)]
    ///Creates new empty value
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    ///Sets `param` to `value`, replacing previous value.
    pub fn set(self, param: DecompressionParameter, value: i32) -> Self {
        self.set_raw(param as i32, value)
    }

    ///Sets raw zstd parameter `key`.
    pub fn set_raw(mut self, key: i32, value: i32) -> Self {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    #[inline]
    ///Sets window_log_max
    ///
    ///This acts as cap on window_log, refusing to decompress anything above it.
    ///Normally, default value is all you need.
    pub fn window_log_max(self, window_log: i32) -> Self {
        self.set(DecompressionParameter::WindowLogMax, window_log)
    }

    pub(crate) fn apply(&self, ctx: ptr::NonNull<sys::ZSTD_DCtx>) -> Result<()> {
        for &(key, value) in self.entries.iter() {
            let result = unsafe {
                utils::ZSTD_DCtx_setParameter(ctx.as_ptr(), key, value)
            };
            if utils::is_error(result) {
                let bounds = unsafe {
                    utils::ZSTD_dParam_getBounds(key)
                };
                let name = DecompressionParameter::from_raw(key).map(DecompressionParameter::name);
                return Err(parameter_error("decompression", name, key, value, bounds));
            }
        }

        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
///Range of compression levels supported by linked library
pub struct CompressionLevels {
    ///Level used when none is specified
    pub default: i32,
    ///Fastest level
    pub min: i32,
    ///Strongest level
    pub max: i32,
}

impl CompressionLevels {
    #[inline(always)]
    ///Returns whether `level` is within range
    pub const fn contains(&self, level: i32) -> bool {
        level >= self.min && level <= self.max
    }

    #[inline(always)]
    ///Clamps `level` into range
    pub fn clamp(&self, level: i32) -> i32 {
        level.clamp(self.min, self.max)
    }
}

#[inline]
///Returns compression level range of linked zstd library
pub fn compression_levels() -> CompressionLevels {
    unsafe {
        CompressionLevels {
            default: sys::ZSTD_defaultCLevel(),
            min: sys::ZSTD_minCLevel(),
            max: sys::ZSTD_maxCLevel(),
        }
    }
}

#[inline]
///Returns version of linked zstd library as `major.minor.patch`
pub fn version() -> &'static str {
    utils::version_string()
}

#[inline]
///Returns version of linked zstd library as `major * 10000 + minor * 100 + patch`
pub fn version_number() -> u32 {
    unsafe {
        sys::ZSTD_versionNumber() as u32
    }
}

#[inline]
///Returns whether linked zstd library can spawn compression workers
pub fn supports_multithread() -> bool {
    match CompressionParameter::NbWorkers.bounds() {
        Ok(range) => *range.start() != 0 || *range.end() != 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_level_range() {
        let levels = compression_levels();
        assert!(levels.min < levels.max);
        assert!(levels.contains(levels.default));
        assert_eq!(levels.clamp(levels.max + 10), levels.max);
        assert_eq!(levels.clamp(levels.min - 10), levels.min);
    }

    #[test]
    fn should_report_bounds() {
        for param in CompressionParameter::ALL {
            let range = param.bounds().expect("to get bounds");
            assert!(range.start() <= range.end(), "{param}");
        }
        let range = DecompressionParameter::WindowLogMax.bounds().expect("to get bounds");
        assert!(*range.start() >= 10);
    }

    #[test]
    fn should_replace_existing_value() {
        let options = CompressionOptions::new().level(3).window_log(20).level(7);
        assert_eq!(options.get(CompressionParameter::CompressionLevel), Some(7));
        assert_eq!(options.get(CompressionParameter::WindowLog), Some(20));
        assert_eq!(options.get(CompressionParameter::HashLog), None);
        assert_eq!(options.entries.len(), 2);
    }

    #[test]
    fn should_map_raw_keys() {
        assert_eq!(CompressionParameter::from_raw(107), Some(CompressionParameter::Strategy));
        assert_eq!(CompressionParameter::from_raw(1), None);
        assert_eq!(DecompressionParameter::from_raw(100), Some(DecompressionParameter::WindowLogMax));
        assert_eq!(CompressionParameter::DictIdFlag.to_string(), "dictIDFlag");
    }

    #[test]
    fn should_have_version() {
        assert!(version_number() >= 10400);
        assert_eq!(version().split('.').count(), 3);
    }
}
