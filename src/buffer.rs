use zstd_sys as sys;

use core::ffi::c_void;

const MIN_GROWTH: usize = 32 * 1024;
const MAX_GROWTH: usize = 4 * 1024 * 1024;

///Output window over spare capacity of `Vec`
///
///Grows storage on demand, never letting number of written bytes exceed `limit`.
pub(crate) struct OutputBuffer<'a> {
    data: &'a mut Vec<u8>,
    start: usize,
    limit: usize,
}

impl<'a> OutputBuffer<'a> {
    #[inline]
    ///Creates output appending to `data`, capped to `limit` new bytes.
    pub fn new(data: &'a mut Vec<u8>, limit: Option<usize>) -> Self {
        Self {
            start: data.len(),
            data,
            limit: limit.unwrap_or(usize::MAX),
        }
    }

    #[inline(always)]
    ///Returns number of bytes written so far
    pub fn written(&self) -> usize {
        self.data.len() - self.start
    }

    #[inline(always)]
    ///Returns whether limit is reached
    pub fn is_full(&self) -> bool {
        self.written() >= self.limit
    }

    #[inline(always)]
    fn remaining(&self) -> usize {
        self.limit - self.written()
    }

    #[inline]
    ///Reserves up front when size of output can be estimated
    pub fn reserve(&mut self, size: usize) {
        let size = size.min(self.remaining());
        //Estimate only, storage grows on demand anyway
        let _ = self.data.try_reserve(size);
    }

    ///Returns zstd output over spare capacity, growing storage when it is exhausted.
    ///
    ///Size is `0` only when limit is reached.
    pub fn spare(&mut self) -> sys::ZSTD_outBuffer_s {
        let remaining = self.remaining();
        if remaining > 0 && self.data.capacity() == self.data.len() {
            let growth = self.written().clamp(MIN_GROWTH, MAX_GROWTH).min(remaining);
            self.data.reserve(growth);
        }

        let spare = self.data.spare_capacity_mut();
        sys::ZSTD_outBuffer_s {
            dst: spare.as_mut_ptr() as *mut c_void,
            size: spare.len().min(remaining),
            pos: 0,
        }
    }

    #[inline(always)]
    ///Marks bytes written by zstd into `output` as initialized.
    ///
    ///`output` must be last value returned by `spare`
    pub fn commit(&mut self, output: &sys::ZSTD_outBuffer_s) {
        debug_assert!(output.pos <= output.size);
        debug_assert!(self.data.len() + output.pos <= self.data.capacity());
        unsafe {
            self.data.set_len(self.data.len() + output.pos);
        }
    }
}
