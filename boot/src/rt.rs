/// Primitive runtime — the handful of byte routines stage 1 needs.
///
/// There is no libc underneath us. The raw-pointer forms mirror what the
/// scan and relocation paths actually do on hardware; the slice forms are
/// what the display writer and the tests use.
use crate::config::DECIMAL_BUF_LEN;

/// Copy `n` bytes from `src` to `dest`, lowest address first.
///
/// # Safety
/// Both ranges must be valid for `n` bytes. Overlapping ranges give
/// unspecified contents in the overlap.
pub unsafe fn copy(dest: *mut u8, src: *const u8, n: u32) {
    for i in 0..n as usize {
        dest.add(i).write_volatile(src.add(i).read_volatile());
    }
}

/// Set `n` bytes at `dst` to `val`.
///
/// # Safety
/// `dst` must be valid for `n` bytes.
pub unsafe fn fill(dst: *mut u8, val: u8, n: usize) {
    for i in 0..n {
        dst.add(i).write_volatile(val);
    }
}

/// Number of bytes before the first NUL.
///
/// # Safety
/// `s` must point at a NUL-terminated string. There is no upper bound.
pub unsafe fn length(s: *const u8) -> usize {
    let mut len = 0;
    while *s.add(len) != 0 {
        len += 1;
    }
    len
}

/// Bounded `length`: stops at the first NUL or the end of `buf`.
pub fn terminated_len(buf: &[u8]) -> usize {
    buf.iter().position(|&b| b == 0).unwrap_or(buf.len())
}

fn digit_count(mut num: u32) -> usize {
    if num == 0 {
        return 1;
    }
    let mut count = 0;
    while num > 0 {
        count += 1;
        num /= 10;
    }
    count
}

/// Render `num` as unsigned decimal ASCII followed by a NUL.
/// Returns the number of digits written.
///
/// # Safety
/// `out` must be valid for `DECIMAL_BUF_LEN` bytes.
pub unsafe fn render_decimal(num: u32, out: *mut u8) -> usize {
    let buf = core::slice::from_raw_parts_mut(out, DECIMAL_BUF_LEN);
    render_decimal_into(num, buf)
}

/// Slice form of [`render_decimal`]. `out` must hold the digits plus the
/// terminator; `DECIMAL_BUF_LEN` always does.
pub fn render_decimal_into(mut num: u32, out: &mut [u8]) -> usize {
    let digits = digit_count(num);
    let mut index = digits;
    loop {
        index -= 1;
        out[index] = b'0' + (num % 10) as u8;
        num /= 10;
        if index == 0 {
            break;
        }
    }
    out[digits] = 0;
    digits
}

/// Fixed buffer for one rendered `u32`.
pub struct DecimalBuf {
    bytes: [u8; DECIMAL_BUF_LEN],
    len: usize,
}

impl DecimalBuf {
    pub fn new(num: u32) -> Self {
        let mut bytes = [0u8; DECIMAL_BUF_LEN];
        let len = render_decimal_into(num, &mut bytes);
        Self { bytes, len }
    }

    /// The digits, without the terminator.
    pub fn digits(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}
