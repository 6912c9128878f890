/// Sentinel scanner — finds the stage-2 payload inside the loaded image.
///
/// The payload carries no length header. It is framed by two 2-byte
/// markers, each accepted in either byte order:
///
///   start: 21 73 (or 73 21)   first two bytes of the payload
///   end:   BE EF (or EF BE)   last two bytes of the payload
///
/// [`scan`] is the boot-path scan and keeps the historical quirks: a later
/// start marker replaces an earlier one, an end marker with no start
/// before it yields start 0, and running out of window leaves whatever
/// was last recorded. [`ScanFlags`] notes each of these without changing
/// the result. [`scan_strict`] turns them into errors.
use bitflags::bitflags;
use core::fmt;

use crate::boot_log;
use crate::config::SCAN_BOUND;
use crate::memory::ImageMemory;


/// A 2-byte boundary marker, matched in either byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sentinel([u8; 2]);

impl Sentinel {
    pub const fn new(first: u8, second: u8) -> Self {
        Self([first, second])
    }

    pub const fn bytes(self) -> [u8; 2] {
        self.0
    }

    /// The same marker with its bytes swapped.
    pub const fn swapped(self) -> [u8; 2] {
        [self.0[1], self.0[0]]
    }

    #[inline]
    pub fn matches(self, lo: u8, hi: u8) -> bool {
        [lo, hi] == self.0 || [lo, hi] == self.swapped()
    }
}

pub const START_SENTINEL: Sentinel = Sentinel::new(0x21, 0x73);
pub const END_SENTINEL: Sentinel = Sentinel::new(0xBE, 0xEF);

/// Shown on screen when the window is exhausted without an end marker.
pub const BOUND_TOKEN: &[u8] = b"Poop";

bitflags! {
    /// What the scan observed. Informational only.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ScanFlags: u8 {
        const START_SEEN = 1 << 0;
        const END_SEEN   = 1 << 1;
        /// Window exhausted; `end` was never set by a match.
        const BOUND_HIT  = 1 << 2;
        /// End marker found with no start marker before it.
        const NO_START   = 1 << 3;
        /// `end < start`; the size computation will wrap.
        const INVERTED   = 1 << 4;
    }
}

/// Result of one scan: offsets relative to the image base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanReport {
    pub start: u32,
    pub end: u32,
    pub flags: ScanFlags,
}

impl ScanReport {
    pub fn bounds(&self) -> (u32, u32) {
        (self.start, self.end)
    }

    pub fn bound_hit(&self) -> bool {
        self.flags.contains(ScanFlags::BOUND_HIT)
    }

    /// Check the report against the image contract.
    pub fn validate(&self) -> Result<Payload, ScanError> {
        if self.bound_hit() {
            return Err(ScanError::BoundExceeded);
        }
        if self.flags.contains(ScanFlags::NO_START) {
            return Err(ScanError::MissingStart);
        }
        if self.end <= self.start {
            return Err(ScanError::EmptyPayload { start: self.start, end: self.end });
        }
        Ok(Payload { start: self.start, end: self.end })
    }
}

/// Validated payload range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payload {
    pub start: u32,
    pub end: u32,
}

impl Payload {
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanError {
    /// No end marker at offsets `0..=SCAN_BOUND`.
    BoundExceeded,
    /// End marker found but no start marker before it.
    MissingStart,
    /// End marker does not follow the start marker.
    EmptyPayload { start: u32, end: u32 },
}

impl ScanError {
    /// Short on-screen token.
    pub fn token(&self) -> &'static [u8] {
        match self {
            ScanError::BoundExceeded => BOUND_TOKEN,
            ScanError::MissingStart => b"NoS",
            ScanError::EmptyPayload { .. } => b"Bad",
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::BoundExceeded => {
                write!(f, "no end sentinel within {:#x} bytes", SCAN_BOUND)
            }
            ScanError::MissingStart => write!(f, "end sentinel without start sentinel"),
            ScanError::EmptyPayload { start, end } => {
                write!(f, "payload bounds inverted or empty: start={} end={}", start, end)
            }
        }
    }
}

/// Scan the image from offset 0 for the payload markers.
///
/// Every offset `0..=SCAN_BOUND` is tested, start marker first, then end
/// marker, then the bound. The pair read at the last offset reaches one
/// byte past `SCAN_BOUND`.
pub fn scan<M: ImageMemory + ?Sized>(mem: &M) -> ScanReport {
    let mut start = 0u32;
    let mut end = 0u32;
    let mut flags = ScanFlags::empty();

    let mut i = 0u32;
    loop {
        let lo = mem.read_byte(i);
        let hi = mem.read_byte(i + 1);

        if START_SENTINEL.matches(lo, hi) {
            start = i;
            flags |= ScanFlags::START_SEEN;
        }
        if END_SENTINEL.matches(lo, hi) {
            end = i;
            flags |= ScanFlags::END_SEEN;
            break;
        }
        if i >= SCAN_BOUND {
            flags |= ScanFlags::BOUND_HIT;
            break;
        }
        i += 1;
    }

    if flags.contains(ScanFlags::END_SEEN) && !flags.contains(ScanFlags::START_SEEN) {
        flags |= ScanFlags::NO_START;
    }
    if end < start {
        flags |= ScanFlags::INVERTED;
    }

    boot_log!("[scan] start={} end={} flags={:?}", start, end, flags);
    ScanReport { start, end, flags }
}

/// [`scan`], rejecting anything that is not a well-formed payload.
pub fn scan_strict<M: ImageMemory + ?Sized>(mem: &M) -> Result<Payload, ScanError> {
    scan(mem).validate()
}
