/// Relocator — copies the payload up by `RELOCATION_OFFSET`.
///
/// This is a flat byte copy, not a fix-up pass. The payload must already
/// be linked for `RELOCATION_OFFSET + start`.
use core::fmt;

use crate::boot_log;
use crate::config::RELOCATION_OFFSET;
use crate::memory::ImageMemory;

/// One payload copy, worked out before any byte moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelocationPlan {
    pub src: u32,
    pub dest: u32,
    pub len: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelocError {
    /// `end < start`; the size would wrap.
    Inverted { start: u32, end: u32 },
    /// Source and destination ranges intersect.
    Overlap { len: u32 },
}

impl RelocError {
    /// Short on-screen token.
    pub fn token(&self) -> &'static [u8] {
        match self {
            RelocError::Inverted { .. } => b"Bad",
            RelocError::Overlap { .. } => b"Ovl",
        }
    }
}

impl fmt::Display for RelocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelocError::Inverted { start, end } => {
                write!(f, "relocation bounds inverted: start={} end={}", start, end)
            }
            RelocError::Overlap { len } => {
                write!(f, "relocation of {} bytes overlaps its own source", len)
            }
        }
    }
}

impl RelocationPlan {
    /// Plan the copy of `[start, end)` to `RELOCATION_OFFSET + start`.
    ///
    /// Size and destination use wrapping arithmetic, exactly as the boot
    /// path always has: inverted bounds produce a near-4 GiB length.
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            src: start,
            dest: RELOCATION_OFFSET.wrapping_add(start),
            len: end.wrapping_sub(start),
        }
    }

    /// [`RelocationPlan::new`], refusing inverted bounds and overlapping
    /// ranges.
    pub fn checked(start: u32, end: u32) -> Result<Self, RelocError> {
        if end < start {
            return Err(RelocError::Inverted { start, end });
        }
        let plan = Self::new(start, end);
        if plan.overlaps() {
            return Err(RelocError::Overlap { len: plan.len });
        }
        Ok(plan)
    }

    /// Whether `[src, src+len)` and `[dest, dest+len)` intersect.
    pub fn overlaps(&self) -> bool {
        let (src, dest, len) = (self.src as u64, self.dest as u64, self.len as u64);
        len != 0 && src < dest + len && dest < src + len
    }

    /// Address `addr` (inside the source range) after the copy.
    pub fn relocated(&self, addr: u32) -> u32 {
        addr.wrapping_add(RELOCATION_OFFSET)
    }

    /// Whether `addr` lies in the copied destination range.
    pub fn dest_contains(&self, addr: u32) -> bool {
        let (dest, addr) = (self.dest as u64, addr as u64);
        addr >= dest && addr < dest + self.len as u64
    }

    /// Perform the copy.
    pub fn apply<M: ImageMemory + ?Sized>(&self, mem: &mut M) {
        boot_log!("[reloc] {:#x} -> {:#x} ({} bytes)", self.src, self.dest, self.len);
        mem.copy(self.dest, self.src, self.len);
    }
}
