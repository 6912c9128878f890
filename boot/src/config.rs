/// Fixed layout constants for stage 1.
///
/// These describe the binary contract with whoever builds the boot image:
/// the stage-2 payload is linked to run at `RELOCATION_OFFSET + start`,
/// and its sentinels must sit within the first `SCAN_BOUND` bytes.
use static_assertions::const_assert;

use crate::stage::StageMode;

/// Destination base for the payload copy. Flat copy, no fix-ups.
pub const RELOCATION_OFFSET: u32 = 0x1_0000;

/// Last offset the sentinel scan tests before giving up.
pub const SCAN_BOUND: u32 = 0xFFFF;

/// Physical base of colour text-mode memory.
pub const TEXT_MODE_BASE: usize = 0xB8000;

/// Bytes per character cell (character + attribute).
pub const CELL_STRIDE: usize = 2;

/// Enough for `u32::MAX` (10 digits) plus slack and the terminator.
pub const DECIMAL_BUF_LEN: usize = 12;

// Scan window ends below the copy destination.
const_assert!(RELOCATION_OFFSET > SCAN_BOUND);
const_assert!(DECIMAL_BUF_LEN >= 11 + 1);
const_assert!(CELL_STRIDE == 2);

/// Mode used by the stage1 binary.
#[cfg(feature = "strict-scan")]
pub const DEFAULT_MODE: StageMode = StageMode::Strict;
#[cfg(not(feature = "strict-scan"))]
pub const DEFAULT_MODE: StageMode = StageMode::Faithful;
