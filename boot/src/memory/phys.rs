/// Physical-memory implementation of [`ImageMemory`].
use core::sync::atomic::{AtomicBool, Ordering};

use super::ImageMemory;
use crate::rt;

/// Set once the capability has been handed out.
static TAKEN: AtomicBool = AtomicBool::new(false);

/// Capability to read and write the identity-mapped physical image.
///
/// There is at most one per boot.
pub struct PhysImage {
    _private: (),
}

impl PhysImage {
    /// Take the raw-access capability. Returns `None` if it was already
    /// taken.
    ///
    /// # Safety
    /// Paging must be off (or identity-mapped) and nothing else may be
    /// touching the image. Any range later passed to [`ImageMemory::copy`]
    /// must not cover the running code, the stack or display memory; that
    /// is the image producer's layout guarantee and is not re-checked.
    pub unsafe fn take() -> Option<Self> {
        if TAKEN.swap(true, Ordering::Relaxed) {
            return None;
        }
        Some(Self { _private: () })
    }
}

impl ImageMemory for PhysImage {
    fn read_byte(&self, addr: u32) -> u8 {
        // Plain loads from address 0 are undefined in Rust, and the scan
        // starts there, so go through asm.
        let val: u8;
        unsafe {
            core::arch::asm!(
                "mov {val}, byte ptr [{addr}]",
                addr = in(reg) addr as usize,
                val = out(reg_byte) val,
                options(nostack, readonly, preserves_flags),
            );
        }
        val
    }

    fn copy(&mut self, dest: u32, src: u32, len: u32) {
        // src is only 0 when the start sentinel was never seen.
        unsafe { rt::copy(dest as usize as *mut u8, src as usize as *const u8, len) }
    }
}
