/// Handoff trampoline — leaving stage 1.
///
/// Two jumps happen here. First a self-test: a small stub that was copied
/// along with the payload is called at its relocated address, proving
/// that code at `link + RELOCATION_OFFSET` executes. Then stage 2 is
/// entered with the relocation offset as its only argument; it is not
/// expected to come back.
///
/// The stub is only correct if it is position independent and really was
/// inside the copied range. [`verify_landing`] checks the second part.
use core::fmt;

use crate::memory::ImageMemory;
use crate::reloc::RelocationPlan;

/// Bytes compared between a stub's link and relocated copies.
pub const STUB_PROBE_LEN: u32 = 16;

/// Position-independent entry stub: code that must work unmodified at
/// its link address and at that address plus the relocation offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryStub {
    link_addr: u32,
}

impl EntryStub {
    pub const fn at(link_addr: u32) -> Self {
        Self { link_addr }
    }

    pub fn link_addr(&self) -> u32 {
        self.link_addr
    }

    /// Where the stub lives after relocation by `offset`.
    pub fn relocated(&self, offset: u32) -> u32 {
        self.link_addr.wrapping_add(offset)
    }
}

/// The two control transfers stage 1 makes.
pub trait ControlTransfer {
    /// Call zero-argument code at `addr` and return.
    ///
    /// # Safety
    /// `addr` must hold code valid to run at that address.
    unsafe fn call_stub(&mut self, addr: u32);

    /// Enter stage 2 with `offset`. Returns only if stage 2 does.
    ///
    /// # Safety
    /// Stage 2 must have been relocated by `offset`.
    unsafe fn enter_stage2(&mut self, offset: u32);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandoffError {
    /// Relocated stub address is outside the copied range, so whatever
    /// runs there was never placed by this stage.
    StubOutsidePayload { addr: u32 },
    /// Relocated bytes differ from the stub's original bytes.
    StubMismatch { addr: u32 },
}

impl HandoffError {
    /// Short on-screen token.
    pub fn token(&self) -> &'static [u8] {
        b"Jmp"
    }
}

impl fmt::Display for HandoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffError::StubOutsidePayload { addr } => {
                write!(f, "self-test target {:#x} outside relocated payload", addr)
            }
            HandoffError::StubMismatch { addr } => {
                write!(f, "self-test target {:#x} does not match the stub", addr)
            }
        }
    }
}

/// Check that the relocated stub address holds a copy of the stub.
/// Returns the address to jump to.
pub fn verify_landing<M: ImageMemory + ?Sized>(
    mem: &M,
    plan: &RelocationPlan,
    stub: EntryStub,
) -> Result<u32, HandoffError> {
    let target = plan.relocated(stub.link_addr());
    if !plan.dest_contains(target) {
        return Err(HandoffError::StubOutsidePayload { addr: target });
    }

    // Only the part of the probe that was copied.
    let copied = plan.dest.wrapping_add(plan.len).wrapping_sub(target);
    let probe = STUB_PROBE_LEN.min(copied);
    for i in 0..probe {
        if mem.read_byte(target.wrapping_add(i)) != mem.read_byte(stub.link_addr().wrapping_add(i)) {
            return Err(HandoffError::StubMismatch { addr: target });
        }
    }
    Ok(target)
}

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), not(test)))]
pub use hw::{self_test_stub, DirectJump};

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), not(test)))]
mod hw {
    use super::ControlTransfer;
    use crate::config::TEXT_MODE_BASE;

    extern "C" {
        /// Stage-2 entry point, resolved when the boot image is linked.
        fn stage2_entry(offset: u32);
    }

    /// Self-test stub. Puts `'q'` in display cell 0, which the diagnostic
    /// cursor never writes. Touches only an absolute address, so it runs
    /// the same from either copy.
    #[inline(never)]
    pub extern "C" fn self_test_stub() {
        unsafe { (TEXT_MODE_BASE as *mut u8).write_volatile(b'q') };
    }

    /// Real jumps through function pointers.
    pub struct DirectJump {
        _private: (),
    }

    impl DirectJump {
        /// # Safety
        /// Every address later passed to [`ControlTransfer::call_stub`]
        /// will be executed as code.
        pub unsafe fn new() -> Self {
            Self { _private: () }
        }
    }

    impl ControlTransfer for DirectJump {
        unsafe fn call_stub(&mut self, addr: u32) {
            let stub: extern "C" fn() = core::mem::transmute(addr as usize);
            stub();
        }

        unsafe fn enter_stage2(&mut self, offset: u32) {
            stage2_entry(offset);
        }
    }
}
