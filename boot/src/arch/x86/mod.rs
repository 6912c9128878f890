/// x86 support used by stage 1.
///
/// - Port I/O for the COM1 log console
/// - `hlt`-based idle once control comes back from stage 2
pub mod serial;

/// Park the CPU forever. Interrupts are masked first so `hlt` cannot be
/// woken into code that no longer exists after the handoff.
pub fn halt_forever() -> ! {
    unsafe { core::arch::asm!("cli", options(nostack, nomem)); }
    loop {
        unsafe { core::arch::asm!("hlt", options(nostack, nomem)); }
    }
}

/// Write a byte to an I/O port.
#[inline(always)]
pub fn outb(port: u16, val: u8) {
    unsafe {
        core::arch::asm!(
            "out dx, al",
            in("dx") port,
            in("al") val,
            options(nostack, preserves_flags),
        );
    }
}

/// Read a byte from an I/O port.
#[inline(always)]
pub fn inb(port: u16) -> u8 {
    let val: u8;
    unsafe {
        core::arch::asm!(
            "in al, dx",
            in("dx") port,
            out("al") val,
            options(nostack, preserves_flags),
        );
    }
    val
}
