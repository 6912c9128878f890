//! HeavenOS stage 1 — bare-metal entry.
//!
//! The loader jumps to `stage_main` in 32-bit protected mode with paging
//! off and a stack set up, passing one 32-bit value that is only shown on
//! screen. From here we find stage 2, copy it up and call it.
#![no_std]
#![no_main]

use core::panic::PanicInfo;

use heavenos_boot::arch::x86;
use heavenos_boot::config::DEFAULT_MODE;
use heavenos_boot::display::{DiagnosticSink, TextModeDisplay};
use heavenos_boot::handoff::{self, DirectJump, EntryStub};
use heavenos_boot::memory::PhysImage;
use heavenos_boot::{serial_println, Stage};

#[no_mangle]
pub extern "C" fn stage_main(entry_arg: u32) -> ! {
    #[cfg(feature = "serial-log")]
    x86::serial::SERIAL.lock().init();
    serial_println!("[boot] stage 1 entered, mode {:?}", DEFAULT_MODE);

    let mut display = unsafe { TextModeDisplay::vga() };
    let Some(mut image) = (unsafe { PhysImage::take() }) else {
        display.write_text(b"Img");
        x86::halt_forever();
    };
    let mut jumps = unsafe { DirectJump::new() };
    let stub = EntryStub::at(handoff::self_test_stub as usize as u32);

    let report = Stage::new(&mut image, &mut display, &mut jumps, stub, DEFAULT_MODE).run(entry_arg);

    match report.error {
        Some(e) => serial_println!("[boot] halted: {}", e),
        None => serial_println!("[boot] stage 2 returned, idling"),
    }
    x86::halt_forever();
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    serial_println!("PANIC: {}", info);
    x86::halt_forever();
}
