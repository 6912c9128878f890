//! HeavenOS stage-1 boot stage.
//!
//! Finds the stage-2 payload embedded in the loaded image by its byte
//! sentinels, copies it up by a fixed relocation offset and hands control
//! to it. All of the logic lives here so it can be exercised on the host;
//! `main.rs` only wires the hardware implementations together.
#![cfg_attr(not(test), no_std)]
#![allow(dead_code)]

// Hardware-dependent modules — only compiled for bare-metal x86, not host-target tests
#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), not(test)))]
pub mod arch;

pub mod config;
pub mod display;
pub mod handoff;
pub mod memory;
pub mod reloc;
pub mod rt;
pub mod scan;
pub mod stage;

pub use display::DiagnosticSink;
pub use memory::ImageMemory;
pub use stage::{Stage, StageMode, StageReport, StageState};

/// Stage log line, mirrored to COM1.
///
/// Compiles to nothing in host tests and when `serial-log` is off, so the
/// text-mode display stays the only required output.
#[macro_export]
macro_rules! boot_log {
    ($($arg:tt)*) => {{
        #[cfg(all(
            feature = "serial-log",
            any(target_arch = "x86", target_arch = "x86_64"),
            not(test)
        ))]
        {
            $crate::serial_println!($($arg)*);
        }
        #[cfg(not(all(
            feature = "serial-log",
            any(target_arch = "x86", target_arch = "x86_64"),
            not(test)
        )))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}
