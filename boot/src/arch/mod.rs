/// Architecture support for the stage. Only 32-bit protected-mode x86 is
/// booted for real; the same code builds on x86_64 hosts so the crate
/// stays checkable there.
pub mod x86;
