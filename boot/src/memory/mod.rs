/// Access to the stage's own loaded image.
///
/// The image is byte-addressable from physical address 0 with no declared
/// length. Scan and relocation code only see it through [`ImageMemory`],
/// so the raw hardware access is confined to one type, [`PhysImage`],
/// whose constructor is the single audited trust boundary.
#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), not(test)))]
mod phys;
#[cfg(test)]
pub mod mock;

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), not(test)))]
pub use phys::PhysImage;

/// Byte-level view of the loaded image, addressed by 32-bit offsets from
/// the image base.
pub trait ImageMemory {
    /// Read the byte at `addr`. Never fails; the image has no end.
    fn read_byte(&self, addr: u32) -> u8;

    /// Copy `len` bytes from `src` to `dest`, lowest address first.
    /// No overlap or bounds checking is done.
    fn copy(&mut self, dest: u32, src: u32, len: u32);
}
