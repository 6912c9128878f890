/// RAM-backed image for host tests.
///
/// Reads past the backing store return zero, like unpopulated memory
/// in the real (unbounded) image. Copies must stay inside the backing
/// store; the tests size it accordingly.
use super::ImageMemory;
use crate::rt;

pub struct RamImage {
    data: Vec<u8>,
    reads: core::cell::Cell<u32>,
}

impl RamImage {
    /// Zero-filled image of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size],
            reads: core::cell::Cell::new(0),
        }
    }

    /// Write `bytes` into the image at `offset`.
    pub fn place(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Raw bytes at an offset (for test verification).
    pub fn read_raw(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    /// Highest address read plus one, i.e. how far a scan looked.
    pub fn read_extent(&self) -> u32 {
        self.reads.get()
    }
}

impl ImageMemory for RamImage {
    fn read_byte(&self, addr: u32) -> u8 {
        let extent = addr.saturating_add(1);
        if extent > self.reads.get() {
            self.reads.set(extent);
        }
        self.data.get(addr as usize).copied().unwrap_or(0)
    }

    fn copy(&mut self, dest: u32, src: u32, len: u32) {
        let (dest, src, n) = (dest as usize, src as usize, len as usize);
        assert!(src + n <= self.data.len() && dest + n <= self.data.len(), "copy outside RamImage");
        let base = self.data.as_mut_ptr();
        unsafe { rt::copy(base.add(dest), base.add(src), len) };
    }
}
