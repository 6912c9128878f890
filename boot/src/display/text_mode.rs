/// Owned handle over colour text-mode memory.
use super::DiagnosticSink;
use crate::config::{CELL_STRIDE, TEXT_MODE_BASE};

/// Write cursor into character+attribute cells.
///
/// The cursor moves before each write, so the first character lands in
/// cell 1 and cell 0 stays free for the self-test marker. Attribute bytes
/// are left as the firmware set them. There is no wrap: writing past the
/// end of the screen keeps going into whatever follows.
pub struct TextModeDisplay {
    cursor: *mut u8,
    cells: usize,
}

impl TextModeDisplay {
    /// # Safety
    /// `base` must be writable for as many cells as will be written. The
    /// handle must be the only writer for its lifetime.
    pub unsafe fn new(base: *mut u8) -> Self {
        Self { cursor: base, cells: 0 }
    }

    /// The screen at `TEXT_MODE_BASE`.
    ///
    /// # Safety
    /// Colour text mode must be active and only one handle may exist.
    pub unsafe fn vga() -> Self {
        Self::new(TEXT_MODE_BASE as *mut u8)
    }

    /// Characters written through this handle.
    pub fn cells_written(&self) -> usize {
        self.cells
    }
}

impl DiagnosticSink for TextModeDisplay {
    fn put_byte(&mut self, byte: u8) {
        unsafe {
            self.cursor = self.cursor.add(CELL_STRIDE);
            self.cursor.write_volatile(byte);
        }
        self.cells += 1;
    }
}
