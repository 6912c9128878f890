/// Diagnostic output for stage 1.
///
/// Everything the stage has to say goes through a [`DiagnosticSink`]: a
/// sequential byte writer. On hardware that is the text-mode screen; in
/// tests it is a [`BufferSink`].
mod text_mode;

pub use text_mode::TextModeDisplay;

use crate::rt::DecimalBuf;

pub trait DiagnosticSink {
    /// Emit one character.
    fn put_byte(&mut self, byte: u8);

    fn write_text(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.put_byte(b);
        }
    }

    /// Emit `num` in unsigned decimal.
    fn write_decimal(&mut self, num: u32) {
        self.write_text(DecimalBuf::new(num).digits());
    }
}

/// Fixed-capacity recording sink. Bytes past capacity are counted but
/// dropped.
pub struct BufferSink<const N: usize> {
    bytes: [u8; N],
    written: usize,
}

impl<const N: usize> BufferSink<N> {
    pub const fn new() -> Self {
        Self { bytes: [0; N], written: 0 }
    }

    /// Recorded bytes, up to capacity.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.written.min(N)]
    }

    /// Total bytes written, including any that did not fit.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl<const N: usize> DiagnosticSink for BufferSink<N> {
    fn put_byte(&mut self, byte: u8) {
        if self.written < N {
            self.bytes[self.written] = byte;
        }
        self.written += 1;
    }
}
