/// COM1 log console for stage 1 (output only).
///
/// Everything written here also appears on the text-mode display in a
/// shorter form; serial is the channel to use when the screen is not
/// visible (headless QEMU, `-serial stdio`).
use core::fmt;
use spin::Mutex;

const COM1: u16 = 0x3F8;

// Line status register bit: transmit holding register empty.
const LSR_THR_EMPTY: u8 = 0x20;

pub static SERIAL: Mutex<Serial> = Mutex::new(Serial::new(COM1));

pub struct Serial {
    port: u16,
    ready: bool,
}

impl Serial {
    pub const fn new(port: u16) -> Self {
        Self { port, ready: false }
    }

    /// Program the UART for 115200 8N1 with FIFOs on and interrupts off.
    pub fn init(&mut self) {
        super::outb(self.port + 1, 0x00); // IER: no interrupts, stage 1 polls
        super::outb(self.port + 3, 0x80); // LCR: DLAB on
        super::outb(self.port, 0x01);     // divisor low (115200)
        super::outb(self.port + 1, 0x00); // divisor high
        super::outb(self.port + 3, 0x03); // LCR: 8N1, DLAB off
        super::outb(self.port + 2, 0xC7); // FCR: enable + clear FIFOs
        super::outb(self.port + 4, 0x03); // MCR: DTR | RTS
        self.ready = true;
    }

    pub fn write_byte(&self, byte: u8) {
        if !self.ready {
            return;
        }
        while super::inb(self.port + 5) & LSR_THR_EMPTY == 0 {
            core::hint::spin_loop();
        }
        super::outb(self.port, byte);
    }
}

impl fmt::Write for Serial {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
        Ok(())
    }
}

/// Print to the COM1 log console.
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        {
            use core::fmt::Write;
            let mut serial = $crate::arch::x86::serial::SERIAL.lock();
            let _ = write!(serial, $($arg)*);
        }
    };
}

/// Print to the COM1 log console with a newline.
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => {
        $crate::serial_print!("{}\n", format_args!($($arg)*))
    };
}
