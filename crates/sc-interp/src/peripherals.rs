//! Simulated GPIO, UART, and timer state backing the built-in call
//! surface. All of it is scoped to one interpretation run: constructed
//! fresh, discarded at teardown.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct GpioPin {
    pub direction: u32,
    pub mode: u32,
    pub value: u32,
}

#[derive(Default)]
pub struct Gpio {
    pins: FxHashMap<u32, GpioPin>,
}

impl Gpio {
    pub fn set(&mut self, pin: u32, direction: u32, mode: u32) {
        let entry = self.pins.entry(pin).or_default();
        entry.direction = direction;
        entry.mode = mode;
    }

    pub fn read(&self, pin: u32) -> Option<u32> {
        self.pins.get(&pin).map(|p| p.value)
    }

    pub fn write(&mut self, pin: u32, value: u32) -> bool {
        match self.pins.get_mut(&pin) {
            Some(p) => {
                p.value = value & 1;
                true
            }
            None => false,
        }
    }
}

/// Byte-level sink/source for `uart_write`/`uart_read`, generic so the
/// interpreter isn't tied to a concrete I/O backend. The interpreter's
/// default, [`StdoutUart`], mirrors writes to the process's standard
/// output; tests use [`BufferUart`] to assert on the byte stream without
/// touching the console.
pub trait UartIo {
    fn write_byte(&mut self, byte: u8);
    fn read_byte(&mut self) -> u8;
}

#[derive(Default)]
pub struct StdoutUart;

impl UartIo for StdoutUart {
    fn write_byte(&mut self, byte: u8) {
        use std::io::Write;
        let _ = std::io::stdout().write_all(&[byte]);
    }

    fn read_byte(&mut self) -> u8 {
        0
    }
}

#[derive(Default)]
pub struct BufferUart {
    pub written: Vec<u8>,
}

impl UartIo for BufferUart {
    fn write_byte(&mut self, byte: u8) {
        self.written.push(byte);
    }

    fn read_byte(&mut self) -> u8 {
        0
    }
}

pub struct Uart<U: UartIo> {
    pub baud: u32,
    io: U,
}

impl<U: UartIo> Uart<U> {
    pub fn new(io: U) -> Self {
        Uart { baud: 0, io }
    }

    pub fn set_baud(&mut self, rate: u32) {
        self.baud = rate;
    }

    pub fn write(&mut self, byte: u8) {
        self.io.write_byte(byte);
    }

    pub fn read(&mut self) -> u8 {
        self.io.read_byte()
    }

    pub fn io(&self) -> &U {
        &self.io
    }
}

impl<U: UartIo + Default> Default for Uart<U> {
    fn default() -> Self {
        Uart::new(U::default())
    }
}

#[derive(Default)]
pub struct Timer {
    mode: u32,
    period: u32,
    running: bool,
    value: u32,
}

impl Timer {
    pub fn set_mode(&mut self, mode: u32) {
        self.mode = mode;
    }

    pub fn set_period(&mut self, period: u32) {
        self.period = period;
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }

    pub fn get_value(&self) -> u32 {
        self.value
    }

    pub fn expired(&self) -> u32 {
        (self.running && self.period != 0 && self.value >= self.period) as u32
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }
}

/// GPIO, UART, and timer state bundled together, parameterized over the
/// UART I/O backend.
pub struct Peripherals<U: UartIo> {
    pub gpio: Gpio,
    pub uart: Uart<U>,
    pub timer: Timer,
}

impl<U: UartIo + Default> Default for Peripherals<U> {
    fn default() -> Self {
        Peripherals {
            gpio: Gpio::default(),
            uart: Uart::default(),
            timer: Timer::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpio_read_before_set_is_unconfigured() {
        let gpio = Gpio::default();
        assert_eq!(gpio.read(3), None);
    }

    #[test]
    fn gpio_write_masks_to_one_bit() {
        let mut gpio = Gpio::default();
        gpio.set(3, 1, 0);
        gpio.write(3, 0xFF);
        assert_eq!(gpio.read(3), Some(1));
    }

    #[test]
    fn uart_write_reaches_buffer() {
        let mut uart = Uart::new(BufferUart::default());
        uart.write(72);
        uart.write(105);
        assert_eq!(uart.io().written, b"Hi");
    }

    #[test]
    fn timer_expires_once_value_reaches_period() {
        let mut timer = Timer::default();
        timer.set_period(10);
        timer.start();
        assert_eq!(timer.expired(), 0);
        timer.value = 10;
        assert_eq!(timer.expired(), 1);
    }
}
