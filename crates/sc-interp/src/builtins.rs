//! The built-in call surface: names that look like function calls in
//! source but dispatch into peripheral state or pure bit operations
//! instead of user-defined functions.

use crate::error::RuntimeError;
use crate::peripherals::{Peripherals, UartIo};

pub fn is_builtin(name: &str) -> bool {
    arity_of(name).is_some()
}

fn arity_of(name: &str) -> Option<usize> {
    let arity = match name {
        "gpio_set" => 3,
        "gpio_read" => 1,
        "gpio_write" => 2,
        "uart_set_baud" => 1,
        "uart_read" => 0,
        "uart_write" => 1,
        "timer_set_mode" => 1,
        "timer_set_period" => 1,
        "timer_start" => 0,
        "timer_stop" => 0,
        "timer_reset" => 0,
        "timer_get_value" => 0,
        "timer_expired" => 0,
        "delay_ms" => 1,
        "delay_us" => 1,
        "delay_cycles" => 1,
        "enable_interrupts" => 0,
        "disable_interrupts" => 0,
        "set_bit" => 2,
        "clear_bit" => 2,
        "toggle_bit" => 2,
        "get_bit" => 2,
        _ => return None,
    };
    Some(arity)
}

pub fn call<U: UartIo>(
    peripherals: &mut Peripherals<U>,
    name: &str,
    args: &[u32],
) -> Result<u32, RuntimeError> {
    let expected = arity_of(name).expect("call() is only invoked after is_builtin() succeeds");
    if args.len() != expected {
        return Err(RuntimeError::BuiltinArityMismatch {
            name: name.to_string(),
            expected,
            found: args.len(),
        });
    }

    Ok(match name {
        "gpio_set" => {
            peripherals.gpio.set(args[0], args[1], args[2]);
            0
        }
        "gpio_read" => peripherals
            .gpio
            .read(args[0])
            .ok_or(RuntimeError::UnconfiguredGpio {
                pin: args[0],
                span: sc_util::Span::dummy(),
            })?,
        "gpio_write" => {
            if !peripherals.gpio.write(args[0], args[1]) {
                return Err(RuntimeError::UnconfiguredGpio {
                    pin: args[0],
                    span: sc_util::Span::dummy(),
                });
            }
            0
        }
        "uart_set_baud" => {
            peripherals.uart.set_baud(args[0]);
            0
        }
        "uart_read" => peripherals.uart.read() as u32,
        "uart_write" => {
            peripherals.uart.write(args[0] as u8);
            0
        }
        "timer_set_mode" => {
            peripherals.timer.set_mode(args[0]);
            0
        }
        "timer_set_period" => {
            peripherals.timer.set_period(args[0]);
            0
        }
        "timer_start" => {
            peripherals.timer.start();
            0
        }
        "timer_stop" => {
            peripherals.timer.stop();
            0
        }
        "timer_reset" => {
            peripherals.timer.reset();
            0
        }
        "timer_get_value" => peripherals.timer.get_value(),
        "timer_expired" => peripherals.timer.expired(),
        "delay_ms" | "delay_us" | "delay_cycles" => 0,
        "enable_interrupts" | "disable_interrupts" => 0,
        "set_bit" => args[0] | (1u32 << (args[1] & 0x1F)),
        "clear_bit" => args[0] & !(1u32 << (args[1] & 0x1F)),
        "toggle_bit" => args[0] ^ (1u32 << (args[1] & 0x1F)),
        "get_bit" => (args[0] >> (args[1] & 0x1F)) & 1,
        _ => unreachable!("arity_of would have returned None"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::BufferUart;

    #[test]
    fn bit_helpers_mask_the_bit_index_to_five_bits() {
        let mut peripherals: Peripherals<BufferUart> = Peripherals::default();
        assert_eq!(call(&mut peripherals, "set_bit", &[0, 33]).unwrap(), 0b10);
        assert_eq!(call(&mut peripherals, "get_bit", &[0b10, 33]).unwrap(), 1);
    }

    #[test]
    fn unconfigured_gpio_read_is_an_error() {
        let mut peripherals: Peripherals<BufferUart> = Peripherals::default();
        assert!(call(&mut peripherals, "gpio_read", &[9]).is_err());
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let mut peripherals: Peripherals<BufferUart> = Peripherals::default();
        let err = call(&mut peripherals, "gpio_read", &[1, 2]).unwrap_err();
        assert!(matches!(err, RuntimeError::BuiltinArityMismatch { .. }));
    }
}
