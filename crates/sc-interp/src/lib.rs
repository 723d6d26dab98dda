//! The tree-walking interpreter back end.

pub mod builtins;
pub mod env;
pub mod error;
mod interp;
pub mod peripherals;
pub mod registers;
pub mod value;

pub use error::RuntimeError;
pub use interp::Interpreter;
pub use peripherals::{BufferUart, Peripherals, StdoutUart, UartIo};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use sc_lex::Lexer;
    use sc_par::ast::Program;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize();
        sc_par::parse(&tokens, None).expect("source should parse")
    }

    fn run(src: &str) -> u32 {
        let program = parse(src);
        let mut interp: Interpreter<BufferUart> = Interpreter::new(&program);
        interp.run().expect("program should run without error")
    }

    #[test]
    fn wrap_around() {
        let src = "function main(){ uint32 x = 4294967295; x = x + 1; return x; }";
        assert_eq!(run(src), 0);
    }

    #[test]
    fn signed_comparison() {
        let src = "function main(){ int32 a = -1; if (a < 0) return 7; return 9; }";
        assert_eq!(run(src), 7);
    }

    #[test]
    fn recursion() {
        let src = "function f(n){ if (n==0||n==1) return 1; return n * f(n-1); } \
                    function main(){ return f(5); }";
        assert_eq!(run(src), 120);
    }

    #[test]
    fn for_loop_sum() {
        let src = "function main(){ uint32 s=0; uint32 i; for (i=0;i<5;i++) s=s+i; return s; }";
        assert_eq!(run(src), 10);
    }

    #[test]
    fn hex_and_bitwise() {
        let src = "function main(){ return 0xFF & 0x0F; }";
        assert_eq!(run(src), 15);
    }

    #[test]
    fn uart_echo_reaches_standard_output_buffer() {
        let src = "function main(){ uart_write(72); uart_write(105); return 0; }";
        let program = parse(src);
        let mut interp: Interpreter<BufferUart> = Interpreter::new(&program);
        interp.run().unwrap();
        assert_eq!(interp.peripherals().uart.io().written, b"Hi");
    }

    #[test]
    fn arithmetic_wraps_modulo_two_to_the_32() {
        let src = "function main(){ uint32 a = 4000000000; uint32 b = 4000000000; return a + b; }";
        let expected = 4_000_000_000u64.wrapping_add(4_000_000_000) as u32;
        assert_eq!(run(src), expected);
    }

    #[test]
    fn shifts_mask_count_to_five_bits() {
        let src = "function main(){ uint32 a = 1; return (a << 33) == (a << 1); }";
        assert_eq!(run(src), 1);
    }

    #[test]
    fn logical_and_short_circuits_right_operand() {
        let src = "function main(){ uint32 d = 0; return (0 && (1 / d)); }";
        assert_eq!(run(src), 0);
    }

    #[test]
    fn logical_or_short_circuits_right_operand() {
        let src = "function main(){ uint32 d = 0; return (1 || (1 / d)); }";
        assert_eq!(run(src), 1);
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let src = "function main(){ uint32 d = 0; return 1 / d; }";
        let program = parse(src);
        let mut interp: Interpreter<BufferUart> = Interpreter::new(&program);
        assert_eq!(interp.run(), Err(RuntimeError::DivByZero { span: sc_util::Span::dummy() }));
    }

    #[test]
    fn modulo_by_zero_is_a_runtime_error() {
        let src = "function main(){ uint32 d = 0; return 1 % d; }";
        let program = parse(src);
        let mut interp: Interpreter<BufferUart> = Interpreter::new(&program);
        assert!(matches!(interp.run(), Err(RuntimeError::ModByZero { .. })));
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let src = "function main(){ return missing; }";
        let program = parse(src);
        let mut interp: Interpreter<BufferUart> = Interpreter::new(&program);
        assert!(matches!(interp.run(), Err(RuntimeError::UndefinedVariable { .. })));
    }

    #[test]
    fn undefined_function_is_a_runtime_error() {
        let src = "function main(){ return missing_fn(1); }";
        let program = parse(src);
        let mut interp: Interpreter<BufferUart> = Interpreter::new(&program);
        assert!(matches!(interp.run(), Err(RuntimeError::UndefinedFunction { .. })));
    }

    #[test]
    fn argument_count_mismatch_is_a_runtime_error() {
        let src = "function f(a, b){ return a + b; } function main(){ return f(1); }";
        let program = parse(src);
        let mut interp: Interpreter<BufferUart> = Interpreter::new(&program);
        assert!(matches!(
            interp.run(),
            Err(RuntimeError::ArgCountMismatch { .. })
        ));
    }

    #[test]
    fn array_out_of_bounds_is_a_runtime_error() {
        let src = "function main(){ uint32 a[3] = {1,2,3}; return a[5]; }";
        let program = parse(src);
        let mut interp: Interpreter<BufferUart> = Interpreter::new(&program);
        assert!(matches!(
            interp.run(),
            Err(RuntimeError::ArrayOutOfBounds { .. })
        ));
    }

    #[test]
    fn signed_then_unsigned_round_trip_preserves_bit_pattern() {
        let src = "function main(){ int32 a = -1; uint32 b = a; return b == 4294967295; }";
        assert_eq!(run(src), 1);
    }

    #[test]
    fn address_of_and_dereference_round_trip() {
        let src = "function main(){ uint32 x = 41; uint32* p = &x; *p = 42; return x; }";
        assert_eq!(run(src), 42);
    }

    #[test]
    fn register_variable_writes_mirror_into_register_file() {
        let src = "function main(){ register uint32 r3 = 5; r3 = r3 + 1; return r3; }";
        let program = parse(src);
        let mut interp: Interpreter<BufferUart> = Interpreter::new(&program);
        let result = interp.run().unwrap();
        assert_eq!(result, 6);
        assert_eq!(interp.registers().read(3), 6);
    }

    #[test]
    fn gpio_round_trips_through_set_write_read() {
        let src = "function main(){ gpio_set(0, 1, 0); gpio_write(0, 1); return gpio_read(0); }";
        assert_eq!(run(src), 1);
    }

    #[test]
    fn unconfigured_gpio_access_is_a_runtime_error() {
        let src = "function main(){ return gpio_read(9); }";
        let program = parse(src);
        let mut interp: Interpreter<BufferUart> = Interpreter::new(&program);
        assert!(matches!(
            interp.run(),
            Err(RuntimeError::UnconfiguredGpio { .. })
        ));
    }

    #[test]
    fn break_leaves_the_nearest_enclosing_loop() {
        let src = "function main(){ uint32 i; uint32 s=0; \
                    for (i=0;i<10;i++) { if (i==3) break; s=s+1; } return s; }";
        assert_eq!(run(src), 3);
    }

    #[test]
    fn continue_runs_the_step_before_retesting_the_condition() {
        let src = "function main(){ uint32 i; uint32 s=0; \
                    for (i=0;i<5;i++) { if (i==2) continue; s=s+1; } return s; }";
        assert_eq!(run(src), 4);
    }

    #[test]
    fn do_while_executes_body_before_testing_condition() {
        let src = "function main(){ uint32 x=0; do { x=x+1; } while(0); return x; }";
        assert_eq!(run(src), 1);
    }

    #[test]
    fn writing_r31_through_a_register_variable_is_rejected() {
        let src = "function main(){ register uint32 r31 = 0; return 0; }";
        let tokens = Lexer::new(src).tokenize();
        assert!(sc_par::parse(&tokens, None).is_err());
    }
}
