//! The fixed-register-allocation assembly code generator back end.

mod emit;
pub mod error;
mod regalloc;

pub use emit::generate;
pub use error::EmitError;

#[cfg(test)]
mod tests {
    use super::*;
    use sc_lex::Lexer;
    use sc_par::ast::Program;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize();
        sc_par::parse(&tokens, None).expect("source should parse")
    }

    #[test]
    fn emits_format_and_entry_directives() {
        let program = parse("function main(){ return 0; }");
        let asm = generate(&program).unwrap();
        assert!(asm.starts_with(";format binary"));
        assert!(asm.contains("include \"isa.inc\""));
        assert!(asm.contains("include \"macros.inc\""));
        assert!(asm.contains("entry main"));
        assert!(asm.contains("main:"));
        assert!(asm.contains("hlt"));
    }

    #[test]
    fn non_main_function_returns_via_stack_restore() {
        let program = parse("function f(){ return 1; } function main(){ return f(); }");
        let asm = generate(&program).unwrap();
        assert!(asm.contains("func_f:"));
        assert!(asm.contains("lds r29, [r30]"));
        assert!(asm.contains("mov r31, r29"));
    }

    #[test]
    fn global_scalar_lands_in_data_section() {
        let program = parse("uint32 counter = 7; function main(){ return counter; }");
        let asm = generate(&program).unwrap();
        assert!(asm.contains("var_counter:"));
        assert!(asm.contains("dd 7"));
        assert!(asm.contains("; Data section"));
    }

    #[test]
    fn global_array_zero_fills_missing_elements() {
        let program = parse("uint32 buf[4] = {1,2}; function main(){ return buf[0]; }");
        let asm = generate(&program).unwrap();
        assert!(asm.contains("array_buf:"));
        let data_idx = asm.find("array_buf:").unwrap();
        let tail = &asm[data_idx..];
        let dd_count = tail.matches("dd").count();
        assert!(dd_count >= 4);
    }

    #[test]
    fn register_variable_is_not_addressable() {
        let program = parse("function main(){ register uint32 r3 = 5; uint32* p = &r3; return 0; }");
        assert!(matches!(generate(&program), Err(EmitError::InvalidAddressOfOperand)));
    }

    #[test]
    fn address_of_plain_local_computes_stack_offset() {
        let program =
            parse("function main(){ uint32 x = 41; uint32* p = &x; *p = 42; return x; }");
        let asm = generate(&program).unwrap();
        assert!(asm.contains("mov") && asm.contains("r30"));
    }

    #[test]
    fn sixteen_locals_exceeds_the_fixed_pool() {
        let mut src = String::from("function main(){ ");
        for i in 0..16 {
            src.push_str(&format!("uint32 v{i} = {i}; "));
        }
        src.push_str("return v0; }");
        let program = parse(&src);
        assert!(matches!(
            generate(&program),
            Err(EmitError::TooManyLocals { .. })
        ));
    }

    #[test]
    fn comparison_normalizes_to_zero_or_one() {
        let program = parse("function main(){ uint32 a=3; uint32 b=5; return a < b; }");
        let asm = generate(&program).unwrap();
        assert!(asm.contains("cmpb"));
        assert!(asm.contains("cmovnz"));
    }

    #[test]
    fn logical_and_short_circuits_with_a_single_jump_per_operand() {
        let program = parse("function main(){ uint32 a=0; uint32 b=1; return a && b; }");
        let asm = generate(&program).unwrap();
        assert_eq!(asm.matches("cmovz r31,").count() >= 2, true);
    }

    #[test]
    fn division_guards_against_a_zero_divisor() {
        let program = parse("function main(){ uint32 a=10; uint32 b=0; return a / b; }");
        let asm = generate(&program).unwrap();
        assert!(asm.contains("div_error"));
    }

    #[test]
    fn do_while_continue_targets_the_condition_test() {
        let program = parse(
            "function main(){ uint32 i=0; uint32 s=0; \
             do { i=i+1; if (i==2) continue; s=s+1; } while(i<4); return s; }",
        );
        let asm = generate(&program).unwrap();
        assert!(asm.contains("do_cond"));
    }

    #[test]
    fn break_outside_a_loop_is_ignored_rather_than_an_error() {
        let program = parse("function main(){ break; return 0; }");
        assert!(generate(&program).is_ok());
    }

    #[test]
    fn builtin_arity_mismatch_is_rejected() {
        let program = parse("function main(){ uart_write(1, 2); return 0; }");
        assert!(matches!(
            generate(&program),
            Err(EmitError::BuiltinArityMismatch { .. })
        ));
    }

    #[test]
    fn gpio_builtins_pack_operands_and_emit_hardware_mnemonics() {
        let program =
            parse("function main(){ gpio_set(0,1,0); gpio_write(0,1); return gpio_read(0); }");
        let asm = generate(&program).unwrap();
        assert!(asm.contains("setg"));
        assert!(asm.contains("outg"));
        assert!(asm.contains("getg"));
    }

    #[test]
    fn timer_and_delay_builtins_lower_to_dedicated_mnemonics() {
        let program = parse(
            "function main(){ timer_set_mode(1); timer_start(); delay_ms(10); \
             return timer_get_value(); }",
        );
        let asm = generate(&program).unwrap();
        assert!(asm.contains("settm"));
        assert!(asm.contains("startt"));
        assert!(asm.contains("dly"));
        assert!(asm.contains("gettv"));
    }

    #[test]
    fn bit_helpers_mask_the_index_to_five_bits() {
        let program = parse("function main(){ uint32 x=1; return set_bit(x, 40); }");
        let asm = generate(&program).unwrap();
        assert!(asm.contains("and") && asm.contains("31"));
    }

    #[test]
    fn user_function_call_pushes_args_in_reverse_order() {
        let program = parse(
            "function add(a, b){ return a + b; } function main(){ return add(1, 2); }",
        );
        let asm = generate(&program).unwrap();
        assert!(asm.contains("ret_addr"));
        assert!(asm.contains("mov r31, func_add addr"));
    }

    #[test]
    fn undefined_function_call_is_rejected() {
        let program = parse("function main(){ return missing_fn(1); }");
        assert!(matches!(
            generate(&program),
            Err(EmitError::UndefinedFunction { .. })
        ));
    }
}
