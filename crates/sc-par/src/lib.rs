//! Recursive-descent parser for the SC language: turns a token stream into
//! a [`Program`] AST, then checks the handful of structural invariants the
//! grammar alone can't express.

pub mod ast;
mod bp;
pub mod error;
mod expr;
mod items;
mod parser;
mod stmt;
mod validate;

pub use ast::Program;
pub use error::ParseError;
pub use validate::validate;

use parser::Parser;
use sc_lex::Token;

/// Parses a token stream into a validated [`Program`].
///
/// `file` names the source file for diagnostics; pass `None` for anonymous
/// or in-memory sources (tests, REPL-style input).
pub fn parse(tokens: &[Token], file: Option<String>) -> Result<Program, ParseError> {
    let mut parser = Parser::new(tokens, file);
    let program = parser.parse_program()?;
    validate(&program)?;
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_lex::Lexer;

    fn parse_src(src: &str) -> Result<Program, ParseError> {
        let tokens = Lexer::new(src).tokenize();
        parse(&tokens, None)
    }

    #[test]
    fn parses_minimal_main() {
        let program = parse_src("function main() { return 0; }").unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name.as_str(), "main");
    }

    #[test]
    fn precedence_groups_multiplication_before_addition() {
        let program = parse_src("function main() { uint32 x = 1 + 2 * 3; return x; }").unwrap();
        let body = &program.functions[0].body;
        match &body[0].kind {
            ast::StmtKind::Var(decl) => match decl.init.as_ref().unwrap() {
                ast::Expr::Binary {
                    op: ast::BinOp::Add,
                    right,
                    ..
                } => {
                    assert!(matches!(**right, ast::Expr::Binary { op: ast::BinOp::Mul, .. }));
                }
                other => panic!("expected top-level add, got {other:?}"),
            },
            other => panic!("expected var decl, got {other:?}"),
        }
    }

    #[test]
    fn left_associativity_of_subtraction() {
        let program = parse_src("function main() { uint32 x = 10 - 3 - 2; return x; }").unwrap();
        match &program.functions[0].body[0].kind {
            ast::StmtKind::Var(decl) => match decl.init.as_ref().unwrap() {
                ast::Expr::Binary {
                    op: ast::BinOp::Sub,
                    left,
                    ..
                } => {
                    assert!(matches!(**left, ast::Expr::Binary { op: ast::BinOp::Sub, .. }));
                }
                other => panic!("expected top-level sub, got {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_qualified_register_declaration_in_any_order() {
        let program =
            parse_src("function main() { volatile register uint32 r3 = 0; return 0; }").unwrap();
        match &program.functions[0].body[0].kind {
            ast::StmtKind::Var(decl) => {
                assert!(decl.is_register);
                assert!(decl.is_volatile);
                assert_eq!(decl.register_num, Some(3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_array_declaration_with_initializer() {
        let program =
            parse_src("function main() { uint32 xs[3] = {1, 2, 3}; return xs[0]; }").unwrap();
        match &program.functions[0].body[0].kind {
            ast::StmtKind::Array(decl) => {
                assert_eq!(decl.size, 3);
                assert_eq!(decl.init.as_ref().unwrap().len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_pointer_declaration_and_dereference_assignment() {
        let program = parse_src(
            "function main() { uint32 x = 0; uint32 *p = &x; *p = 5; return x; }",
        )
        .unwrap();
        assert!(matches!(
            program.functions[0].body[1].kind,
            ast::StmtKind::Pointer(_)
        ));
        assert!(matches!(
            program.functions[0].body[2].kind,
            ast::StmtKind::PointerAssignment { .. }
        ));
    }

    #[test]
    fn parses_for_while_do_while_and_if_else() {
        let program = parse_src(
            "function main() {\
               uint32 sum = 0;\
               for (uint32 i = 0; i < 10; i++) { sum = sum + i; }\
               while (sum > 100) { sum--; }\
               do { sum++; } while (sum < 5);\
               if (sum == 5) { return 1; } else { return 0; }\
             }",
        )
        .unwrap();
        assert_eq!(program.functions[0].body.len(), 5);
    }

    #[test]
    fn parses_function_call_statement_and_expression() {
        let program = parse_src(
            "function helper(a) { return a; }\
             function main() { helper(1); uint32 x = helper(2); return x; }",
        )
        .unwrap();
        assert_eq!(program.functions.len(), 2);
        assert!(matches!(
            program.functions[1].body[0].kind,
            ast::StmtKind::FunctionCallStmt(_)
        ));
    }

    #[test]
    fn parses_interrupt_function_with_no_params() {
        let program = parse_src("interrupt function on_tick() { return; }\nfunction main() { return 0; }").unwrap();
        assert!(program.functions[0].is_interrupt);
    }

    #[test]
    fn missing_main_is_rejected() {
        let err = parse_src("function helper() { return 0; }").unwrap_err();
        assert!(matches!(err, ParseError::MainCount { count: 0 }));
    }

    #[test]
    fn duplicate_main_is_rejected() {
        let err = parse_src(
            "function main() { return 0; } function main() { return 1; }",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::MainCount { count: 2 }));
    }

    #[test]
    fn interrupt_function_with_params_is_rejected() {
        let err =
            parse_src("interrupt function on_tick(x) { return; }\nfunction main() { return 0; }")
                .unwrap_err();
        assert!(matches!(err, ParseError::InterruptHasParams { .. }));
    }

    #[test]
    fn invalid_register_name_is_rejected() {
        let err =
            parse_src("function main() { register uint32 counter = 0; return 0; }").unwrap_err();
        assert!(matches!(err, ParseError::InvalidRegisterName { .. }));
    }

    #[test]
    fn assigning_to_r31_is_rejected() {
        let err = parse_src("function main() { r31 = 0; return 0; }").unwrap_err();
        assert!(matches!(err, ParseError::R31NotAssignable { .. }));
    }

    #[test]
    fn zero_size_array_is_rejected() {
        let err = parse_src("function main() { uint32 xs[0]; return 0; }").unwrap_err();
        assert!(matches!(err, ParseError::InvalidArraySize { .. }));
    }

    #[test]
    fn invalid_global_register_name_is_rejected() {
        let err =
            parse_src("register uint32 counter;\nfunction main() { return 0; }").unwrap_err();
        assert!(matches!(err, ParseError::InvalidRegisterName { .. }));
    }

    #[test]
    fn parses_global_array_and_pointer_declarations() {
        let program = parse_src(
            "uint32 table[4] = {1, 2, 3, 4};\nuint32 *cursor;\nfunction main() { return table[0]; }",
        )
        .unwrap();
        assert_eq!(program.globals.len(), 2);
        assert!(matches!(program.globals[0], ast::GlobalDecl::Array(_)));
        assert!(matches!(program.globals[1], ast::GlobalDecl::Pointer(_)));
    }

    #[test]
    fn boundary_program_bitwise_and_hex_literals() {
        let program = parse_src(
            "function main() {\
               uint32 mask = 0xFF;\
               uint32 flags = 0x0F;\
               uint32 result = (mask & flags) | (1 << 4);\
               return result;\
             }",
        )
        .unwrap();
        assert_eq!(program.functions[0].body.len(), 4);
    }
}
