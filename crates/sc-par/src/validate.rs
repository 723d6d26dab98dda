//! Post-parse structural validation: checks that are grammar-independent
//! but still purely syntactic, so they run once on the finished tree rather
//! than threading extra state through the recursive-descent parser.

use crate::ast::{GlobalDecl, Program, Stmt, StmtKind};
use crate::error::ParseError;
use sc_util::Span;

pub fn validate(program: &Program) -> Result<(), ParseError> {
    check_main(program)?;
    for global in &program.globals {
        check_global(global)?;
    }
    for func in &program.functions {
        if func.is_interrupt && !func.params.is_empty() {
            return Err(ParseError::InterruptHasParams {
                span: func.span.clone(),
            });
        }
        for stmt in &func.body {
            check_stmt(stmt)?;
        }
    }
    Ok(())
}

fn check_global(global: &GlobalDecl) -> Result<(), ParseError> {
    if let GlobalDecl::Var(decl) = global {
        if decl.is_register {
            if decl.register_num.is_none() {
                return Err(ParseError::InvalidRegisterName {
                    name: decl.name.to_string(),
                    span: Span::dummy(),
                });
            }
            if decl.register_num == Some(31) {
                return Err(ParseError::R31NotAssignable {
                    span: Span::dummy(),
                });
            }
        }
    }
    Ok(())
}

fn check_main(program: &Program) -> Result<(), ParseError> {
    let count = program
        .functions
        .iter()
        .filter(|f| f.name.as_str() == "main" && f.params.is_empty())
        .count();
    if count != 1 {
        return Err(ParseError::MainCount { count });
    }
    Ok(())
}

fn check_stmt(stmt: &Stmt) -> Result<(), ParseError> {
    match &stmt.kind {
        StmtKind::Var(decl) if decl.is_register => {
            if decl.register_num.is_none() {
                return Err(ParseError::InvalidRegisterName {
                    name: decl.name.to_string(),
                    span: stmt.span.clone(),
                });
            }
            if decl.register_num == Some(31) {
                return Err(ParseError::R31NotAssignable {
                    span: stmt.span.clone(),
                });
            }
        }
        StmtKind::Assignment { name, .. }
        | StmtKind::Increment { name, .. }
        | StmtKind::Decrement { name, .. } => {
            reject_r31(name.as_str(), &stmt.span)?;
        }
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            check_stmt(then_branch)?;
            if let Some(else_branch) = else_branch {
                check_stmt(else_branch)?;
            }
        }
        StmtKind::While { body, .. } => check_stmt(body)?,
        StmtKind::DoWhile { body, .. } => check_stmt(body)?,
        StmtKind::For {
            init, step, body, ..
        } => {
            if let Some(init) = init {
                check_stmt(init)?;
            }
            if let Some(step) = step {
                check_stmt(step)?;
            }
            check_stmt(body)?;
        }
        StmtKind::Block(stmts) => {
            for s in stmts {
                check_stmt(s)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// `r31` is the instruction pointer; the grammar allows any register name
/// as an assignment target, so this check catches `r31 = ...`, `r31++`,
/// and `r31--` after the fact rather than special-casing it in `stmt.rs`.
fn reject_r31(name: &str, span: &Span) -> Result<(), ParseError> {
    if name == "r31" {
        return Err(ParseError::R31NotAssignable { span: span.clone() });
    }
    Ok(())
}
