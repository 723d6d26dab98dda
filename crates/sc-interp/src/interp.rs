//! The tree-walking evaluator.

use rustc_hash::FxHashMap;
use sc_par::ast::{BinOp, Expr, FunctionDef, GlobalDecl, Program, Stmt, StmtKind, Ty, UnOp};
use sc_util::{Span, Symbol};

use crate::builtins;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::peripherals::{Peripherals, StdoutUart, UartIo};
use crate::registers::RegisterFile;
use crate::value::Value;

/// Non-local control-flow exit from a statement or block.
enum Signal {
    None,
    Return(Value),
    Break,
    Continue,
}

pub struct Interpreter<'p, U: UartIo = StdoutUart> {
    program: &'p Program,
    functions: FxHashMap<&'p str, &'p FunctionDef>,
    env: Environment,
    registers: RegisterFile,
    peripherals: Peripherals<U>,
}

impl<'p, U: UartIo + Default> Interpreter<'p, U> {
    pub fn new(program: &'p Program) -> Self {
        Self::with_uart(program, U::default())
    }
}

impl<'p, U: UartIo> Interpreter<'p, U> {
    pub fn with_uart(program: &'p Program, uart_io: U) -> Self {
        let functions = program
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f))
            .collect();

        let mut interp = Interpreter {
            program,
            functions,
            env: Environment::new(),
            registers: RegisterFile::new(),
            peripherals: Peripherals {
                gpio: Default::default(),
                uart: crate::peripherals::Uart::new(uart_io),
                timer: Default::default(),
            },
        };
        interp.declare_globals();
        interp
    }

    pub fn peripherals(&self) -> &Peripherals<U> {
        &self.peripherals
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    fn declare_globals(&mut self) {
        for global in &self.program.globals {
            match global {
                GlobalDecl::Var(decl) => {
                    let bits = self.eval_init_scalar(&decl.init, decl.ty);
                    self.env
                        .declare_scalar(decl.name.clone(), decl.ty, bits, decl.register_num);
                    if let Some(num) = decl.register_num {
                        let _ = self.registers.write(num, bits);
                    }
                }
                GlobalDecl::Array(decl) => {
                    let values = self.eval_array_init(decl.size, &decl.init);
                    self.env.declare_array(decl.name.clone(), values);
                }
                GlobalDecl::Pointer(decl) => {
                    let bits = self.eval_init_scalar(&decl.init, Ty::Uint32);
                    self.env.declare_scalar(decl.name.clone(), Ty::Uint32, bits, None);
                }
            }
        }
    }

    /// Global initializers are evaluated eagerly at startup; any error
    /// (undefined name, div-by-zero) in one falls back to zero rather than
    /// aborting construction, since a global decl's initializer is expected
    /// to be a constant expression in well-formed programs.
    fn eval_init_scalar(&mut self, init: &Option<Expr>, ty: Ty) -> u32 {
        match init {
            Some(expr) => match self.eval_expr(expr) {
                Ok(v) => v.coerce_to(ty).bits,
                Err(_) => 0,
            },
            None => 0,
        }
    }

    fn eval_array_init(&mut self, size: u32, init: &Option<Vec<Expr>>) -> Vec<u32> {
        let mut values = vec![0u32; size as usize];
        if let Some(exprs) = init {
            for (slot, expr) in values.iter_mut().zip(exprs.iter()) {
                *slot = match self.eval_expr(expr) {
                    Ok(v) => v.bits,
                    Err(_) => 0,
                };
            }
        }
        values
    }

    /// Runs `main` to completion and returns its return value.
    pub fn run(&mut self) -> Result<u32, RuntimeError> {
        let main = self.functions.get("main").copied().ok_or(RuntimeError::MissingMain)?;
        let value = self.call_function(main, &[])?;
        Ok(value.as_u32())
    }

    fn call_function(&mut self, func: &'p FunctionDef, args: &[Value]) -> Result<Value, RuntimeError> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::ArgCountMismatch {
                name: func.name.to_string(),
                expected: func.params.len(),
                found: args.len(),
            });
        }

        let caller_scope = self.env.current_scope();
        let global = self.env.global_scope();
        self.env.enter_scope(global);
        for (param, arg) in func.params.iter().zip(args.iter()) {
            self.env.declare_scalar(param.clone(), arg.ty, arg.bits, None);
        }

        let signal = self.exec_stmts(&func.body);
        self.env.set_current(caller_scope);

        match signal? {
            Signal::Return(v) => Ok(v),
            _ => Ok(Value::uint(0)),
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Signal, RuntimeError> {
        let parent = self.env.current_scope();
        self.env.enter_scope(parent);
        let result = self.exec_stmts(stmts);
        self.env.set_current(parent);
        result
    }

    fn exec_stmts(&mut self, stmts: &[Stmt]) -> Result<Signal, RuntimeError> {
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Signal::None => {}
                other => return Ok(other),
            }
        }
        Ok(Signal::None)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Signal, RuntimeError> {
        match &stmt.kind {
            StmtKind::Var(decl) => {
                let bits = match &decl.init {
                    Some(e) => self.eval_expr(e)?.coerce_to(decl.ty).bits,
                    None => 0,
                };
                self.env
                    .declare_scalar(decl.name.clone(), decl.ty, bits, decl.register_num);
                if let Some(num) = decl.register_num {
                    self.registers.write(num, bits)?;
                }
                Ok(Signal::None)
            }
            StmtKind::Array(decl) => {
                let values = self.eval_array_init(decl.size, &decl.init);
                self.env.declare_array(decl.name.clone(), values);
                Ok(Signal::None)
            }
            StmtKind::Pointer(decl) => {
                let bits = match &decl.init {
                    Some(e) => self.eval_expr(e)?.bits,
                    None => 0,
                };
                self.env.declare_scalar(decl.name.clone(), Ty::Uint32, bits, None);
                Ok(Signal::None)
            }
            StmtKind::Assignment { name, value } => {
                let v = self.eval_expr(value)?;
                let ty = self
                    .env
                    .lookup_scalar(name)
                    .map(|(_, ty)| ty)
                    .ok_or_else(|| self.undefined_variable(name, &stmt.span))?;
                let bits = v.coerce_to(ty).bits;
                self.env.assign_scalar(name, bits);
                if let Some(num) = self.env.lookup_register_num(name) {
                    self.registers.write(num, bits)?;
                }
                Ok(Signal::None)
            }
            StmtKind::ArrayAssignment { name, index, value } => {
                let idx = self.eval_expr(index)?.as_u32();
                let v = self.eval_expr(value)?;
                let len = self
                    .env
                    .array_len(name)
                    .ok_or_else(|| self.undefined_variable(name, &stmt.span))?;
                if idx >= len {
                    return Err(RuntimeError::ArrayOutOfBounds {
                        name: name.to_string(),
                        index: idx,
                        size: len,
                        span: stmt.span.clone(),
                    });
                }
                self.env.array_set(name, idx, v.bits);
                Ok(Signal::None)
            }
            StmtKind::PointerAssignment { addr, value } => {
                let address = self.eval_expr(addr)?.as_u32();
                let v = self.eval_expr(value)?;
                if !self.env.deref_write(address, v.bits) {
                    return Err(RuntimeError::InvalidDereference {
                        address,
                        span: stmt.span.clone(),
                    });
                }
                Ok(Signal::None)
            }
            StmtKind::Increment { name, .. } => self.step_scalar(name, 1, &stmt.span),
            StmtKind::Decrement { name, .. } => self.step_scalar(name, -1, &stmt.span),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(condition)?.is_truthy() {
                    self.exec_stmt(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec_stmt(else_branch)
                } else {
                    Ok(Signal::None)
                }
            }
            StmtKind::While { condition, body } => {
                while self.eval_expr(condition)?.is_truthy() {
                    match self.exec_stmt(body)? {
                        Signal::Break => break,
                        Signal::Return(v) => return Ok(Signal::Return(v)),
                        Signal::None | Signal::Continue => {}
                    }
                }
                Ok(Signal::None)
            }
            StmtKind::DoWhile { body, condition } => {
                loop {
                    match self.exec_stmt(body)? {
                        Signal::Break => break,
                        Signal::Return(v) => return Ok(Signal::Return(v)),
                        Signal::None | Signal::Continue => {}
                    }
                    if !self.eval_expr(condition)?.is_truthy() {
                        break;
                    }
                }
                Ok(Signal::None)
            }
            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => {
                let parent = self.env.current_scope();
                self.env.enter_scope(parent);
                let result = self.run_for_loop(init, condition, step, body);
                self.env.set_current(parent);
                result
            }
            StmtKind::Return(value) => {
                let v = match value {
                    Some(e) => self.eval_expr(e)?,
                    None => Value::uint(0),
                };
                Ok(Signal::Return(v))
            }
            StmtKind::Break => Ok(Signal::Break),
            StmtKind::Continue => Ok(Signal::Continue),
            StmtKind::Block(stmts) => self.exec_block(stmts),
            StmtKind::FunctionCallStmt(expr) => {
                self.eval_expr(expr)?;
                Ok(Signal::None)
            }
        }
    }

    fn run_for_loop(
        &mut self,
        init: &Option<Box<Stmt>>,
        condition: &Option<Expr>,
        step: &Option<Box<Stmt>>,
        body: &Stmt,
    ) -> Result<Signal, RuntimeError> {
        if let Some(init) = init {
            self.exec_stmt(init)?;
        }
        loop {
            let cond_true = match condition {
                Some(e) => self.eval_expr(e)?.is_truthy(),
                None => true,
            };
            if !cond_true {
                break;
            }
            match self.exec_stmt(body)? {
                Signal::Break => break,
                Signal::Return(v) => return Ok(Signal::Return(v)),
                Signal::None | Signal::Continue => {}
            }
            if let Some(step) = step {
                self.exec_stmt(step)?;
            }
        }
        Ok(Signal::None)
    }

    fn step_scalar(&mut self, name: &Symbol, delta: i32, span: &Span) -> Result<Signal, RuntimeError> {
        let (bits, ty) = self
            .env
            .lookup_scalar(name)
            .ok_or_else(|| self.undefined_variable(name, span))?;
        let new_bits = match ty {
            Ty::Int32 => (bits as i32).wrapping_add(delta) as u32,
            Ty::Uint32 => (bits as i32).wrapping_add(delta) as u32,
        };
        self.env.assign_scalar(name, new_bits);
        if let Some(num) = self.env.lookup_register_num(name) {
            self.registers.write(num, new_bits)?;
        }
        Ok(Signal::None)
    }

    fn undefined_variable(&self, name: &Symbol, span: &Span) -> RuntimeError {
        RuntimeError::UndefinedVariable {
            name: name.to_string(),
            span: span.clone(),
        }
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(v) => Ok(Value::uint(*v)),
            Expr::Identifier(name) => {
                let (bits, ty) = self
                    .env
                    .lookup_scalar(name)
                    .ok_or_else(|| self.undefined_variable(name, &Span::dummy()))?;
                Ok(Value::typed(bits, ty))
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right),
            Expr::Unary { op, operand } => {
                let v = self.eval_expr(operand)?;
                Ok(match op {
                    UnOp::Neg => Value::int(v.as_i32().wrapping_neg()),
                    UnOp::Not => Value::bool_uint(!v.is_truthy()),
                    UnOp::BitNot => Value::typed(!v.bits, v.ty),
                })
            }
            Expr::Call { name, args } => self.eval_call(name, args),
            Expr::ArrayAccess { name, index } => {
                let idx = self.eval_expr(index)?.as_u32();
                let len = self
                    .env
                    .array_len(name)
                    .ok_or_else(|| self.undefined_variable(name, &Span::dummy()))?;
                if idx >= len {
                    return Err(RuntimeError::ArrayOutOfBounds {
                        name: name.to_string(),
                        index: idx,
                        size: len,
                        span: Span::dummy(),
                    });
                }
                Ok(Value::uint(self.env.array_get(name, idx).unwrap()))
            }
            Expr::AddressOf(operand) => self.eval_address_of(operand),
            Expr::Dereference(operand) => {
                let address = self.eval_expr(operand)?.as_u32();
                self.env
                    .deref_read(address)
                    .map(Value::uint)
                    .ok_or(RuntimeError::InvalidDereference {
                        address,
                        span: Span::dummy(),
                    })
            }
        }
    }

    fn eval_address_of(&mut self, operand: &Expr) -> Result<Value, RuntimeError> {
        match operand {
            Expr::Identifier(name) => self
                .env
                .address_of_scalar(name)
                .map(Value::uint)
                .ok_or_else(|| self.undefined_variable(name, &Span::dummy())),
            Expr::ArrayAccess { name, index } => {
                let idx = self.eval_expr(index)?.as_u32();
                let len = self
                    .env
                    .array_len(name)
                    .ok_or_else(|| self.undefined_variable(name, &Span::dummy()))?;
                if idx >= len {
                    return Err(RuntimeError::ArrayOutOfBounds {
                        name: name.to_string(),
                        index: idx,
                        size: len,
                        span: Span::dummy(),
                    });
                }
                Ok(Value::uint(self.env.address_of_array_elem(name, idx).unwrap()))
            }
            Expr::Dereference(inner) => self.eval_expr(inner),
            _ => Err(RuntimeError::NotAddressable { span: Span::dummy() }),
        }
    }

    fn eval_call(&mut self, name: &Symbol, args: &[Expr]) -> Result<Value, RuntimeError> {
        let arg_values = args
            .iter()
            .map(|a| self.eval_expr(a))
            .collect::<Result<Vec<_>, _>>()?;

        if builtins::is_builtin(name.as_str()) {
            let raw: Vec<u32> = arg_values.iter().map(|v| v.as_u32()).collect();
            let result = builtins::call(&mut self.peripherals, name.as_str(), &raw)?;
            return Ok(Value::uint(result));
        }

        let func = *self
            .functions
            .get(name.as_str())
            .ok_or_else(|| RuntimeError::UndefinedFunction {
                name: name.to_string(),
                span: Span::dummy(),
            })?;
        self.call_function(func, &arg_values)
    }

    fn eval_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<Value, RuntimeError> {
        if matches!(op, BinOp::LogAnd | BinOp::LogOr) {
            let l = self.eval_expr(left)?;
            return match op {
                BinOp::LogAnd if !l.is_truthy() => Ok(Value::bool_uint(false)),
                BinOp::LogOr if l.is_truthy() => Ok(Value::bool_uint(true)),
                _ => {
                    let r = self.eval_expr(right)?;
                    Ok(Value::bool_uint(r.is_truthy()))
                }
            };
        }

        let l = self.eval_expr(left)?;
        let r = self.eval_expr(right)?;
        let result_ty = Value::arith_result_ty(l.ty, r.ty);

        let bits = match op {
            BinOp::Add => arith(result_ty, l, r, |a, b| a.wrapping_add(b), |a, b| a.wrapping_add(b)),
            BinOp::Sub => arith(result_ty, l, r, |a, b| a.wrapping_sub(b), |a, b| a.wrapping_sub(b)),
            BinOp::Mul => arith(result_ty, l, r, |a, b| a.wrapping_mul(b), |a, b| a.wrapping_mul(b)),
            BinOp::Div => {
                if r.bits == 0 {
                    return Err(RuntimeError::DivByZero { span: Span::dummy() });
                }
                arith(result_ty, l, r, |a, b| a.wrapping_div(b), |a, b| a.wrapping_div(b))
            }
            BinOp::Mod => {
                if r.bits == 0 {
                    return Err(RuntimeError::ModByZero { span: Span::dummy() });
                }
                arith(result_ty, l, r, |a, b| a.wrapping_rem(b), |a, b| a.wrapping_rem(b))
            }
            BinOp::BitAnd => l.bits & r.bits,
            BinOp::BitOr => l.bits | r.bits,
            BinOp::BitXor => l.bits ^ r.bits,
            BinOp::Shl => shift(result_ty, l, r, |a, n| a.wrapping_shl(n), |a, n| a.wrapping_shl(n)),
            BinOp::Shr => shift(result_ty, l, r, |a, n| a.wrapping_shr(n), |a, n| a.wrapping_shr(n)),
            BinOp::Eq => return Ok(Value::bool_uint(compare(result_ty, l, r, |a, b| a == b, |a, b| a == b))),
            BinOp::Ne => return Ok(Value::bool_uint(compare(result_ty, l, r, |a, b| a != b, |a, b| a != b))),
            BinOp::Lt => return Ok(Value::bool_uint(compare(result_ty, l, r, |a, b| a < b, |a, b| a < b))),
            BinOp::Le => return Ok(Value::bool_uint(compare(result_ty, l, r, |a, b| a <= b, |a, b| a <= b))),
            BinOp::Gt => return Ok(Value::bool_uint(compare(result_ty, l, r, |a, b| a > b, |a, b| a > b))),
            BinOp::Ge => return Ok(Value::bool_uint(compare(result_ty, l, r, |a, b| a >= b, |a, b| a >= b))),
            BinOp::LogAnd | BinOp::LogOr => unreachable!("handled above"),
        };
        Ok(Value::typed(bits, result_ty))
    }
}

fn arith(
    ty: Ty,
    l: Value,
    r: Value,
    int_op: impl Fn(i32, i32) -> i32,
    uint_op: impl Fn(u32, u32) -> u32,
) -> u32 {
    match ty {
        Ty::Int32 => int_op(l.as_i32(), r.as_i32()) as u32,
        Ty::Uint32 => uint_op(l.as_u32(), r.as_u32()),
    }
}

fn shift(
    ty: Ty,
    l: Value,
    r: Value,
    int_op: impl Fn(i32, u32) -> i32,
    uint_op: impl Fn(u32, u32) -> u32,
) -> u32 {
    let count = r.as_u32() & 0x1F;
    match ty {
        Ty::Int32 => int_op(l.as_i32(), count) as u32,
        Ty::Uint32 => uint_op(l.as_u32(), count),
    }
}

fn compare(
    ty: Ty,
    l: Value,
    r: Value,
    int_op: impl Fn(i32, i32) -> bool,
    uint_op: impl Fn(u32, u32) -> bool,
) -> bool {
    match ty {
        Ty::Int32 => int_op(l.as_i32(), r.as_i32()),
        Ty::Uint32 => uint_op(l.as_u32(), r.as_u32()),
    }
}
