//! Lowers a validated AST into textual ISA assembly.
//!
//! Mnemonic vocabulary (`mov/add/sub/and/or/xor/shl/shr/not/lds/cmpb/cmpe/
//! cmpa/cmovz/cmovnz/hlt/outu/inu/dd`) and the calling convention follow a
//! fixed-register-allocation model; `setu/setg/getg/outg` extend that
//! GPIO/UART naming to the rest of the built-in call surface (timer/delay/
//! interrupt control).

use rustc_hash::FxHashMap;
use sc_par::ast::{BinOp, Expr, FunctionDef, GlobalDecl, Program, Stmt, StmtKind, UnOp};
use sc_util::Symbol;

use crate::error::EmitError;
use crate::regalloc::{LocalAllocator, TempPool, IP_REG, RETURN_REG, SP_REG};

const ISA_HEADER: &str = "isa.inc";
const ENTRY_MACROS: &str = "macros.inc";

/// Scratch register used to hold a callee's return address while it is
/// popped off the stack; distinct from `r0`, which already holds the
/// function's result at that point.
const RETURN_ADDR_SCRATCH: u8 = 29;

fn reg_name(n: u8) -> String {
    format!("r{n}")
}

fn builtin_arity(name: &str) -> Option<usize> {
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
        "delay_ms" | "delay_us" | "delay_cycles" => 1,
        "enable_interrupts" | "disable_interrupts" => 0,
        "set_bit" | "clear_bit" | "toggle_bit" | "get_bit" => 2,
        _ => return None,
    };
    Some(arity)
}

#[derive(Clone)]
enum GlobalSlot {
    Scalar(String),
    Array(String),
    Register(u8),
}

struct LoopCtx {
    start_label: String,
    end_label: String,
    step_label: Option<String>,
}

/// Walks one [`Program`] and accumulates its assembly listing. State is
/// reset per function (`locals`, `temps`, `stack_offset`, ...); `globals`,
/// `data`, `code` and `label_counter` persist across the whole run.
pub struct Emitter<'p> {
    program: &'p Program,
    function_labels: FxHashMap<String, String>,
    globals: FxHashMap<Symbol, GlobalSlot>,
    data: Vec<String>,
    code: Vec<String>,
    label_counter: u32,
    current_function: String,
    locals: LocalAllocator,
    temps: TempPool,
    stack_offset: u32,
    local_offsets: FxHashMap<Symbol, u32>,
    local_arrays: FxHashMap<Symbol, (String, u32)>,
    loop_stack: Vec<LoopCtx>,
    has_explicit_return: bool,
}

/// Emits a complete assembly listing for `program`.
pub fn generate(program: &Program) -> Result<String, EmitError> {
    Emitter::new(program).run()
}

impl<'p> Emitter<'p> {
    fn new(program: &'p Program) -> Self {
        let mut function_labels = FxHashMap::default();
        for func in &program.functions {
            let label = if func.name.as_str() == "main" {
                "main".to_string()
            } else {
                format!("func_{}", func.name)
            };
            function_labels.insert(func.name.to_string(), label);
        }

        Emitter {
            program,
            function_labels,
            globals: FxHashMap::default(),
            data: Vec::new(),
            code: Vec::new(),
            label_counter: 0,
            current_function: String::new(),
            locals: LocalAllocator::new(),
            temps: TempPool::new(),
            stack_offset: 0,
            local_offsets: FxHashMap::default(),
            local_arrays: FxHashMap::default(),
            loop_stack: Vec::new(),
            has_explicit_return: false,
        }
    }

    fn run(mut self) -> Result<String, EmitError> {
        self.code.push(";format binary".to_string());
        self.code.push(String::new());
        self.code.push(format!("include \"{ISA_HEADER}\""));

        let program = self.program;
        let has_main = program.functions.iter().any(|f| f.name.as_str() == "main");
        if has_main {
            self.code.push(format!("include \"{ENTRY_MACROS}\""));
        }
        self.code.push(String::new());

        for global in &program.globals {
            self.emit_global(global)?;
        }

        let mut main_func = None;
        let mut other_funcs = Vec::new();
        for func in &program.functions {
            if func.name.as_str() == "main" {
                main_func = Some(func);
            } else {
                other_funcs.push(func);
            }
        }

        if has_main {
            self.code.push("entry main".to_string());
            self.code.push(String::new());
        }

        if let Some(func) = main_func {
            self.emit_function(func)?;
        }
        for func in other_funcs {
            self.emit_function(func)?;
        }

        if !self.data.is_empty() {
            self.code.push(String::new());
            self.code.push("; Data section".to_string());
            self.code.append(&mut self.data);
        }

        Ok(self.code.join("\n"))
    }

    // -- emission helpers -------------------------------------------------

    fn label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}_{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    fn push(&mut self, instruction: String) {
        self.code.push(format!("\t{instruction}"));
    }

    fn label_line(&mut self, label: &str) {
        self.code.push(format!("{label}:"));
    }

    fn comment(&mut self, text: &str) {
        self.code.push(format!("\t; {text}"));
    }

    fn array_label(&self, name: &Symbol) -> Result<String, EmitError> {
        if let Some((label, _)) = self.local_arrays.get(name) {
            return Ok(label.clone());
        }
        if let Some(GlobalSlot::Array(label)) = self.globals.get(name) {
            return Ok(label.clone());
        }
        Err(EmitError::UndefinedVariable {
            name: name.to_string(),
        })
    }

    // -- globals ------------------------------------------------------------

    fn emit_global(&mut self, global: &GlobalDecl) -> Result<(), EmitError> {
        match global {
            GlobalDecl::Var(decl) => {
                if decl.is_register {
                    let reg_num = decl.register_num.ok_or_else(|| EmitError::InvalidRegisterName {
                        name: decl.name.to_string(),
                    })?;
                    self.globals
                        .insert(decl.name.clone(), GlobalSlot::Register(reg_num));
                    return Ok(());
                }
                let label = format!("var_{}", decl.name);
                self.globals
                    .insert(decl.name.clone(), GlobalSlot::Scalar(label.clone()));
                let value = match &decl.init {
                    Some(Expr::Literal(v)) => *v,
                    _ => 0,
                };
                self.data.push(format!("{label}:"));
                self.data.push(format!("\tdd {value}"));
                Ok(())
            }
            GlobalDecl::Array(decl) => {
                let label = format!("array_{}", decl.name);
                self.globals
                    .insert(decl.name.clone(), GlobalSlot::Array(label.clone()));
                self.data.push(format!("{label}:"));
                let provided = decl.init.as_deref().unwrap_or(&[]);
                for expr in provided {
                    let value = match expr {
                        Expr::Literal(v) => *v,
                        _ => 0,
                    };
                    self.data.push(format!("\tdd {value}"));
                }
                for _ in provided.len()..decl.size as usize {
                    self.data.push("\tdd 0".to_string());
                }
                Ok(())
            }
            GlobalDecl::Pointer(decl) => {
                let label = format!("var_{}", decl.name);
                self.globals
                    .insert(decl.name.clone(), GlobalSlot::Scalar(label.clone()));
                self.data.push(format!("{label}:"));
                self.data.push("\tdd 0".to_string());
                Ok(())
            }
        }
    }

    // -- functions ------------------------------------------------------------

    fn emit_function(&mut self, func: &FunctionDef) -> Result<(), EmitError> {
        self.current_function = func.name.to_string();
        self.locals = LocalAllocator::new();
        self.temps = TempPool::new();
        self.stack_offset = 0;
        self.local_offsets.clear();
        self.local_arrays.clear();
        self.loop_stack.clear();
        self.has_explicit_return = false;

        let label = self
            .function_labels
            .get(func.name.as_str())
            .cloned()
            .expect("function label precomputed in Emitter::new");
        self.code.push(String::new());
        self.label_line(&label);
        self.comment(&format!("Function: {}", func.name));

        let is_main = func.name.as_str() == "main";
        if !is_main {
            self.stack_offset += 1 + func.params.len() as u32;
        }

        for (i, param) in func.params.iter().enumerate() {
            let param_reg = self.locals.alloc(param, &self.current_function)?;
            let addr_reg = self.temps.alloc(&[]);
            self.push(format!("mov {}, {}", reg_name(addr_reg), reg_name(SP_REG)));
            let offset = 1 + i as u32;
            let offset_reg = self.temps.alloc(&[addr_reg]);
            self.push(format!("mov {}, {offset}", reg_name(offset_reg)));
            self.push(format!(
                "add {0}, {0}, {1}",
                reg_name(addr_reg),
                reg_name(offset_reg)
            ));
            self.push(format!(
                "lds {}, [{}]",
                reg_name(param_reg),
                reg_name(addr_reg)
            ));
        }

        for stmt in &func.body {
            self.emit_stmt(stmt)?;
        }

        if !self.has_explicit_return {
            self.comment("Implicit return 0");
            self.emit_epilogue(0, is_main);
        }
        Ok(())
    }

    /// Shared tail of every `return`, explicit or implicit: deposit `value`
    /// (already materialized in a register by the caller) isn't handled
    /// here — only the unconditional `r0 = 0` / restore-and-jump sequence
    /// common to both paths.
    fn emit_epilogue(&mut self, zero: u32, is_main: bool) {
        self.push(format!("mov {}, {zero}", reg_name(RETURN_REG)));
        if is_main {
            self.push("hlt".to_string());
        } else {
            self.push(format!(
                "lds {}, [{}]",
                reg_name(RETURN_ADDR_SCRATCH),
                reg_name(SP_REG)
            ));
            self.push(format!("add {0}, {0}, 1", reg_name(SP_REG)));
            self.push(format!(
                "mov {}, {}",
                reg_name(IP_REG),
                reg_name(RETURN_ADDR_SCRATCH)
            ));
        }
    }

    // -- statements ------------------------------------------------------------

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), EmitError> {
        match &stmt.kind {
            StmtKind::Var(decl) => self.emit_var_decl(decl),
            StmtKind::Array(decl) => self.emit_local_array_decl(decl),
            StmtKind::Pointer(decl) => self.emit_pointer_decl(decl),
            StmtKind::Assignment { name, value } => self.emit_assignment(name, value),
            StmtKind::ArrayAssignment { name, index, value } => {
                self.emit_array_assignment(name, index, value)
            }
            StmtKind::PointerAssignment { addr, value } => {
                self.emit_pointer_assignment(addr, value)
            }
            StmtKind::Increment { name, .. } => self.emit_step(name, "add"),
            StmtKind::Decrement { name, .. } => self.emit_step(name, "sub"),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.emit_if(condition, then_branch, else_branch.as_deref()),
            StmtKind::While { condition, body } => self.emit_while(condition, body),
            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => self.emit_for(init.as_deref(), condition.as_ref(), step.as_deref(), body),
            StmtKind::DoWhile { body, condition } => self.emit_do_while(body, condition),
            StmtKind::Return(value) => self.emit_return(value.as_ref()),
            StmtKind::Break => self.emit_break(),
            StmtKind::Continue => self.emit_continue(),
            StmtKind::Block(stmts) => {
                for s in stmts {
                    self.emit_stmt(s)?;
                }
                Ok(())
            }
            StmtKind::FunctionCallStmt(expr) => self.emit_expr(expr).map(|_| ()),
        }
    }

    fn emit_var_decl(&mut self, decl: &sc_par::ast::VarDecl) -> Result<(), EmitError> {
        if decl.is_register {
            let reg = decl.register_num.ok_or_else(|| EmitError::InvalidRegisterName {
                name: decl.name.to_string(),
            })?;
            self.locals.insert_fixed(&decl.name, reg);
            if let Some(init) = &decl.init {
                let value_reg = self.emit_expr(init)?;
                if value_reg != reg {
                    self.push(format!("mov {}, {}", reg_name(reg), reg_name(value_reg)));
                }
            }
            return Ok(());
        }

        let reg = self.locals.alloc(&decl.name, &self.current_function)?;
        self.local_offsets.insert(decl.name.clone(), self.stack_offset);
        self.stack_offset += 1;

        match &decl.init {
            Some(init) => {
                let value_reg = self.emit_expr(init)?;
                if value_reg != reg {
                    self.push(format!("mov {}, {}", reg_name(reg), reg_name(value_reg)));
                }
            }
            None => self.push(format!("mov {}, 0", reg_name(reg))),
        }
        Ok(())
    }

    fn emit_local_array_decl(&mut self, decl: &sc_par::ast::ArrayDecl) -> Result<(), EmitError> {
        let label = format!(
            "array_{}_{}_{}",
            self.current_function, decl.name, self.label_counter
        );
        self.label_counter += 1;
        self.data.push(format!("{label}:"));

        let provided = decl.init.as_deref().unwrap_or(&[]);
        for (i, expr) in provided.iter().enumerate() {
            match expr {
                Expr::Literal(v) => self.data.push(format!("\tdd {v}")),
                _ => {
                    self.data.push("\tdd 0".to_string());
                    let value_reg = self.emit_expr(expr)?;
                    let addr_reg = self.temps.alloc(&[value_reg]);
                    self.push(format!("mov {}, {label} addr", reg_name(addr_reg)));
                    let index_reg = self.temps.alloc(&[value_reg, addr_reg]);
                    self.push(format!("mov {}, {i}", reg_name(index_reg)));
                    self.push(format!(
                        "add {0}, {0}, {1}",
                        reg_name(addr_reg),
                        reg_name(index_reg)
                    ));
                    self.push(format!(
                        "lds [{}], {}",
                        reg_name(addr_reg),
                        reg_name(value_reg)
                    ));
                }
            }
        }
        for _ in provided.len()..decl.size as usize {
            self.data.push("\tdd 0".to_string());
        }

        self.local_arrays.insert(decl.name.clone(), (label, decl.size));
        Ok(())
    }

    fn emit_pointer_decl(&mut self, decl: &sc_par::ast::PointerDecl) -> Result<(), EmitError> {
        let reg = self.locals.alloc(&decl.name, &self.current_function)?;
        match &decl.init {
            Some(init) => {
                let addr_reg = self.emit_expr(init)?;
                if addr_reg != reg {
                    self.push(format!("mov {}, {}", reg_name(reg), reg_name(addr_reg)));
                }
            }
            None => self.push(format!("mov {}, 0", reg_name(reg))),
        }
        Ok(())
    }

    fn emit_assignment(&mut self, name: &Symbol, value: &Expr) -> Result<(), EmitError> {
        let value_reg = self.emit_expr(value)?;
        if let Some(slot) = self.globals.get(name).cloned() {
            match slot {
                GlobalSlot::Register(reg) => {
                    if value_reg != reg {
                        self.push(format!("mov {}, {}", reg_name(reg), reg_name(value_reg)));
                    }
                }
                GlobalSlot::Scalar(label) | GlobalSlot::Array(label) => {
                    let addr_reg = self.temps.alloc(&[value_reg]);
                    self.push(format!("mov {}, {label} addr", reg_name(addr_reg)));
                    self.push(format!(
                        "lds [{}], {}",
                        reg_name(addr_reg),
                        reg_name(value_reg)
                    ));
                }
            }
            return Ok(());
        }

        let reg = self
            .locals
            .get(name)
            .ok_or_else(|| EmitError::UndefinedVariable {
                name: name.to_string(),
            })?;
        if value_reg != reg {
            self.push(format!("mov {}, {}", reg_name(reg), reg_name(value_reg)));
        }
        Ok(())
    }

    fn emit_array_assignment(
        &mut self,
        name: &Symbol,
        index: &Expr,
        value: &Expr,
    ) -> Result<(), EmitError> {
        let index_reg = self.emit_expr(index)?;
        let value_reg = self.emit_expr(value)?;
        let label = self.array_label(name)?;
        let addr_reg = self.temps.alloc(&[index_reg, value_reg]);
        self.push(format!("mov {}, {label} addr", reg_name(addr_reg)));
        self.push(format!(
            "add {0}, {0}, {1}",
            reg_name(addr_reg),
            reg_name(index_reg)
        ));
        self.push(format!(
            "lds [{}], {}",
            reg_name(addr_reg),
            reg_name(value_reg)
        ));
        Ok(())
    }

    fn emit_pointer_assignment(&mut self, addr: &Expr, value: &Expr) -> Result<(), EmitError> {
        let addr_reg = self.emit_expr(addr)?;
        let value_reg = self.emit_expr(value)?;
        self.push(format!(
            "lds [{}], {}",
            reg_name(addr_reg),
            reg_name(value_reg)
        ));
        Ok(())
    }

    fn emit_step(&mut self, name: &Symbol, mnemonic: &str) -> Result<(), EmitError> {
        if let Some(slot) = self.globals.get(name).cloned() {
            match slot {
                GlobalSlot::Register(reg) => {
                    let one_reg = self.temps.alloc(&[reg]);
                    self.push(format!("mov {}, 1", reg_name(one_reg)));
                    self.push(format!(
                        "{mnemonic} {0}, {0}, {1}",
                        reg_name(reg),
                        reg_name(one_reg)
                    ));
                }
                GlobalSlot::Scalar(label) | GlobalSlot::Array(label) => {
                    let addr_reg = self.temps.alloc(&[]);
                    let value_reg = self.temps.alloc(&[addr_reg]);
                    self.push(format!("mov {}, {label} addr", reg_name(addr_reg)));
                    self.push(format!(
                        "lds {}, [{}]",
                        reg_name(value_reg),
                        reg_name(addr_reg)
                    ));
                    let one_reg = self.temps.alloc(&[addr_reg, value_reg]);
                    self.push(format!("mov {}, 1", reg_name(one_reg)));
                    self.push(format!(
                        "{mnemonic} {0}, {0}, {1}",
                        reg_name(value_reg),
                        reg_name(one_reg)
                    ));
                    self.push(format!(
                        "lds [{}], {}",
                        reg_name(addr_reg),
                        reg_name(value_reg)
                    ));
                }
            }
            return Ok(());
        }

        let reg = self
            .locals
            .get(name)
            .ok_or_else(|| EmitError::UndefinedVariable {
                name: name.to_string(),
            })?;
        let one_reg = self.temps.alloc(&[reg]);
        self.push(format!("mov {}, 1", reg_name(one_reg)));
        self.push(format!(
            "{mnemonic} {0}, {0}, {1}",
            reg_name(reg),
            reg_name(one_reg)
        ));
        Ok(())
    }

    fn emit_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), EmitError> {
        let condition_reg = self.emit_expr(condition)?;
        let else_label = self.label("else");
        let end_label = self.label("endif");

        if else_branch.is_some() {
            self.push(format!(
                "cmovz r31, {}, {else_label} addr",
                reg_name(condition_reg)
            ));
        } else {
            self.push(format!(
                "cmovz r31, {}, {end_label} addr",
                reg_name(condition_reg)
            ));
        }

        self.emit_stmt(then_branch)?;

        if else_branch.is_some() {
            self.push(format!("mov r31, {end_label} addr"));
        }
        if let Some(else_branch) = else_branch {
            self.label_line(&else_label);
            self.emit_stmt(else_branch)?;
        }
        self.label_line(&end_label);
        Ok(())
    }

    fn emit_while(&mut self, condition: &Expr, body: &Stmt) -> Result<(), EmitError> {
        let start_label = self.label("while_start");
        let end_label = self.label("while_end");
        self.loop_stack.push(LoopCtx {
            start_label: start_label.clone(),
            end_label: end_label.clone(),
            step_label: None,
        });

        self.label_line(&start_label);
        let condition_reg = self.emit_expr(condition)?;
        self.push(format!(
            "cmovz r31, {}, {end_label} addr",
            reg_name(condition_reg)
        ));
        self.emit_stmt(body)?;
        self.push(format!("mov r31, {start_label} addr"));
        self.label_line(&end_label);

        self.loop_stack.pop();
        Ok(())
    }

    fn emit_for(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        step: Option<&Stmt>,
        body: &Stmt,
    ) -> Result<(), EmitError> {
        if let Some(init) = init {
            self.emit_stmt(init)?;
        }

        let start_label = self.label("for_start");
        let step_label = step.map(|_| self.label("for_step"));
        let end_label = self.label("for_end");
        self.loop_stack.push(LoopCtx {
            start_label: start_label.clone(),
            end_label: end_label.clone(),
            step_label: step_label.clone(),
        });

        self.label_line(&start_label);
        if let Some(condition) = condition {
            let condition_reg = self.emit_expr(condition)?;
            self.push(format!(
                "cmovz r31, {}, {end_label} addr",
                reg_name(condition_reg)
            ));
        }

        self.emit_stmt(body)?;

        if let (Some(step), Some(step_label)) = (step, &step_label) {
            self.label_line(step_label);
            self.emit_stmt(step)?;
        }
        self.push(format!("mov r31, {start_label} addr"));
        self.label_line(&end_label);

        self.loop_stack.pop();
        Ok(())
    }

    /// `do { body } while (condition)`: the body runs once unconditionally
    /// before the first test; `continue` jumps to the condition check
    /// rather than to a separate step section.
    fn emit_do_while(&mut self, body: &Stmt, condition: &Expr) -> Result<(), EmitError> {
        let start_label = self.label("do_start");
        let cond_label = self.label("do_cond");
        let end_label = self.label("do_end");
        self.loop_stack.push(LoopCtx {
            start_label: cond_label.clone(),
            end_label: end_label.clone(),
            step_label: None,
        });

        self.label_line(&start_label);
        self.emit_stmt(body)?;
        self.label_line(&cond_label);
        let condition_reg = self.emit_expr(condition)?;
        self.push(format!(
            "cmovnz r31, {}, {start_label} addr",
            reg_name(condition_reg)
        ));
        self.label_line(&end_label);

        self.loop_stack.pop();
        Ok(())
    }

    fn emit_break(&mut self) -> Result<(), EmitError> {
        match self.loop_stack.last() {
            Some(ctx) => {
                self.push(format!("mov r31, {} addr", ctx.end_label));
                Ok(())
            }
            None => {
                tracing::warn!("break outside any loop in '{}'; ignored", self.current_function);
                Ok(())
            }
        }
    }

    fn emit_continue(&mut self) -> Result<(), EmitError> {
        match self.loop_stack.last() {
            Some(ctx) => {
                let target = ctx.step_label.as_ref().unwrap_or(&ctx.start_label);
                self.push(format!("mov r31, {target} addr"));
                Ok(())
            }
            None => {
                tracing::warn!(
                    "continue outside any loop in '{}'; ignored",
                    self.current_function
                );
                Ok(())
            }
        }
    }

    fn emit_return(&mut self, value: Option<&Expr>) -> Result<(), EmitError> {
        self.has_explicit_return = true;
        let value_reg = match value {
            Some(expr) => Some(self.emit_expr(expr)?),
            None => None,
        };
        let is_main = self.current_function == "main";
        match value_reg {
            Some(reg) if reg != RETURN_REG => {
                self.push(format!(
                    "mov {}, {}",
                    reg_name(RETURN_REG),
                    reg_name(reg)
                ));
            }
            Some(_) => {}
            None => self.push(format!("mov {}, 0", reg_name(RETURN_REG))),
        }
        if is_main {
            self.push("hlt".to_string());
        } else {
            self.push(format!(
                "lds {}, [{}]",
                reg_name(RETURN_ADDR_SCRATCH),
                reg_name(SP_REG)
            ));
            self.push(format!("add {0}, {0}, 1", reg_name(SP_REG)));
            self.push(format!(
                "mov {}, {}",
                reg_name(IP_REG),
                reg_name(RETURN_ADDR_SCRATCH)
            ));
        }
        Ok(())
    }

    // -- expressions ------------------------------------------------------------

    fn emit_expr(&mut self, expr: &Expr) -> Result<u8, EmitError> {
        match expr {
            Expr::Literal(v) => {
                let reg = self.temps.alloc(&[]);
                self.push(format!("mov {}, {v}", reg_name(reg)));
                Ok(reg)
            }
            Expr::Identifier(name) => self.emit_identifier(name),
            Expr::Binary { op, left, right } => self.emit_binary(*op, left, right),
            Expr::Unary { op, operand } => self.emit_unary(*op, operand),
            Expr::Call { name, args } => self.emit_call(name, args),
            Expr::ArrayAccess { name, index } => self.emit_array_access(name, index),
            Expr::AddressOf(operand) => self.emit_address_of(operand),
            Expr::Dereference(operand) => self.emit_dereference(operand),
        }
    }

    fn emit_identifier(&mut self, name: &Symbol) -> Result<u8, EmitError> {
        if let Some(slot) = self.globals.get(name).cloned() {
            return match slot {
                GlobalSlot::Register(reg) => Ok(reg),
                GlobalSlot::Scalar(label) | GlobalSlot::Array(label) => {
                    let addr_reg = self.temps.alloc(&[]);
                    let result_reg = self.temps.alloc(&[addr_reg]);
                    self.push(format!("mov {}, {label} addr", reg_name(addr_reg)));
                    self.push(format!(
                        "lds {}, [{}]",
                        reg_name(result_reg),
                        reg_name(addr_reg)
                    ));
                    Ok(result_reg)
                }
            };
        }
        self.locals
            .get(name)
            .ok_or_else(|| EmitError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn emit_array_access(&mut self, name: &Symbol, index: &Expr) -> Result<u8, EmitError> {
        let index_reg = self.emit_expr(index)?;
        let label = self.array_label(name)?;
        let addr_reg = self.temps.alloc(&[index_reg]);
        let result_reg = self.temps.alloc(&[index_reg, addr_reg]);
        self.push(format!("mov {}, {label} addr", reg_name(addr_reg)));
        self.push(format!(
            "add {0}, {0}, {1}",
            reg_name(addr_reg),
            reg_name(index_reg)
        ));
        self.push(format!(
            "lds {}, [{}]",
            reg_name(result_reg),
            reg_name(addr_reg)
        ));
        Ok(result_reg)
    }

    /// `&x`, `&arr[i]`, and `&*p` are the three addressable shapes; anything
    /// else (a literal, a binary expression, ...) has no address.
    fn emit_address_of(&mut self, operand: &Expr) -> Result<u8, EmitError> {
        match operand {
            Expr::Identifier(name) => {
                if let Ok(label) = self.array_label(name) {
                    let result_reg = self.temps.alloc(&[]);
                    self.push(format!("mov {}, {label} addr", reg_name(result_reg)));
                    return Ok(result_reg);
                }
                if let Some(slot) = self.globals.get(name).cloned() {
                    return match slot {
                        GlobalSlot::Scalar(label) => {
                            let result_reg = self.temps.alloc(&[]);
                            self.push(format!("mov {}, {label} addr", reg_name(result_reg)));
                            Ok(result_reg)
                        }
                        GlobalSlot::Array(label) => {
                            let result_reg = self.temps.alloc(&[]);
                            self.push(format!("mov {}, {label} addr", reg_name(result_reg)));
                            Ok(result_reg)
                        }
                        GlobalSlot::Register(_) => Err(EmitError::InvalidAddressOfOperand),
                    };
                }
                let offset = *self
                    .local_offsets
                    .get(name)
                    .ok_or(EmitError::InvalidAddressOfOperand)?;
                let result_reg = self.temps.alloc(&[]);
                self.push(format!("mov {}, {}", reg_name(result_reg), reg_name(SP_REG)));
                if offset > 0 {
                    let offset_reg = self.temps.alloc(&[result_reg]);
                    self.push(format!("mov {}, {offset}", reg_name(offset_reg)));
                    self.push(format!(
                        "add {0}, {0}, {1}",
                        reg_name(result_reg),
                        reg_name(offset_reg)
                    ));
                }
                Ok(result_reg)
            }
            Expr::ArrayAccess { name, index } => {
                let index_reg = self.emit_expr(index)?;
                let label = self.array_label(name)?;
                let addr_reg = self.temps.alloc(&[index_reg]);
                self.push(format!("mov {}, {label} addr", reg_name(addr_reg)));
                self.push(format!(
                    "add {0}, {0}, {1}",
                    reg_name(addr_reg),
                    reg_name(index_reg)
                ));
                Ok(addr_reg)
            }
            Expr::Dereference(inner) => self.emit_expr(inner),
            _ => Err(EmitError::InvalidAddressOfOperand),
        }
    }

    fn emit_dereference(&mut self, operand: &Expr) -> Result<u8, EmitError> {
        let addr_reg = self.emit_expr(operand)?;
        let result_reg = self.temps.alloc(&[addr_reg]);
        self.push(format!(
            "lds {}, [{}]",
            reg_name(result_reg),
            reg_name(addr_reg)
        ));
        Ok(result_reg)
    }

    fn emit_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<u8, EmitError> {
        match op {
            BinOp::LogAnd => return self.emit_log_and(left, right),
            BinOp::LogOr => return self.emit_log_or(left, right),
            _ => {}
        }

        let left_reg = self.emit_expr(left)?;
        let right_reg = self.emit_expr(right)?;
        Ok(match op {
            BinOp::Add => self.emit_binop_direct("add", left_reg, right_reg),
            BinOp::Sub => self.emit_binop_direct("sub", left_reg, right_reg),
            BinOp::BitAnd => self.emit_binop_direct("and", left_reg, right_reg),
            BinOp::BitOr => self.emit_binop_direct("or", left_reg, right_reg),
            BinOp::BitXor => self.emit_binop_direct("xor", left_reg, right_reg),
            BinOp::Shl => self.emit_binop_direct("shl", left_reg, right_reg),
            BinOp::Shr => self.emit_binop_direct("shr", left_reg, right_reg),
            BinOp::Mul => self.emit_mul(left_reg, right_reg),
            BinOp::Div => self.emit_div(left_reg, right_reg),
            BinOp::Mod => self.emit_mod(left_reg, right_reg),
            BinOp::Eq => self.emit_compare(left_reg, right_reg, "cmpe", true),
            BinOp::Ne => self.emit_compare(left_reg, right_reg, "cmpe", false),
            BinOp::Lt => self.emit_compare(left_reg, right_reg, "cmpb", true),
            BinOp::Ge => self.emit_compare(left_reg, right_reg, "cmpb", false),
            BinOp::Gt => self.emit_compare(left_reg, right_reg, "cmpa", true),
            BinOp::Le => self.emit_compare(left_reg, right_reg, "cmpa", false),
            BinOp::LogAnd | BinOp::LogOr => unreachable!("handled above"),
        })
    }

    fn emit_binop_direct(&mut self, mnemonic: &str, left_reg: u8, right_reg: u8) -> u8 {
        let result_reg = self.temps.alloc(&[left_reg, right_reg]);
        self.push(format!(
            "{mnemonic} {}, {}, {}",
            reg_name(result_reg),
            reg_name(left_reg),
            reg_name(right_reg)
        ));
        result_reg
    }

    /// Normalizes a `cmpb`/`cmpe`/`cmpa` result (0 or −1) to 0/1: `result`
    /// is set to 1 when the compare register is nonzero if `set_when_nonzero`,
    /// or when it is zero otherwise. Covers all six relational operators
    /// with one routine by choosing the primitive and the polarity.
    fn emit_compare(
        &mut self,
        left_reg: u8,
        right_reg: u8,
        mnemonic: &str,
        set_when_nonzero: bool,
    ) -> u8 {
        let temp_cmp = self.temps.alloc(&[left_reg, right_reg]);
        self.push(format!(
            "{mnemonic} {}, {}, {}",
            reg_name(temp_cmp),
            reg_name(left_reg),
            reg_name(right_reg)
        ));
        let result_reg = self.temps.alloc(&[left_reg, right_reg, temp_cmp]);
        let one_reg = self.temps.alloc(&[left_reg, right_reg, temp_cmp, result_reg]);
        self.push(format!("mov {}, 0", reg_name(result_reg)));
        self.push(format!("mov {}, 1", reg_name(one_reg)));
        let move_mnemonic = if set_when_nonzero { "cmovnz" } else { "cmovz" };
        self.push(format!(
            "{move_mnemonic} {}, {}, {}",
            reg_name(result_reg),
            reg_name(temp_cmp),
            reg_name(one_reg)
        ));
        result_reg
    }

    fn emit_log_and(&mut self, left: &Expr, right: &Expr) -> Result<u8, EmitError> {
        let result_reg = self.temps.alloc(&[]);
        self.push(format!("mov {}, 0", reg_name(result_reg)));
        let end_label = self.label("and_end");

        let left_reg = self.emit_expr(left)?;
        self.push(format!(
            "cmovz r31, {}, {end_label} addr",
            reg_name(left_reg)
        ));
        let right_reg = self.emit_expr(right)?;
        self.push(format!(
            "cmovz r31, {}, {end_label} addr",
            reg_name(right_reg)
        ));

        let one_reg = self.temps.alloc(&[left_reg, right_reg, result_reg]);
        self.push(format!("mov {}, 1", reg_name(one_reg)));
        self.push(format!("mov {}, {}", reg_name(result_reg), reg_name(one_reg)));
        self.label_line(&end_label);
        Ok(result_reg)
    }

    fn emit_log_or(&mut self, left: &Expr, right: &Expr) -> Result<u8, EmitError> {
        let result_reg = self.temps.alloc(&[]);
        self.push(format!("mov {}, 1", reg_name(result_reg)));
        let end_label = self.label("or_end");

        let left_reg = self.emit_expr(left)?;
        self.push(format!(
            "cmovnz r31, {}, {end_label} addr",
            reg_name(left_reg)
        ));
        let right_reg = self.emit_expr(right)?;
        self.push(format!(
            "cmovnz r31, {}, {end_label} addr",
            reg_name(right_reg)
        ));

        let zero_reg = self.temps.alloc(&[left_reg, right_reg, result_reg]);
        self.push(format!("mov {}, 0", reg_name(zero_reg)));
        self.push(format!("mov {}, {}", reg_name(result_reg), reg_name(zero_reg)));
        self.label_line(&end_label);
        Ok(result_reg)
    }

    fn emit_mul(&mut self, left_reg: u8, right_reg: u8) -> u8 {
        let left_temp = self.temps.alloc(&[left_reg, right_reg]);
        let right_temp = self.temps.alloc(&[left_reg, right_reg, left_temp]);
        self.push(format!("mov {}, {}", reg_name(left_temp), reg_name(left_reg)));
        self.push(format!("mov {}, {}", reg_name(right_temp), reg_name(right_reg)));

        let result_reg = self.temps.alloc(&[left_temp, right_temp]);
        self.push(format!("mov {}, 0", reg_name(result_reg)));
        let loop_label = self.label("mul_loop");
        let end_label = self.label("mul_end");

        self.label_line(&loop_label);
        self.push(format!(
            "cmovz r31, {}, {end_label} addr",
            reg_name(right_temp)
        ));
        self.push(format!(
            "add {0}, {0}, {1}",
            reg_name(result_reg),
            reg_name(left_temp)
        ));
        let one_reg = self.temps.alloc(&[left_temp, right_temp, result_reg]);
        self.push(format!("mov {}, 1", reg_name(one_reg)));
        self.push(format!(
            "sub {0}, {0}, {1}",
            reg_name(right_temp),
            reg_name(one_reg)
        ));
        self.push(format!("mov r31, {loop_label} addr"));
        self.label_line(&end_label);
        result_reg
    }

    fn emit_div(&mut self, left_reg: u8, right_reg: u8) -> u8 {
        let left_temp = self.temps.alloc(&[left_reg, right_reg]);
        let right_temp = self.temps.alloc(&[left_reg, right_reg, left_temp]);
        self.push(format!("mov {}, {}", reg_name(left_temp), reg_name(left_reg)));
        self.push(format!("mov {}, {}", reg_name(right_temp), reg_name(right_reg)));

        let result_reg = self.temps.alloc(&[left_temp, right_temp]);
        self.push(format!("mov {}, 0", reg_name(result_reg)));

        let error_label = self.label("div_error");
        self.push(format!(
            "cmovz r31, {}, {error_label} addr",
            reg_name(right_temp)
        ));

        let loop_label = self.label("div_loop");
        let end_label = self.label("div_end");
        self.label_line(&loop_label);
        let temp_cmp = self.temps.alloc(&[left_temp, right_temp, result_reg]);
        self.push(format!(
            "cmpb {}, {}, {}",
            reg_name(temp_cmp),
            reg_name(left_temp),
            reg_name(right_temp)
        ));
        self.push(format!(
            "cmovnz r31, {}, {end_label} addr",
            reg_name(temp_cmp)
        ));
        self.push(format!(
            "sub {0}, {0}, {1}",
            reg_name(left_temp),
            reg_name(right_temp)
        ));
        let one_reg = self.temps.alloc(&[left_temp, right_temp, result_reg, temp_cmp]);
        self.push(format!("mov {}, 1", reg_name(one_reg)));
        self.push(format!(
            "add {0}, {0}, {1}",
            reg_name(result_reg),
            reg_name(one_reg)
        ));
        self.push(format!("mov r31, {loop_label} addr"));
        self.label_line(&end_label);

        let skip_error_label = self.label("div_skip_error");
        self.push(format!("mov r31, {skip_error_label} addr"));
        self.label_line(&error_label);
        self.push(format!("mov {}, 0", reg_name(result_reg)));
        self.label_line(&skip_error_label);
        result_reg
    }

    fn emit_mod(&mut self, left_reg: u8, right_reg: u8) -> u8 {
        let remainder_reg = self.temps.alloc(&[left_reg, right_reg]);
        let right_temp = self.temps.alloc(&[left_reg, right_reg, remainder_reg]);
        self.push(format!(
            "mov {}, {}",
            reg_name(remainder_reg),
            reg_name(left_reg)
        ));
        self.push(format!("mov {}, {}", reg_name(right_temp), reg_name(right_reg)));

        let error_label = self.label("mod_error");
        self.push(format!(
            "cmovz r31, {}, {error_label} addr",
            reg_name(right_temp)
        ));

        let loop_label = self.label("mod_loop");
        let end_label = self.label("mod_end");
        self.label_line(&loop_label);
        let temp_cmp = self.temps.alloc(&[remainder_reg, right_temp]);
        self.push(format!(
            "cmpb {}, {}, {}",
            reg_name(temp_cmp),
            reg_name(remainder_reg),
            reg_name(right_temp)
        ));
        self.push(format!(
            "cmovnz r31, {}, {end_label} addr",
            reg_name(temp_cmp)
        ));
        self.push(format!(
            "sub {0}, {0}, {1}",
            reg_name(remainder_reg),
            reg_name(right_temp)
        ));
        self.push(format!("mov r31, {loop_label} addr"));
        self.label_line(&end_label);

        let result_reg = self.temps.alloc(&[remainder_reg, right_temp, temp_cmp]);
        self.push(format!(
            "mov {}, {}",
            reg_name(result_reg),
            reg_name(remainder_reg)
        ));
        let skip_error_label = self.label("mod_skip_error");
        self.push(format!("mov r31, {skip_error_label} addr"));
        self.label_line(&error_label);
        self.push(format!("mov {}, 0", reg_name(result_reg)));
        self.label_line(&skip_error_label);
        result_reg
    }

    fn emit_unary(&mut self, op: UnOp, operand: &Expr) -> Result<u8, EmitError> {
        let operand_reg = self.emit_expr(operand)?;
        Ok(match op {
            UnOp::Not => {
                let zero_reg = self.temps.alloc(&[operand_reg]);
                self.push(format!("mov {}, 0", reg_name(zero_reg)));
                self.emit_compare(operand_reg, zero_reg, "cmpe", true)
            }
            UnOp::BitNot => {
                let result_reg = self.temps.alloc(&[operand_reg]);
                self.push(format!(
                    "not {}, {}",
                    reg_name(result_reg),
                    reg_name(operand_reg)
                ));
                result_reg
            }
            UnOp::Neg => {
                let zero_reg = self.temps.alloc(&[operand_reg]);
                let result_reg = self.temps.alloc(&[operand_reg, zero_reg]);
                self.push(format!("mov {}, 0", reg_name(zero_reg)));
                self.push(format!(
                    "sub {}, {}, {}",
                    reg_name(result_reg),
                    reg_name(zero_reg),
                    reg_name(operand_reg)
                ));
                result_reg
            }
        })
    }

    fn emit_call(&mut self, name: &Symbol, args: &[Expr]) -> Result<u8, EmitError> {
        if let Some(label) = self.function_labels.get(name.as_str()).cloned() {
            return self.emit_user_call(&label, args);
        }
        self.emit_builtin_call(name.as_str(), args)
    }

    fn emit_user_call(&mut self, label: &str, args: &[Expr]) -> Result<u8, EmitError> {
        for arg in args.iter().rev() {
            let arg_reg = self.emit_expr(arg)?;
            let temp_reg = self.temps.alloc(&[arg_reg]);
            if arg_reg != temp_reg {
                self.push(format!("mov {}, {}", reg_name(temp_reg), reg_name(arg_reg)));
            }
            self.push(format!("sub {0}, {0}, 1", reg_name(SP_REG)));
            self.push(format!(
                "lds [{}], {}",
                reg_name(SP_REG),
                reg_name(temp_reg)
            ));
        }

        let return_addr_label = self.label("ret_addr");
        let temp_reg = self.temps.alloc(&[]);
        self.push(format!(
            "mov {}, {return_addr_label} addr",
            reg_name(temp_reg)
        ));
        self.push(format!("sub {0}, {0}, 1", reg_name(SP_REG)));
        self.push(format!(
            "lds [{}], {}",
            reg_name(SP_REG),
            reg_name(temp_reg)
        ));
        self.push(format!("mov r31, {label} addr"));
        self.label_line(&return_addr_label);

        if !args.is_empty() {
            let cleanup_reg = self.temps.alloc(&[]);
            self.push(format!("mov {}, {}", reg_name(cleanup_reg), args.len()));
            self.push(format!(
                "add {0}, {0}, {1}",
                reg_name(SP_REG),
                reg_name(cleanup_reg)
            ));
        }

        let result_reg = self.temps.alloc(&[]);
        if result_reg != RETURN_REG {
            self.push(format!(
                "mov {}, {}",
                reg_name(result_reg),
                reg_name(RETURN_REG)
            ));
        }
        Ok(result_reg)
    }

    fn emit_builtin_call(&mut self, name: &str, args: &[Expr]) -> Result<u8, EmitError> {
        let expected = builtin_arity(name).ok_or_else(|| EmitError::UndefinedFunction {
            name: name.to_string(),
        })?;
        if args.len() != expected {
            return Err(EmitError::BuiltinArityMismatch {
                name: name.to_string(),
                expected,
                found: args.len(),
            });
        }

        let result_reg = self.temps.alloc(&[]);
        match name {
            "gpio_set" => {
                let pin_reg = self.emit_expr(&args[0])?;
                let dir_reg = self.emit_expr(&args[1])?;
                let mode_reg = self.emit_expr(&args[2])?;
                let packed = self.temps.alloc(&[pin_reg, dir_reg, mode_reg]);
                let temp2 = self.temps.alloc(&[pin_reg, dir_reg, mode_reg, packed]);
                self.push(format!("shl {}, {}, 16", reg_name(packed), reg_name(pin_reg)));
                self.push(format!("shl {}, {}, 8", reg_name(temp2), reg_name(dir_reg)));
                self.push(format!(
                    "or {0}, {0}, {1}",
                    reg_name(packed),
                    reg_name(temp2)
                ));
                self.push(format!(
                    "or {0}, {0}, {1}",
                    reg_name(packed),
                    reg_name(mode_reg)
                ));
                self.push(format!("setg {}", reg_name(packed)));
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "gpio_read" => {
                let pin_reg = self.emit_expr(&args[0])?;
                self.push(format!(
                    "getg {}, {}",
                    reg_name(result_reg),
                    reg_name(pin_reg)
                ));
            }
            "gpio_write" => {
                let pin_reg = self.emit_expr(&args[0])?;
                let value_reg = self.emit_expr(&args[1])?;
                let packed = self.temps.alloc(&[pin_reg, value_reg]);
                self.push(format!("shl {}, {}, 8", reg_name(packed), reg_name(pin_reg)));
                self.push(format!(
                    "or {0}, {0}, {1}",
                    reg_name(packed),
                    reg_name(value_reg)
                ));
                self.push(format!("outg {}", reg_name(packed)));
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "uart_set_baud" => {
                let baud_reg = self.emit_expr(&args[0])?;
                self.push(format!("setu {}", reg_name(baud_reg)));
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "uart_read" => {
                self.push(format!("inu {}", reg_name(result_reg)));
            }
            "uart_write" => {
                let data_reg = self.emit_expr(&args[0])?;
                self.push(format!("outu {}", reg_name(data_reg)));
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "timer_set_mode" => {
                let mode_reg = self.emit_expr(&args[0])?;
                self.push(format!("settm {}", reg_name(mode_reg)));
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "timer_set_period" => {
                let period_reg = self.emit_expr(&args[0])?;
                self.push(format!("settp {}", reg_name(period_reg)));
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "timer_start" => {
                self.push("startt".to_string());
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "timer_stop" => {
                self.push("stopt".to_string());
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "timer_reset" => {
                self.push("rstt".to_string());
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "timer_get_value" => {
                self.push(format!("gettv {}", reg_name(result_reg)));
            }
            "timer_expired" => {
                self.push(format!("gette {}", reg_name(result_reg)));
            }
            "delay_ms" | "delay_us" | "delay_cycles" => {
                let n_reg = self.emit_expr(&args[0])?;
                self.push(format!("dly {}", reg_name(n_reg)));
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "enable_interrupts" => {
                self.push("ei".to_string());
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "disable_interrupts" => {
                self.push("di".to_string());
                self.push(format!("mov {}, 0", reg_name(result_reg)));
            }
            "set_bit" | "clear_bit" | "toggle_bit" | "get_bit" => {
                let value_reg = self.emit_expr(&args[0])?;
                let bit_reg = self.emit_expr(&args[1])?;
                self.push(format!("and {0}, {0}, 31", reg_name(bit_reg)));

                if name == "get_bit" {
                    self.push(format!(
                        "shr {}, {}, {}",
                        reg_name(result_reg),
                        reg_name(value_reg),
                        reg_name(bit_reg)
                    ));
                    let one_reg = self.temps.alloc(&[value_reg, bit_reg, result_reg]);
                    self.push(format!("mov {}, 1", reg_name(one_reg)));
                    self.push(format!(
                        "and {0}, {0}, {1}",
                        reg_name(result_reg),
                        reg_name(one_reg)
                    ));
                } else {
                    let one_reg = self.temps.alloc(&[value_reg, bit_reg, result_reg]);
                    let mask_reg = self.temps.alloc(&[value_reg, bit_reg, result_reg, one_reg]);
                    self.push(format!("mov {}, 1", reg_name(one_reg)));
                    self.push(format!(
                        "shl {}, {}, {}",
                        reg_name(mask_reg),
                        reg_name(one_reg),
                        reg_name(bit_reg)
                    ));
                    match name {
                        "set_bit" => self.push(format!(
                            "or {}, {}, {}",
                            reg_name(result_reg),
                            reg_name(value_reg),
                            reg_name(mask_reg)
                        )),
                        "clear_bit" => {
                            let neg1 = self
                                .temps
                                .alloc(&[value_reg, bit_reg, result_reg, one_reg, mask_reg]);
                            self.push(format!("mov {}, -1", reg_name(neg1)));
                            self.push(format!(
                                "xor {0}, {0}, {1}",
                                reg_name(mask_reg),
                                reg_name(neg1)
                            ));
                            self.push(format!(
                                "and {}, {}, {}",
                                reg_name(result_reg),
                                reg_name(value_reg),
                                reg_name(mask_reg)
                            ));
                        }
                        "toggle_bit" => self.push(format!(
                            "xor {}, {}, {}",
                            reg_name(result_reg),
                            reg_name(value_reg),
                            reg_name(mask_reg)
                        )),
                        _ => unreachable!(),
                    }
                }
            }
            _ => {
                return Err(EmitError::UndefinedFunction {
                    name: name.to_string(),
                })
            }
        }
        Ok(result_reg)
    }
}
