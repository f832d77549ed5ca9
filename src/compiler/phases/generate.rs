use super::types::Located;
use crate::compiler::emit::{Asm, Section};
use crate::compiler::lang::Lang;
use crate::common;
use crate::compiler::model::{
    ArgumentValue, ArithOp, BinaryOp, CallFunction, Condition, Function, Identifier, IfElse,
    Literal, Program, Register, Resize, Statement, Syscall, SyscallNumber, Type, Value,
    DEFAULT_DYNAMIC_SIZE, MAX_SYSCALL_ARGS, SYSCALL_ARG_REGISTERS,
};
use crate::compiler::token::{Comparator, Registry};
use itertools::Itertools;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;
use std::fmt::Display;
use strum::IntoEnumIterator;

pub const ENTRY_LABEL: &str = "_start";
pub const MAIN_LABEL: &str = "main";

/// Label families minted by the generator itself. Each is followed by a decimal counter.
const GENERATED_LABEL_PREFIXES: [&str; 3] = ["if_block_", "else_block_", "__str_"];

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    UndeclaredIdentifier(String),
    DeletedIdentifier(String),
    DuplicateSymbol(String),
    ReservedSymbol(String),
    UnsupportedOperand(String, &'static str),
    TooManySyscallArgs(usize),
    UnknownFunction(String),
    TooManyArguments {
        function: String,
        expected: usize,
        found: usize,
    },
    MissingArgument {
        function: String,
        argument: String,
    },
    ArgumentTypeMismatch {
        function: String,
        argument: String,
        expected: Type,
        found: Type,
    },
    InvalidResize(String, &'static str),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UndeclaredIdentifier(name) => write!(f, "Use of undeclared identifier '{}'", name),
            Error::DeletedIdentifier(name) => write!(f, "Use of deleted identifier '{}'", name),
            Error::DuplicateSymbol(name) => write!(
                f,
                "Symbol '{}' is already defined in the generated assembly",
                name
            ),
            Error::ReservedSymbol(name) => write!(
                f,
                "Symbol '{}' collides with a label the compiler generates",
                name
            ),
            Error::UnsupportedOperand(op, msg) => {
                write!(f, "Unsupported operand '{}': {}", op, msg)
            }
            Error::TooManySyscallArgs(n) => write!(
                f,
                "Syscall given {} arguments, at most {} are allowed",
                n, MAX_SYSCALL_ARGS
            ),
            Error::UnknownFunction(name) => write!(f, "Unknown function '{}'", name),
            Error::TooManyArguments {
                function,
                expected,
                found,
            } => write!(
                f,
                "Function '{}' takes at most {} argument(s), {} were given",
                function, expected, found
            ),
            Error::MissingArgument { function, argument } => write!(
                f,
                "Missing argument '{}' in call to '{}'",
                argument, function
            ),
            Error::ArgumentTypeMismatch {
                function,
                argument,
                expected,
                found,
            } => write!(
                f,
                "Argument '{}' of '{}' expects '{}', found '{}'",
                argument, function, expected, found
            ),
            Error::InvalidResize(name, msg) => write!(f, "Cannot resize '{}': {}", name, msg),
        }
    }
}

fn jumps(cmp: Comparator) -> (&'static str, &'static str) {
    match cmp {
        Comparator::Eq => ("je", "jne"),
        Comparator::Ne => ("jne", "je"),
        Comparator::Gt => ("jg", "jle"),
        Comparator::Ge => ("jge", "jl"),
        Comparator::Lt => ("jl", "jge"),
        Comparator::Le => ("jle", "jg"),
    }
}

/// Backquoted so that escapes written in the source (e.g. `\n`) are honoured by nasm.
fn nasm_string(s: &str) -> String {
    format!("`{}`", s.replace('`', "\\`"))
}

fn nasm_float(x: f64) -> String {
    if x.is_nan() {
        String::from("__QNaN__")
    } else if x.is_infinite() {
        format!("{}__Infinity__", if x < 0.0 { "-" } else { "" })
    } else {
        common::float_text(x)
    }
}

fn data_directive(lit: &Literal) -> String {
    match lit {
        Literal::String(s) => format!("db {}, 0", nasm_string(s)),
        Literal::Char(c) => format!("db {}, 0", nasm_string(&c.to_string())),
        Literal::Number(n) => format!("dq {}", n),
        Literal::Float(x) => format!("dq {}", nasm_float(*x)),
    }
}

/// Whole quadwords covering `size` bytes.
fn reservation(name: &str, size: u64) -> String {
    format!("{} resq {}", name, size / 8 + u64::from(size % 8 != 0))
}

fn is_generated_label(name: &str) -> bool {
    GENERATED_LABEL_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .map_or(false, |n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
    })
}

/// `cmp` only encodes a sign-extended 32-bit immediate.
fn fits_cmp_immediate(value: &Value) -> bool {
    match value {
        Value::Literal(Literal::Number(n)) => i32::try_from(*n).is_ok(),
        _ => false,
    }
}

fn is_memory(value: &Value) -> bool {
    match value {
        Value::Identifier(_) | Value::Deref(_) => true,
        Value::Literal(_) => false,
    }
}

#[derive(Debug)]
struct Symbol {
    ty: Type,
    size: u64,
    section: Section,
}

struct Generator<'a> {
    asm: Asm,
    registry: &'a Registry,
    symbols: HashMap<String, Symbol>,
    deleted: HashSet<String>,
    blocks: usize,
    strings: usize,
}

impl<'a> Generator<'a> {
    fn new(registry: &'a Registry) -> Self {
        Generator {
            asm: Asm::new(),
            registry,
            symbols: HashMap::new(),
            deleted: HashSet::new(),
            blocks: 0,
            strings: 0,
        }
    }

    fn entry(&mut self) {
        self.asm.extend(
            Section::Text,
            ENTRY_LABEL,
            vec![
                format!("global {}", ENTRY_LABEL),
                format!("{}:", ENTRY_LABEL),
                format!("call {}", MAIN_LABEL),
                String::from("mov rax, 60"),
                String::from("mov rdi, 0"),
                String::from("syscall"),
            ],
        );
    }

    fn builtins(&mut self) {
        for function in Lang::get().functions() {
            if let Some(lines) = &function.prebaked {
                self.asm
                    .extend(Section::Text, &function.identifier.name, lines.iter().cloned());
            }
        }
    }

    fn lookup(&self, id: &Identifier) -> Result<&Symbol, Error> {
        if self.deleted.contains(&id.name) {
            return Err(Error::DeletedIdentifier(id.name.clone()));
        }

        self.symbols
            .get(&id.name)
            .ok_or_else(|| Error::UndeclaredIdentifier(id.name.clone()))
    }

    /// Memory operand for `id`. Storage declared elsewhere (or not at all) is left to the
    /// assembler to resolve, only a `del`eted name is refused.
    fn memory(&self, id: &Identifier) -> Result<String, Error> {
        if self.deleted.contains(&id.name) {
            return Err(Error::DeletedIdentifier(id.name.clone()));
        }
        Ok(format!("[{}]", id.name))
    }

    /// Places a string literal in the data section, returning its label.
    fn intern(&mut self, s: &str) -> String {
        let label = format!("__str_{}", self.strings);
        self.strings += 1;
        self.asm.push(
            Section::Data,
            &label,
            format!("{} {}", label, data_directive(&Literal::String(s.to_owned()))),
        );
        label
    }

    fn operand(&self, value: &Value) -> Result<String, Error> {
        match value {
            Value::Literal(Literal::Number(n)) => Ok(n.to_string()),
            Value::Literal(lit @ Literal::Float(_)) => Err(Error::UnsupportedOperand(
                lit.to_string(),
                "floating point values cannot be used in integer arithmetic",
            )),
            Value::Literal(lit) => Err(Error::UnsupportedOperand(
                lit.to_string(),
                "string literals cannot be used as operands",
            )),
            Value::Identifier(id) | Value::Deref(id) => self.memory(id),
        }
    }

    fn declare(
        &mut self,
        id: &Identifier,
        ty: &Type,
        size: u64,
        value: Option<&Literal>,
    ) -> Result<(), Error> {
        let name = &id.name;
        if self.symbols.contains_key(name)
            || Section::iter().any(|section| self.asm.contains(section, name))
        {
            return Err(Error::DuplicateSymbol(name.clone()));
        }
        if is_generated_label(name) {
            return Err(Error::ReservedSymbol(name.clone()));
        }

        let section = match value {
            Some(lit) => {
                self.asm.push(
                    Section::Data,
                    name,
                    format!("{} {}", name, data_directive(lit)),
                );
                Section::Data
            }
            None => {
                self.asm.push(Section::Bss, name, reservation(name, size));
                Section::Bss
            }
        };

        trace!("declared '{}' in .{}", name, section);

        self.symbols.insert(
            name.clone(),
            Symbol {
                ty: ty.clone(),
                size,
                section,
            },
        );
        Ok(())
    }

    fn arithmetic(&mut self, label: &str, op: &BinaryOp) -> Result<(), Error> {
        let left = self.operand(&op.left)?;
        let right = self.operand(&op.right)?;
        let target = self.memory(&op.assign_target)?;
        let (acc, scratch) = (Register::Rax, Register::Rbx);

        let mut lines = match op.op {
            ArithOp::Multiply => vec![
                format!("mov {}, {}", acc, left),
                format!("mov {}, {}", scratch, right),
                format!("imul {}, {}", acc, scratch),
            ],
            ArithOp::Divide => vec![
                format!("mov {}, {}", acc, left),
                format!("mov {}, {}", Register::Rcx, right),
                format!("xor {0}, {0}", Register::Rdx),
                format!("idiv {}", Register::Rcx),
            ],
            ArithOp::Addition => vec![
                format!("mov {}, {}", acc, left),
                format!("mov {}, {}", scratch, right),
                format!("add {}, {}", acc, scratch),
            ],
            ArithOp::Subtraction => vec![
                format!("mov {}, {}", acc, left),
                format!("mov {}, {}", scratch, right),
                format!("sub {}, {}", acc, scratch),
            ],
        };
        lines.push(format!("mov {}, {}", target, acc));

        self.asm.extend(Section::Text, label, lines);
        Ok(())
    }

    fn syscall_arg(&mut self, arg: &Value) -> Result<String, Error> {
        match arg {
            Value::Deref(id) => self.memory(id),
            Value::Identifier(id) if self.registry.role_of(&id.name).is_some() => self.memory(id),
            Value::Identifier(id) => Ok(id.name.clone()),
            Value::Literal(Literal::Number(n)) => Ok(n.to_string()),
            Value::Literal(Literal::Float(x)) => Ok(format!("__float64__({})", nasm_float(*x))),
            Value::Literal(Literal::String(s)) => Ok(self.intern(s)),
            Value::Literal(Literal::Char(c)) => Ok(self.intern(&c.to_string())),
        }
    }

    fn syscall(&mut self, label: &str, syscall: &Syscall) -> Result<(), Error> {
        if syscall.args.len() > MAX_SYSCALL_ARGS {
            return Err(Error::TooManySyscallArgs(syscall.args.len()));
        }

        let number = match &syscall.number {
            SyscallNumber::Literal(n) => n.to_string(),
            SyscallNumber::Identifier(id) => self.memory(id)?,
        };

        let mut lines = vec![format!("mov {}, {}", Register::Rax, number)];
        for (reg, arg) in SYSCALL_ARG_REGISTERS.iter().zip(syscall.args.iter()) {
            lines.push(format!("mov {}, {}", reg, self.syscall_arg(arg)?));
        }
        lines.push(String::from("syscall"));
        lines.push(format!(
            "mov {}, {}",
            self.memory(&syscall.error_identifier)?,
            Register::Rax
        ));

        self.asm.extend(Section::Text, label, lines);
        Ok(())
    }

    fn value_type(&self, value: &Value) -> Result<Type, Error> {
        match value {
            Value::Literal(lit) => Ok(lit.ty()),
            Value::Identifier(id) | Value::Deref(id) => Ok(self.lookup(id)?.ty.clone()),
        }
    }

    fn bind(&self, function: &Function, args: &[Value]) -> Result<Vec<ArgumentValue>, Error> {
        if args.len() > function.arguments.len() {
            return Err(Error::TooManyArguments {
                function: function.identifier.name.clone(),
                expected: function.arguments.len(),
                found: args.len(),
            });
        }

        function
            .arguments
            .iter()
            .enumerate()
            .map(|(idx, argument)| {
                let value = match (args.get(idx), &argument.default) {
                    (Some(value), _) => value.clone(),
                    (None, Some(default)) => Value::Literal(default.clone()),
                    (None, None) => {
                        return Err(Error::MissingArgument {
                            function: function.identifier.name.clone(),
                            argument: argument.identifier.name.clone(),
                        })
                    }
                };

                let found = self.value_type(&value)?;
                if !argument.ty.accepts(&found) {
                    return Err(Error::ArgumentTypeMismatch {
                        function: function.identifier.name.clone(),
                        argument: argument.identifier.name.clone(),
                        expected: argument.ty.clone(),
                        found,
                    });
                }

                Ok(ArgumentValue {
                    identifier: argument.identifier.clone(),
                    value,
                    register: argument.register,
                })
            })
            .collect()
    }

    fn call_arg(&mut self, ty: &Type, value: &Value) -> Result<String, Error> {
        match value {
            Value::Literal(Literal::Number(n)) => Ok(n.to_string()),
            Value::Literal(Literal::Float(x)) => Ok(format!("__float64__({})", nasm_float(*x))),
            Value::Literal(Literal::String(s)) => Ok(self.intern(s)),
            Value::Literal(Literal::Char(c)) => Ok(self.intern(&c.to_string())),
            // Buffers are handed over by address.
            Value::Identifier(id) if ty.is_buffer() => {
                self.lookup(id)?;
                Ok(id.name.clone())
            }
            Value::Identifier(id) | Value::Deref(id) => self.memory(id),
        }
    }

    fn call(&mut self, label: &str, call: &CallFunction) -> Result<(), Error> {
        let function = Lang::get()
            .lookup_function(&call.identifier.name)
            .ok_or_else(|| Error::UnknownFunction(call.identifier.name.clone()))?;

        let bound = self.bind(function, &call.args)?;

        let mut lines = Vec::new();
        for (argument, value) in function.arguments.iter().zip(bound.iter()) {
            lines.push(format!(
                "mov {}, {}",
                value.register,
                self.call_arg(&argument.ty, &value.value)?
            ));
        }
        lines.push(format!("call {}", function.identifier));

        self.asm.extend(Section::Text, label, lines);
        Ok(())
    }

    fn resize(&mut self, dir: Resize, id: &Identifier, amount: u64) -> Result<(), Error> {
        self.lookup(id)?;

        let symbol = match self.symbols.get_mut(&id.name) {
            Some(symbol) => symbol,
            None => return Err(Error::UndeclaredIdentifier(id.name.clone())),
        };

        if symbol.section != Section::Bss {
            return Err(Error::InvalidResize(
                id.name.clone(),
                "only uninitialised variables can be resized",
            ));
        }

        let size = match dir {
            Resize::Grow => symbol.size.checked_add(amount),
            Resize::Shrink => symbol.size.checked_sub(amount),
        };
        symbol.size = match (size, dir) {
            (Some(size), _) => size,
            (None, Resize::Grow) => {
                return Err(Error::InvalidResize(id.name.clone(), "size overflows"))
            }
            (None, Resize::Shrink) => {
                return Err(Error::InvalidResize(
                    id.name.clone(),
                    "size would drop below zero",
                ))
            }
        };

        let line = reservation(&id.name, symbol.size);
        self.asm.replace(Section::Bss, &id.name, vec![line]);
        Ok(())
    }

    fn compare(&self, cond: &Condition) -> Result<Vec<String>, Error> {
        let left = self.operand(&cond.left)?;
        let right = self.operand(&cond.right)?;

        if is_memory(&cond.left) && fits_cmp_immediate(&cond.right) {
            return Ok(vec![format!("cmp qword {}, {}", left, right)]);
        }

        let mut lines = vec![format!("mov {}, {}", Register::Rax, left)];
        if is_memory(&cond.right) || fits_cmp_immediate(&cond.right) {
            lines.push(format!("cmp {}, {}", Register::Rax, right));
        } else {
            lines.push(format!("mov {}, {}", Register::Rbx, right));
            lines.push(format!("cmp {}, {}", Register::Rax, Register::Rbx));
        }
        Ok(lines)
    }

    fn if_else(
        &mut self,
        label: &str,
        at: &Located<Statement>,
        if_else: &IfElse,
    ) -> Result<(), Located<Error>> {
        let n = self.blocks;
        self.blocks += 1;

        let then_label = format!("if_block_{}", n);
        let else_label = format!("else_block_{}", n);
        let (jump, inverse) = jumps(if_else.condition.comparator);

        let mut lines = self
            .compare(&if_else.condition)
            .map_err(|err| at.transfer(err))?;
        lines.extend(vec![
            format!("{} .then_{}", jump, n),
            format!("{} .else_{}", inverse, n),
            format!(".then_{}:", n),
            format!("call {}", then_label),
            format!("jmp .end_{}", n),
            format!(".else_{}:", n),
            format!("call {}", else_label),
            format!(".end_{}:", n),
        ]);
        self.asm.extend(Section::Text, label, lines);

        for (block, body) in vec![(&then_label, &if_else.if_body), (&else_label, &if_else.else_body)] {
            self.asm.push(Section::Text, block, format!("{}:", block));
            self.body(block, body)?;
            self.asm.push(Section::Text, block, "ret");
        }

        Ok(())
    }

    fn statement(&mut self, label: &str, stmt: &Statement) -> Result<(), Error> {
        match stmt {
            Statement::Constant(c) => self.declare(&c.identifier, &c.ty, c.size, Some(&c.value)),
            Statement::Variable(v) => self.declare(&v.identifier, &v.ty, v.size, v.value.as_ref()),
            Statement::Pointer(p) => {
                self.declare(&p.identifier, &p.ty, DEFAULT_DYNAMIC_SIZE, Some(&p.value))
            }
            Statement::BinaryOp(op) => self.arithmetic(label, op),
            Statement::Syscall(syscall) => self.syscall(label, syscall),
            Statement::Call(call) => self.call(label, call),
            Statement::Resize(dir, id, amount) => self.resize(*dir, id, *amount),
            Statement::Empty(id) => {
                let target = self.memory(id)?;
                self.asm
                    .push(Section::Text, label, format!("mov qword {}, 0", target));
                Ok(())
            }
            Statement::Delete(id) => {
                self.lookup(id)?;
                self.deleted.insert(id.name.clone());
                Ok(())
            }
            // Handled by `body`, which knows where the statement came from.
            Statement::IfElse(_) => Ok(()),
        }
    }

    fn body(&mut self, label: &str, statements: &[Located<Statement>]) -> Result<(), Located<Error>> {
        for stmt in statements {
            match stmt.value_ref() {
                Statement::IfElse(if_else) => self.if_else(label, stmt, if_else)?,
                other => self
                    .statement(label, other)
                    .map_err(|err| stmt.transfer(err))?,
            }
        }
        Ok(())
    }
}

pub fn generate(program: Program) -> Result<Asm, Located<Error>> {
    let mut gen = Generator::new(&program.registry);

    gen.entry();
    gen.builtins();
    gen.asm.push(Section::Text, MAIN_LABEL, format!("{}:", MAIN_LABEL));
    gen.body(MAIN_LABEL, &program.statements)?;
    gen.asm.push(Section::Text, MAIN_LABEL, "ret");

    debug!(
        "generated {} symbol(s), {} block pair(s), text labels: {}",
        gen.symbols.len(),
        gen.blocks,
        gen.asm
            .blocks(Section::Text)
            .iter()
            .map(|b| b.label())
            .join(", ")
    );

    Ok(gen.asm)
}

#[cfg(test)]
mod tests {
    use super::super::types::{Loc, Located};
    use super::super::{parse, tokenize};
    use super::{generate, Error};
    use crate::compiler::emit::{Asm, Section};
    use crate::compiler::model::Type;
    use crate::compiler::source::Source;

    fn asm(src: &str) -> Asm {
        try_asm(src).unwrap()
    }

    fn try_asm(src: &str) -> Result<Asm, Located<Error>> {
        generate(parse(tokenize(&Source::new(src)).unwrap()).unwrap())
    }

    fn gen_err(src: &str) -> Error {
        try_asm(src).unwrap_err().value()
    }

    fn lines(asm: &Asm, section: Section, label: &str) -> Vec<String> {
        asm.get(section, label).unwrap().lines().to_vec()
    }

    fn main_body(asm: &Asm) -> Vec<String> {
        let lines = lines(asm, Section::Text, "main");
        lines[1..lines.len() - 1].to_vec()
    }

    #[test]
    fn multiply_uses_rax_rbx() {
        let asm = asm("var r: int;\nmul (2, 3) into r;");
        assert_eq!(
            main_body(&asm),
            vec!["mov rax, 2", "mov rbx, 3", "imul rax, rbx", "mov [r], rax"]
        );
    }

    #[test]
    fn syscall_register_order() {
        let asm = asm("const msg: str = \"Hello World\";\nvar err: int;\nsyscall 1, 1, msg, 11, err;");
        assert_eq!(
            main_body(&asm),
            vec![
                "mov rax, 1",
                "mov rdi, 1",
                "mov rsi, [msg]",
                "mov rdx, 11",
                "syscall",
                "mov [err], rax",
            ]
        );
    }

    #[test]
    fn syscall_uses_all_six_registers() {
        let asm = asm("var err: int;\nsyscall 9, 1, 2, 3, 4, 5, 6, err;");
        assert_eq!(
            main_body(&asm)[1..7],
            [
                "mov rdi, 1",
                "mov rsi, 2",
                "mov rdx, 3",
                "mov r10, 4",
                "mov r8, 5",
                "mov r9, 6",
            ]
        );
    }

    #[test]
    fn syscall_operand_kinds() {
        let asm = asm(
            "var nr: int = 1;\nvar fd: int = 1;\nvar err: int;\nsyscall nr, *fd, \"hi\", LEN, 1.5, err;",
        );
        assert_eq!(
            main_body(&asm),
            vec![
                "mov rax, [nr]",
                "mov rdi, [fd]",
                "mov rsi, __str_0",
                "mov rdx, LEN",
                "mov r10, __float64__(1.5)",
                "syscall",
                "mov [err], rax",
            ]
        );
        assert_eq!(
            lines(&asm, Section::Data, "__str_0"),
            vec!["__str_0 db `hi`, 0"]
        );
    }

    #[test]
    fn divide_keeps_right_operand_in_rcx() {
        let asm = asm("var a: int = 10;\nvar q: int;\ndiv (a, 3) into q;");
        assert_eq!(
            main_body(&asm),
            vec![
                "mov rax, [a]",
                "mov rcx, 3",
                "xor rdx, rdx",
                "idiv rcx",
                "mov [q], rax",
            ]
        );
    }

    #[test]
    fn literal_right_operand_never_replaces_left() {
        let asm = asm("var a: int = 10;\nadd (a, 3) into a;\nsub (a, 4) into a;");
        assert_eq!(
            main_body(&asm),
            vec![
                "mov rax, [a]",
                "mov rbx, 3",
                "add rax, rbx",
                "mov [a], rax",
                "mov rax, [a]",
                "mov rbx, 4",
                "sub rax, rbx",
                "mov [a], rax",
            ]
        );
    }

    #[test]
    fn data_and_bss_directives() {
        let asm = asm(
            "const msg: str = \"Hi`there\";\nconst c: char = 'z';\nconst n[100]: int = 100;\nvar f: float = 2.5;\nvar buf[20]: str;\nptr p: int;",
        );
        let data = asm
            .blocks(Section::Data)
            .iter()
            .map(|b| b.lines().join("\n"))
            .collect::<Vec<_>>();
        assert_eq!(
            data,
            vec![
                "msg db `Hi\\`there`, 0",
                "c db `z`, 0",
                "n dq 100",
                "f dq 2.5",
                "p dq 0",
            ]
        );
        assert_eq!(lines(&asm, Section::Bss, "buf"), vec!["buf resq 3"]);
    }

    #[test]
    fn symbols_share_one_namespace() {
        assert_eq!(
            gen_err("var x: int;\nconst x: int = 1;"),
            Error::DuplicateSymbol(String::from("x"))
        );
        assert_eq!(
            gen_err("var printi: int;"),
            Error::DuplicateSymbol(String::from("printi"))
        );
    }

    #[test]
    fn float_arithmetic_is_rejected() {
        assert_eq!(
            gen_err("var r: int;\nadd (1.5, 2) into r;"),
            Error::UnsupportedOperand(
                String::from("1.5"),
                "floating point values cannot be used in integer arithmetic"
            )
        );
    }

    #[test]
    fn undeclared_storage_is_left_to_the_assembler() {
        let product = asm("mul (2, 3) into r;");
        assert_eq!(
            main_body(&product),
            vec!["mov rax, 2", "mov rbx, 3", "imul rax, rbx", "mov [r], rax"]
        );
        assert!(product.get(Section::Bss, "r").is_none());

        let write = asm("const msg: str = \"Hello World\";\nsyscall 1, 1, msg, 11, err;");
        assert_eq!(
            main_body(&write),
            vec![
                "mov rax, 1",
                "mov rdi, 1",
                "mov rsi, [msg]",
                "mov rdx, 11",
                "syscall",
                "mov [err], rax",
            ]
        );
    }

    #[test]
    fn deleted_identifiers_are_refused() {
        assert_eq!(
            gen_err("var r: int;\ndel r;\nmul (2, 3) into r;"),
            Error::DeletedIdentifier(String::from("r"))
        );
        assert_eq!(
            try_asm("var r: int;\ndel r;\nemt r;").unwrap_err(),
            Located::with_loc(
                Loc::new(3, 1),
                Error::DeletedIdentifier(String::from("r"))
            )
        );
    }

    #[test]
    fn empty_zeroes_storage() {
        let asm = asm("var r: int = 4;\nemt r;");
        assert_eq!(main_body(&asm), vec!["mov qword [r], 0"]);
    }

    #[test]
    fn resizing_reservations() {
        let asm = asm("var b[8]: str;\nsize_inc b, 16;\nsize_dec b, 8;");
        assert_eq!(lines(&asm, Section::Bss, "b"), vec!["b resq 2"]);

        assert_eq!(
            gen_err("var b[8]: str;\nsize_dec b, 9;"),
            Error::InvalidResize(String::from("b"), "size would drop below zero")
        );
        assert_eq!(
            gen_err("var b: int = 1;\nsize_inc b, 8;"),
            Error::InvalidResize(
                String::from("b"),
                "only uninitialised variables can be resized"
            )
        );
    }

    #[test]
    fn reservation_near_the_top_of_the_address_space() {
        let asm = asm(
            "var b[8]: str;\nsize_inc b, 9223372036854775807;\nsize_inc b, 9223372036854775797;",
        );
        assert_eq!(
            lines(&asm, Section::Bss, "b"),
            vec!["b resq 2305843009213693952"]
        );
    }

    #[test]
    fn generated_label_names_are_reserved() {
        assert_eq!(
            gen_err("var if_block_0: int;\nif (1 == 1) {\n}"),
            Error::ReservedSymbol(String::from("if_block_0"))
        );
        assert_eq!(
            gen_err("const else_block_12: int = 1;"),
            Error::ReservedSymbol(String::from("else_block_12"))
        );
        assert_eq!(
            gen_err("var __str_0: int;"),
            Error::ReservedSymbol(String::from("__str_0"))
        );

        let asm = asm("var if_block: int;\nvar __str_x: int;\nif (1 == 1) {\n}");
        assert!(asm.get(Section::Bss, "if_block").is_some());
        assert!(asm.get(Section::Text, "if_block_0").is_some());
    }

    #[test]
    fn wide_literals_are_compared_through_a_register() {
        let asm = asm(
            "var x: int;\nif (x == 5000000000) {\n}\nif (1 < -2147483649) {\n}\nif (x != -2147483648) {\n}",
        );
        let body = main_body(&asm);
        assert_eq!(
            body[0..4],
            ["mov rax, [x]", "mov rbx, 5000000000", "cmp rax, rbx", "je .then_0"]
        );
        assert_eq!(
            body[11..15],
            ["mov rax, 1", "mov rbx, -2147483649", "cmp rax, rbx", "jl .then_1"]
        );
        assert_eq!(body[22..24], ["cmp qword [x], -2147483648", "jne .then_2"]);
    }

    #[test]
    fn floats_are_written_with_a_decimal_point() {
        let asm = asm("var big: float = 100000000000000000000.0;\nvar err: int;\nsyscall 1, 0.0000001, err;");
        assert_eq!(lines(&asm, Section::Data, "big"), vec!["big dq 1.0e20"]);
        assert_eq!(main_body(&asm)[1], "mov rdi, __float64__(1.0e-7)");
    }

    #[test]
    fn if_else_dispatch() {
        let asm = asm("var x: int = 1;\nif (x == 1) {\n    emt x;\n} else {\n    exit(3);\n}");
        assert_eq!(
            main_body(&asm),
            vec![
                "cmp qword [x], 1",
                "je .then_0",
                "jne .else_0",
                ".then_0:",
                "call if_block_0",
                "jmp .end_0",
                ".else_0:",
                "call else_block_0",
                ".end_0:",
            ]
        );
        assert_eq!(
            lines(&asm, Section::Text, "if_block_0"),
            vec!["if_block_0:", "mov qword [x], 0", "ret"]
        );
        assert_eq!(
            lines(&asm, Section::Text, "else_block_0"),
            vec!["else_block_0:", "mov rdi, 3", "call exit", "ret"]
        );
    }

    #[test]
    fn comparison_operand_placement() {
        let asm = asm(
            "var x: int;\nvar y: int;\nif (1 < x) {\n}\nif (x >= y) {\n}\nif (1 =< 2) {\n}",
        );
        let body = main_body(&asm);
        assert_eq!(body[0..4], ["mov rax, 1", "cmp rax, [x]", "jl .then_0", "jge .else_0"]);
        assert_eq!(body[10..14], ["mov rax, [x]", "cmp rax, [y]", "jge .then_1", "jl .else_1"]);
        assert_eq!(body[20..24], ["mov rax, 1", "cmp rax, 2", "jle .then_2", "jg .else_2"]);
    }

    #[test]
    fn nested_blocks_get_fresh_labels_in_order() {
        let asm = asm("if (1 == 1) {\n    if (2 != 3) {\n    }\n}");
        let labels = asm
            .blocks(Section::Text)
            .iter()
            .map(|b| b.label().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![
                "_start",
                "exit",
                "printi",
                "prints",
                "main",
                "if_block_0",
                "if_block_1",
                "else_block_1",
                "else_block_0",
            ]
        );
    }

    #[test]
    fn builtin_calls() {
        let asm = asm("const msg: str = \"Hello\";\nvar n: int = 5;\nprints(msg, 5);\nprinti(n);\nprints(\"ok\", 2);\nexit;");
        assert_eq!(
            main_body(&asm),
            vec![
                "mov rsi, msg",
                "mov rdx, 5",
                "call prints",
                "mov rdi, [n]",
                "call printi",
                "mov rsi, __str_0",
                "mov rdx, 2",
                "call prints",
                "mov rdi, 0",
                "call exit",
            ]
        );
    }

    #[test]
    fn builtin_call_errors() {
        assert_eq!(
            gen_err("const msg: str = \"Hello\";\nprints(msg);"),
            Error::MissingArgument {
                function: String::from("prints"),
                argument: String::from("length"),
            }
        );
        assert_eq!(
            gen_err("exit(1, 2);"),
            Error::TooManyArguments {
                function: String::from("exit"),
                expected: 1,
                found: 2,
            }
        );
        assert_eq!(
            gen_err("var n: int;\nprints(n, 1);"),
            Error::ArgumentTypeMismatch {
                function: String::from("prints"),
                argument: String::from("char_seq"),
                expected: Type::Multi(vec![Type::Str, Type::Char]),
                found: Type::Int,
            }
        );
    }

    #[test]
    fn entry_calls_main_then_exits() {
        let asm = asm("");
        assert_eq!(
            lines(&asm, Section::Text, "_start"),
            vec![
                "global _start",
                "_start:",
                "call main",
                "mov rax, 60",
                "mov rdi, 0",
                "syscall",
            ]
        );
        assert_eq!(lines(&asm, Section::Text, "main"), vec!["main:", "ret"]);
    }
}
