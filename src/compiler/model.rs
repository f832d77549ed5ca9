use super::phases::types::Located;
use super::token::{Comparator, Registry};
use crate::common;
use static_assertions::const_assert_eq;
use std::fmt::Display;
use strum_macros::{Display as StrumDisplay, EnumIter};

/// Declarations without an explicit `[SIZE]` get this many bytes.
pub const DEFAULT_DYNAMIC_SIZE: u64 = 8;

pub const MAX_SYSCALL_NUMBER: i64 = 456;
pub const MAX_SYSCALL_ARGS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: String,
}

impl Identifier {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Identifier { name: name.into() }
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Str,
    Char,
    /// Any one of the alternatives. Only builtin signatures use this.
    Multi(Vec<Type>),
}

impl Type {
    /// Storage-class hint carried by each builtin type. These are not byte sizes.
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            Type::Int => Some(32),
            Type::Float => Some(64),
            Type::Str => Some(16),
            Type::Char => Some(2),
            Type::Multi(_) => None,
        }
    }

    pub fn accepts(&self, other: &Type) -> bool {
        match self {
            Type::Multi(alts) => alts.iter().any(|alt| alt.accepts(other)),
            ty => ty == other,
        }
    }

    /// Values of this type live in memory, so identifiers are passed by address.
    pub fn is_buffer(&self) -> bool {
        self.accepts(&Type::Str) || self.accepts(&Type::Char)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Str => write!(f, "str"),
            Type::Char => write!(f, "char"),
            Type::Multi(alts) => write!(
                f,
                "{}",
                alts.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("|")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(i64),
    Float(f64),
    String(String),
    Char(char),
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Number(_) => Type::Int,
            Literal::Float(_) => Type::Float,
            Literal::String(_) => Type::Str,
            Literal::Char(_) => Type::Char,
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{}", common::float_text(*x)),
            Literal::String(s) => write!(f, "\"{}\"", s),
            Literal::Char(c) => write!(f, "'{}'", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Literal),
    Identifier(Identifier),
    /// `*name`: load through the named storage.
    Deref(Identifier),
}

impl Value {
    /// Integer first, then float (only if it has a '.'), otherwise an identifier.
    pub fn classify(raw: &str) -> Value {
        if let Ok(n) = raw.parse::<i64>() {
            return Value::Literal(Literal::Number(n));
        }

        if raw.contains('.') {
            if let Ok(x) = raw.parse::<f64>() {
                return Value::Literal(Literal::Float(x));
            }
        }

        Value::Identifier(Identifier::new(raw))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Literal(lit) => write!(f, "{}", lit),
            Value::Identifier(id) => write!(f, "{}", id),
            Value::Deref(id) => write!(f, "*{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, EnumIter)]
pub enum Register {
    #[strum(serialize = "rax")]
    Rax,
    #[strum(serialize = "rbx")]
    Rbx,
    #[strum(serialize = "rcx")]
    Rcx,
    #[strum(serialize = "rdx")]
    Rdx,
    #[strum(serialize = "rsi")]
    Rsi,
    #[strum(serialize = "rdi")]
    Rdi,
    #[strum(serialize = "r8")]
    R8,
    #[strum(serialize = "r9")]
    R9,
    #[strum(serialize = "r10")]
    R10,
}

/// Linux x86-64 kernel ABI ordering.
pub const SYSCALL_ARG_REGISTERS: [Register; 6] = [
    Register::Rdi,
    Register::Rsi,
    Register::Rdx,
    Register::R10,
    Register::R8,
    Register::R9,
];

const_assert_eq!(SYSCALL_ARG_REGISTERS.len(), MAX_SYSCALL_ARGS);

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub identifier: Identifier,
    pub size: u64,
    pub ty: Type,
    pub value: Literal,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub identifier: Identifier,
    pub size: u64,
    pub ty: Type,
    pub value: Option<Literal>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pointer {
    pub identifier: Identifier,
    pub ty: Type,
    pub value: Literal,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub identifier: Identifier,
    pub ty: Type,
    pub default: Option<Literal>,
    pub register: Register,
}

/// A call argument after it has been bound to its parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentValue {
    pub identifier: Identifier,
    pub value: Value,
    pub register: Register,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub identifier: Identifier,
    pub arguments: Vec<Argument>,
    pub prebaked: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallFunction {
    pub identifier: Identifier,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Multiply,
    Divide,
    Addition,
    Subtraction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub op: ArithOp,
    pub left: Value,
    pub right: Value,
    pub assign_target: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyscallNumber {
    Literal(u16),
    Identifier(Identifier),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Syscall {
    pub number: SyscallNumber,
    pub args: Vec<Value>,
    pub error_identifier: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub left: Value,
    pub comparator: Comparator,
    pub right: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfElse {
    pub condition: Condition,
    pub if_body: Vec<Located<Statement>>,
    pub else_body: Vec<Located<Statement>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resize {
    Grow,
    Shrink,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Constant(Constant),
    Variable(Variable),
    Pointer(Pointer),
    BinaryOp(BinaryOp),
    Syscall(Syscall),
    IfElse(IfElse),
    Call(CallFunction),
    Resize(Resize, Identifier, u64),
    Empty(Identifier),
    Delete(Identifier),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Located<Statement>>,
    pub registry: Registry,
}

#[cfg(test)]
mod tests {
    use super::{Identifier, Literal, Type, Value};

    #[test]
    fn classify_operands() {
        assert_eq!(Value::classify("42"), Value::Literal(Literal::Number(42)));
        assert_eq!(Value::classify("-3"), Value::Literal(Literal::Number(-3)));
        assert_eq!(Value::classify("2.5"), Value::Literal(Literal::Float(2.5)));
        assert_eq!(
            Value::classify("inf"),
            Value::Identifier(Identifier::new("inf"))
        );
        assert_eq!(
            Value::classify("count"),
            Value::Identifier(Identifier::new("count"))
        );
    }

    #[test]
    fn multi_type_acceptance() {
        let ty = Type::Multi(vec![Type::Str, Type::Char]);
        assert!(ty.accepts(&Type::Str));
        assert!(ty.accepts(&Type::Char));
        assert!(!ty.accepts(&Type::Int));
        assert!(ty.is_buffer());
        assert!(!Type::Int.is_buffer());
        assert_eq!(ty.to_string(), "str|char");
        assert_eq!(ty.bit_width(), None);
        assert_eq!(Type::Char.bit_width(), Some(2));
    }
}
