use super::tokenize::{LineTokens, Tokens};
use super::types::{Loc, Located};
use crate::common;
use crate::compiler::lang::Lang;
use crate::compiler::model::{
    ArithOp, BinaryOp, CallFunction, Condition, Constant, Identifier, IfElse, Literal, Pointer,
    Program, Resize, Statement, Syscall, SyscallNumber, Type, Value, Variable,
    DEFAULT_DYNAMIC_SIZE, MAX_SYSCALL_ARGS, MAX_SYSCALL_NUMBER,
};
use crate::compiler::token::{Keyword, Role, Size, Symbol, Token};
use log::{debug, trace};
use std::convert::TryFrom;
use std::fmt::Display;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    UnexpectedEndOfLine(&'static str),
    UnknownType(String),
    InvalidSize(String),
    InvalidValue {
        ty: Type,
        raw: String,
    },
    InvalidSyscallNumber(i64),
    TooManySyscallArgs(usize),
    UnbalancedBrace,
    ElseWithoutIf,
    UnclosedBlock,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnexpectedToken { expected, found } => {
                write!(f, "Expected {}, found {}", expected, found)
            }
            Error::UnexpectedEndOfLine(expected) => {
                write!(f, "Expected {}, found the end of the line", expected)
            }
            Error::UnknownType(ty) => write!(f, "Unknown type '{}'", ty),
            Error::InvalidSize(raw) => write!(
                f,
                "Invalid size '{}', expected a non-negative integer",
                raw
            ),
            Error::InvalidValue { ty, raw } => {
                write!(f, "Value '{}' is not a valid '{}'", raw, ty)
            }
            Error::InvalidSyscallNumber(n) => write!(
                f,
                "Syscall number {} out of range, expected 0 to {}",
                n, MAX_SYSCALL_NUMBER
            ),
            Error::TooManySyscallArgs(n) => write!(
                f,
                "Syscall given {} arguments, at most {} are allowed",
                n, MAX_SYSCALL_ARGS
            ),
            Error::UnbalancedBrace => write!(f, "Encountered '}}' with no open block"),
            Error::ElseWithoutIf => write!(f, "'else' must directly follow a closed 'if' block"),
            Error::UnclosedBlock => write!(f, "Block is never closed"),
        }
    }
}

fn unexpected(expected: &'static str, tok: Token) -> Error {
    Error::UnexpectedToken {
        expected,
        found: format!("'{}'", tok.raw_text()),
    }
}

fn literal_for(ty: &Type, raw: &str) -> Result<Literal, Error> {
    let invalid = || Error::InvalidValue {
        ty: ty.clone(),
        raw: raw.to_owned(),
    };

    match ty {
        Type::Int => common::parse_numeric(raw)
            .map(Literal::Number)
            .ok_or_else(invalid),
        Type::Float => raw.parse::<f64>().map(Literal::Float).map_err(|_| invalid()),
        Type::Str => common::unquote(raw)
            .map(|s| Literal::String(s.to_owned()))
            .ok_or_else(invalid),
        Type::Char => {
            let s = common::unquote(raw).ok_or_else(invalid)?;
            let mut cs = s.chars();
            match (cs.next(), cs.next()) {
                (Some(c), None) => Ok(Literal::Char(c)),
                _ => Err(invalid()),
            }
        }
        Type::Multi(_) => Err(invalid()),
    }
}

/// Positional reader over the (comment free) tokens of one line.
struct Cursor {
    line: usize,
    last: Option<Loc>,
    it: std::iter::Peekable<std::vec::IntoIter<Located<Token>>>,
}

impl Cursor {
    fn new(line: LineTokens) -> Self {
        let tokens = line
            .tokens
            .into_iter()
            .filter(|tok| match tok.value_ref() {
                Token::Comment(_) => false,
                _ => true,
            })
            .collect::<Vec<_>>();

        Cursor {
            line: line.line,
            last: None,
            it: tokens.into_iter().peekable(),
        }
    }

    fn peek(&mut self) -> Option<&Token> {
        self.it.peek().map(Located::value_ref)
    }

    fn is_empty(&mut self) -> bool {
        self.peek().is_none()
    }

    fn end(&self, expected: &'static str) -> Located<Error> {
        Located::with_loc(
            self.last.unwrap_or_else(|| Loc::new(self.line, 1)),
            Error::UnexpectedEndOfLine(expected),
        )
    }

    fn next(&mut self, expected: &'static str) -> Result<Located<Token>, Located<Error>> {
        match self.it.next() {
            Some(tok) => {
                self.last = tok.loc().or(self.last);
                Ok(tok)
            }
            None => Err(self.end(expected)),
        }
    }

    fn take<T, F>(&mut self, expected: &'static str, f: F) -> Result<Located<T>, Located<Error>>
    where
        F: FnOnce(Token) -> Result<T, Error>,
    {
        self.next(expected)?.map_result(f)
    }

    fn symbol(&mut self, sym: Symbol, expected: &'static str) -> Result<(), Located<Error>> {
        self.take(expected, |tok| match tok {
            Token::Symbol(s) if s == sym => Ok(()),
            tok => Err(unexpected(expected, tok)),
        })?;
        Ok(())
    }

    fn name(&mut self, expected: &'static str) -> Result<Identifier, Located<Error>> {
        Ok(self
            .take(expected, |tok| match tok {
                Token::Word(name) | Token::Ident(_, name) => Ok(Identifier::new(name)),
                tok => Err(unexpected(expected, tok)),
            })?
            .value())
    }

    fn size(&mut self) -> Result<u64, Located<Error>> {
        Ok(self
            .take("a size", |tok| match tok {
                Token::Size(Size::Dynamic) => Ok(DEFAULT_DYNAMIC_SIZE),
                Token::Size(Size::Fixed(raw)) => common::parse_numeric(&raw)
                    .and_then(|n| u64::try_from(n).ok())
                    .ok_or(Error::InvalidSize(raw)),
                tok => Err(unexpected("a size", tok)),
            })?
            .value())
    }

    fn ty(&mut self) -> Result<Type, Located<Error>> {
        Ok(self
            .take("a type", |tok| match tok {
                Token::Type(name) => Lang::get()
                    .lookup_type(&name)
                    .cloned()
                    .ok_or(Error::UnknownType(name)),
                tok => Err(unexpected("a type", tok)),
            })?
            .value())
    }

    fn value(&mut self, ty: &Type) -> Result<Literal, Located<Error>> {
        Ok(self
            .take("a value", |tok| match tok {
                Token::Value(raw) => literal_for(ty, &raw),
                tok => Err(unexpected("a value", tok)),
            })?
            .value())
    }

    fn maybe_value(&mut self, ty: &Type) -> Result<Option<Literal>, Located<Error>> {
        match self.peek() {
            Some(Token::Value(_)) => Ok(Some(self.value(ty)?)),
            _ => Ok(None),
        }
    }

    /// Bare words are re-classified from their text, literals are kept as the lexer built them.
    fn operand(&mut self, expected: &'static str) -> Result<Located<Value>, Located<Error>> {
        self.take(expected, |tok| match tok {
            Token::Word(raw) | Token::Ident(_, raw) => Ok(Value::classify(&raw)),
            Token::Literal(lit) => Ok(Value::Literal(lit)),
            Token::Deref(name) => Ok(Value::Deref(Identifier::new(name))),
            tok => Err(unexpected(expected, tok)),
        })
    }

    fn at_symbol(&mut self, sym: Symbol) -> bool {
        match self.peek() {
            Some(Token::Symbol(s)) => *s == sym,
            _ => false,
        }
    }

    fn end_of_line(&mut self) -> Result<(), Located<Error>> {
        match self.it.next() {
            None => Ok(()),
            Some(tok) => Err(tok.map(|tok| unexpected("the end of the line", tok))),
        }
    }

    fn finish(&mut self) -> Result<(), Located<Error>> {
        self.symbol(Symbol::Semicolon, "';'")?;
        self.end_of_line()
    }
}

enum Frame {
    If(Located<Condition>),
    Else(Located<IfElse>),
}

struct Parser {
    root: Vec<Located<Statement>>,
    frames: Vec<(Frame, Vec<Located<Statement>>)>,
    awaiting_else: bool,
}

impl Parser {
    fn new() -> Self {
        Parser {
            root: Vec::new(),
            frames: Vec::new(),
            awaiting_else: false,
        }
    }

    fn current(&mut self) -> &mut Vec<Located<Statement>> {
        match self.frames.last_mut() {
            Some((_, body)) => body,
            None => &mut self.root,
        }
    }

    fn push(&mut self, loc: Option<Loc>, stmt: Statement) {
        self.current()
            .push(Located::from(stmt).proximate_to_option_loc(loc));
    }

    fn close(&mut self, brace: Located<Token>) -> Result<(), Located<Error>> {
        let (frame, body) = match self.frames.pop() {
            Some(frame) => frame,
            None => return Err(brace.transfer(Error::UnbalancedBrace)),
        };

        match frame {
            Frame::If(cond) => {
                let loc = cond.loc();
                let stmt = Statement::IfElse(IfElse {
                    condition: cond.value(),
                    if_body: body,
                    else_body: Vec::new(),
                });
                self.push(loc, stmt);
                self.awaiting_else = true;
            }
            Frame::Else(if_else) => {
                let loc = if_else.loc();
                let mut if_else = if_else.value();
                if_else.else_body = body;
                self.push(loc, Statement::IfElse(if_else));
                self.awaiting_else = false;
            }
        }

        Ok(())
    }

    /// Reopens the `IfElse` just closed on a previous line so that its else body can be filled.
    fn open_else(&mut self, kw: Located<Token>, cur: &mut Cursor) -> Result<(), Located<Error>> {
        cur.symbol(Symbol::LBrace, "'{'")?;
        cur.end_of_line()?;

        let if_else = match self.current().pop() {
            None => return Err(kw.transfer(Error::ElseWithoutIf)),
            Some(stmt) => {
                let loc = stmt.loc();
                match stmt.value() {
                    Statement::IfElse(if_else) => {
                        Located::from(if_else).proximate_to_option_loc(loc)
                    }
                    other => {
                        self.push(loc, other);
                        return Err(kw.transfer(Error::ElseWithoutIf));
                    }
                }
            }
        };

        self.frames.push((Frame::Else(if_else), Vec::new()));
        Ok(())
    }

    fn line(&mut self, line: LineTokens) -> Result<(), Located<Error>> {
        let mut cur = Cursor::new(line);

        while cur.at_symbol(Symbol::RBrace) {
            let brace = cur.next("'}'")?;
            self.close(brace)?;
        }

        if cur.is_empty() {
            return Ok(());
        }

        let awaiting_else = std::mem::replace(&mut self.awaiting_else, false);
        let first = cur.next("a statement")?;
        let loc = first.loc();

        trace!("line {}: decoding {}", cur.line, first.value_ref());

        let stmt = match first.value_ref() {
            Token::Keyword(Keyword::Const) => Statement::Constant(constant(&mut cur)?),
            Token::Keyword(Keyword::Var) => Statement::Variable(variable(&mut cur)?),
            Token::Keyword(Keyword::Ptr) => Statement::Pointer(pointer(&mut cur)?),
            Token::Keyword(Keyword::Mul) => binary_op(ArithOp::Multiply, &mut cur)?,
            Token::Keyword(Keyword::Div) => binary_op(ArithOp::Divide, &mut cur)?,
            Token::Keyword(Keyword::Add) => binary_op(ArithOp::Addition, &mut cur)?,
            Token::Keyword(Keyword::Sub) => binary_op(ArithOp::Subtraction, &mut cur)?,
            Token::Keyword(Keyword::Syscall) => Statement::Syscall(syscall(&mut cur)?),
            Token::Keyword(Keyword::SizeInc) => resize(Resize::Grow, &mut cur)?,
            Token::Keyword(Keyword::SizeDec) => resize(Resize::Shrink, &mut cur)?,
            Token::Keyword(Keyword::Emt) => Statement::Empty(target(&mut cur)?),
            Token::Keyword(Keyword::Del) => Statement::Delete(target(&mut cur)?),
            Token::Keyword(Keyword::If) => {
                let cond = condition(&mut cur)?;
                let frame = Frame::If(Located::from(cond).proximate_to_option_loc(loc));
                self.frames.push((frame, Vec::new()));
                return Ok(());
            }
            Token::Keyword(Keyword::Else) => {
                if !awaiting_else {
                    return Err(first.transfer(Error::ElseWithoutIf));
                }
                return self.open_else(first, &mut cur);
            }
            Token::Ident(Role::Function, name) => Statement::Call(call(name, &mut cur)?),
            _ => {
                return Err(
                    first.map(|tok| unexpected("a keyword or a builtin function", tok))
                )
            }
        };

        self.push(loc, stmt);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Located<Statement>>, Located<Error>> {
        match self.frames.pop() {
            None => Ok(self.root),
            Some((Frame::If(cond), _)) => Err(cond.transfer(Error::UnclosedBlock)),
            Some((Frame::Else(if_else), _)) => Err(if_else.transfer(Error::UnclosedBlock)),
        }
    }
}

// [name, size, type, value]
fn constant(cur: &mut Cursor) -> Result<Constant, Located<Error>> {
    let line = cur.line;
    let identifier = cur.name("an identifier")?;
    let size = cur.size()?;
    let ty = cur.ty()?;
    let value = cur.value(&ty)?;
    cur.finish()?;

    Ok(Constant {
        identifier,
        size,
        ty,
        value,
        line,
    })
}

// [name, size, type, value?]
fn variable(cur: &mut Cursor) -> Result<Variable, Located<Error>> {
    let line = cur.line;
    let identifier = cur.name("an identifier")?;
    let size = cur.size()?;
    let ty = cur.ty()?;
    let value = cur.maybe_value(&ty)?;
    cur.finish()?;

    Ok(Variable {
        identifier,
        size,
        ty,
        value,
        line,
    })
}

// [name, type, value?]
fn pointer(cur: &mut Cursor) -> Result<Pointer, Located<Error>> {
    let line = cur.line;
    let identifier = cur.name("an identifier")?;
    let ty = cur.ty()?;
    let value = cur.maybe_value(&ty)?.unwrap_or(Literal::Number(0));
    cur.finish()?;

    Ok(Pointer {
        identifier,
        ty,
        value,
        line,
    })
}

// [left, right, target]
fn binary_op(op: ArithOp, cur: &mut Cursor) -> Result<Statement, Located<Error>> {
    let left = cur.operand("a left operand")?.value();
    let right = cur.operand("a right operand")?.value();
    let assign_target = cur.name("an assignment target")?;
    cur.finish()?;

    Ok(Statement::BinaryOp(BinaryOp {
        op,
        left,
        right,
        assign_target,
    }))
}

// [number, args..., error_identifier]
fn syscall(cur: &mut Cursor) -> Result<Syscall, Located<Error>> {
    let number = cur
        .take("a syscall number", |tok| match tok {
            Token::Literal(Literal::Number(n)) => u16::try_from(n)
                .ok()
                .filter(|&num| i64::from(num) <= MAX_SYSCALL_NUMBER)
                .map(SyscallNumber::Literal)
                .ok_or(Error::InvalidSyscallNumber(n)),
            Token::Word(name) | Token::Ident(_, name) => {
                Ok(SyscallNumber::Identifier(Identifier::new(name)))
            }
            tok => Err(unexpected("a syscall number", tok)),
        })?
        .value();

    let mut values = Vec::new();
    while !cur.at_symbol(Symbol::Semicolon) && !cur.is_empty() {
        values.push(cur.operand("a syscall argument")?);
    }

    let error_identifier = match values.pop() {
        Some(value) => value
            .map_result(|value| match value {
                Value::Identifier(id) => Ok(id),
                value => Err(Error::UnexpectedToken {
                    expected: "an error identifier",
                    found: format!("'{}'", value),
                }),
            })?
            .value(),
        None => return Err(cur.end("an error identifier")),
    };

    if values.len() > MAX_SYSCALL_ARGS {
        return Err(values[MAX_SYSCALL_ARGS].transfer(Error::TooManySyscallArgs(values.len())));
    }

    cur.finish()?;

    Ok(Syscall {
        number,
        args: values.into_iter().map(Located::value).collect(),
        error_identifier,
    })
}

// ['(', left, comparator, right, ')', '{']
fn condition(cur: &mut Cursor) -> Result<Condition, Located<Error>> {
    cur.symbol(Symbol::LParen, "'('")?;
    let left = cur.operand("a left operand")?.value();
    let comparator = cur
        .take("a comparator", |tok| match tok {
            Token::Symbol(Symbol::Comparator(cmp)) => Ok(cmp),
            tok => Err(unexpected("a comparator", tok)),
        })?
        .value();
    let right = cur.operand("a right operand")?.value();
    cur.symbol(Symbol::RParen, "')'")?;
    cur.symbol(Symbol::LBrace, "'{'")?;
    cur.end_of_line()?;

    Ok(Condition {
        left,
        comparator,
        right,
    })
}

// [name, amount]
fn resize(dir: Resize, cur: &mut Cursor) -> Result<Statement, Located<Error>> {
    let identifier = cur.name("an identifier")?;
    let amount = cur
        .take("an amount", |tok| match tok {
            Token::Literal(Literal::Number(n)) => u64::try_from(n).map_err(|_| {
                Error::InvalidSize(n.to_string())
            }),
            tok => Err(unexpected("an amount", tok)),
        })?
        .value();
    cur.finish()?;

    Ok(Statement::Resize(dir, identifier, amount))
}

// [name]
fn target(cur: &mut Cursor) -> Result<Identifier, Located<Error>> {
    let identifier = cur.name("an identifier")?;
    cur.finish()?;
    Ok(identifier)
}

// ['(', args..., ')']?
fn call(name: &str, cur: &mut Cursor) -> Result<CallFunction, Located<Error>> {
    let mut args = Vec::new();
    if cur.at_symbol(Symbol::LParen) {
        cur.next("'('")?;
        while !cur.at_symbol(Symbol::RParen) && !cur.is_empty() {
            args.push(cur.operand("an argument")?.value());
        }
        cur.symbol(Symbol::RParen, "')'")?;
    }
    cur.finish()?;

    Ok(CallFunction {
        identifier: Identifier::new(name),
        args,
    })
}

pub fn parse(tokens: Tokens) -> Result<Program, Located<Error>> {
    let mut parser = Parser::new();
    for line in tokens.lines {
        parser.line(line)?;
    }

    let statements = parser.finish()?;
    debug!("parsed {} top-level statement(s)", statements.len());

    Ok(Program {
        statements,
        registry: tokens.registry,
    })
}
