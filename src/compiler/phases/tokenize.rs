use super::types::{Loc, Located};
use crate::common;
use crate::compiler::lang::Lang;
use crate::compiler::model::{Literal, MAX_SYSCALL_ARGS, MAX_SYSCALL_NUMBER};
use crate::compiler::source::{Line, Source};
use crate::compiler::token::{Comparator, Keyword, Registry, Role, Size, Symbol, Token};
use log::{debug, trace};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    MissingSemicolon,
    TrailingCharacters(String),
    UnterminatedQuote,
    UnknownStatement(String),
    MalformedIdentifier(String),
    MalformedOperand(String),
    MalformedDeclaration(&'static str),
    MissingValue(String),
    Redeclaration(Role, String),
    MalformedOperation(&'static str),
    MalformedSyscall(&'static str),
    SyscallNumberOutOfRange(i64),
    TooManySyscallArgs(usize),
    MalformedCondition(&'static str),
    InvalidComparator(String),
    InconsistentComparatorSpacing(String),
    MalformedStatement(&'static str),
    MissingBlockOpener,
    ElseWithoutIf,
    UnbalancedBrace,
    UnclosedBlock,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingSemicolon => write!(f, "Expected a ';' at the end of the line"),
            Error::TrailingCharacters(s) => write!(f, "Unexpected trailing characters '{}'", s),
            Error::UnterminatedQuote => write!(f, "Encountered unterminated quoted literal"),
            Error::UnknownStatement(s) => write!(
                f,
                "Unknown statement '{}', expected a keyword or a builtin function",
                s
            ),
            Error::MalformedIdentifier(s) => write!(f, "Malformed identifier '{}'", s),
            Error::MalformedOperand(s) => write!(f, "Malformed operand '{}'", s),
            Error::MalformedDeclaration(msg) => write!(f, "Malformed declaration: {}", msg),
            Error::MissingValue(name) => {
                write!(f, "Constant '{}' must be initialised with a value", name)
            }
            Error::Redeclaration(role, name) => {
                write!(f, "Redeclaration of {} '{}'", role, name)
            }
            Error::MalformedOperation(msg) => write!(
                f,
                "Malformed operation, expected 'OP (left, right) into target;': {}",
                msg
            ),
            Error::MalformedSyscall(msg) => write!(f, "Malformed syscall: {}", msg),
            Error::SyscallNumberOutOfRange(n) => write!(
                f,
                "Syscall number {} out of range, expected 0 to {}",
                n, MAX_SYSCALL_NUMBER
            ),
            Error::TooManySyscallArgs(n) => write!(
                f,
                "Syscall given {} arguments, at most {} are allowed",
                n, MAX_SYSCALL_ARGS
            ),
            Error::MalformedCondition(msg) => write!(f, "Malformed condition: {}", msg),
            Error::InvalidComparator(s) => write!(
                f,
                "Invalid comparator '{}', expected one of ==, !=, >, >=, <, =<",
                s
            ),
            Error::InconsistentComparatorSpacing(s) => write!(
                f,
                "Inconsistent spacing around the comparator in '{}'",
                s
            ),
            Error::MalformedStatement(msg) => write!(f, "Malformed statement: {}", msg),
            Error::MissingBlockOpener => write!(f, "Expected a '{{' to open the block"),
            Error::ElseWithoutIf => write!(f, "'else' must directly follow a closed 'if' block"),
            Error::UnbalancedBrace => write!(f, "Encountered '}}' with no open block"),
            Error::UnclosedBlock => write!(f, "Block is never closed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineTokens {
    pub line: usize,
    pub tokens: Vec<Located<Token>>,
}

/// Everything the lexer learnt about one compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Tokens {
    pub lines: Vec<LineTokens>,
    pub registry: Registry,
}

/// Tracks whether we are inside a quoted span while walking a line.
#[derive(Default)]
struct Quotes {
    open: Option<char>,
    escaped: bool,
}

impl Quotes {
    /// Feed the next character, returns whether it is plain (unquoted) source text.
    fn feed(&mut self, c: char) -> bool {
        match self.open {
            Some(q) => {
                if self.escaped {
                    self.escaped = false;
                } else if c == '\\' {
                    self.escaped = true;
                } else if c == q {
                    self.open = None;
                }
                false
            }
            None => {
                if c == '"' || c == '\'' {
                    self.open = Some(c);
                    false
                } else {
                    true
                }
            }
        }
    }

    fn finish(self) -> Result<(), Error> {
        match self.open {
            Some(_) => Err(Error::UnterminatedQuote),
            None => Ok(()),
        }
    }
}

fn split_comment(raw: &str) -> Result<(&str, Option<&str>), Error> {
    let mut quotes = Quotes::default();
    let mut chars = raw.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if quotes.feed(c) && c == '/' && chars.peek().map(|&(_, n)| n) == Some('/') {
            return Ok((&raw[..idx], Some(&raw[idx + 2..])));
        }
    }

    quotes.finish()?;
    Ok((raw, None))
}

fn find_unquoted(s: &str, target: char) -> Result<Option<usize>, Error> {
    let mut quotes = Quotes::default();
    for (idx, c) in s.char_indices() {
        if quotes.feed(c) && c == target {
            return Ok(Some(idx));
        }
    }

    quotes.finish()?;
    Ok(None)
}

fn split_unquoted(s: &str, sep: char) -> Result<Vec<&str>, Error> {
    let mut quotes = Quotes::default();
    let mut parts = Vec::new();
    let mut start = 0;
    for (idx, c) in s.char_indices() {
        if quotes.feed(c) && c == sep {
            parts.push(&s[start..idx]);
            start = idx + c.len_utf8();
        }
    }

    quotes.finish()?;
    parts.push(&s[start..]);
    Ok(parts)
}

/// One raw line, able to turn subslices of itself back into columns.
struct Scan<'a> {
    number: usize,
    raw: &'a str,
}

impl<'a> Scan<'a> {
    fn new(line: &'a Line) -> Self {
        Scan {
            number: line.number(),
            raw: line.content(),
        }
    }

    fn loc(&self, part: &str) -> Loc {
        let start = self.raw.as_ptr() as usize;
        let at = part.as_ptr() as usize;
        let col = if at >= start && at <= start + self.raw.len() {
            at - start + 1
        } else {
            1
        };
        Loc::new(self.number, col)
    }

    fn located<T>(&self, part: &str, val: T) -> Located<T> {
        Located::with_loc(self.loc(part), val)
    }

    fn err<T>(&self, part: &str, err: Error) -> Result<T, Located<Error>> {
        Err(self.located(part, err))
    }

    fn lift<T>(&self, part: &str, res: Result<T, Error>) -> Result<T, Located<Error>> {
        res.map_err(|err| self.located(part, err))
    }

    /// Splits `s` at its first unquoted ';', which has to be the last thing on the line.
    /// Returns the statement body and the ';' itself.
    fn terminated<'b>(&self, s: &'b str) -> Result<(&'b str, &'b str), Located<Error>> {
        match self.lift(s, find_unquoted(s, ';'))? {
            None => self.err(&s[s.len()..], Error::MissingSemicolon),
            Some(idx) => {
                let after = s[idx + 1..].trim();
                if !after.is_empty() {
                    return self.err(after, Error::TrailingCharacters(after.to_owned()));
                }
                Ok((&s[..idx], &s[idx..idx + 1]))
            }
        }
    }

    fn identifier<'b>(&self, s: &'b str) -> Result<&'b str, Located<Error>> {
        if common::is_identifier(s) && Keyword::from_str(s).is_err() {
            Ok(s)
        } else {
            self.err(s, Error::MalformedIdentifier(s.to_owned()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Else,
}

struct Lexer {
    registry: Registry,
    blocks: Vec<(BlockKind, Loc)>,
    else_permitted: bool,
    lines: Vec<LineTokens>,
}

impl Lexer {
    fn new() -> Self {
        Lexer {
            registry: Registry::with_functions(
                Lang::get()
                    .functions()
                    .map(|f| f.identifier.name.as_str()),
            ),
            blocks: Vec::new(),
            else_permitted: false,
            lines: Vec::new(),
        }
    }

    fn classify_word(&self, name: &str) -> Token {
        match self.registry.role_of(name) {
            Some(role) => Token::Ident(role, name.to_owned()),
            None => Token::Word(name.to_owned()),
        }
    }

    fn classify_operand(&self, scan: &Scan, raw: &str) -> Result<Located<Token>, Located<Error>> {
        let tok = if let Some(n) = common::parse_numeric(raw) {
            Token::Literal(Literal::Number(n))
        } else if let (true, Ok(x)) = (raw.contains('.'), raw.parse::<f64>()) {
            Token::Literal(Literal::Float(x))
        } else if let Some(s) = common::unquote(raw) {
            Token::Literal(Literal::String(s.to_owned()))
        } else if common::is_identifier(raw) {
            self.classify_word(raw)
        } else {
            return scan.err(raw, Error::MalformedOperand(raw.to_owned()));
        };

        Ok(scan.located(raw, tok))
    }

    fn line(&mut self, line: &Line) -> Result<(), Located<Error>> {
        let scan = Scan::new(line);
        let (code, comment) = scan.lift(scan.raw, split_comment(scan.raw))?;

        let mut tokens = Vec::new();
        let mut rest = code.trim();

        while rest.starts_with('}') {
            self.close_block(&scan, &rest[..1])?;
            tokens.push(scan.located(rest, Token::Symbol(Symbol::RBrace)));
            rest = rest[1..].trim_start();
        }

        if !rest.is_empty() {
            if !rest.ends_with(';') && !rest.ends_with('{') {
                return scan.err(&rest[rest.len()..], Error::MissingSemicolon);
            }

            self.statement(&scan, rest, &mut tokens)?;
        }

        if let Some(comment) = comment {
            tokens.push(scan.located(comment, Token::Comment(comment.trim().to_owned())));
        }

        trace!("line {}: {} token(s)", scan.number, tokens.len());

        if !tokens.is_empty() {
            self.lines.push(LineTokens {
                line: scan.number,
                tokens,
            });
        }

        Ok(())
    }

    fn close_block(&mut self, scan: &Scan, brace: &str) -> Result<(), Located<Error>> {
        match self.blocks.pop() {
            None => scan.err(brace, Error::UnbalancedBrace),
            Some((kind, _)) => {
                self.else_permitted = kind == BlockKind::If;
                Ok(())
            }
        }
    }

    fn statement(
        &mut self,
        scan: &Scan,
        rest: &str,
        tokens: &mut Vec<Located<Token>>,
    ) -> Result<(), Located<Error>> {
        let end = rest
            .find(|c: char| c.is_whitespace() || "([{;}".contains(c))
            .unwrap_or_else(|| rest.len());
        let (construct, tail) = rest.split_at(end);
        let else_permitted = std::mem::replace(&mut self.else_permitted, false);

        trace!("line {}: construct '{}'", scan.number, construct);

        let kw = match Keyword::from_str(construct) {
            Ok(kw) => kw,
            Err(_) if self.registry.contains(Role::Function, construct) => {
                return self.call(scan, construct, tail, tokens);
            }
            Err(_) => {
                return scan.err(construct, Error::UnknownStatement(construct.to_owned()));
            }
        };

        tokens.push(scan.located(construct, Token::Keyword(kw)));

        match kw {
            Keyword::Const => self.declaration(scan, Role::Const, tail, tokens),
            Keyword::Var => self.declaration(scan, Role::Var, tail, tokens),
            Keyword::Ptr => self.declaration(scan, Role::Ptr, tail, tokens),
            Keyword::Mul | Keyword::Add | Keyword::Sub | Keyword::Div => {
                self.operation(scan, tail, tokens)
            }
            Keyword::Syscall => self.syscall(scan, tail, tokens),
            Keyword::If => self.condition(scan, tail, tokens),
            Keyword::Else => {
                if !else_permitted {
                    return scan.err(construct, Error::ElseWithoutIf);
                }
                self.open_else(scan, tail, tokens)
            }
            Keyword::SizeInc | Keyword::SizeDec => self.resize(scan, tail, tokens),
            Keyword::Emt | Keyword::Del => self.target(scan, tail, tokens),
        }
    }

    // const NAME[SIZE]: TYPE = VALUE;    var NAME[SIZE]: TYPE (= VALUE);    ptr NAME: TYPE (= VALUE);
    fn declaration(
        &mut self,
        scan: &Scan,
        role: Role,
        tail: &str,
        tokens: &mut Vec<Located<Token>>,
    ) -> Result<(), Located<Error>> {
        let (body, semi) = scan.terminated(tail)?;

        let (head, value) = match scan.lift(body, find_unquoted(body, '='))? {
            Some(idx) => (&body[..idx], Some(body[idx + 1..].trim())),
            None => (body, None),
        };

        let colon = match head.find(':') {
            Some(colon) => colon,
            None => {
                return scan.err(
                    head,
                    Error::MalformedDeclaration("expected ':' before the type"),
                )
            }
        };
        let (name_part, ty) = (&head[..colon], head[colon + 1..].trim());

        let (name, size) = match name_part.find('[') {
            None => (name_part.trim(), None),
            Some(_) if role == Role::Ptr => {
                return scan.err(
                    name_part,
                    Error::MalformedDeclaration("pointers cannot be given a size"),
                )
            }
            Some(open) => {
                let close = match name_part.find(']') {
                    Some(close) if close > open && name_part[close + 1..].trim().is_empty() => {
                        close
                    }
                    _ => {
                        return scan.err(
                            &name_part[open..],
                            Error::MalformedDeclaration("expected ']' to close the size"),
                        )
                    }
                };
                let size = name_part[open + 1..close].trim();
                if size.is_empty() {
                    return scan.err(
                        &name_part[open..],
                        Error::MalformedDeclaration("empty size, omit the brackets instead"),
                    );
                }
                (name_part[..open].trim(), Some(size))
            }
        };

        let name = scan.identifier(name)?;

        if ty.is_empty() {
            return scan.err(&head[colon..], Error::MalformedDeclaration("missing type"));
        }

        match value {
            Some("") => {
                return scan.err(
                    &body[body.len()..],
                    Error::MalformedDeclaration("missing value after '='"),
                )
            }
            None if role == Role::Const => {
                return scan.err(name, Error::MissingValue(name.to_owned()));
            }
            _ => (),
        }

        if !self.registry.declare(role, name) {
            return scan.err(name, Error::Redeclaration(role, name.to_owned()));
        }

        debug!("line {}: declared {} '{}'", scan.number, role, name);

        tokens.push(scan.located(name, Token::Word(name.to_owned())));
        if role != Role::Ptr {
            tokens.push(match size {
                Some(size) => scan.located(size, Token::Size(Size::Fixed(size.to_owned()))),
                None => scan.located(name, Token::Size(Size::Dynamic)),
            });
        }
        tokens.push(scan.located(ty, Token::Type(ty.to_owned())));
        if let Some(value) = value {
            tokens.push(scan.located(value, Token::Value(value.to_owned())));
        }
        tokens.push(scan.located(semi, Token::Symbol(Symbol::Semicolon)));

        Ok(())
    }

    // OP (left, right) into target;
    fn operation(
        &mut self,
        scan: &Scan,
        tail: &str,
        tokens: &mut Vec<Located<Token>>,
    ) -> Result<(), Located<Error>> {
        let (body, semi) = scan.terminated(tail)?;
        let body = body.trim();

        if !body.starts_with('(') {
            return scan.err(
                body,
                Error::MalformedOperation("expected '(' after the operator"),
            );
        }

        let close = match scan.lift(body, find_unquoted(body, ')'))? {
            Some(close) => close,
            None => {
                return scan.err(
                    body,
                    Error::MalformedOperation("expected ')' after the operands"),
                )
            }
        };

        let operands = scan.lift(body, split_unquoted(&body[1..close], ','))?;
        if operands.len() != 2 {
            return scan.err(
                body,
                Error::MalformedOperation("expected exactly two operands"),
            );
        }

        let after = body[close + 1..].trim_start();
        let target = match after.strip_prefix("into") {
            Some(target) if target.starts_with(char::is_whitespace) => target.trim(),
            _ => {
                return scan.err(
                    after,
                    Error::MalformedOperation("expected 'into' after the operands"),
                )
            }
        };
        let target = scan.identifier(target)?;

        for operand in operands {
            let operand = operand.trim();
            if operand.is_empty() {
                return scan.err(body, Error::MalformedOperation("empty operand"));
            }
            tokens.push(self.classify_operand(scan, operand)?);
        }
        tokens.push(scan.located(target, self.classify_word(target)));
        tokens.push(scan.located(semi, Token::Symbol(Symbol::Semicolon)));

        Ok(())
    }

    // syscall NUMBER, arg1, ..., argN, error_ident;
    fn syscall(
        &mut self,
        scan: &Scan,
        tail: &str,
        tokens: &mut Vec<Located<Token>>,
    ) -> Result<(), Located<Error>> {
        let (body, semi) = scan.terminated(tail)?;
        let parts = scan
            .lift(body, split_unquoted(body, ','))?
            .into_iter()
            .map(str::trim)
            .collect::<Vec<_>>();

        if parts.len() < 2 {
            return scan.err(
                body,
                Error::MalformedSyscall("expected a number followed by an error identifier"),
            );
        }
        if let Some(empty) = parts.iter().find(|part| part.is_empty()) {
            return scan.err(empty, Error::MalformedSyscall("empty argument"));
        }

        let args = &parts[1..parts.len() - 1];
        if args.len() > MAX_SYSCALL_ARGS {
            return scan.err(
                args[MAX_SYSCALL_ARGS],
                Error::TooManySyscallArgs(args.len()),
            );
        }

        let number = parts[0];
        let number_tok = match common::parse_numeric(number) {
            Some(n) if (0..=MAX_SYSCALL_NUMBER).contains(&n) => Token::Literal(Literal::Number(n)),
            Some(n) => return scan.err(number, Error::SyscallNumberOutOfRange(n)),
            None if common::is_identifier(number) => self.classify_word(number),
            None => {
                return scan.err(
                    number,
                    Error::MalformedSyscall("the number must be an integer or an identifier"),
                )
            }
        };
        tokens.push(scan.located(number, number_tok));

        for arg in args {
            match arg.strip_prefix('*') {
                Some(name) => {
                    let name = scan.identifier(name.trim())?;
                    tokens.push(scan.located(arg, Token::Deref(name.to_owned())));
                }
                None => tokens.push(self.classify_operand(scan, arg)?),
            }
        }

        let error_ident = scan.identifier(parts[parts.len() - 1])?;
        tokens.push(scan.located(error_ident, self.classify_word(error_ident)));
        tokens.push(scan.located(semi, Token::Symbol(Symbol::Semicolon)));

        Ok(())
    }

    // if (left CMP right) {
    fn condition(
        &mut self,
        scan: &Scan,
        tail: &str,
        tokens: &mut Vec<Located<Token>>,
    ) -> Result<(), Located<Error>> {
        let body = tail.trim();
        if !body.ends_with('{') {
            return scan.err(&body[body.len()..], Error::MissingBlockOpener);
        }
        let brace = &body[body.len() - 1..];
        let cond = body[..body.len() - 1].trim_end();

        if cond.len() < 2 || !cond.starts_with('(') || !cond.ends_with(')') {
            return scan.err(
                cond,
                Error::MalformedCondition("expected a parenthesised condition"),
            );
        }
        let inner = &cond[1..cond.len() - 1];

        let start = match inner.find(Comparator::CHARS) {
            Some(start) => start,
            None => return scan.err(inner, Error::MalformedCondition("missing comparator")),
        };
        let len = inner[start..]
            .find(|c: char| !Comparator::CHARS.contains(&c))
            .unwrap_or_else(|| inner.len() - start);
        let op = &inner[start..start + len];
        let cmp = match Comparator::from_str(op) {
            Ok(cmp) => cmp,
            Err(_) => return scan.err(op, Error::InvalidComparator(op.to_owned())),
        };

        let (left, right) = (&inner[..start], &inner[start + len..]);
        if left.ends_with(char::is_whitespace) != right.starts_with(char::is_whitespace) {
            return scan.err(
                op,
                Error::InconsistentComparatorSpacing(inner.trim().to_owned()),
            );
        }

        let (left, right) = (left.trim(), right.trim());
        if left.is_empty() || right.is_empty() {
            return scan.err(inner, Error::MalformedCondition("missing operand"));
        }

        tokens.push(scan.located(&cond[..1], Token::Symbol(Symbol::LParen)));
        tokens.push(self.classify_operand(scan, left)?);
        tokens.push(scan.located(op, Token::Symbol(Symbol::Comparator(cmp))));
        tokens.push(self.classify_operand(scan, right)?);
        tokens.push(scan.located(&cond[cond.len() - 1..], Token::Symbol(Symbol::RParen)));
        tokens.push(scan.located(brace, Token::Symbol(Symbol::LBrace)));

        self.blocks.push((BlockKind::If, scan.loc(brace)));
        Ok(())
    }

    // else {
    fn open_else(
        &mut self,
        scan: &Scan,
        tail: &str,
        tokens: &mut Vec<Located<Token>>,
    ) -> Result<(), Located<Error>> {
        let body = tail.trim();
        if body != "{" {
            return scan.err(body, Error::MissingBlockOpener);
        }

        tokens.push(scan.located(body, Token::Symbol(Symbol::LBrace)));
        self.blocks.push((BlockKind::Else, scan.loc(body)));
        Ok(())
    }

    // size_inc NAME, AMOUNT;    size_dec NAME, AMOUNT;
    fn resize(
        &mut self,
        scan: &Scan,
        tail: &str,
        tokens: &mut Vec<Located<Token>>,
    ) -> Result<(), Located<Error>> {
        let (body, semi) = scan.terminated(tail)?;
        let parts = scan.lift(body, split_unquoted(body, ','))?;
        if parts.len() != 2 {
            return scan.err(
                body,
                Error::MalformedStatement("expected 'IDENT, AMOUNT' after the keyword"),
            );
        }

        let name = scan.identifier(parts[0].trim())?;
        let amount = parts[1].trim();
        let n = match common::parse_numeric(amount) {
            Some(n) if n >= 0 => n,
            _ => return scan.err(amount, Error::MalformedOperand(amount.to_owned())),
        };

        tokens.push(scan.located(name, self.classify_word(name)));
        tokens.push(scan.located(amount, Token::Literal(Literal::Number(n))));
        tokens.push(scan.located(semi, Token::Symbol(Symbol::Semicolon)));
        Ok(())
    }

    // emt NAME;    del NAME;
    fn target(
        &mut self,
        scan: &Scan,
        tail: &str,
        tokens: &mut Vec<Located<Token>>,
    ) -> Result<(), Located<Error>> {
        let (body, semi) = scan.terminated(tail)?;
        let name = scan.identifier(body.trim())?;

        tokens.push(scan.located(name, self.classify_word(name)));
        tokens.push(scan.located(semi, Token::Symbol(Symbol::Semicolon)));
        Ok(())
    }

    // NAME;    NAME(arg, ...);
    fn call(
        &mut self,
        scan: &Scan,
        name: &str,
        tail: &str,
        tokens: &mut Vec<Located<Token>>,
    ) -> Result<(), Located<Error>> {
        tokens.push(scan.located(name, Token::Ident(Role::Function, name.to_owned())));

        let (body, semi) = scan.terminated(tail)?;
        let body = body.trim();

        if !body.is_empty() {
            if !body.starts_with('(') || !body.ends_with(')') {
                return scan.err(
                    body,
                    Error::MalformedStatement("expected '(' arguments ')' after the function name"),
                );
            }

            tokens.push(scan.located(&body[..1], Token::Symbol(Symbol::LParen)));
            let inner = &body[1..body.len() - 1];
            if !inner.trim().is_empty() {
                for arg in scan.lift(inner, split_unquoted(inner, ','))? {
                    let arg = arg.trim();
                    if arg.is_empty() {
                        return scan.err(inner, Error::MalformedStatement("empty argument"));
                    }
                    tokens.push(self.classify_operand(scan, arg)?);
                }
            }
            tokens.push(scan.located(&body[body.len() - 1..], Token::Symbol(Symbol::RParen)));
        }

        tokens.push(scan.located(semi, Token::Symbol(Symbol::Semicolon)));
        Ok(())
    }

    fn finish(self) -> Result<Tokens, Located<Error>> {
        if let Some((_, loc)) = self.blocks.last() {
            return Err(Located::with_loc(*loc, Error::UnclosedBlock));
        }

        Ok(Tokens {
            lines: self.lines,
            registry: self.registry,
        })
    }
}

pub fn tokenize(source: &Source) -> Result<Tokens, Located<Error>> {
    let mut lexer = Lexer::new();
    for line in source.iter() {
        lexer.line(line)?;
    }

    let tokens = lexer.finish()?;
    debug!(
        "tokenized {} line(s) into {} statement line(s)",
        source.len(),
        tokens.lines.len()
    );
    Ok(tokens)
}
