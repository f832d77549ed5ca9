use super::{generate, parse, tokenize};
use crate::compiler::source::Source;
use derive_more::Constructor;
use std::fmt::Display;

/*
    Phases:

        1.  Tokenization: The source is consumed one line at a time. Comments are split off (respecting
            quoted spans), the leading keyword of each line selects a sub-lexer which rescans the raw line
            and produces the positional token layout for that statement kind. Identifier registries are
            grown as declarations are seen, and bare words on later lines are reclassified against them.

        2.  Parsing: Each line's token list is decoded positionally (after a shape check) into a `Statement`.
            `if`/`else` lines open nested bodies, `}` closes them. Literal values are wrapped according to
            the declared type.

        3.  Generation: Each `Statement` contributes lines to labelled blocks of an `Asm`, which is finally
            rendered section by section (data, bss, text).

    Every error is fatal; the first one encountered aborts the whole pipeline.
*/

#[derive(Debug, PartialEq, Clone, Copy, Eq, Constructor)]
pub struct Loc {
    line: usize,
    col: usize,
}

impl Loc {
    pub fn line(&self) -> usize {
        self.line
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Located<T: Sized> {
    loc: Option<Loc>,
    val: T,
}

impl Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(line: {}, col: {})", self.line, self.col)
    }
}

impl<T: Display> Display for Located<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.loc {
            None => write!(f, "@<unknown location>: {}", self.val),
            Some(loc) => write!(f, "@{}: {}", loc, self.val),
        }
    }
}

impl<T> Located<T> {
    fn new(loc: Option<Loc>, val: T) -> Self {
        Located { loc, val }
    }

    pub fn with_loc(loc: Loc, val: T) -> Self {
        Located::new(Some(loc), val)
    }

    pub fn loc(&self) -> Option<Loc> {
        self.loc
    }

    pub fn value(self) -> T {
        self.val
    }

    pub fn value_ref(&self) -> &T {
        &self.val
    }

    pub fn proximate_to_option_loc(self, loc: Option<Loc>) -> Self {
        match self.loc {
            None => Self { loc, ..self },
            Some(_) => self,
        }
    }

    pub fn map<S, F>(self, f: F) -> Located<S>
    where
        F: FnOnce(T) -> S,
    {
        Located::new(self.loc, f(self.val))
    }

    pub fn map_result<S, E, F>(self, f: F) -> Result<Located<S>, Located<E>>
    where
        F: FnOnce(T) -> Result<S, E>,
    {
        match f(self.val) {
            Ok(s) => Ok(Located::new(self.loc, s)),
            Err(err) => Err(Located::new(self.loc, err)),
        }
    }

    pub fn transfer<S>(&self, s: S) -> Located<S> {
        Located::new(self.loc, s)
    }
}

impl<T> From<T> for Located<T> {
    fn from(val: T) -> Self {
        Located { loc: None, val }
    }
}

/// The offending line of a diagnostic, between its neighbours (where they exist).
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Snippet {
    lines: Vec<(usize, String)>,
    offending: usize,
}

impl Snippet {
    pub fn capture(source: &Source, line: usize) -> Self {
        let lines = match source.get(line) {
            None => Vec::new(),
            Some(cur) => source
                .prev(cur)
                .into_iter()
                .chain(std::iter::once(cur))
                .chain(source.next(cur))
                .map(|l| (l.number(), l.content().to_owned()))
                .collect(),
        };

        Snippet {
            lines,
            offending: line,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Display for Snippet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (number, content) in &self.lines {
            let gutter = if *number == self.offending { "->" } else { "  " };
            writeln!(f, "{} {: >4} | {}", gutter, number, content)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum Phase {
    Tokenize,
    Parse,
    Generate,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Tokenize => write!(f, "Lexer"),
            Phase::Parse => write!(f, "Parser"),
            Phase::Generate => write!(f, "Generator"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    Tokenize(Located<String>, Snippet),
    Parse(Located<String>, Snippet),
    Generate(Located<String>, Snippet),
}

impl Error {
    pub fn phase(&self) -> Phase {
        match self {
            Error::Tokenize(..) => Phase::Tokenize,
            Error::Parse(..) => Phase::Parse,
            Error::Generate(..) => Phase::Generate,
        }
    }

    pub fn message(&self) -> &Located<String> {
        match self {
            Error::Tokenize(msg, _) | Error::Parse(msg, _) | Error::Generate(msg, _) => msg,
        }
    }

    pub fn snippet(&self) -> &Snippet {
        match self {
            Error::Tokenize(_, snip) | Error::Parse(_, snip) | Error::Generate(_, snip) => snip,
        }
    }

    /// Attach the offending source lines, if the error knows where it happened.
    pub fn in_context(self, source: &Source) -> Self {
        let snippet = match self.message().loc() {
            None => return self,
            Some(loc) => Snippet::capture(source, loc.line()),
        };

        match self {
            Error::Tokenize(msg, _) => Error::Tokenize(msg, snippet),
            Error::Parse(msg, _) => Error::Parse(msg, snippet),
            Error::Generate(msg, _) => Error::Generate(msg, snippet),
        }
    }
}

impl From<Located<tokenize::Error>> for Error {
    fn from(err: Located<tokenize::Error>) -> Self {
        Error::Tokenize(err.map(|err| format!("{}", err)), Snippet::default())
    }
}

impl From<Located<parse::Error>> for Error {
    fn from(err: Located<parse::Error>) -> Self {
        Error::Parse(err.map(|err| format!("{}", err)), Snippet::default())
    }
}

impl From<Located<generate::Error>> for Error {
    fn from(err: Located<generate::Error>) -> Self {
        Error::Generate(err.map(|err| format!("{}", err)), Snippet::default())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Compilation Error (in {}): {}", self.phase(), self.message())?;
        if !self.snippet().is_empty() {
            write!(f, "\n{}", self.snippet())?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::{Error, Loc, Located, Snippet};
    use crate::compiler::source::Source;

    #[test]
    fn snippet_includes_previous_line() {
        let source = Source::new("var x: int;\nvar y: int\n");
        let snippet = Snippet::capture(&source, 2);
        assert_eq!(
            snippet.to_string(),
            "      1 | var x: int;\n->    2 | var y: int\n"
        );
    }

    #[test]
    fn snippet_includes_next_line() {
        let source = Source::new("var x: int;\nvar y: int\nvar z: int;\nvar w: int;");
        assert_eq!(
            Snippet::capture(&source, 2).to_string(),
            "      1 | var x: int;\n->    2 | var y: int\n      3 | var z: int;\n"
        );
        assert_eq!(
            Snippet::capture(&source, 1).to_string(),
            "->    1 | var x: int;\n      2 | var y: int\n"
        );
    }

    #[test]
    fn snippet_of_only_line_has_no_context() {
        let source = Source::new("var y: int\n");
        assert_eq!(
            Snippet::capture(&source, 1).to_string(),
            "->    1 | var y: int\n"
        );
    }

    #[test]
    fn display_names_phase_and_location() {
        let err = Error::Parse(
            Located::with_loc(Loc::new(3, 7), String::from("something broke")),
            Snippet::default(),
        );
        assert_eq!(
            err.to_string(),
            "Compilation Error (in Parser): @(line: 3, col: 7): something broke"
        );
    }

    #[test]
    fn unlocated_errors_keep_empty_context() {
        let source = Source::new("a;");
        let err = Error::Generate(Located::from(String::from("oops")), Snippet::default())
            .in_context(&source);
        assert!(err.snippet().is_empty());
    }
}
