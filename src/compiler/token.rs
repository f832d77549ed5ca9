use super::model::Literal;
use enum_map::{Enum, EnumMap};
use std::fmt::Display;
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, StrumDisplay, EnumIter)]
pub enum Keyword {
    #[strum(serialize = "const")]
    Const,
    #[strum(serialize = "var")]
    Var,
    #[strum(serialize = "ptr")]
    Ptr,
    #[strum(serialize = "size_inc")]
    SizeInc,
    #[strum(serialize = "size_dec")]
    SizeDec,
    #[strum(serialize = "emt")]
    Emt,
    #[strum(serialize = "del")]
    Del,
    #[strum(serialize = "mul")]
    Mul,
    #[strum(serialize = "add")]
    Add,
    #[strum(serialize = "sub")]
    Sub,
    #[strum(serialize = "div")]
    Div,
    #[strum(serialize = "syscall")]
    Syscall,
    #[strum(serialize = "if")]
    If,
    #[strum(serialize = "else")]
    Else,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, StrumDisplay, EnumIter)]
pub enum Comparator {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "=<")]
    Le,
}

impl Comparator {
    pub const CHARS: &'static [char] = &['=', '!', '<', '>'];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comparator(Comparator),
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Semicolon => write!(f, ";"),
            Symbol::LParen => write!(f, "("),
            Symbol::RParen => write!(f, ")"),
            Symbol::LBrace => write!(f, "{{"),
            Symbol::RBrace => write!(f, "}}"),
            Symbol::Comparator(cmp) => write!(f, "{}", cmp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Size {
    Fixed(String),
    Dynamic,
}

/// The namespaces an identifier can be declared into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, StrumDisplay)]
pub enum Role {
    #[strum(serialize = "constant")]
    Const,
    #[strum(serialize = "variable")]
    Var,
    #[strum(serialize = "pointer")]
    Ptr,
    #[strum(serialize = "function")]
    Function,
}

// This enum models what the lexer can tell apart by looking at a single line, together with what
// the registries know about the identifiers declared on earlier lines. Whether a `Value` actually
// fits its `Type` is left to the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Word(String),
    Ident(Role, String),
    Symbol(Symbol),
    Type(String),
    Value(String),
    Size(Size),
    Literal(Literal),
    Deref(String),
    Comment(String),
}

impl Token {
    /// The source text this token stood for, as far as it can be recovered.
    pub fn raw_text(&self) -> String {
        match self {
            Token::Keyword(kw) => kw.to_string(),
            Token::Word(s)
            | Token::Ident(_, s)
            | Token::Type(s)
            | Token::Value(s)
            | Token::Comment(s) => s.clone(),
            Token::Symbol(sym) => sym.to_string(),
            Token::Size(Size::Fixed(s)) => s.clone(),
            Token::Size(Size::Dynamic) => String::new(),
            Token::Literal(lit) => lit.to_string(),
            Token::Deref(s) => format!("*{}", s),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Keyword(kw) => write!(f, "Keyword({})", kw),
            Token::Word(s) => write!(f, "Word({})", s),
            Token::Ident(role, s) => write!(f, "Ident({}, {})", role, s),
            Token::Symbol(sym) => write!(f, "Symbol({})", sym),
            Token::Type(s) => write!(f, "Type({})", s),
            Token::Value(s) => write!(f, "Value({})", s),
            Token::Size(Size::Fixed(s)) => write!(f, "Size({})", s),
            Token::Size(Size::Dynamic) => write!(f, "DynamicSize"),
            Token::Literal(lit) => write!(f, "Literal({})", lit),
            Token::Deref(s) => write!(f, "Deref({})", s),
            Token::Comment(s) => write!(f, "Comment({})", s),
        }
    }
}

/// Per-compilation record of every identifier declared so far, one namespace per `Role`.
/// Names are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    names: EnumMap<Role, Vec<String>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn with_functions<'a>(functions: impl Iterator<Item = &'a str>) -> Self {
        let mut registry = Registry::new();
        registry.names[Role::Function].extend(functions.map(str::to_owned));
        registry
    }

    /// Returns `false` (and changes nothing) if `name` already exists in that namespace.
    pub fn declare(&mut self, role: Role, name: &str) -> bool {
        if self.contains(role, name) {
            return false;
        }

        self.names[role].push(name.to_owned());
        true
    }

    pub fn contains(&self, role: Role, name: &str) -> bool {
        self.names[role].iter().any(|n| n == name)
    }

    pub fn role_of(&self, name: &str) -> Option<Role> {
        self.names
            .iter()
            .find(|(_, names)| names.iter().any(|n| n == name))
            .map(|(role, _)| role)
    }

    pub fn names(&self, role: Role) -> &[String] {
        &self.names[role]
    }
}

#[cfg(test)]
mod tests {
    use super::{Comparator, Keyword, Registry, Role};
    use std::str::FromStr;

    #[test]
    fn keywords_from_source_text() {
        assert_eq!(Keyword::from_str("size_inc"), Ok(Keyword::SizeInc));
        assert_eq!(Keyword::from_str("else"), Ok(Keyword::Else));
        assert!(Keyword::from_str("CONST").is_err());
        assert_eq!(Keyword::Syscall.to_string(), "syscall");
    }

    #[test]
    fn comparators() {
        assert_eq!(Comparator::from_str("=<"), Ok(Comparator::Le));
        assert_eq!(Comparator::from_str(">="), Ok(Comparator::Ge));
        assert!(Comparator::from_str("<=").is_err());
        assert!(Comparator::from_str("=").is_err());
    }

    #[test]
    fn registry_namespaces_are_separate() {
        let mut registry = Registry::new();
        assert!(registry.declare(Role::Const, "x"));
        assert!(!registry.declare(Role::Const, "x"));
        assert!(registry.declare(Role::Var, "x"));
        assert_eq!(registry.role_of("x"), Some(Role::Const));
        assert_eq!(registry.role_of("y"), None);
    }

    #[test]
    fn registry_seeded_with_functions() {
        let registry = Registry::with_functions(vec!["exit", "prints"].into_iter());
        assert_eq!(registry.role_of("prints"), Some(Role::Function));
        assert_eq!(registry.names(Role::Var).len(), 0);
    }
}
