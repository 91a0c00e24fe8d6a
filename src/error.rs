//! Diagnostics raised by every stage of the compiler.
//!
//! User errors (lexical, syntax, semantic) always carry the location that
//! triggered them. `Internal` errors mean an earlier pass broke an invariant a
//! later pass relies on, so they are kept apart from the user-facing kinds.

use thiserror::Error;

use crate::analyzer::Ty;
use crate::source::Location;

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("{loc}: lexical error: {error}")]
    Lexical { loc: Location, error: LexError },

    #[error("{loc}: syntax error: expected {expected}, found {found}")]
    Syntax {
        loc: Location,
        expected: String,
        found: String,
    },

    #[error("{loc}: semantic error: {error}")]
    Semantic { loc: Location, error: SemanticError },

    #[error("internal compiler error: {0}")]
    Internal(String),

    #[error("{path}: {message}")]
    Io { path: String, message: String },
}

impl CompileError {
    pub fn lexical(loc: Location, error: LexError) -> Self {
        Self::Lexical { loc, error }
    }

    pub fn syntax(loc: Location, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::Syntax {
            loc,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn semantic(loc: Location, error: SemanticError) -> Self {
        Self::Semantic { loc, error }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Lexical { .. } => "lexical",
            Self::Syntax { .. } => "syntax",
            Self::Semantic { .. } => "semantic",
            Self::Internal(_) => "internal",
            Self::Io { .. } => "io",
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::Lexical { loc, .. } | Self::Syntax { loc, .. } | Self::Semantic { loc, .. } => {
                Some(loc)
            }
            Self::Internal(_) | Self::Io { .. } => None,
        }
    }

    /// The semantic failure, if this is one.
    pub fn as_semantic(&self) -> Option<&SemanticError> {
        match self {
            Self::Semantic { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn as_lexical(&self) -> Option<&LexError> {
        match self {
            Self::Lexical { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("invalid character `{0}`")]
    InvalidCharacter(char),

    #[error("character literal is not terminated")]
    UnterminatedChar,

    #[error("string literal is not terminated")]
    UnterminatedString,

    #[error("escape sequence is not terminated")]
    UnterminatedEscape,

    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(char),

    #[error("empty character literal")]
    EmptyChar,

    #[error("character literal holds more than one character")]
    MultiCharacterChar,

    #[error("literal spans a newline")]
    NewlineInLiteral,

    #[error("expected {0} digits after the prefix")]
    MissingDigits(&'static str),

    #[error("integer literal `{0}` is too large")]
    IntegerOverflow(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticError {
    #[error("use of undeclared name `{name}`")]
    Undeclared { name: String },

    #[error("redeclaration of `{name}`")]
    Redeclaration { name: String },

    #[error("`{name}` is used in its own initializer")]
    SelfInitializer { name: String },

    #[error("initializer of global `{name}` is not a constant expression")]
    NonConstantInitializer { name: String },

    #[error("expected {expected} expression, found `{found}`")]
    ExpectedCategory { expected: &'static str, found: Ty },

    #[error("left-hand side not a reference: found `{found}`")]
    NotAReference { found: Ty },

    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: Ty, found: Ty },

    #[error("no common type for `{left}` and `{right}`")]
    NoCommonType { left: Ty, right: Ty },

    #[error("too few arguments: expected {expected}, found {found}")]
    TooFewArguments { expected: usize, found: usize },

    #[error("too many arguments: expected {expected}, found {found}")]
    TooManyArguments { expected: usize, found: usize },

    #[error("argument {position} does not match: expected `{expected}`, found `{found}`")]
    ArgumentMismatch {
        position: usize,
        expected: Ty,
        found: Ty,
    },

    #[error("cannot convert `{from}` to `{to}`")]
    InvalidConversion { from: Ty, to: Ty },

    #[error("integer literal {0} does not fit in `int`")]
    IntegerOutOfRange(i64),

    #[error("character literal `{0}` does not fit in `char`")]
    CharOutOfRange(char),

    #[error("{0} are not supported")]
    Unsupported(&'static str),

    #[error("function `{name}` cannot be defined inside another function")]
    NestedFunction { name: String },

    #[error("`break` outside of a loop")]
    BreakOutsideLoop,

    #[error("`continue` outside of a loop")]
    ContinueOutsideLoop,
}
