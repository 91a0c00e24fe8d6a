use std::fmt;

use phf::phf_map;

use crate::source::Location;
use crate::symbol::Symbol;

pub static KEYWORDS: phf::Map<&str, TokenKind> = phf_map! {
    "def" => TokenKind::Def,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "var" => TokenKind::Var,
    "let" => TokenKind::Let,
    "true" => TokenKind::Bool(true),
    "false" => TokenKind::Bool(false),
    "char" => TokenKind::TypeSpec(TypeSpec::Char),
    "int" => TokenKind::TypeSpec(TypeSpec::Int),
    "bool" => TokenKind::TypeSpec(TypeSpec::Bool),
    "float" => TokenKind::TypeSpec(TypeSpec::Float),
    "as" => TokenKind::As,
    "break" => TokenKind::Break,
    "continue" => TokenKind::Continue,
    "return" => TokenKind::Return,
    "while" => TokenKind::While,
    "when" => TokenKind::When,
};

pub static TWO_SYMBOLS_TOKENS: phf::Map<&str, TokenKind> = phf_map! {
    "<<" => TokenKind::Bitwise(BitwiseOp::Shl),
    "<=" => TokenKind::Relational(RelationalOp::Le),
    ">>" => TokenKind::Bitwise(BitwiseOp::Shr),
    ">=" => TokenKind::Relational(RelationalOp::Ge),
    "==" => TokenKind::Relational(RelationalOp::Eq),
    "!=" => TokenKind::Relational(RelationalOp::Ne),
    "&&" => TokenKind::Logical(LogicalOp::And),
    "||" => TokenKind::Logical(LogicalOp::Or),
    "->" => TokenKind::Arrow,
};

pub static ONE_SYMBOL_TOKENS: phf::Map<char, TokenKind> = phf_map! {
    '{' => TokenKind::LeftBrace,
    '}' => TokenKind::RightBrace,
    '(' => TokenKind::LeftParen,
    ')' => TokenKind::RightParen,
    '[' => TokenKind::LeftBracket,
    ']' => TokenKind::RightBracket,
    ',' => TokenKind::Comma,
    ';' => TokenKind::SemiColon,
    ':' => TokenKind::Colon,
    '<' => TokenKind::Relational(RelationalOp::Lt),
    '>' => TokenKind::Relational(RelationalOp::Gt),
    '=' => TokenKind::Assign,
    '+' => TokenKind::Arithmetic(ArithmeticOp::Add),
    '-' => TokenKind::Arithmetic(ArithmeticOp::Sub),
    '*' => TokenKind::Arithmetic(ArithmeticOp::Mul),
    '/' => TokenKind::Arithmetic(ArithmeticOp::Div),
    '%' => TokenKind::Arithmetic(ArithmeticOp::Mod),
    '&' => TokenKind::Bitwise(BitwiseOp::And),
    '|' => TokenKind::Bitwise(BitwiseOp::Or),
    '^' => TokenKind::Bitwise(BitwiseOp::Xor),
    '~' => TokenKind::Bitwise(BitwiseOp::Not),
    '!' => TokenKind::Logical(LogicalOp::Not),
    '?' => TokenKind::Question,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationalOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BitwiseOp {
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    Bool,
    Char,
    Int,
    Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Radix {
    Binary = 2,
    Decimal = 10,
    Hexadecimal = 16,
}

impl Radix {
    pub fn base(self) -> u32 {
        self as u32
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Radix::Binary => "0b",
            Radix::Decimal => "",
            Radix::Hexadecimal => "0x",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Eof,

    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    SemiColon,
    Colon,

    Relational(RelationalOp),
    Arithmetic(ArithmeticOp),
    Bitwise(BitwiseOp),
    Logical(LogicalOp),
    Question,
    Assign,
    Arrow,

    Def,
    If,
    Else,
    Var,
    Let,
    As,
    Break,
    Continue,
    Return,
    While,
    When,

    Ident(Symbol),
    Int { value: i64, radix: Radix },
    Float(f64),
    Bool(bool),
    Char(char),
    Str(Symbol),
    TypeSpec(TypeSpec),
}

impl TokenKind {
    pub fn is_eof(&self) -> bool {
        matches!(self, TokenKind::Eof)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spelling = match self {
            TokenKind::Eof => "end of input",
            TokenKind::LeftBrace => "`{`",
            TokenKind::RightBrace => "`}`",
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::LeftBracket => "`[`",
            TokenKind::RightBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::SemiColon => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::Relational(op) => match op {
                RelationalOp::Eq => "`==`",
                RelationalOp::Ne => "`!=`",
                RelationalOp::Lt => "`<`",
                RelationalOp::Gt => "`>`",
                RelationalOp::Le => "`<=`",
                RelationalOp::Ge => "`>=`",
            },
            TokenKind::Arithmetic(op) => match op {
                ArithmeticOp::Add => "`+`",
                ArithmeticOp::Sub => "`-`",
                ArithmeticOp::Mul => "`*`",
                ArithmeticOp::Div => "`/`",
                ArithmeticOp::Mod => "`%`",
            },
            TokenKind::Bitwise(op) => match op {
                BitwiseOp::And => "`&`",
                BitwiseOp::Or => "`|`",
                BitwiseOp::Xor => "`^`",
                BitwiseOp::Shl => "`<<`",
                BitwiseOp::Shr => "`>>`",
                BitwiseOp::Not => "`~`",
            },
            TokenKind::Logical(op) => match op {
                LogicalOp::And => "`&&`",
                LogicalOp::Or => "`||`",
                LogicalOp::Not => "`!`",
            },
            TokenKind::Question => "`?`",
            TokenKind::Assign => "`=`",
            TokenKind::Arrow => "`->`",
            TokenKind::Def => "`def`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::Var => "`var`",
            TokenKind::Let => "`let`",
            TokenKind::As => "`as`",
            TokenKind::Break => "`break`",
            TokenKind::Continue => "`continue`",
            TokenKind::Return => "`return`",
            TokenKind::While => "`while`",
            TokenKind::When => "`when`",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Int { value, radix } => {
                return match radix {
                    Radix::Binary => write!(f, "integer `0b{:b}`", value),
                    Radix::Decimal => write!(f, "integer `{}`", value),
                    Radix::Hexadecimal => write!(f, "integer `0x{:X}`", value),
                }
            }
            TokenKind::Float(value) => return write!(f, "float `{}`", value),
            TokenKind::Bool(value) => return write!(f, "`{}`", value),
            TokenKind::Char(c) => return write!(f, "character {:?}", c),
            TokenKind::Str(_) => "string literal",
            TokenKind::TypeSpec(ts) => match ts {
                TypeSpec::Bool => "`bool`",
                TypeSpec::Char => "`char`",
                TypeSpec::Int => "`int`",
                TypeSpec::Float => "`float`",
            },
        };
        f.write_str(spelling)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Location,
}

impl Token {
    pub fn new(kind: TokenKind, loc: Location) -> Self {
        Self { kind, loc }
    }

    pub fn is_eof(&self) -> bool {
        self.kind.is_eof()
    }

    pub fn ident(&self) -> Option<Symbol> {
        match self.kind {
            TokenKind::Ident(sym) => Some(sym),
            _ => None,
        }
    }
}
