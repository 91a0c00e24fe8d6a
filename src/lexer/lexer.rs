use std::sync::Arc;

use crate::error::{CompileError, LexError, Result};
use crate::source::{Location, SourceFile};
use crate::symbol::Interner;

use super::{
    token::{KEYWORDS, ONE_SYMBOL_TOKENS, TWO_SYMBOLS_TOKENS},
    Radix, Token, TokenKind,
};

/// Produces tokens one at a time. Once the input is exhausted every further
/// call to [`Lexer::scan`] returns `Eof`.
#[derive(Debug)]
pub struct Lexer<'a> {
    chars: Vec<char>,
    index: usize,
    file: Option<Arc<str>>,
    line: u32,
    column: u32,
    interner: &'a Interner,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &SourceFile, interner: &'a Interner) -> Self {
        let start = source.start();
        Self {
            chars: source.text().chars().collect(),
            index: 0,
            file: start.file,
            line: start.line,
            column: start.column,
            interner,
        }
    }

    /// Scans the whole input. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = vec![];
        loop {
            let token = self.scan()?;
            let eof = token.is_eof();
            tokens.push(token);
            if eof {
                return Ok(tokens);
            }
        }
    }

    pub fn scan(&mut self) -> Result<Token> {
        self.skip_blanks();

        let loc = self.location();
        let Some(c) = self.peek(0) else {
            return Ok(Token::new(TokenKind::Eof, loc));
        };

        if c.is_ascii_digit() {
            return self.scan_number(loc);
        }
        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.scan_identifier(loc));
        }
        if c == '\'' {
            return self.scan_char(loc);
        }
        if c == '"' {
            return self.scan_string(loc);
        }

        if let Some(c2) = self.peek(1) {
            let s: String = [c, c2].iter().collect();
            if let Some(kind) = TWO_SYMBOLS_TOKENS.get(s.as_str()) {
                self.bump();
                self.bump();
                return Ok(Token::new(kind.clone(), loc));
            }
        }
        if let Some(kind) = ONE_SYMBOL_TOKENS.get(&c) {
            self.bump();
            return Ok(Token::new(kind.clone(), loc));
        }

        Err(CompileError::lexical(loc, LexError::InvalidCharacter(c)))
    }

    fn location(&self) -> Location {
        Location {
            file: self.file.clone(),
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.index + n).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.index += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek(0).filter(|&c| pred(c)) {
            s.push(c);
            self.bump();
        }
        s
    }

    fn skip_blanks(&mut self) {
        while let Some(c) = self.peek(0) {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '#' => {
                    self.take_while(|c| c != '\n');
                }
                _ => return,
            }
        }
    }

    fn scan_identifier(&mut self, loc: Location) -> Token {
        let s = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');

        if let Some(kind) = KEYWORDS.get(s.as_str()) {
            Token::new(kind.clone(), loc)
        } else {
            Token::new(TokenKind::Ident(self.interner.intern(&s)), loc)
        }
    }

    fn scan_number(&mut self, loc: Location) -> Result<Token> {
        if self.peek(0) == Some('0') {
            match self.peek(1) {
                Some('b' | 'B') => return self.scan_prefixed(loc, Radix::Binary, "binary"),
                Some('x' | 'X') => return self.scan_prefixed(loc, Radix::Hexadecimal, "hexadecimal"),
                _ => {}
            }
        }

        let digits = self.take_while(|c| c.is_ascii_digit());
        if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            let fraction = self.take_while(|c| c.is_ascii_digit());
            let text = format!("{}.{}", digits, fraction);
            let value = text
                .parse::<f64>()
                .map_err(|e| CompileError::internal(format!("bad float `{}`: {}", text, e)))?;
            return Ok(Token::new(TokenKind::Float(value), loc));
        }

        integer(loc, &digits, Radix::Decimal)
    }

    fn scan_prefixed(&mut self, loc: Location, radix: Radix, name: &'static str) -> Result<Token> {
        self.bump();
        self.bump();
        let digits = self.take_while(|c| c.is_digit(radix.base()));
        if digits.is_empty() {
            return Err(CompileError::lexical(loc, LexError::MissingDigits(name)));
        }
        integer(loc, &digits, radix)
    }

    fn scan_char(&mut self, loc: Location) -> Result<Token> {
        self.bump();
        match self.peek(0) {
            None => return Err(CompileError::lexical(loc, LexError::UnterminatedChar)),
            Some('\'') => return Err(CompileError::lexical(loc, LexError::EmptyChar)),
            Some('\n') => return Err(CompileError::lexical(loc, LexError::NewlineInLiteral)),
            Some(_) => {}
        }

        let c = self.scan_literal_char(&loc)?;
        match self.peek(0) {
            Some('\'') => {
                self.bump();
                Ok(Token::new(TokenKind::Char(c), loc))
            }
            None => Err(CompileError::lexical(loc, LexError::UnterminatedChar)),
            Some('\n') => Err(CompileError::lexical(loc, LexError::NewlineInLiteral)),
            Some(_) => Err(CompileError::lexical(loc, LexError::MultiCharacterChar)),
        }
    }

    fn scan_string(&mut self, loc: Location) -> Result<Token> {
        self.bump();
        let mut s = String::new();
        loop {
            match self.peek(0) {
                None => return Err(CompileError::lexical(loc, LexError::UnterminatedString)),
                Some('\n') => return Err(CompileError::lexical(loc, LexError::NewlineInLiteral)),
                Some('"') => {
                    self.bump();
                    break;
                }
                Some(_) => s.push(self.scan_literal_char(&loc)?),
            }
        }
        Ok(Token::new(TokenKind::Str(self.interner.intern(&s)), loc))
    }

    /// One character of a char or string literal, with escapes resolved.
    fn scan_literal_char(&mut self, loc: &Location) -> Result<char> {
        let Some(c) = self.bump() else {
            return Err(CompileError::lexical(loc.clone(), LexError::UnterminatedChar));
        };
        if c != '\\' {
            return Ok(c);
        }

        let Some(e) = self.bump() else {
            return Err(CompileError::lexical(loc.clone(), LexError::UnterminatedEscape));
        };
        let escaped = match e {
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0b',
            '\'' => '\'',
            '"' => '"',
            '\\' => '\\',
            '\n' => return Err(CompileError::lexical(loc.clone(), LexError::NewlineInLiteral)),
            other => return Err(CompileError::lexical(loc.clone(), LexError::InvalidEscape(other))),
        };
        Ok(escaped)
    }
}

fn integer(loc: Location, digits: &str, radix: Radix) -> Result<Token> {
    match i64::from_str_radix(digits, radix.base()) {
        Ok(value) => Ok(Token::new(TokenKind::Int { value, radix }, loc)),
        Err(_) => Err(CompileError::lexical(
            loc,
            LexError::IntegerOverflow(format!("{}{}", radix.prefix(), digits)),
        )),
    }
}
