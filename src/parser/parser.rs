use std::collections::VecDeque;

use crate::analyzer::{Semantics, Ty};
use crate::error::{CompileError, Result};
use crate::lexer::{
    ArithmeticOp, BitwiseOp, Lexer, LogicalOp, RelationalOp, Token, TokenKind,
};
use crate::source::SourceFile;
use crate::symbol::{Interner, Symbol};

use super::{DeclId, ExprId, StmtId, TranslationUnit};

/// Recursive-descent parser. Tokens are pulled from the lexer only as far as
/// the grammar needs to look ahead, and every production is handed to the
/// semantic actions as soon as it is recognized.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    tokens: VecDeque<Token>,
    sema: Semantics<'a>,
    program_name: Symbol,
}

impl<'a> Parser<'a> {
    pub fn new(source: &SourceFile, interner: &'a Interner) -> Self {
        Self {
            lexer: Lexer::new(source, interner),
            tokens: VecDeque::new(),
            sema: Semantics::new(interner),
            program_name: interner.intern(source.name()),
        }
    }

    pub fn parse(mut self) -> Result<TranslationUnit> {
        self.sema.enter_global_scope()?;
        let decls = self.parse_program()?;
        self.sema.leave_scope()?;

        let program = self.sema.on_program(self.program_name, decls);
        Ok(self.sema.finish(program))
    }

    fn lookahead(&mut self, n: usize) -> Result<&Token> {
        while self.tokens.len() <= n {
            let token = self.lexer.scan()?;
            self.tokens.push_back(token);
        }
        Ok(&self.tokens[n])
    }

    fn peek(&mut self) -> Result<TokenKind> {
        Ok(self.lookahead(0)?.kind.clone())
    }

    fn next_token(&mut self) -> Result<Token> {
        self.lookahead(0)?;
        self.tokens
            .pop_front()
            .ok_or_else(|| CompileError::internal("lookahead buffer is empty"))
    }

    fn consume(&mut self, kind: &TokenKind) -> Result<Option<Token>> {
        if &self.lookahead(0)?.kind != kind {
            return Ok(None);
        }
        self.next_token().map(Some)
    }

    fn consume_if(&mut self, pred: impl Fn(&TokenKind) -> bool) -> Result<Option<Token>> {
        if !pred(&self.lookahead(0)?.kind) {
            return Ok(None);
        }
        self.next_token().map(Some)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        match self.consume(kind)? {
            Some(t) => Ok(t),
            None => self.syntax_error(kind.to_string()),
        }
    }

    fn expect_ident(&mut self) -> Result<Token> {
        match self.consume_if(|k| matches!(k, TokenKind::Ident(_)))? {
            Some(t) => Ok(t),
            None => self.syntax_error("identifier"),
        }
    }

    fn syntax_error<T>(&mut self, expected: impl Into<String>) -> Result<T> {
        let found = self.lookahead(0)?;
        Err(CompileError::syntax(
            found.loc.clone(),
            expected,
            found.kind.to_string(),
        ))
    }

    /// program = declaration* EOF
    fn parse_program(&mut self) -> Result<Vec<DeclId>> {
        let mut decls = vec![];
        while !self.peek()?.is_eof() {
            decls.push(self.parse_declaration()?);
        }
        Ok(decls)
    }

    /// declaration = variable-definition
    ///             | constant-definition
    ///             | value-definition
    ///             | function-definition
    fn parse_declaration(&mut self) -> Result<DeclId> {
        match self.peek()? {
            TokenKind::Var => self.parse_variable_definition(),
            TokenKind::Let => self.parse_constant_definition(),
            TokenKind::Def => match self.lookahead(2)?.kind.clone() {
                TokenKind::Colon => self.parse_value_definition(),
                TokenKind::LeftParen => self.parse_function_definition(),
                _ => {
                    self.next_token()?;
                    self.expect_ident()?;
                    self.syntax_error("`:` or `(`")
                }
            },
            _ => self.syntax_error("declaration"),
        }
    }

    /// local-declaration = variable-definition
    ///                   | constant-definition
    ///                   | value-definition
    fn parse_local_declaration(&mut self) -> Result<DeclId> {
        match self.peek()? {
            TokenKind::Var => self.parse_variable_definition(),
            TokenKind::Let => self.parse_constant_definition(),
            TokenKind::Def => {
                if self.lookahead(2)?.kind == TokenKind::Colon {
                    return self.parse_value_definition();
                }
                self.next_token()?;
                self.expect_ident()?;
                self.syntax_error(TokenKind::Colon.to_string())
            }
            _ => self.syntax_error("declaration"),
        }
    }

    /// variable-definition = "var" identifier ":" type "=" expression ";"
    fn parse_variable_definition(&mut self) -> Result<DeclId> {
        self.expect(&TokenKind::Var)?;
        let (name, ty) = self.parse_object_head()?;
        let d = self.sema.on_variable_declaration(&name, ty)?;
        let e = self.parse_initializer()?;
        self.sema.on_variable_definition(d, e)
    }

    /// constant-definition = "let" identifier ":" type "=" expression ";"
    fn parse_constant_definition(&mut self) -> Result<DeclId> {
        self.expect(&TokenKind::Let)?;
        let (name, ty) = self.parse_object_head()?;
        let d = self.sema.on_constant_declaration(&name, ty)?;
        let e = self.parse_initializer()?;
        self.sema.on_constant_definition(d, e)
    }

    /// value-definition = "def" identifier ":" type "=" expression ";"
    fn parse_value_definition(&mut self) -> Result<DeclId> {
        self.expect(&TokenKind::Def)?;
        let (name, ty) = self.parse_object_head()?;
        let d = self.sema.on_value_declaration(&name, ty)?;
        let e = self.parse_initializer()?;
        self.sema.on_value_definition(d, e)
    }

    fn parse_object_head(&mut self) -> Result<(Token, Ty)> {
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Colon)?;
        let ty = self.parse_type()?;
        Ok((name, ty))
    }

    fn parse_initializer(&mut self) -> Result<ExprId> {
        self.expect(&TokenKind::Assign)?;
        let e = self.parse_expression()?;
        self.expect(&TokenKind::SemiColon)?;
        Ok(e)
    }

    /// function-definition = "def" identifier "(" parameter-list? ")" "->" type block-statement
    fn parse_function_definition(&mut self) -> Result<DeclId> {
        self.expect(&TokenKind::Def)?;
        let name = self.expect_ident()?;

        self.expect(&TokenKind::LeftParen)?;
        self.sema.enter_parameter_scope();
        let params = self.parse_parameter_list()?;
        self.expect(&TokenKind::RightParen)?;
        self.expect(&TokenKind::Arrow)?;
        let ret = self.parse_type()?;
        self.sema.leave_scope()?;

        let d = self.sema.on_function_declaration(&name, params, ret)?;
        let body = self.parse_block_statement()?;
        self.sema.on_function_definition(d, body)
    }

    /// parameter-list = parameter ("," parameter)*
    /// parameter = identifier ":" type
    fn parse_parameter_list(&mut self) -> Result<Vec<DeclId>> {
        let mut params = vec![];
        if self.peek()? == TokenKind::RightParen {
            return Ok(params);
        }
        loop {
            let name = self.expect_ident()?;
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_type()?;
            params.push(self.sema.on_parameter_declaration(&name, ty)?);
            if self.consume(&TokenKind::Comma)?.is_none() {
                return Ok(params);
            }
        }
    }

    /// type = "bool" | "char" | "int" | "float"
    ///      | "*" type
    ///      | "(" (type ("," type)*)? ")" "->" type
    fn parse_type(&mut self) -> Result<Ty> {
        match self.peek()? {
            TokenKind::TypeSpec(spec) => {
                self.next_token()?;
                Ok(self.sema.on_basic_type(spec))
            }
            TokenKind::Arithmetic(ArithmeticOp::Mul) => {
                self.next_token()?;
                let elem = self.parse_type()?;
                Ok(self.sema.on_pointer_type(elem))
            }
            TokenKind::LeftParen => {
                self.next_token()?;
                let mut params = vec![];
                if self.consume(&TokenKind::RightParen)?.is_none() {
                    loop {
                        params.push(self.parse_type()?);
                        if self.consume(&TokenKind::Comma)?.is_none() {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RightParen)?;
                }
                self.expect(&TokenKind::Arrow)?;
                let ret = self.parse_type()?;
                Ok(self.sema.on_function_type(params, ret))
            }
            _ => self.syntax_error("type"),
        }
    }

    /// stmt = block-statement
    ///      | "if" "(" expression ")" stmt "else" stmt
    ///      | "when" "(" expression ")" stmt
    ///      | "while" "(" expression ")" stmt
    ///      | "break" ";"
    ///      | "continue" ";"
    ///      | "return" expression ";"
    ///      | local-declaration
    ///      | expression ";"
    fn parse_statement(&mut self) -> Result<StmtId> {
        match self.peek()? {
            TokenKind::LeftBrace => self.parse_block_statement(),
            TokenKind::If => {
                self.next_token()?;
                let e = self.parse_guard()?;
                let s1 = self.parse_statement()?;
                self.expect(&TokenKind::Else)?;
                let s2 = self.parse_statement()?;
                self.sema.on_if_statement(e, s1, s2)
            }
            TokenKind::When => {
                self.next_token()?;
                let e = self.parse_guard()?;
                let s = self.parse_statement()?;
                self.sema.on_when_statement(e, s)
            }
            TokenKind::While => {
                self.next_token()?;
                let e = self.parse_guard()?;
                let s = self.parse_statement()?;
                self.sema.on_while_statement(e, s)
            }
            TokenKind::Break => {
                let tok = self.next_token()?;
                self.expect(&TokenKind::SemiColon)?;
                Ok(self.sema.on_break_statement(&tok))
            }
            TokenKind::Continue => {
                let tok = self.next_token()?;
                self.expect(&TokenKind::SemiColon)?;
                Ok(self.sema.on_continue_statement(&tok))
            }
            TokenKind::Return => {
                self.next_token()?;
                let e = self.parse_expression()?;
                self.expect(&TokenKind::SemiColon)?;
                self.sema.on_return_statement(e)
            }
            TokenKind::Var | TokenKind::Let | TokenKind::Def => {
                let d = self.parse_local_declaration()?;
                Ok(self.sema.on_declaration_statement(d))
            }
            _ => {
                let e = self.parse_expression()?;
                self.expect(&TokenKind::SemiColon)?;
                Ok(self.sema.on_expression_statement(e))
            }
        }
    }

    fn parse_guard(&mut self) -> Result<ExprId> {
        self.expect(&TokenKind::LeftParen)?;
        let e = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        Ok(e)
    }

    /// block-statement = "{" stmt* "}"
    fn parse_block_statement(&mut self) -> Result<StmtId> {
        self.expect(&TokenKind::LeftBrace)?;
        self.sema.enter_block_scope();
        self.sema.start_block()?;

        let mut stmts = vec![];
        while self.consume(&TokenKind::RightBrace)?.is_none() {
            stmts.push(self.parse_statement()?);
        }

        self.sema.leave_scope()?;
        Ok(self.sema.on_block_statement(stmts))
    }

    /// expression = assignment
    pub fn parse_expression(&mut self) -> Result<ExprId> {
        self.parse_assignment()
    }

    /// assignment = conditional ("=" assignment)?
    fn parse_assignment(&mut self) -> Result<ExprId> {
        let e1 = self.parse_conditional()?;
        if self.consume(&TokenKind::Assign)?.is_some() {
            let e2 = self.parse_assignment()?;
            return self.sema.on_assignment_expression(e1, e2);
        }
        Ok(e1)
    }

    /// conditional = logical-or ("?" expression ":" conditional)?
    fn parse_conditional(&mut self) -> Result<ExprId> {
        let e1 = self.parse_logical_or()?;
        if self.consume(&TokenKind::Question)?.is_some() {
            let e2 = self.parse_expression()?;
            self.expect(&TokenKind::Colon)?;
            let e3 = self.parse_conditional()?;
            return self.sema.on_conditional_expression(e1, e2, e3);
        }
        Ok(e1)
    }

    /// logical-or = logical-and ("||" logical-and)*
    fn parse_logical_or(&mut self) -> Result<ExprId> {
        let mut e = self.parse_logical_and()?;
        while let Some(op) = self.consume(&TokenKind::Logical(LogicalOp::Or))? {
            let rhs = self.parse_logical_and()?;
            e = self.sema.on_logical_or_expression(&op, e, rhs)?;
        }
        Ok(e)
    }

    /// logical-and = bitwise-or ("&&" bitwise-or)*
    fn parse_logical_and(&mut self) -> Result<ExprId> {
        let mut e = self.parse_bitwise_or()?;
        while let Some(op) = self.consume(&TokenKind::Logical(LogicalOp::And))? {
            let rhs = self.parse_bitwise_or()?;
            e = self.sema.on_logical_and_expression(&op, e, rhs)?;
        }
        Ok(e)
    }

    /// bitwise-or = bitwise-xor ("|" bitwise-xor)*
    fn parse_bitwise_or(&mut self) -> Result<ExprId> {
        let mut e = self.parse_bitwise_xor()?;
        while let Some(op) = self.consume(&TokenKind::Bitwise(BitwiseOp::Or))? {
            let rhs = self.parse_bitwise_xor()?;
            e = self.sema.on_bitwise_or_expression(&op, e, rhs)?;
        }
        Ok(e)
    }

    /// bitwise-xor = bitwise-and ("^" bitwise-and)*
    fn parse_bitwise_xor(&mut self) -> Result<ExprId> {
        let mut e = self.parse_bitwise_and()?;
        while let Some(op) = self.consume(&TokenKind::Bitwise(BitwiseOp::Xor))? {
            let rhs = self.parse_bitwise_and()?;
            e = self.sema.on_bitwise_xor_expression(&op, e, rhs)?;
        }
        Ok(e)
    }

    /// bitwise-and = equality ("&" equality)*
    fn parse_bitwise_and(&mut self) -> Result<ExprId> {
        let mut e = self.parse_equality()?;
        while let Some(op) = self.consume(&TokenKind::Bitwise(BitwiseOp::And))? {
            let rhs = self.parse_equality()?;
            e = self.sema.on_bitwise_and_expression(&op, e, rhs)?;
        }
        Ok(e)
    }

    /// equality = relational (("==" | "!=") relational)*
    fn parse_equality(&mut self) -> Result<ExprId> {
        let mut e = self.parse_relational()?;
        while let Some(op) = self.consume_if(|k| {
            matches!(
                k,
                TokenKind::Relational(RelationalOp::Eq | RelationalOp::Ne)
            )
        })? {
            let rhs = self.parse_relational()?;
            e = self.sema.on_equality_expression(&op, e, rhs)?;
        }
        Ok(e)
    }

    /// relational = shift (("<" | ">" | "<=" | ">=") shift)*
    fn parse_relational(&mut self) -> Result<ExprId> {
        let mut e = self.parse_shift()?;
        while let Some(op) = self.consume_if(|k| {
            matches!(
                k,
                TokenKind::Relational(
                    RelationalOp::Lt | RelationalOp::Gt | RelationalOp::Le | RelationalOp::Ge
                )
            )
        })? {
            let rhs = self.parse_shift()?;
            e = self.sema.on_relational_expression(&op, e, rhs)?;
        }
        Ok(e)
    }

    /// shift = additive (("<<" | ">>") additive)*
    fn parse_shift(&mut self) -> Result<ExprId> {
        let mut e = self.parse_additive()?;
        while let Some(op) = self
            .consume_if(|k| matches!(k, TokenKind::Bitwise(BitwiseOp::Shl | BitwiseOp::Shr)))?
        {
            let rhs = self.parse_additive()?;
            e = self.sema.on_shift_expression(&op, e, rhs)?;
        }
        Ok(e)
    }

    /// additive = multiplicative (("+" | "-") multiplicative)*
    fn parse_additive(&mut self) -> Result<ExprId> {
        let mut e = self.parse_multiplicative()?;
        while let Some(op) = self.consume_if(|k| {
            matches!(
                k,
                TokenKind::Arithmetic(ArithmeticOp::Add | ArithmeticOp::Sub)
            )
        })? {
            let rhs = self.parse_multiplicative()?;
            e = self.sema.on_additive_expression(&op, e, rhs)?;
        }
        Ok(e)
    }

    /// multiplicative = cast (("*" | "/" | "%") cast)*
    fn parse_multiplicative(&mut self) -> Result<ExprId> {
        let mut e = self.parse_cast()?;
        while let Some(op) = self.consume_if(|k| {
            matches!(
                k,
                TokenKind::Arithmetic(ArithmeticOp::Mul | ArithmeticOp::Div | ArithmeticOp::Mod)
            )
        })? {
            let rhs = self.parse_cast()?;
            e = self.sema.on_multiplicative_expression(&op, e, rhs)?;
        }
        Ok(e)
    }

    /// cast = unary ("as" type)*
    fn parse_cast(&mut self) -> Result<ExprId> {
        let mut e = self.parse_unary()?;
        while self.consume(&TokenKind::As)?.is_some() {
            let ty = self.parse_type()?;
            e = self.sema.on_cast_expression(e, ty)?;
        }
        Ok(e)
    }

    /// unary = "-" integer
    ///       | ("+" | "-" | "*" | "&" | "~" | "!") unary
    ///       | postfix
    fn parse_unary(&mut self) -> Result<ExprId> {
        let op = self.consume_if(|k| {
            matches!(
                k,
                TokenKind::Arithmetic(ArithmeticOp::Add | ArithmeticOp::Sub | ArithmeticOp::Mul)
                    | TokenKind::Bitwise(BitwiseOp::And | BitwiseOp::Not)
                    | TokenKind::Logical(LogicalOp::Not)
            )
        })?;
        match op {
            Some(op) if self.negates_literal(&op)? => {
                let tok = self.next_token()?;
                self.sema.on_negated_integer_literal(&op, &tok)
            }
            Some(op) => {
                let e = self.parse_unary()?;
                self.sema.on_unary_expression(&op, e)
            }
            None => self.parse_postfix(),
        }
    }

    /// A `-` directly before an integer literal that has no postfix operator.
    fn negates_literal(&mut self, op: &Token) -> Result<bool> {
        if op.kind != TokenKind::Arithmetic(ArithmeticOp::Sub)
            || !matches!(self.peek()?, TokenKind::Int { .. })
        {
            return Ok(false);
        }
        let next = &self.lookahead(1)?.kind;
        Ok(!matches!(next, TokenKind::LeftParen | TokenKind::LeftBracket))
    }

    /// postfix = primary ("(" arguments? ")" | "[" arguments? "]")*
    fn parse_postfix(&mut self) -> Result<ExprId> {
        let mut e = self.parse_primary()?;
        loop {
            if self.consume(&TokenKind::LeftParen)?.is_some() {
                let args = self.parse_arguments(&TokenKind::RightParen)?;
                e = self.sema.on_call_expression(e, args)?;
            } else if self.consume(&TokenKind::LeftBracket)?.is_some() {
                let args = self.parse_arguments(&TokenKind::RightBracket)?;
                e = self.sema.on_index_expression(e, args)?;
            } else {
                return Ok(e);
            }
        }
    }

    /// arguments = expression ("," expression)*
    fn parse_arguments(&mut self, close: &TokenKind) -> Result<Vec<ExprId>> {
        let mut args = vec![];
        if self.consume(close)?.is_some() {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.consume(&TokenKind::Comma)?.is_none() {
                break;
            }
        }
        self.expect(close)?;
        Ok(args)
    }

    /// primary = integer | float | "true" | "false" | char | string
    ///         | identifier
    ///         | "(" expression ")"
    fn parse_primary(&mut self) -> Result<ExprId> {
        match self.peek()? {
            TokenKind::Int { .. } => {
                let tok = self.next_token()?;
                self.sema.on_integer_literal(&tok)
            }
            TokenKind::Float(_) => {
                let tok = self.next_token()?;
                self.sema.on_float_literal(&tok)
            }
            TokenKind::Bool(_) => {
                let tok = self.next_token()?;
                self.sema.on_boolean_literal(&tok)
            }
            TokenKind::Char(_) => {
                let tok = self.next_token()?;
                self.sema.on_char_literal(&tok)
            }
            TokenKind::Str(_) => {
                let tok = self.next_token()?;
                self.sema.on_string_literal(&tok)
            }
            TokenKind::Ident(_) => {
                let tok = self.next_token()?;
                self.sema.on_id_expression(&tok)
            }
            TokenKind::LeftParen => {
                self.next_token()?;
                let e = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(e)
            }
            _ => self.syntax_error("expression"),
        }
    }
}
