use crate::tokenizer::{
    Associativity, IMPLICIT_MUL_PRECEDENCE, Token, TokenSubType, TokenType, Tokenizer,
    TokenizerError,
};
use linecalc_common::{CalcError, CalcErrorKind};

use std::error::Error;
use std::fmt::{self, Display};

/// Binding power of prefix `+`/`-`: looser than `^` so `-2^2` is `-(2^2)`.
const PREFIX_PRECEDENCE: u8 = 7;

/// Deepest sub-expression nesting accepted before parsing gives up.
pub const MAX_NESTING_DEPTH: usize = 100;

/// A custom error type for the parser.
#[derive(Debug)]
pub struct ParserError {
    pub message: String,
    pub position: Option<usize>,
    pub unbalanced: bool,
}

impl Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pos) = self.position {
            write!(f, "ParserError at position {}: {}", pos, self.message)
        } else {
            write!(f, "ParserError: {}", self.message)
        }
    }
}

impl Error for ParserError {}

impl ParserError {
    fn at(message: impl Into<String>, position: usize) -> Self {
        ParserError {
            message: message.into(),
            position: Some(position),
            unbalanced: false,
        }
    }
}

impl From<TokenizerError> for ParserError {
    fn from(err: TokenizerError) -> Self {
        let unbalanced = err.message.contains("parenthesis") || err.message.contains("bracket");
        ParserError {
            message: err.message,
            position: Some(err.pos),
            unbalanced,
        }
    }
}

impl From<ParserError> for CalcError {
    fn from(err: ParserError) -> Self {
        let kind = if err.unbalanced {
            CalcErrorKind::Unbalanced
        } else {
            CalcErrorKind::Syntax
        };
        CalcError::new(kind).with_message(err.message)
    }
}

/// The different types of AST nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNodeType {
    Number(f64),
    Text(String),
    Symbol(String),
    UnaryOp {
        op: String,
        expr: Box<AstNode>,
    },
    BinaryOp {
        op: String,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Function {
        name: String,
        args: Vec<AstNode>,
    },
    Matrix(Vec<Vec<AstNode>>),
    Assign {
        name: String,
        value: Box<AstNode>,
    },
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Box<AstNode>,
        /// Body exactly as typed, used for display and plotting.
        source: String,
    },
}

/// An AST node represents a parsed expression element
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub node_type: AstNodeType,
    pub source_token: Option<Token>,
}

impl AstNode {
    pub fn new(node_type: AstNodeType, source_token: Option<Token>) -> Self {
        AstNode {
            node_type,
            source_token,
        }
    }

    pub fn is_function_def(&self) -> bool {
        matches!(self.node_type, AstNodeType::FunctionDef { .. })
    }

    /// Names this expression reads from scope, in first-use order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.node_type {
            AstNodeType::Symbol(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            AstNodeType::UnaryOp { expr, .. } => expr.collect_symbols(out),
            AstNodeType::BinaryOp { left, right, .. } => {
                left.collect_symbols(out);
                right.collect_symbols(out);
            }
            AstNodeType::Function { args, .. } => {
                for arg in args {
                    arg.collect_symbols(out);
                }
            }
            AstNodeType::Matrix(rows) => {
                for item in rows.iter().flatten() {
                    item.collect_symbols(out);
                }
            }
            AstNodeType::Assign { value, .. } => value.collect_symbols(out),
            AstNodeType::FunctionDef { .. } | AstNodeType::Number(_) | AstNodeType::Text(_) => {}
        }
    }
}

/// A parser for converting tokens into an AST.
pub struct Parser {
    source: String,
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(source: &str, tokens: Vec<Token>) -> Self {
        let filtered_tokens = tokens
            .into_iter()
            .filter(|t| t.token_type != TokenType::Whitespace)
            .collect();
        Parser {
            source: source.to_string(),
            tokens: filtered_tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Parse the tokens into an AST.
    pub fn parse(&mut self) -> Result<AstNode, ParserError> {
        if self.tokens.is_empty() {
            return Err(ParserError {
                message: "Empty expression".to_string(),
                position: None,
                unbalanced: false,
            });
        }

        let ast = self.parse_expression()?;
        if self.position < self.tokens.len() {
            return Err(ParserError::at(
                format!("Unexpected token '{}'", self.tokens[self.position].value),
                self.tokens[self.position].start,
            ));
        }
        Ok(ast)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn end_position(&self) -> usize {
        self.tokens.last().map(|t| t.end).unwrap_or(0)
    }

    fn parse_expression(&mut self) -> Result<AstNode, ParserError> {
        self.parse_binary_op(0)
    }

    fn parse_binary_op(&mut self, min_precedence: u8) -> Result<AstNode, ParserError> {
        if self.depth >= MAX_NESTING_DEPTH {
            let at = self.peek().map(|t| t.start).unwrap_or_else(|| self.end_position());
            return Err(ParserError::at("Expression is nested too deeply", at));
        }
        self.depth += 1;
        let result = self.parse_binary_op_nested(min_precedence);
        self.depth -= 1;
        result
    }

    fn parse_binary_op_nested(&mut self, min_precedence: u8) -> Result<AstNode, ParserError> {
        let mut left = self.parse_unary_op()?;

        while let Some(token) = self.peek() {
            if token.token_type == TokenType::OpInfix {
                let (precedence, associativity) =
                    token.get_precedence().unwrap_or((0, Associativity::Left));
                if precedence < min_precedence {
                    break;
                }

                let op_token = token.clone();
                self.position += 1;

                if op_token.value == "=" {
                    left = self.parse_assignment(left, op_token)?;
                    continue;
                }

                let next_min_precedence = if associativity == Associativity::Left {
                    precedence + 1
                } else {
                    precedence
                };

                let right = self.parse_binary_op(next_min_precedence)?;
                let op = match op_token.value.as_str() {
                    "**" => "^",
                    "mod" => "%",
                    "in" => "to",
                    other => other,
                }
                .to_string();
                left = AstNode::new(
                    AstNodeType::BinaryOp {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    Some(op_token),
                );
            } else if token.starts_operand() {
                // Juxtaposition: `2x`, `5 km`, `2(3)`
                if IMPLICIT_MUL_PRECEDENCE < min_precedence {
                    break;
                }
                let right = self.parse_binary_op(IMPLICIT_MUL_PRECEDENCE + 1)?;
                left = AstNode::new(
                    AstNodeType::BinaryOp {
                        op: "*".to_string(),
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    None,
                );
            } else {
                break;
            }
        }

        Ok(left)
    }

    /// `name = expr` stores a variable; `name(a, b) = expr` defines a function.
    fn parse_assignment(
        &mut self,
        target: AstNode,
        op_token: Token,
    ) -> Result<AstNode, ParserError> {
        let body_start = self.position;
        let value = self.parse_binary_op(1)?;
        let source = match (self.tokens.get(body_start), self.tokens.get(self.position - 1)) {
            (Some(first), Some(last)) if self.position > body_start => {
                self.source[first.start..last.end].to_string()
            }
            _ => String::new(),
        };

        match target.node_type {
            AstNodeType::Symbol(name) => Ok(AstNode::new(
                AstNodeType::Assign {
                    name,
                    value: Box::new(value),
                },
                Some(op_token),
            )),
            AstNodeType::Function { name, args } => {
                let mut params = Vec::with_capacity(args.len());
                for arg in args {
                    match arg.node_type {
                        AstNodeType::Symbol(p) => params.push(p),
                        _ => {
                            return Err(ParserError::at(
                                format!("Invalid parameter list for function '{name}'"),
                                op_token.start,
                            ));
                        }
                    }
                }
                Ok(AstNode::new(
                    AstNodeType::FunctionDef {
                        name,
                        params,
                        body: Box::new(value),
                        source,
                    },
                    Some(op_token),
                ))
            }
            _ => Err(ParserError::at("Invalid assignment target", op_token.start)),
        }
    }

    fn parse_unary_op(&mut self) -> Result<AstNode, ParserError> {
        if let Some(token) = self.peek() {
            if token.token_type == TokenType::OpPrefix {
                let op_token = token.clone();
                self.position += 1;
                let expr = self.parse_binary_op(PREFIX_PRECEDENCE)?;
                return Ok(AstNode::new(
                    AstNodeType::UnaryOp {
                        op: op_token.value.clone(),
                        expr: Box::new(expr),
                    },
                    Some(op_token),
                ));
            }
        }
        self.parse_postfix_op()
    }

    fn parse_postfix_op(&mut self) -> Result<AstNode, ParserError> {
        let mut expr = self.parse_primary()?;

        while let Some(token) = self.peek() {
            if token.token_type != TokenType::OpPostfix {
                break;
            }
            let op_token = token.clone();
            self.position += 1;
            expr = AstNode::new(
                AstNodeType::UnaryOp {
                    op: op_token.value.clone(),
                    expr: Box::new(expr),
                },
                Some(op_token),
            );
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<AstNode, ParserError> {
        let Some(token) = self.peek().cloned() else {
            return Err(ParserError::at("Unexpected end of expression", self.end_position()));
        };

        match token.token_type {
            TokenType::Operand => {
                self.position += 1;
                self.parse_operand(token)
            }
            TokenType::Func if token.subtype == TokenSubType::Open => {
                self.position += 1;
                self.parse_function(token)
            }
            TokenType::Paren if token.subtype == TokenSubType::Open => {
                self.position += 1;
                let expr = self.parse_expression()?;
                match self.peek() {
                    Some(t)
                        if t.token_type == TokenType::Paren
                            && t.subtype == TokenSubType::Close =>
                    {
                        self.position += 1;
                        Ok(expr)
                    }
                    _ => Err(ParserError::at("Expected closing parenthesis", self.end_position())),
                }
            }
            TokenType::Matrix if token.subtype == TokenSubType::Open => {
                self.position += 1;
                self.parse_matrix()
            }
            _ => Err(ParserError::at(
                format!("Unexpected token '{}'", token.value),
                token.start,
            )),
        }
    }

    fn parse_operand(&mut self, token: Token) -> Result<AstNode, ParserError> {
        match token.subtype {
            TokenSubType::Number => {
                let value = parse_number_literal(&token.value).ok_or_else(|| {
                    ParserError::at(format!("Invalid number: {}", token.value), token.start)
                })?;
                Ok(AstNode::new(AstNodeType::Number(value), Some(token)))
            }
            TokenSubType::Text => {
                let text = unescape_text(&token.value);
                Ok(AstNode::new(AstNodeType::Text(text), Some(token)))
            }
            TokenSubType::Identifier => Ok(AstNode::new(
                AstNodeType::Symbol(token.value.clone()),
                Some(token),
            )),
            _ => Err(ParserError::at(
                format!("Unexpected operand subtype: {:?}", token.subtype),
                token.start,
            )),
        }
    }

    fn parse_function(&mut self, func_token: Token) -> Result<AstNode, ParserError> {
        let name = func_token.value[..func_token.value.len() - 1].to_string();
        let args = self.parse_function_arguments()?;
        Ok(AstNode::new(
            AstNodeType::Function { name, args },
            Some(func_token),
        ))
    }

    /// Parse function arguments.
    fn parse_function_arguments(&mut self) -> Result<Vec<AstNode>, ParserError> {
        let mut args = Vec::new();

        // Check for closing parenthesis (empty arguments)
        if let Some(t) = self.peek() {
            if t.token_type == TokenType::Func && t.subtype == TokenSubType::Close {
                self.position += 1;
                return Ok(args);
            }
        }

        loop {
            args.push(self.parse_expression()?);
            match self.peek() {
                Some(t) if t.token_type == TokenType::Sep && t.subtype == TokenSubType::Arg => {
                    self.position += 1;
                }
                Some(t) if t.token_type == TokenType::Func && t.subtype == TokenSubType::Close => {
                    self.position += 1;
                    break;
                }
                Some(t) => {
                    return Err(ParserError::at(
                        format!("Expected ',' or ')' in function arguments, got '{}'", t.value),
                        t.start,
                    ));
                }
                None => {
                    return Err(ParserError::at(
                        "Unexpected end of function arguments",
                        self.end_position(),
                    ));
                }
            }
        }

        Ok(args)
    }

    fn parse_matrix(&mut self) -> Result<AstNode, ParserError> {
        let mut rows = Vec::new();

        // Check for empty matrix
        if let Some(t) = self.peek() {
            if t.token_type == TokenType::Matrix && t.subtype == TokenSubType::Close {
                self.position += 1;
                return Ok(AstNode::new(AstNodeType::Matrix(rows), None));
            }
        }

        let mut current_row = vec![self.parse_expression()?];
        loop {
            let Some(token) = self.peek().cloned() else {
                return Err(ParserError::at("Unexpected end of matrix", self.end_position()));
            };
            match (token.token_type, token.subtype) {
                (TokenType::Sep, TokenSubType::Arg) => {
                    self.position += 1;
                    current_row.push(self.parse_expression()?);
                }
                (TokenType::Sep, TokenSubType::Row) => {
                    self.position += 1;
                    rows.push(std::mem::take(&mut current_row));
                    current_row.push(self.parse_expression()?);
                }
                (TokenType::Matrix, TokenSubType::Close) => {
                    self.position += 1;
                    rows.push(current_row);
                    break;
                }
                _ => {
                    return Err(ParserError::at(
                        format!("Unexpected token in matrix: '{}'", token.value),
                        token.start,
                    ));
                }
            }
        }

        if rows.iter().any(|r| r.len() != rows[0].len()) {
            return Err(ParserError::at("Matrix rows differ in length", self.end_position()));
        }
        Ok(AstNode::new(AstNodeType::Matrix(rows), None))
    }
}

fn parse_number_literal(text: &str) -> Option<f64> {
    let radix = match text.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0b" | "0B") => 2,
        Some("0o" | "0O") => 8,
        _ => return text.parse::<f64>().ok(),
    };
    i64::from_str_radix(&text[2..], radix).ok().map(|n| n as f64)
}

/// Strip surrounding quotes and resolve backslash escapes.
fn unescape_text(raw: &str) -> String {
    let inner = &raw[1..raw.len().saturating_sub(1).max(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

pub fn parse<T: AsRef<str>>(formula: T) -> Result<AstNode, ParserError> {
    let source = formula.as_ref();
    let tokens = Tokenizer::new(source)?.items;
    Parser::new(source, tokens).parse()
}
