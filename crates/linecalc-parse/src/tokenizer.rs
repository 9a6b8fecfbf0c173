use std::convert::TryFrom;
use std::error::Error;
use std::fmt::{self, Display};

use linecalc_common::{CalcError, CalcErrorKind};

/// Words that act as infix operators rather than identifiers.
const WORD_OPERATORS: &[&str] = &["to", "in", "mod"];

/// Represents operator associativity.
#[derive(Debug, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

/// A custom error type for the tokenizer.
#[derive(Debug)]
pub struct TokenizerError {
    pub message: String,
    pub pos: usize,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenizerError: {}", self.message)
    }
}

impl Error for TokenizerError {}

impl From<TokenizerError> for CalcError {
    fn from(err: TokenizerError) -> Self {
        let kind = if err.message.contains("parenthesis") || err.message.contains("bracket") {
            CalcErrorKind::Unbalanced
        } else {
            CalcErrorKind::Syntax
        };
        CalcError::new(kind).with_message(err.message)
    }
}

/// The type of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Operand,
    Func,
    Paren,
    Matrix,
    Sep,
    OpPrefix,
    OpInfix,
    OpPostfix,
    Whitespace,
}

impl Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The subtype of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSubType {
    None,
    Text,
    Number,
    Identifier,
    Open,
    Close,
    Arg,
    Row,
}

impl Display for TokenSubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A token in a calculator expression, with its byte span in the source.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct Token {
    pub value: String,
    pub token_type: TokenType,
    pub subtype: TokenSubType,
    pub start: usize,
    pub end: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} subtype: {:?} value: {}>",
            self.token_type, self.subtype, self.value
        )
    }
}

impl Token {
    pub fn new_with_span(
        value: String,
        token_type: TokenType,
        subtype: TokenSubType,
        start: usize,
        end: usize,
    ) -> Self {
        Token {
            value,
            token_type,
            subtype,
            start,
            end,
        }
    }

    fn from_slice(
        source: &str,
        token_type: TokenType,
        subtype: TokenSubType,
        start: usize,
        end: usize,
    ) -> Self {
        Token {
            value: source[start..end].to_string(),
            token_type,
            subtype,
            start,
            end,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self.token_type,
            TokenType::OpPrefix | TokenType::OpInfix | TokenType::OpPostfix
        )
    }

    /// True for tokens that can begin an operand; used to detect implicit
    /// multiplication (`2x`, `5 km`, `2(3)`).
    pub fn starts_operand(&self) -> bool {
        match self.token_type {
            TokenType::Operand => true,
            TokenType::Func | TokenType::Paren | TokenType::Matrix => {
                self.subtype == TokenSubType::Open
            }
            _ => false,
        }
    }

    pub fn get_precedence(&self) -> Option<(u8, Associativity)> {
        // For a prefix operator, use the 'u' key.
        let op = if self.token_type == TokenType::OpPrefix {
            "u"
        } else {
            self.value.as_str()
        };

        match op {
            "!" => Some((9, Associativity::Left)),
            "^" | "**" => Some((8, Associativity::Right)),
            "u" => Some((7, Associativity::Right)),
            "*" | "/" | "%" | "mod" => Some((5, Associativity::Left)),
            "+" | "-" => Some((4, Associativity::Left)),
            "==" | "!=" | "<" | ">" | "<=" | ">=" => Some((3, Associativity::Left)),
            "to" | "in" => Some((2, Associativity::Left)),
            "=" => Some((1, Associativity::Right)),
            _ => None,
        }
    }

    /// Given an opener token, return the closer text it expects.
    pub fn closer(&self) -> Result<&'static str, TokenizerError> {
        if self.subtype != TokenSubType::Open {
            return Err(TokenizerError {
                message: "Token is not an opener".to_string(),
                pos: self.start,
            });
        }
        Ok(if self.token_type == TokenType::Matrix {
            "]"
        } else {
            ")"
        })
    }
}

/// Binding power given to juxtaposed operands (`2 km`): above `*`/`/`,
/// below unary minus and `^`.
pub const IMPLICIT_MUL_PRECEDENCE: u8 = 6;

/// A tokenizer for calculator expressions.
pub struct Tokenizer {
    formula: String,
    pub items: Vec<Token>,
    token_stack: Vec<Token>,
    offset: usize,
}

impl Tokenizer {
    /// Create a new tokenizer and immediately scan the expression.
    pub fn new(formula: &str) -> Result<Self, TokenizerError> {
        let mut tokenizer = Tokenizer {
            formula: formula.to_string(),
            items: Vec::with_capacity(formula.len() / 2),
            token_stack: Vec::with_capacity(8),
            offset: 0,
        };
        tokenizer.parse()?;
        Ok(tokenizer)
    }

    pub fn source(&self) -> &str {
        &self.formula
    }

    #[inline]
    fn current_char(&self) -> Option<char> {
        self.formula[self.offset..].chars().next()
    }

    #[inline]
    fn peek_char(&self, skip: usize) -> Option<char> {
        self.formula[self.offset..].chars().nth(skip)
    }

    fn last_significant(&self) -> Option<&Token> {
        self.items
            .iter()
            .rev()
            .find(|t| t.token_type != TokenType::Whitespace)
    }

    fn parse(&mut self) -> Result<(), TokenizerError> {
        while let Some(c) = self.current_char() {
            match c {
                '"' | '\'' => self.parse_string(c)?,
                ' ' | '\t' => self.parse_whitespace(),
                '0'..='9' => self.parse_number()?,
                '.' if self.peek_char(1).is_some_and(|n| n.is_ascii_digit()) => {
                    self.parse_number()?
                }
                '+' | '-' | '*' | '/' | '^' | '%' | '!' | '=' | '<' | '>' => {
                    self.parse_operator(c)?
                }
                '(' | '[' => self.parse_opener(c),
                ')' | ']' => self.parse_closer(c)?,
                ',' | ';' => self.parse_separator(c)?,
                c if c.is_alphabetic() || c == '_' || c == '$' => self.parse_identifier(),
                other => {
                    return Err(TokenizerError {
                        message: format!("Unexpected character '{other}'"),
                        pos: self.offset,
                    });
                }
            }
        }

        // Check for unmatched opening parentheses/brackets
        if let Some(open) = self.token_stack.last() {
            let what = if open.token_type == TokenType::Matrix {
                "bracket"
            } else {
                "parenthesis"
            };
            return Err(TokenizerError {
                message: format!("Unmatched opening {what}"),
                pos: open.start,
            });
        }

        Ok(())
    }

    fn parse_whitespace(&mut self) {
        let start = self.offset;
        while matches!(self.current_char(), Some(' ' | '\t')) {
            self.offset += 1;
        }
        self.items.push(Token::from_slice(
            &self.formula,
            TokenType::Whitespace,
            TokenSubType::None,
            start,
            self.offset,
        ));
    }

    /// Decimal (`12`, `1.5`, `.5`, `2e-3`) or radix-prefixed (`0x1F`, `0b101`, `0o17`).
    fn parse_number(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        let bytes = self.formula.as_bytes();

        if bytes[start] == b'0' {
            let radix = match bytes.get(start + 1) {
                Some(b'x' | b'X') => Some(16),
                Some(b'b' | b'B') => Some(2),
                Some(b'o' | b'O') => Some(8),
                _ => None,
            };
            if let Some(radix) = radix {
                let mut end = start + 2;
                while end < bytes.len() && (bytes[end] as char).is_digit(radix) {
                    end += 1;
                }
                if end > start + 2 {
                    self.offset = end;
                    self.items.push(Token::from_slice(
                        &self.formula,
                        TokenType::Operand,
                        TokenSubType::Number,
                        start,
                        end,
                    ));
                    return Ok(());
                }
            }
        }

        let mut end = start;
        let mut dot_seen = false;
        while end < bytes.len() {
            match bytes[end] {
                b'0'..=b'9' => end += 1,
                b'.' if !dot_seen => {
                    dot_seen = true;
                    end += 1;
                }
                _ => break,
            }
        }

        // Scientific notation: only consume the exponent if digits follow.
        if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
            let mut exp_end = end + 1;
            if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
                exp_end += 1;
            }
            let digits_start = exp_end;
            while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                exp_end += 1;
            }
            if exp_end > digits_start {
                end = exp_end;
            }
        }

        if self.formula[start..end].parse::<f64>().is_err() {
            return Err(TokenizerError {
                message: format!("Invalid number '{}'", &self.formula[start..end]),
                pos: start,
            });
        }

        self.offset = end;
        self.items.push(Token::from_slice(
            &self.formula,
            TokenType::Operand,
            TokenSubType::Number,
            start,
            end,
        ));
        Ok(())
    }

    /// Identifiers, word operators (`to`, `in`, `mod`), and function openers `name(`.
    fn parse_identifier(&mut self) {
        let start = self.offset;
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.offset += c.len_utf8();
            } else {
                break;
            }
        }
        let word = &self.formula[start..self.offset];

        if WORD_OPERATORS.contains(&word) && self.follows_operand() {
            self.items.push(Token::from_slice(
                &self.formula,
                TokenType::OpInfix,
                TokenSubType::None,
                start,
                self.offset,
            ));
            return;
        }

        if self.current_char() == Some('(') {
            self.offset += 1;
            let token = Token::from_slice(
                &self.formula,
                TokenType::Func,
                TokenSubType::Open,
                start,
                self.offset,
            );
            self.items.push(token.clone());
            self.token_stack.push(token);
            return;
        }

        self.items.push(Token::from_slice(
            &self.formula,
            TokenType::Operand,
            TokenSubType::Identifier,
            start,
            self.offset,
        ));
    }

    /// Parse a quoted string; backslash escapes the next character.
    fn parse_string(&mut self, delim: char) -> Result<(), TokenizerError> {
        let start = self.offset;
        self.offset += 1; // Skip opening delimiter

        while let Some(c) = self.current_char() {
            self.offset += c.len_utf8();
            if c == '\\' {
                if let Some(escaped) = self.current_char() {
                    self.offset += escaped.len_utf8();
                }
            } else if c == delim {
                self.items.push(Token::from_slice(
                    &self.formula,
                    TokenType::Operand,
                    TokenSubType::Text,
                    start,
                    self.offset,
                ));
                return Ok(());
            }
        }

        Err(TokenizerError {
            message: "Reached end of expression while parsing string".to_string(),
            pos: self.offset,
        })
    }

    /// Whether the previous significant token ends an operand, which decides
    /// prefix vs infix for `+`/`-` and word operators.
    fn follows_operand(&self) -> bool {
        match self.last_significant() {
            Some(p) => {
                p.subtype == TokenSubType::Close
                    || p.token_type == TokenType::OpPostfix
                    || p.token_type == TokenType::Operand
            }
            None => false,
        }
    }

    /// `%` directly followed by an operand is modulo (`20%50`); otherwise it is
    /// a postfix percentage (`50%`, `10% + 1`).
    fn percent_is_infix(&self) -> bool {
        let rest = self.formula[self.offset + 1..].trim_start();
        match rest.chars().next() {
            Some(c) => c.is_alphanumeric() || matches!(c, '.' | '(' | '[' | '"' | '\'' | '_'),
            None => false,
        }
    }

    fn parse_operator(&mut self, c: char) -> Result<(), TokenizerError> {
        let start = self.offset;

        // Two-character operators first
        if let Some(next) = self.peek_char(1) {
            let two: Option<&str> = match (c, next) {
                ('=', '=') => Some("=="),
                ('!', '=') => Some("!="),
                ('<', '=') => Some("<="),
                ('>', '=') => Some(">="),
                ('*', '*') => Some("**"),
                _ => None,
            };
            if two.is_some() {
                self.offset += 2;
                self.items.push(Token::from_slice(
                    &self.formula,
                    TokenType::OpInfix,
                    TokenSubType::None,
                    start,
                    self.offset,
                ));
                return Ok(());
            }
        }

        let token_type = match c {
            '+' | '-' => {
                if self.follows_operand() {
                    TokenType::OpInfix
                } else {
                    TokenType::OpPrefix
                }
            }
            '!' => TokenType::OpPostfix,
            '%' => {
                if self.percent_is_infix() {
                    TokenType::OpInfix
                } else {
                    TokenType::OpPostfix
                }
            }
            _ => TokenType::OpInfix,
        };

        if token_type == TokenType::OpPostfix && !self.follows_operand() {
            return Err(TokenizerError {
                message: format!("Unexpected operator '{c}'"),
                pos: start,
            });
        }

        self.offset += 1;
        self.items.push(Token::from_slice(
            &self.formula,
            token_type,
            TokenSubType::None,
            start,
            self.offset,
        ));
        Ok(())
    }

    fn parse_opener(&mut self, c: char) {
        let token_type = if c == '[' {
            TokenType::Matrix
        } else {
            TokenType::Paren
        };
        let token = Token::from_slice(
            &self.formula,
            token_type,
            TokenSubType::Open,
            self.offset,
            self.offset + 1,
        );
        self.items.push(token.clone());
        self.token_stack.push(token);
        self.offset += 1;
    }

    fn parse_closer(&mut self, c: char) -> Result<(), TokenizerError> {
        let Some(open_token) = self.token_stack.pop() else {
            return Err(TokenizerError {
                message: format!(
                    "No matching opening parenthesis for '{c}' at position {}",
                    self.offset
                ),
                pos: self.offset,
            });
        };
        let expected = open_token.closer()?;
        if !expected.starts_with(c) {
            return Err(TokenizerError {
                message: "Mismatched parenthesis and bracket pair".to_string(),
                pos: self.offset,
            });
        }

        self.items.push(Token::from_slice(
            &self.formula,
            open_token.token_type,
            TokenSubType::Close,
            self.offset,
            self.offset + 1,
        ));
        self.offset += 1;
        Ok(())
    }

    /// `,` separates arguments and matrix columns, `;` separates matrix rows.
    fn parse_separator(&mut self, c: char) -> Result<(), TokenizerError> {
        let inside = self.token_stack.last().map(|t| t.token_type);
        let subtype = match (c, inside) {
            (',', Some(TokenType::Func | TokenType::Matrix)) => TokenSubType::Arg,
            (';', Some(TokenType::Matrix)) => TokenSubType::Row,
            _ => {
                return Err(TokenizerError {
                    message: format!("Unexpected separator '{c}'"),
                    pos: self.offset,
                });
            }
        };
        self.items.push(Token::from_slice(
            &self.formula,
            TokenType::Sep,
            subtype,
            self.offset,
            self.offset + 1,
        ));
        self.offset += 1;
        Ok(())
    }

    /// Reconstruct the expression from the scanned tokens.
    pub fn render(&self) -> String {
        self.items.iter().map(|t| t.value.as_str()).collect()
    }
}

impl TryFrom<&str> for Tokenizer {
    type Error = TokenizerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Tokenizer::new(value)
    }
}

impl TryFrom<String> for Tokenizer {
    type Error = TokenizerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tokenizer::new(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenType, String)> {
        Tokenizer::new(src)
            .unwrap()
            .items
            .into_iter()
            .filter(|t| t.token_type != TokenType::Whitespace)
            .map(|t| (t.token_type, t.value))
            .collect()
    }

    #[test]
    fn prefix_and_infix_minus() {
        let toks = kinds("-2 - -3");
        assert_eq!(toks[0].0, TokenType::OpPrefix);
        assert_eq!(toks[2].0, TokenType::OpInfix);
        assert_eq!(toks[3].0, TokenType::OpPrefix);
    }

    #[test]
    fn percent_modulo_vs_postfix() {
        assert_eq!(kinds("20%50")[1].0, TokenType::OpInfix);
        assert_eq!(kinds("50%")[1].0, TokenType::OpPostfix);
        assert_eq!(kinds("50% + 1")[1].0, TokenType::OpPostfix);
    }

    #[test]
    fn numbers_units_and_functions() {
        let toks = kinds("2.5e3km + sqrt(0x10)");
        assert_eq!(toks[0], (TokenType::Operand, "2.5e3".to_string()));
        assert_eq!(toks[1], (TokenType::Operand, "km".to_string()));
        assert_eq!(toks[3], (TokenType::Func, "sqrt(".to_string()));
        assert_eq!(toks[4], (TokenType::Operand, "0x10".to_string()));
    }

    #[test]
    fn word_operators_only_after_operands() {
        assert_eq!(kinds("5 km to m")[2].0, TokenType::OpInfix);
        // `in` at the start is an identifier (e.g. a variable named `in`).
        assert_eq!(kinds("in")[0].0, TokenType::Operand);
    }

    #[test]
    fn unbalanced_is_rejected() {
        assert!(Tokenizer::new("(1 + 2").is_err());
        assert!(Tokenizer::new("1 + 2)").is_err());
        assert!(Tokenizer::new("[1, 2)").is_err());
        let err: CalcError = Tokenizer::new("(1").err().unwrap().into();
        assert_eq!(err.kind, CalcErrorKind::Unbalanced);
    }

    #[test]
    fn render_round_trips() {
        assert!(Tokenizer::new("max(1; 2)").is_err());
        let src = "[1, 2; 3, 4] * \"q\\\"\"";
        assert_eq!(Tokenizer::new(src).unwrap().render(), src);
    }
}
