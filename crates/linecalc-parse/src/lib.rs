pub mod parser;
pub mod tokenizer;

pub use parser::{AstNode, AstNodeType, Parser, ParserError, parse};
pub use tokenizer::{Associativity, Token, TokenSubType, TokenType, Tokenizer, TokenizerError};

// Re-export common types
pub use linecalc_common::{CalcError, CalcErrorKind, Value};
