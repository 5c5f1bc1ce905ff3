pub mod parser;
pub mod references;
pub mod tokenizer;

pub use parser::{ASTNode, ASTNodeType, Parser, ParserError, parse};
pub use references::{FieldReference, find_references, substitute_references};
pub use tokenizer::{
    Token, TokenSubType, TokenType, Tokenizer, TokenizerError, quote_text, unquote_text,
};

// Re-export common types
pub use formsmith_common::{FieldValue, FormulaError, FormulaErrorKind};
