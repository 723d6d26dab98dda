//! Preprocessor and lexer for the SC language front end.

pub mod cursor;
pub mod lexer;
pub mod preprocessor;
pub mod token;

pub use lexer::Lexer;
pub use preprocessor::{preprocess, PreprocessError};
pub use token::{Token, TokenKind};

use std::path::Path;

/// Runs the preprocessor then the lexer over a root source file.
pub fn lex_file(path: &Path) -> Result<Vec<Token>, PreprocessError> {
    let source = preprocess(path)?;
    Ok(Lexer::new(&source).tokenize())
}

/// Returns the first error token in the stream, if any. The front end must
/// call this and abort before handing the stream to the parser.
pub fn first_error(tokens: &[Token]) -> Option<&Token> {
    tokens.iter().find(|t| t.kind == TokenKind::Error)
}
