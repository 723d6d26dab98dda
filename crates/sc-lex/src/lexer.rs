//! The lexer: turns a flat source string into a token stream.

use crate::cursor::Cursor;
use crate::token::{keyword_kind, Token, TokenKind};

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Tokenizes the whole input, always terminating with a single `Eof`
    /// token. Lexical errors are not raised here: they come back as
    /// `TokenKind::Error` tokens mixed into the stream, so a caller can
    /// decide whether to stop at the first one or collect them all.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self) -> Token {
        if let Some(err) = self.skip_whitespace_and_comments() {
            return err;
        }

        let line = self.cursor.line();
        let column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Token::new(TokenKind::Eof, "", line, column);
        }

        let c = self.cursor.current();

        if c == '_' || c.is_ascii_alphabetic() {
            return self.lex_identifier(line, column);
        }
        if c.is_ascii_digit() {
            return self.lex_number(line, column);
        }

        self.lex_operator_or_punct(line, column)
    }

    /// Skips whitespace and comments, returning an error token in place of
    /// an unterminated `/* ... */` block comment.
    fn skip_whitespace_and_comments(&mut self) -> Option<Token> {
        loop {
            match self.cursor.current() {
                ' ' | '\t' | '\r' | '\n' => {
                    self.cursor.advance();
                }
                '/' if self.cursor.peek(1) == '/' => {
                    while !self.cursor.is_at_end() && self.cursor.current() != '\n' {
                        self.cursor.advance();
                    }
                }
                '/' if self.cursor.peek(1) == '*' => {
                    let line = self.cursor.line();
                    let column = self.cursor.column();
                    self.cursor.advance();
                    self.cursor.advance();
                    loop {
                        if self.cursor.is_at_end() {
                            return Some(Token::new(
                                TokenKind::Error,
                                "unterminated block comment",
                                line,
                                column,
                            ));
                        }
                        if self.cursor.current() == '*' && self.cursor.peek(1) == '/' {
                            self.cursor.advance();
                            self.cursor.advance();
                            break;
                        }
                        self.cursor.advance();
                    }
                }
                _ => return None,
            }
        }
    }

    fn lex_identifier(&mut self, line: u32, column: u32) -> Token {
        let start = self.cursor.position();
        while matches!(self.cursor.current(), c if c == '_' || c.is_ascii_alphanumeric()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice(start, self.cursor.position());
        let kind = keyword_kind(text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, line, column)
    }

    fn lex_number(&mut self, line: u32, column: u32) -> Token {
        let start = self.cursor.position();
        if self.cursor.current() == '0' && matches!(self.cursor.peek(1), 'x' | 'X') {
            self.cursor.advance();
            self.cursor.advance();
            while self.cursor.current().is_ascii_hexdigit() {
                self.cursor.advance();
            }
        } else {
            while self.cursor.current().is_ascii_digit() {
                self.cursor.advance();
            }
        }
        let text = self.cursor.slice(start, self.cursor.position());
        Token::new(TokenKind::IntLiteral, text, line, column)
    }

    fn lex_operator_or_punct(&mut self, line: u32, column: u32) -> Token {
        let c = self.cursor.advance();
        let two = |second: char| self.cursor.current() == second;

        macro_rules! maybe_two {
            ($second:expr, $double_kind:expr, $single_kind:expr) => {{
                if two($second) {
                    self.cursor.advance();
                    let text = format!("{c}{}", $second);
                    Token::new($double_kind, text, line, column)
                } else {
                    Token::new($single_kind, c.to_string(), line, column)
                }
            }};
        }

        match c {
            '+' => maybe_two!('+', TokenKind::PlusPlus, TokenKind::Plus),
            '-' => maybe_two!('-', TokenKind::MinusMinus, TokenKind::Minus),
            '*' => Token::new(TokenKind::Star, "*", line, column),
            '/' => Token::new(TokenKind::Slash, "/", line, column),
            '%' => Token::new(TokenKind::Percent, "%", line, column),
            '=' => maybe_two!('=', TokenKind::EqEq, TokenKind::Eq),
            '!' => maybe_two!('=', TokenKind::NotEq, TokenKind::Bang),
            '<' => {
                if two('=') {
                    self.cursor.advance();
                    Token::new(TokenKind::Le, "<=", line, column)
                } else if two('<') {
                    self.cursor.advance();
                    Token::new(TokenKind::Shl, "<<", line, column)
                } else {
                    Token::new(TokenKind::Lt, "<", line, column)
                }
            }
            '>' => {
                if two('=') {
                    self.cursor.advance();
                    Token::new(TokenKind::Ge, ">=", line, column)
                } else if two('>') {
                    self.cursor.advance();
                    Token::new(TokenKind::Shr, ">>", line, column)
                } else {
                    Token::new(TokenKind::Gt, ">", line, column)
                }
            }
            '&' => maybe_two!('&', TokenKind::AmpAmp, TokenKind::Amp),
            '|' => maybe_two!('|', TokenKind::PipePipe, TokenKind::Pipe),
            '^' => Token::new(TokenKind::Caret, "^", line, column),
            '~' => Token::new(TokenKind::Tilde, "~", line, column),
            ';' => Token::new(TokenKind::Semicolon, ";", line, column),
            ',' => Token::new(TokenKind::Comma, ",", line, column),
            '(' => Token::new(TokenKind::LParen, "(", line, column),
            ')' => Token::new(TokenKind::RParen, ")", line, column),
            '{' => Token::new(TokenKind::LBrace, "{", line, column),
            '}' => Token::new(TokenKind::RBrace, "}", line, column),
            '[' => Token::new(TokenKind::LBracket, "[", line, column),
            ']' => Token::new(TokenKind::RBracket, "]", line, column),
            other => Token::new(TokenKind::Error, other.to_string(), line, column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn skips_whitespace_and_line_comments() {
        let kinds = kinds("  x // hi\n  + 1");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Plus,
                TokenKind::IntLiteral,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn block_comment_is_skipped() {
        let kinds = kinds("1 /* block \n comment */ 2");
        assert_eq!(
            kinds,
            vec![TokenKind::IntLiteral, TokenKind::IntLiteral, TokenKind::Eof]
        );
    }

    #[test]
    fn hex_and_decimal_literals() {
        let toks = Lexer::new("0xFF 15").tokenize();
        assert_eq!(toks[0].text, "0xFF");
        assert_eq!(toks[1].text, "15");
    }

    #[test]
    fn multi_char_operators_before_prefixes() {
        let kinds = kinds("== != <= >= && || << >> ++ --");
        assert_eq!(
            kinds,
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Shl,
                TokenKind::Shr,
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn single_amp_and_pipe_distinct_from_double() {
        let kinds = kinds("& |");
        assert_eq!(kinds, vec![TokenKind::Amp, TokenKind::Pipe, TokenKind::Eof]);
    }

    #[test]
    fn keywords_recognized() {
        let kinds = kinds("function return if else while for do uint32 int32 register volatile interrupt break continue");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Function,
                TokenKind::Return,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::For,
                TokenKind::Do,
                TokenKind::Uint32,
                TokenKind::Int32,
                TokenKind::Register,
                TokenKind::Volatile,
                TokenKind::Interrupt,
                TokenKind::Break,
                TokenKind::Continue,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_block_comment_is_error_token() {
        let toks = Lexer::new("1 /* never closed").tokenize();
        assert_eq!(toks[1].kind, TokenKind::Error);
    }

    #[test]
    fn unknown_character_is_error_token_but_lexing_continues() {
        let toks = Lexer::new("1 @ 2").tokenize();
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLiteral,
                TokenKind::Error,
                TokenKind::IntLiteral,
                TokenKind::Eof
            ]
        );
    }
}
