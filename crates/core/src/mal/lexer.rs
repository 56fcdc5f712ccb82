//! MAL lexer.
//!
//! Turns source text into a flat, finite token sequence. The only stateful
//! rule is line tracking: a newline terminates whitespace skipping once any
//! non-whitespace has been seen on the current logical line, so every code
//! line is closed by its own `Eol` token while blank lines between
//! instructions are consumed silently.

use super::token::{Token, TokenKind};
use crate::common::{Error, Result};

/// Single-use lexer over MAL source text.
#[derive(Debug)]
pub struct Lexer<'a> {
    src: &'a [u8],
    index: usize,
    /// True once a token has been produced on the current logical line.
    code_line: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            src: source.as_bytes(),
            index: 0,
            code_line: false,
        }
    }

    /// Consumes the lexer and produces the full token sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lex`] when a `<`, `>`, or `/` is not followed by its
    /// required pairing character.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            if self.skip_whitespace() {
                continue;
            }
            if self.skip_comment()? {
                continue;
            }
            break;
        }

        if self.done() {
            return Ok(None);
        }

        let c = self.advance();
        self.code_line = c != b'\n';

        let token = match c {
            b'\n' => Token::new(TokenKind::Eol, "\n"),
            b';' => Token::new(TokenKind::Separator, ";"),
            b'(' => Token::new(TokenKind::LeftParen, "("),
            b')' => Token::new(TokenKind::RightParen, ")"),
            b'+' => Token::new(TokenKind::Operator, "+"),
            b'-' => Token::new(TokenKind::Operator, "-"),
            b'=' => Token::new(TokenKind::Operator, "="),
            b'>' => {
                self.require(b'>')?;
                Token::new(TokenKind::Operator, ">>")
            }
            b'<' => {
                self.require(b'<')?;
                Token::new(TokenKind::Operator, "<<")
            }
            b'1' => Token::new(TokenKind::Numeric, "1"),
            b'8' => Token::new(TokenKind::Numeric, "8"),
            b'0' => self.lex_zero(),
            _ => self.lex_word(c),
        };

        Ok(Some(token))
    }

    /// Lexes a token starting with `0`: either the literal `0` or a
    /// `0x`-prefixed hexadecimal address literal.
    fn lex_zero(&mut self) -> Token {
        if self.done() || self.src[self.index] != b'x' {
            return Token::new(TokenKind::Numeric, "0");
        }
        self.index += 1;
        let mut text = String::from("0x");
        while !self.done() && self.src[self.index].is_ascii_hexdigit() {
            text.push(self.src[self.index] as char);
            self.index += 1;
        }
        Token::new(TokenKind::Numeric, text)
    }

    /// Lexes an identifier-like run and classifies it.
    fn lex_word(&mut self, first: u8) -> Token {
        let mut text = String::new();
        text.push(first as char);
        while !self.done() && is_word_byte(self.src[self.index]) {
            text.push(self.src[self.index] as char);
            self.index += 1;
        }

        match text.as_str() {
            "if" | "goto" | "else" => Token::new(TokenKind::Keyword, text),
            _ if text.starts_with('.') => Token::new(TokenKind::DirectiveStart, text),
            _ => Token::new(TokenKind::Word, text),
        }
    }

    /// Skips whitespace, stopping at a newline on a code line so that the
    /// newline itself is lexed as an `Eol` token.
    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while !self.done() && self.src[self.index].is_ascii_whitespace() {
            if self.code_line && self.src[self.index] == b'\n' {
                break;
            }
            self.index += 1;
            skipped = true;
        }
        skipped
    }

    /// Skips a `//` comment up to (not including) the next newline.
    fn skip_comment(&mut self) -> Result<bool> {
        if self.done() || self.src[self.index] != b'/' {
            return Ok(false);
        }
        self.index += 1;
        self.require(b'/')?;

        while !self.done() && self.src[self.index] != b'\n' {
            self.index += 1;
        }
        Ok(true)
    }

    /// Consumes the next byte, requiring it to equal `expected`.
    fn require(&mut self, expected: u8) -> Result<()> {
        if self.done() || self.src[self.index] != expected {
            return Err(Error::Lex {
                position: self.index,
                reason: format!("expected a second `{}`", expected as char),
            });
        }
        self.index += 1;
        Ok(())
    }

    fn advance(&mut self) -> u8 {
        let c = self.src[self.index];
        self.index += 1;
        c
    }

    fn done(&self) -> bool {
        self.index >= self.src.len()
    }
}

/// Bytes allowed inside an identifier-like run.
const fn is_word_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}
