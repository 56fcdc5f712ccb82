//! MAL token definitions.

use std::fmt;

/// Classification of a single MAL token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Statement separator `;`.
    Separator,
    /// A `.`-led word opening a directive (`.label`, `.default`).
    DirectiveStart,
    /// Numeric literal: `0`, `1`, `8`, or a `0x`-prefixed hex address.
    Numeric,
    /// `(`.
    LeftParen,
    /// `)`.
    RightParen,
    /// Reserved word: `if`, `goto`, or `else`.
    Keyword,
    /// `+`, `-`, `=`, `<<`, or `>>`.
    Operator,
    /// Identifier-like run: register names, labels, `rd`/`wr`/`fetch`/`nop`.
    Word,
    /// End of a logical line.
    Eol,
}

/// One lexed token. Produced once by the lexer and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token's classification.
    pub kind: TokenKind,
    /// The exact source text of the token.
    pub text: String,
}

impl Token {
    /// Creates a token from a kind and its source text.
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == TokenKind::Eol {
            write!(f, "<eol>")
        } else {
            write!(f, "{}", self.text)
        }
    }
}
