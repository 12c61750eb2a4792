use std::{borrow::Cow, iter::Peekable};

use crate::error::{LineIndex, ParseError, Position};

use super::lexer::{Token, TokenIter, TokenKind};

/// Token source with one token of lookahead
pub(crate) struct TokenStream<'a> {
    input: &'a str,
    iter: Peekable<TokenIter<'a>>,
    lines: LineIndex,
}

impl<'a> TokenStream<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            input,
            iter: TokenIter::new(input).peekable(),
            lines: LineIndex::new(input),
        }
    }

    fn eof(&self) -> Token {
        let end = self.input.len();
        Token {
            kind: TokenKind::Eof,
            span: end..end,
        }
    }

    /// Advances and returns the next token, an `Eof` token once the input is
    /// exhausted. Untokenizable input is a lexical error.
    pub(super) fn get(&mut self) -> Result<Token, ParseError> {
        let Some(tok) = self.iter.next() else {
            return Ok(self.eof());
        };
        if tok.kind == TokenKind::Error {
            return Err(ParseError::Lexical {
                message: "Invalid token".to_owned(),
                found: self.input[tok.span.clone()].to_owned(),
                at: self.position_of(&tok),
            });
        }
        Ok(tok)
    }

    /// Kind of the next token, without consuming it
    pub(super) fn peek(&mut self) -> TokenKind {
        self.iter.peek().map_or(TokenKind::Eof, |tok| tok.kind)
    }

    /// Consumes the next token, failing unless it is of `kind`
    pub(super) fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        let tok = self.get()?;
        if tok.kind == kind {
            Ok(tok)
        } else {
            Err(self.unexpected(&tok, expected))
        }
    }

    pub(super) fn skip(&mut self) -> Result<(), ParseError> {
        self.get().map(|_| ())
    }

    /// Error for finding `tok` where `expected` should have been. Running out
    /// of input means the parentheses do not balance.
    pub(super) fn unexpected(&self, tok: &Token, expected: &str) -> ParseError {
        let at = self.position_of(tok);
        if tok.kind == TokenKind::Eof {
            return ParseError::Lexical {
                message: format!("Unexpected end of input, expected {expected}"),
                found: String::new(),
                at,
            };
        }
        ParseError::Structural {
            expected: expected.to_owned(),
            found: self.text(tok).to_owned(),
            at,
        }
    }

    /// Raw text of a token, without the quotes of a quoted string
    pub(super) fn text(&self, tok: &Token) -> &'a str {
        &self.input[tok.span.clone()]
    }

    /// Text of a token with string escapes resolved
    pub(super) fn string(&self, tok: &Token) -> Cow<'a, str> {
        let text = self.text(tok);
        if tok.kind == TokenKind::String && text.contains('\\') {
            Cow::Owned(unescape(text))
        } else {
            Cow::Borrowed(text)
        }
    }

    pub(super) fn position_of(&self, tok: &Token) -> Position {
        self.lines.position(self.input, tok.span.start)
    }

    /// Position of the next token
    pub(super) fn position(&mut self) -> Position {
        let offset = self
            .iter
            .peek()
            .map_or(self.input.len(), |tok| tok.span.start);
        self.lines.position(self.input, offset)
    }

    /// Raw text of the next token
    pub(super) fn peek_text(&mut self) -> &'a str {
        let input = self.input;
        self.iter.peek().map_or("", |tok| &input[tok.span.clone()])
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(r#""plain""#, "plain")]
    #[case(r#""a \"b\"""#, "a \"b\"")]
    #[case(r#""back\\slash""#, "back\\slash")]
    #[case(r#""two\nlines""#, "two\nlines")]
    fn strings_are_unescaped(#[case] input: &str, #[case] expected: &str) {
        let mut stream = TokenStream::new(input);
        let tok = stream.expect(TokenKind::String, "string").unwrap();
        assert_eq!(stream.string(&tok), expected);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut stream = TokenStream::new("(a)");
        assert_eq!(stream.peek(), TokenKind::LParen);
        assert_eq!(stream.peek(), TokenKind::LParen);
        stream.skip().unwrap();
        assert_eq!(stream.peek(), TokenKind::Symbol);
        assert_eq!(stream.peek_text(), "a");
    }

    #[test]
    fn eof_is_repeated() {
        let mut stream = TokenStream::new("");
        assert_eq!(stream.get().unwrap().kind, TokenKind::Eof);
        assert_eq!(stream.get().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn expect_reports_position() {
        let mut stream = TokenStream::new("(\n  b)");
        stream.skip().unwrap();
        let err = stream.expect(TokenKind::Number, "X coordinate").unwrap_err();
        let at = err.position();
        assert_eq!((at.line, at.column), (2, 3));
        assert_eq!(err.found(), Some("b"));
    }

    #[test]
    fn missing_close_paren_is_lexical() {
        let mut stream = TokenStream::new("(a");
        stream.skip().unwrap();
        stream.skip().unwrap();
        let err = stream.expect(TokenKind::RParen, "')'").unwrap_err();
        assert!(matches!(err, ParseError::Lexical { .. }));
    }
}
