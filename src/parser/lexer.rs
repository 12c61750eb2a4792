use logos::{Logos, SpannedIter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Token {
    pub(super) kind: TokenKind,
    pub(super) span: logos::Span,
}

pub(super) struct TokenIter<'a> {
    input: &'a str,
    iter: SpannedIter<'a, LogosTokenKind>,
}

impl<'a> TokenIter<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            input,
            iter: LogosTokenKind::lexer(input).spanned(),
        }
    }
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        match self.iter.next() {
            Some((Ok(kind), span)) => {
                let (kind, span) = match kind {
                    LogosTokenKind::LParen => (TokenKind::LParen, span),
                    LogosTokenKind::RParen => (TokenKind::RParen, span),
                    LogosTokenKind::QuotedString => {
                        (TokenKind::String, (span.start + 1)..(span.end - 1))
                    }
                    LogosTokenKind::Atom if is_number(&self.input[span.clone()]) => {
                        (TokenKind::Number, span)
                    }
                    LogosTokenKind::Atom => (TokenKind::Symbol, span),
                    LogosTokenKind::WS => unreachable!(),
                };
                Some(Token { kind, span })
            }
            Some((Err(_), span)) => Some(Token {
                kind: TokenKind::Error,
                span,
            }),
            None => None,
        }
    }
}

/// Decimal literal with optional sign and fractional part
fn is_number(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    digits.bytes().any(|b| b.is_ascii_digit())
        && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && digits.bytes().filter(|&b| b == b'.').count() <= 1
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum TokenKind {
    LParen,
    RParen,
    /// Bare keyword or identifier
    Symbol,
    Number,
    /// Quoted string, the span excludes the quotes
    String,
    Error,
    Eof,
}

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum LogosTokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r#""([^"\\]|\\.)*""#)]
    QuotedString,
    #[regex(r#"[^"() \t\r\f\n]+"#)]
    Atom,
    #[regex(r"[ \t\r\f\n]+", logos::skip)]
    WS,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[test]
    fn test() {
        let input = "(a \"b\" \"\" -1.5 \n)";
        let it = TokenIter::new(input);
        let expected = vec![
            (TokenKind::LParen, "("),
            (TokenKind::Symbol, "a"),
            (TokenKind::String, "b"),
            (TokenKind::String, ""),
            (TokenKind::Number, "-1.5"),
            (TokenKind::RParen, ")"),
        ];

        let result: Vec<_> = it
            .map(|token| (token.kind, &input[token.span.clone()]))
            .collect();

        assert_eq!(result, expected);
    }

    #[test]
    fn escaped_quote_stays_in_string() {
        let input = r#"("a \"q\" b")"#;
        let kinds: Vec<_> = TokenIter::new(input).map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::LParen, TokenKind::String, TokenKind::RParen]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let input = "(a \"open";
        let kinds: Vec<_> = TokenIter::new(input).map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenKind::Error));
    }

    #[rstest]
    #[case("0", true)]
    #[case("-12.7", true)]
    #[case("+3", true)]
    #[case(".5", true)]
    #[case("1.", true)]
    #[case("-", false)]
    #[case("1.2.3", false)]
    #[case("R1", false)]
    #[case("1e3", false)]
    fn number_classification(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_number(text), expected);
    }
}
