//! Parser for the s-expression symbol library and schematic file formats.

use std::sync::Arc;

use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::{
    error::{ParseError, Position, UnknownKeyword},
    library::{resolve_one, PendingLib, SymbolLib},
    model::{GraphicItem, LibSymbol, Point, SchSheet, Screen},
    units,
};

mod draw_items;
mod lexer;
mod primitives;
mod schematic;
mod stream;
mod symbol;

use lexer::TokenKind;
use stream::TokenStream;

/// Oldest file format version that can be read
pub const MIN_SUPPORTED_VERSION: i64 = 20200126;

/// Newest file format version that can be read
pub const MAX_SUPPORTED_VERSION: i64 = 20200310;

/// Declared format version and the program that wrote the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    pub version: i64,
    pub generator: String,
}

/// Reads one symbol library or schematic document.
///
/// A parser holds no state beyond the token stream and the header of the
/// document, so independent documents can be read on separate threads with one
/// parser each.
pub struct SchParser<'a> {
    stream: TokenStream<'a>,
    header: Option<DocumentHeader>,
    too_recent: bool,
}

impl<'a> SchParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            stream: TokenStream::new(input),
            header: None,
            too_recent: false,
        }
    }

    /// True once a header declaring a version newer than [`MAX_SUPPORTED_VERSION`] was read
    pub fn is_too_recent(&self) -> bool {
        self.too_recent
    }

    pub fn header(&self) -> Option<&DocumentHeader> {
        self.header.as_ref()
    }

    /// Reads a whole `kicad_symbol_lib` document into `lib`.
    ///
    /// Derived symbols are linked to their parents after every symbol has been
    /// read. Nothing is added to `lib` if the document is too recent.
    pub fn parse_lib(&mut self, lib: &mut SymbolLib) -> Result<(), ParseError> {
        if !self.parse_header("kicad_symbol_lib")? {
            return Ok(());
        }

        let mut pending = PendingLib::default();
        while self.stream.peek() == TokenKind::LParen {
            self.need_left()?;
            let (keyword, at) = self.keyword_at()?;
            match keyword {
                "symbol" => {
                    let symbol = symbol::parse_lib_symbol(self, false)?;
                    pending.insert(symbol, at);
                }
                _ => return Err(self.unexpected_keyword(keyword, at, "symbol")),
            }
        }
        self.need_right()?;
        self.need_eof()?;

        let count = lib.len();
        pending.resolve(lib)?;
        debug!("Read {} symbols", lib.len() - count);
        Ok(())
    }

    /// Reads exactly one `(symbol ...)` definition and adds it to `lib`.
    ///
    /// With `embedded` set the name is read as a full `nickname:name`
    /// identifier, as in a schematic's `lib_symbols`. A derived symbol's parent
    /// must already be in `lib`.
    pub fn parse_symbol(
        &mut self,
        lib: &mut SymbolLib,
        embedded: bool,
    ) -> Result<Arc<LibSymbol>, ParseError> {
        self.need_left()?;
        let at = self.stream.position();
        self.expect_keyword("symbol")?;
        let symbol = symbol::parse_lib_symbol(self, embedded)?;
        resolve_one(symbol, at, lib)
    }

    /// Reads exactly one library drawing primitive
    pub fn parse_draw_item(&mut self) -> Result<GraphicItem, ParseError> {
        self.need_left()?;
        let (keyword, at) = self.keyword_at()?;
        match draw_items::draw_item_parser(keyword) {
            Some(parse) => parse(self),
            None => Err(self.unexpected_keyword(
                keyword,
                at,
                "arc, bezier, circle, pin, polyline, rectangle or text",
            )),
        }
    }

    /// Reads a `kicad_sch` document into the screen of `sheet`.
    ///
    /// Sub-sheets are only recorded, their files are not loaded. The screen is
    /// left unset if the document is too recent.
    pub fn parse_schematic(&mut self, sheet: &mut SchSheet) -> Result<(), ParseError> {
        if !self.parse_header("kicad_sch")? {
            return Ok(());
        }
        let mut screen = Screen::default();
        if let Some(header) = &self.header {
            screen.version = header.version;
            screen.generator = header.generator.clone();
        }
        schematic::parse_screen(self, &mut screen)?;
        self.need_eof()?;

        debug!(
            "Read schematic with {} items and {} library symbols",
            screen.items.len(),
            screen.lib_symbols.len()
        );
        sheet.screen = Some(Arc::new(screen));
        Ok(())
    }

    /// Reads `(root (version N) (generator G)`. Returns false, leaving the rest
    /// of the document unread, if the version is newer than supported.
    fn parse_header(&mut self, root: &str) -> Result<bool, ParseError> {
        self.need_left()?;
        self.expect_keyword(root)?;

        self.need_left()?;
        self.expect_keyword("version")?;
        let at = self.stream.position();
        let version = self.parse_int("version")?;
        self.need_right()?;

        if version > MAX_SUPPORTED_VERSION {
            warn!(
                "File version {} is newer than the supported version {}",
                version, MAX_SUPPORTED_VERSION
            );
            self.too_recent = true;
            self.header = Some(DocumentHeader {
                version,
                generator: String::new(),
            });
            return Ok(false);
        }
        if version < MIN_SUPPORTED_VERSION {
            return Err(ParseError::UnsupportedVersion {
                version,
                minimum: MIN_SUPPORTED_VERSION,
                at,
            });
        }

        self.need_left()?;
        self.expect_keyword("generator")?;
        let generator = self.parse_string("generator")?;
        self.need_right()?;

        debug!("Reading {} version {} written by {}", root, version, generator);
        self.header = Some(DocumentHeader { version, generator });
        Ok(true)
    }

    // Token level helpers shared by the sub-parsers

    fn need_left(&mut self) -> Result<(), ParseError> {
        self.stream.expect(TokenKind::LParen, "'('").map(|_| ())
    }

    fn need_right(&mut self) -> Result<(), ParseError> {
        self.stream.expect(TokenKind::RParen, "')'").map(|_| ())
    }

    fn need_eof(&mut self) -> Result<(), ParseError> {
        self.stream.expect(TokenKind::Eof, "end of file").map(|_| ())
    }

    /// Reads the keyword that follows an opening parenthesis
    fn keyword(&mut self) -> Result<&'a str, ParseError> {
        self.keyword_at().map(|(keyword, _)| keyword)
    }

    fn keyword_at(&mut self) -> Result<(&'a str, Position), ParseError> {
        let tok = self.stream.expect(TokenKind::Symbol, "keyword")?;
        Ok((self.stream.text(&tok), self.stream.position_of(&tok)))
    }

    fn expect_keyword(&mut self, expected: &str) -> Result<(), ParseError> {
        let tok = self.stream.get()?;
        if tok.kind == TokenKind::Symbol && self.stream.text(&tok) == expected {
            Ok(())
        } else {
            Err(self.stream.unexpected(&tok, expected))
        }
    }

    fn unexpected_keyword(&self, keyword: &str, at: Position, expected: &str) -> ParseError {
        ParseError::Structural {
            expected: expected.to_owned(),
            found: keyword.to_owned(),
            at,
        }
    }

    /// Error for a required child group that was not found before the group closed
    fn missing(&mut self, expected: &str) -> ParseError {
        ParseError::Structural {
            expected: expected.to_owned(),
            found: self.stream.peek_text().to_owned(),
            at: self.stream.position(),
        }
    }

    /// Reads a quoted string, a bare symbol or a number as text
    fn parse_string(&mut self, expected: &str) -> Result<String, ParseError> {
        let tok = self.stream.get()?;
        match tok.kind {
            TokenKind::String | TokenKind::Symbol | TokenKind::Number => {
                Ok(self.stream.string(&tok).into_owned())
            }
            _ => Err(self.stream.unexpected(&tok, expected)),
        }
    }

    fn numeric_token(&mut self, expected: &str) -> Result<(&'a str, Position), ParseError> {
        let tok = self.stream.get()?;
        let at = self.stream.position_of(&tok);
        match tok.kind {
            TokenKind::Number => Ok((self.stream.text(&tok), at)),
            TokenKind::Eof | TokenKind::RParen | TokenKind::LParen => {
                Err(self.stream.unexpected(&tok, expected))
            }
            _ => Err(ParseError::NumericFormat {
                expected: expected.to_owned(),
                found: self.stream.text(&tok).to_owned(),
                at,
            }),
        }
    }

    /// Reads a decimal literal
    fn parse_f64(&mut self, expected: &str) -> Result<f64, ParseError> {
        let (text, at) = self.numeric_token(expected)?;
        text.trim_start()
            .parse::<f64>()
            .map_err(|_| ParseError::NumericFormat {
                expected: expected.to_owned(),
                found: text.to_owned(),
                at,
            })
    }

    fn parse_int(&mut self, expected: &str) -> Result<i64, ParseError> {
        let (text, at) = self.numeric_token(expected)?;
        text.parse::<i64>().map_err(|_| ParseError::NumericFormat {
            expected: expected.to_owned(),
            found: text.to_owned(),
            at,
        })
    }

    fn parse_u32(&mut self, expected: &str) -> Result<u32, ParseError> {
        let (text, at) = self.numeric_token(expected)?;
        text.parse::<u32>().map_err(|_| ParseError::NumericFormat {
            expected: expected.to_owned(),
            found: text.to_owned(),
            at,
        })
    }

    /// Reads a millimeter value as clamped internal units
    fn parse_internal_units(&mut self, expected: &str) -> Result<i32, ParseError> {
        self.parse_f64(expected).map(units::mm_to_iu)
    }

    fn parse_xy(&mut self) -> Result<Point, ParseError> {
        let x = self.parse_internal_units("X coordinate")?;
        let y = self.parse_internal_units("Y coordinate")?;
        Ok(Point { x, y })
    }

    /// Reads a `yes` or `no` token
    fn parse_bool(&mut self, expected: &str) -> Result<bool, ParseError> {
        let tok = self.stream.get()?;
        match (tok.kind, self.stream.text(&tok)) {
            (TokenKind::Symbol, "yes") => Ok(true),
            (TokenKind::Symbol, "no") => Ok(false),
            (TokenKind::Symbol, other) => Err(ParseError::UnknownValue {
                expected: expected.to_owned(),
                found: other.to_owned(),
                at: self.stream.position_of(&tok),
            }),
            _ => Err(self.stream.unexpected(&tok, expected)),
        }
    }

    /// Reads a keyword from a fixed table
    fn parse_enum<T>(&mut self, expected: &str) -> Result<T, ParseError>
    where
        T: for<'s> TryFrom<&'s str, Error = UnknownKeyword>,
    {
        let tok = self.stream.get()?;
        match tok.kind {
            TokenKind::Symbol | TokenKind::String => {
                let text = self.stream.text(&tok);
                T::try_from(text).map_err(|e| ParseError::UnknownValue {
                    expected: e.kind.to_owned(),
                    found: e.found,
                    at: self.stream.position_of(&tok),
                })
            }
            _ => Err(self.stream.unexpected(&tok, expected)),
        }
    }

    fn parse_uuid(&mut self) -> Result<Uuid, ParseError> {
        let tok = self.stream.get()?;
        let text = match tok.kind {
            TokenKind::String | TokenKind::Symbol => self.stream.text(&tok),
            _ => return Err(self.stream.unexpected(&tok, "uuid")),
        };
        Uuid::parse_str(text).map_err(|_| ParseError::Structural {
            expected: "uuid".to_owned(),
            found: text.to_owned(),
            at: self.stream.position_of(&tok),
        })
    }

    /// Reads `(uuid U)` after its opening keyword
    fn parse_uuid_group(&mut self) -> Result<Uuid, ParseError> {
        let uuid = self.parse_uuid()?;
        self.need_right()?;
        Ok(uuid)
    }

    /// Consumes tokens up to and including the `)` closing the current group
    fn skip_group(&mut self) -> Result<(), ParseError> {
        let mut depth = 1usize;
        loop {
            let tok = self.stream.get()?;
            match tok.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                TokenKind::Eof => return Err(self.stream.unexpected(&tok, "')'")),
                _ => {}
            }
        }
    }

    /// Skips an unknown child group, after its opening keyword
    fn skip_unknown(&mut self, keyword: &str) -> Result<(), ParseError> {
        trace!("Skipping unknown group '{}'", keyword);
        self.skip_group()
    }

    /// Reads the next child of a group: `Some(keyword)` after an opening
    /// parenthesis, `None` once the closing parenthesis has been consumed.
    /// Stray bare tokens are returned through `on_token`.
    fn next_child(
        &mut self,
        mut on_token: impl FnMut(&mut Self, &'a str, Position) -> Result<(), ParseError>,
    ) -> Result<Option<&'a str>, ParseError> {
        loop {
            match self.stream.peek() {
                TokenKind::RParen => {
                    self.stream.skip()?;
                    return Ok(None);
                }
                TokenKind::LParen => {
                    self.stream.skip()?;
                    return self.keyword().map(Some);
                }
                TokenKind::Symbol | TokenKind::String | TokenKind::Number => {
                    let tok = self.stream.get()?;
                    let text = self.stream.text(&tok);
                    let at = self.stream.position_of(&tok);
                    on_token(self, text, at)?;
                }
                _ => {
                    let tok = self.stream.get()?;
                    return Err(self.stream.unexpected(&tok, "')'"));
                }
            }
        }
    }

    /// Like [`Self::next_child`], ignoring stray bare tokens
    fn next_group(&mut self) -> Result<Option<&'a str>, ParseError> {
        self.next_child(|_, _, _| Ok(()))
    }
}
