//! Library symbol definitions.

use tracing::trace;

use super::{
    draw_items::draw_item_parser,
    lexer::TokenKind,
    primitives::{parse_property, FieldIds},
    SchParser,
};
use crate::{
    error::{ParseError, Position},
    model::{DrawItem, LibId, LibSymbol},
};

/// Per-symbol parse state. Lives for the duration of one symbol definition.
struct SymbolContext {
    field_ids: FieldIds,
    unit: u32,
    body_style: u32,
}

impl SymbolContext {
    fn new() -> Self {
        SymbolContext {
            field_ids: FieldIds::for_symbol(),
            unit: 1,
            body_style: 1,
        }
    }
}

/// `(symbol "NAME" [(extends "PARENT")] [(power)] [(pin_names ...)] [(pin_numbers hide)]
///  [(in_bom yes|no)] [(on_board yes|no)] property* (symbol "NAME_U_B" item*)* item*)`
///
/// Called after the `symbol` keyword. The parent of a derived symbol is only
/// recorded by name, and a derived symbol draws through its parent so it may
/// not carry drawing items of its own.
pub(super) fn parse_lib_symbol(
    p: &mut SchParser<'_>,
    embedded: bool,
) -> Result<LibSymbol, ParseError> {
    let at = p.stream.position();
    let name = p.parse_string("symbol name")?;
    let lib_id = symbol_lib_id(&name, embedded, at)?;
    trace!("Reading symbol '{}'", lib_id);

    let mut symbol = LibSymbol::new(lib_id);
    let mut ctx = SymbolContext::new();
    let mut max_unit = 1;

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "extends" => {
                symbol.extends = Some(p.parse_string("parent symbol name")?);
                p.need_right()?;
            }
            "power" => {
                symbol.power = true;
                p.need_right()?;
            }
            "pin_names" => parse_pin_names(p, &mut symbol)?,
            "pin_numbers" => {
                while p.stream.peek() != TokenKind::RParen {
                    let tok = p.stream.get()?;
                    match tok.kind {
                        TokenKind::Symbol if p.stream.text(&tok) == "hide" => {
                            symbol.show_pin_numbers = false
                        }
                        _ => return Err(p.stream.unexpected(&tok, "hide")),
                    }
                }
                p.need_right()?;
            }
            "in_bom" => {
                symbol.in_bom = p.parse_bool("in_bom")?;
                p.need_right()?;
            }
            "on_board" => {
                symbol.on_board = p.parse_bool("on_board")?;
                p.need_right()?;
            }
            "property" => {
                let property = parse_property(p, &mut ctx.field_ids)?;
                symbol.properties.push(property);
            }
            "symbol" => {
                let (unit, body_style) = parse_unit_name(p, &symbol.lib_id.name)?;
                max_unit = max_unit.max(unit);
                if body_style > 1 {
                    symbol.has_alternate_body_style = true;
                }
                ctx.unit = unit;
                ctx.body_style = body_style;
                parse_unit_items(p, &mut symbol, &ctx)?;
                ctx.unit = 1;
                ctx.body_style = 1;
            }
            other => match draw_item_parser(other) {
                Some(parse) => {
                    let item = parse(p)?;
                    symbol.draw_items.push(DrawItem {
                        unit: ctx.unit,
                        body_style: ctx.body_style,
                        item,
                    });
                }
                None => {
                    return Err(ParseError::Structural {
                        expected: "extends, power, pin_names, pin_numbers, in_bom, on_board, \
                                   property, symbol or a drawing item"
                            .to_owned(),
                        found: other.to_owned(),
                        at: p.stream.position(),
                    })
                }
            },
        }
    }

    if symbol.extends.is_some() && !symbol.draw_items.is_empty() {
        return Err(ParseError::Structural {
            expected: "derived symbol without drawing items".to_owned(),
            found: symbol.name(),
            at,
        });
    }

    symbol.unit_count = max_unit;
    Ok(symbol)
}

fn symbol_lib_id(name: &str, embedded: bool, at: Position) -> Result<LibId, ParseError> {
    let invalid = |expected: &str| ParseError::Structural {
        expected: expected.to_owned(),
        found: name.to_owned(),
        at,
    };
    if name.is_empty() {
        return Err(invalid("non-empty symbol name"));
    }
    if embedded {
        let lib_id = LibId::parse(name);
        if lib_id.name.is_empty() {
            return Err(invalid("symbol identifier 'nickname:name'"));
        }
        Ok(lib_id)
    } else if name.contains(':') {
        Err(invalid("symbol name without ':'"))
    } else {
        Ok(LibId::new("", name))
    }
}

/// `(pin_names [(offset X)] [hide])`
fn parse_pin_names(p: &mut SchParser<'_>, symbol: &mut LibSymbol) -> Result<(), ParseError> {
    loop {
        let keyword = p.next_child(|_, token, _| {
            if token == "hide" {
                symbol.show_pin_names = false;
            }
            Ok(())
        })?;
        match keyword {
            None => return Ok(()),
            Some("offset") => {
                symbol.pin_name_offset = Some(p.parse_internal_units("pin name offset")?);
                p.need_right()?;
            }
            Some(other) => p.skip_unknown(other)?,
        }
    }
}

/// Reads a unit block name `NAME_UNIT_BODYSTYLE`, returning unit and body style
fn parse_unit_name(p: &mut SchParser<'_>, symbol_name: &str) -> Result<(u32, u32), ParseError> {
    let at = p.stream.position();
    let name = p.parse_string("symbol unit name")?;
    let invalid = || ParseError::Structural {
        expected: format!("symbol unit name '{symbol_name}_UNIT_BODYSTYLE'"),
        found: name.clone(),
        at,
    };

    let mut parts = name.rsplitn(3, '_');
    let body_style = parts.next().and_then(|s| s.parse::<u32>().ok());
    let unit = parts.next().and_then(|s| s.parse::<u32>().ok());
    let prefix = parts.next();
    match (prefix, unit, body_style) {
        (Some(prefix), Some(unit), Some(body_style)) if prefix == symbol_name => {
            Ok((unit, body_style))
        }
        _ => Err(invalid()),
    }
}

/// Drawing items of one unit block, up to its closing parenthesis
fn parse_unit_items(
    p: &mut SchParser<'_>,
    symbol: &mut LibSymbol,
    ctx: &SymbolContext,
) -> Result<(), ParseError> {
    while let Some(keyword) = p.next_group()? {
        let Some(parse) = draw_item_parser(keyword) else {
            return Err(ParseError::Structural {
                expected: "arc, bezier, circle, pin, polyline, rectangle or text".to_owned(),
                found: keyword.to_owned(),
                at: p.stream.position(),
            });
        };
        let item = parse(p)?;
        symbol.draw_items.push(DrawItem {
            unit: ctx.unit,
            body_style: ctx.body_style,
            item,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        library::SymbolLib,
        model::{field_id, GraphicItem, PinType},
    };
    use rstest::*;

    fn parse(input: &str, embedded: bool) -> Result<LibSymbol, ParseError> {
        let mut p = SchParser::new(input);
        p.need_left()?;
        p.expect_keyword("symbol")?;
        let symbol = parse_lib_symbol(&mut p, embedded)?;
        p.need_eof()?;
        Ok(symbol)
    }

    const SMALL: &str = r#"(symbol "R_Small" (extends "R") (property "Value" "R_Small"))"#;

    const RESISTOR: &str = r#"(symbol "R"
      (pin_numbers hide) (pin_names (offset 0) hide) (in_bom yes) (on_board yes)
      (property "Reference" "R" (id 0) (at 2.032 0 90) (effects (font (size 1.27 1.27))))
      (property "Value" "R" (id 1) (at 0 0 90) (effects (font (size 1.27 1.27))))
      (property "Footprint" "" (id 2) (at -1.778 0 90) (effects (font (size 1.27 1.27)) hide))
      (property "ki_keywords" "R res resistor")
      (symbol "R_0_1"
        (rectangle (start -1.016 -2.54) (end 1.016 2.54) (stroke (width 0.254)) (fill (type none))))
      (symbol "R_1_1"
        (pin passive line (at 0 3.81 270) (length 1.27)
          (name "~" (effects (font (size 1.27 1.27))))
          (number "1" (effects (font (size 1.27 1.27)))))
        (pin passive line (at 0 -3.81 90) (length 1.27)
          (name "~" (effects (font (size 1.27 1.27))))
          (number "2" (effects (font (size 1.27 1.27)))))))"#;

    #[test]
    fn resistor() {
        let symbol = parse(RESISTOR, false).unwrap();
        assert_eq!(symbol.name(), "R");
        assert!(!symbol.show_pin_numbers);
        assert!(!symbol.show_pin_names);
        assert_eq!(symbol.pin_name_offset, Some(0));
        assert!(symbol.in_bom && symbol.on_board);
        assert_eq!(symbol.reference(), Some("R"));
        assert_eq!(symbol.field(field_id::FIRST_USER).unwrap().name, "ki_keywords");
        assert_eq!(symbol.draw_items.len(), 3);
        assert_eq!(
            (symbol.draw_items[0].unit, symbol.draw_items[0].body_style),
            (0, 1)
        );
        assert!(matches!(symbol.draw_items[0].item, GraphicItem::Rectangle(_)));
        let pins: Vec<_> = symbol.pins().collect();
        assert_eq!(pins.len(), 2);
        assert_eq!(pins[1].number, "2");
        assert_eq!(pins[1].electrical_type, PinType::Passive);
        assert_eq!(symbol.unit_count(), 1);
        assert!(!symbol.has_alternate_body_style());
    }

    #[test]
    fn multi_unit_with_body_styles() {
        let symbol = parse(
            r#"(symbol "Dual"
                 (symbol "Dual_1_1" (pin "A" "1" input line (at 0 0 0) (length 1)))
                 (symbol "Dual_2_1" (pin "B" "2" output line (at 0 0 0) (length 1)))
                 (symbol "Dual_2_2" (pin "B" "2" output inverted (at 0 0 0) (length 1))))"#,
            false,
        )
        .unwrap();
        assert_eq!(symbol.unit_count, 2);
        assert!(symbol.has_alternate_body_style);
        let drawn: Vec<_> = symbol
            .draw_items
            .iter()
            .filter(|d| d.is_drawn_for(2, 2))
            .collect();
        assert_eq!(drawn.len(), 1);
    }

    #[test]
    fn field_ids_restart_for_every_symbol() {
        let input = r#"(symbol "A" (property "X" "1") (property "Y" "2"))"#;
        let a = parse(input, false).unwrap();
        let b = parse(input, false).unwrap();
        assert_eq!(a.properties[0].id, field_id::FIRST_USER);
        assert_eq!(b.properties[0].id, field_id::FIRST_USER);
        assert_eq!(b.properties[1].id, field_id::FIRST_USER + 1);
    }

    #[test]
    fn extends_is_only_recorded() {
        let symbol = parse(SMALL, false).unwrap();
        assert_eq!(symbol.extends.as_deref(), Some("R"));
        assert!(symbol.parent.is_none());
    }

    #[rstest]
    #[case(r#"(symbol "R" (symbol "X_0_1"))"#)]
    #[case(r#"(symbol "R" (symbol "R_a_1"))"#)]
    #[case(r#"(symbol "R" (symbol "R_1"))"#)]
    #[case(r#"(symbol "R" (wire (pts)))"#)]
    #[case(r#"(symbol "R" (pin_numbers show))"#)]
    #[case(r#"(symbol "lib:R")"#)]
    #[case::derived_with_unit_block(
        r#"(symbol "S" (extends "R") (symbol "S_1_1" (rectangle (start 0 0) (end 1 1))))"#
    )]
    #[case::derived_with_item(r#"(symbol "S" (extends "R") (circle (center 0 0) (radius 1)))"#)]
    fn malformed_symbols(#[case] input: &str) {
        let err = parse(input, false).unwrap_err();
        assert!(err.is_structural(), "{err:?}");
    }

    #[test]
    fn in_bom_must_be_yes_or_no() {
        let err = parse(r#"(symbol "R" (in_bom maybe))"#, false).unwrap_err();
        assert!(matches!(err, ParseError::UnknownValue { .. }));
    }

    #[test]
    fn embedded_name_keeps_nickname() {
        let symbol = parse(r#"(symbol "Device:R" (symbol "R_0_1"))"#, true).unwrap();
        assert_eq!(symbol.lib_id, LibId::new("Device", "R"));
        assert_eq!(symbol.name(), "Device:R");
    }

    #[test]
    fn parse_symbol_entry_point_resolves_parent() {
        let mut lib = SymbolLib::new();
        SchParser::new(RESISTOR).parse_symbol(&mut lib, false).unwrap();
        let small = SchParser::new(SMALL).parse_symbol(&mut lib, false).unwrap();
        assert_eq!(small.draw_items().len(), 3);
        assert_eq!(small.value(), Some("R_Small"));
        assert_eq!(small.reference(), Some("R"));
    }
}
