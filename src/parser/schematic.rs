//! Sheet content: placed symbols, wiring, text, images, sub-sheets and the
//! instance tables.

use tracing::trace;

use super::{
    lexer::TokenKind,
    primitives::{
        parse_at, parse_color, parse_effects, parse_fill, parse_page_info, parse_point,
        parse_property, parse_pts, parse_size, parse_stroke, parse_title_block, required,
        FieldIds,
    },
    symbol::parse_lib_symbol,
    SchParser,
};
use crate::{
    error::ParseError,
    library::{PendingLib, SymbolLib},
    model::{
        sheet_field, Bitmap, BusAlias, BusEntry, Color, Junction, LabelShape, LibId, LineLayer,
        NoConnect, Point, Rotation, SchItem, SchLine, SchSheet, SchSymbol, SchText, Screen,
        SheetInstance, SheetPath, SheetPin, Stroke, SymbolInstance, TextEffects, TextKind,
    },
};

/// Parses one placed item, after its opening keyword. The keyword is passed on
/// for parsers that serve several item kinds.
type ItemParser = fn(&mut SchParser<'_>, &str) -> Result<SchItem, ParseError>;

const ITEM_PARSERS: &[(&str, ItemParser)] = &[
    ("bus", parse_line),
    ("bus_entry", parse_bus_entry),
    ("global_label", parse_text),
    ("hierarchical_label", parse_text),
    ("image", parse_image),
    ("junction", parse_junction),
    ("label", parse_text),
    ("no_connect", parse_no_connect),
    ("polyline", parse_line),
    ("sheet", parse_sheet),
    ("symbol", parse_component),
    ("text", parse_text),
    ("wire", parse_line),
];

fn item_parser(keyword: &str) -> Option<ItemParser> {
    ITEM_PARSERS
        .iter()
        .find(|(name, _)| *name == keyword)
        .map(|(_, parse)| *parse)
}

/// Reads the groups following the header of a `kicad_sch` document, up to and
/// including the document's closing parenthesis.
pub(super) fn parse_screen(p: &mut SchParser<'_>, screen: &mut Screen) -> Result<(), ParseError> {
    loop {
        let tok = p.stream.get()?;
        match tok.kind {
            TokenKind::RParen => break,
            TokenKind::LParen => {}
            _ => return Err(p.stream.unexpected(&tok, "'('")),
        }

        let (keyword, at) = p.keyword_at()?;
        match keyword {
            "paper" => screen.page = parse_page_info(p)?,
            "title_block" => screen.title_block = parse_title_block(p)?,
            "uuid" => screen.uuid = Some(p.parse_uuid_group()?),
            // sheet number and count, recomputed from the hierarchy
            "page" => p.skip_group()?,
            "lib_symbols" => parse_lib_symbols(p, &mut screen.lib_symbols)?,
            "bus_alias" => screen.bus_aliases.push(parse_bus_alias(p)?),
            "sheet_instances" => screen.sheet_instances = parse_sheet_instances(p)?,
            "symbol_instances" => screen.symbol_instances = parse_symbol_instances(p)?,
            other => match item_parser(other) {
                Some(parse) => {
                    let item = parse(p, other)?;
                    screen.items.push(item);
                }
                None => return Err(p.unexpected_keyword(other, at, "schematic item")),
            },
        }
    }

    let instances = std::mem::take(&mut screen.symbol_instances);
    screen.assign_symbol_instances(&instances);
    screen.symbol_instances = instances;
    Ok(())
}

/// `(lib_symbols (symbol "nick:name" ...) ...)`
fn parse_lib_symbols(p: &mut SchParser<'_>, lib: &mut SymbolLib) -> Result<(), ParseError> {
    let mut pending = PendingLib::default();
    loop {
        let at = p.stream.position();
        match p.next_group()? {
            None => break,
            Some("symbol") => {
                let symbol = parse_lib_symbol(p, true)?;
                pending.insert(symbol, at);
            }
            Some(other) => return Err(p.unexpected_keyword(other, at, "symbol")),
        }
    }
    pending.resolve(lib)
}

/// `(symbol (lib_id "nick:name") (at X Y A) [(mirror x|y)] (unit N) [(convert N)]
///  (in_bom yes) (on_board yes) (uuid U) property* (pin "NUM" (uuid U))*)`
fn parse_component(p: &mut SchParser<'_>, _: &str) -> Result<SchItem, ParseError> {
    let mut lib_id = None;
    let mut placement = None;
    let mut symbol = SchSymbol {
        lib_id: LibId::default(),
        position: Point::default(),
        rotation: Rotation::R0,
        mirror: None,
        unit: 1,
        body_style: 1,
        in_bom: true,
        on_board: true,
        uuid: None,
        fields: Vec::new(),
        pin_uuids: Vec::new(),
        instances: Vec::new(),
    };
    let mut ids = FieldIds::for_symbol();

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "lib_id" => {
                let at = p.stream.position();
                let text = p.parse_string("symbol library identifier")?;
                let id = LibId::parse(&text);
                if id.name.is_empty() {
                    return Err(ParseError::Structural {
                        expected: "symbol library identifier".to_owned(),
                        found: text,
                        at,
                    });
                }
                lib_id = Some(id);
                p.need_right()?;
            }
            "at" => {
                let at = p.stream.position();
                let (position, angle) = parse_at(p)?;
                let rotation =
                    Rotation::from_angle(angle).ok_or_else(|| ParseError::Structural {
                        expected: "symbol orientation 0, 90, 180 or 270".to_owned(),
                        found: angle.to_string(),
                        at,
                    })?;
                placement = Some((position, rotation));
            }
            "mirror" => {
                symbol.mirror = Some(p.parse_enum("mirror axis")?);
                p.need_right()?;
            }
            "unit" => {
                symbol.unit = p.parse_u32("unit")?;
                p.need_right()?;
            }
            "convert" => {
                symbol.body_style = p.parse_u32("body style")?;
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
            "uuid" => symbol.uuid = Some(p.parse_uuid_group()?),
            "property" => symbol.fields.push(parse_property(p, &mut ids)?),
            "pin" => {
                let number = p.parse_string("pin number")?;
                while let Some(keyword) = p.next_group()? {
                    match keyword {
                        "uuid" => {
                            let uuid = p.parse_uuid_group()?;
                            symbol.pin_uuids.push((number.clone(), uuid));
                        }
                        other => p.skip_unknown(other)?,
                    }
                }
            }
            other => p.skip_unknown(other)?,
        }
    }

    symbol.lib_id = required(p, lib_id, "lib_id")?;
    (symbol.position, symbol.rotation) = required(p, placement, "at")?;
    trace!("Placed symbol {}", symbol.lib_id);
    Ok(SchItem::Symbol(symbol))
}

/// `(wire|bus|polyline (pts (xy X1 Y1) (xy X2 Y2)) (stroke ...) (uuid U))`
fn parse_line(p: &mut SchParser<'_>, keyword: &str) -> Result<SchItem, ParseError> {
    let layer = match keyword {
        "wire" => LineLayer::Wire,
        "bus" => LineLayer::Bus,
        _ => LineLayer::Notes,
    };
    let mut ends = None;
    let mut stroke = Stroke::default();
    let mut uuid = None;

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "pts" => {
                let at = p.stream.position();
                let points = parse_pts(p)?;
                match points.as_slice() {
                    [start, end] => ends = Some((*start, *end)),
                    _ => {
                        return Err(ParseError::Structural {
                            expected: "two line end points".to_owned(),
                            found: format!("{} points", points.len()),
                            at,
                        })
                    }
                }
            }
            "stroke" => stroke = parse_stroke(p)?,
            "uuid" => uuid = Some(p.parse_uuid_group()?),
            other => p.skip_unknown(other)?,
        }
    }

    let (start, end) = required(p, ends, "pts")?;
    Ok(SchItem::Line(SchLine {
        layer,
        start,
        end,
        stroke,
        uuid,
    }))
}

/// `(bus_entry (at X Y) (size W H) (stroke ...) (uuid U))`
fn parse_bus_entry(p: &mut SchParser<'_>, _: &str) -> Result<SchItem, ParseError> {
    let mut position = None;
    let mut size = None;
    let mut stroke = Stroke::default();
    let mut uuid = None;

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "at" => position = Some(parse_point(p)?),
            "size" => size = Some(parse_size(p)?),
            "stroke" => stroke = parse_stroke(p)?,
            "uuid" => uuid = Some(p.parse_uuid_group()?),
            other => p.skip_unknown(other)?,
        }
    }

    Ok(SchItem::BusEntry(BusEntry {
        position: required(p, position, "at")?,
        size: required(p, size, "size")?,
        stroke,
        uuid,
    }))
}

/// `(junction (at X Y) (diameter D) (color R G B A) (uuid U))`
fn parse_junction(p: &mut SchParser<'_>, _: &str) -> Result<SchItem, ParseError> {
    let mut position = None;
    let mut diameter = 0;
    let mut color = Color::UNSPECIFIED;
    let mut uuid = None;

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "at" => position = Some(parse_point(p)?),
            "diameter" => {
                diameter = p.parse_internal_units("junction diameter")?;
                p.need_right()?;
            }
            "color" => color = parse_color(p)?,
            "uuid" => uuid = Some(p.parse_uuid_group()?),
            other => p.skip_unknown(other)?,
        }
    }

    Ok(SchItem::Junction(Junction {
        position: required(p, position, "at")?,
        diameter,
        color,
        uuid,
    }))
}

/// `(no_connect (at X Y) (uuid U))`
fn parse_no_connect(p: &mut SchParser<'_>, _: &str) -> Result<SchItem, ParseError> {
    let mut position = None;
    let mut uuid = None;

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "at" => position = Some(parse_point(p)?),
            "uuid" => uuid = Some(p.parse_uuid_group()?),
            other => p.skip_unknown(other)?,
        }
    }

    Ok(SchItem::NoConnect(NoConnect {
        position: required(p, position, "at")?,
        uuid,
    }))
}

/// `(text|label|global_label|hierarchical_label "TEXT" [(shape S)] (at X Y A)
///  (effects ...) (uuid U) property*)`
fn parse_text(p: &mut SchParser<'_>, keyword: &str) -> Result<SchItem, ParseError> {
    let kind = match keyword {
        "label" => TextKind::Label,
        "global_label" => TextKind::GlobalLabel,
        "hierarchical_label" => TextKind::HierarchicalLabel,
        _ => TextKind::Note,
    };
    let text = p.parse_string("text")?;
    let mut shape = match kind {
        TextKind::GlobalLabel | TextKind::HierarchicalLabel => Some(LabelShape::default()),
        TextKind::Note | TextKind::Label => None,
    };
    let mut placement = None;
    let mut effects = TextEffects::default();
    let mut uuid = None;
    let mut properties = Vec::new();
    let mut ids = FieldIds::for_symbol();

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "shape" => {
                shape = Some(p.parse_enum("label shape")?);
                p.need_right()?;
            }
            "at" => placement = Some(parse_at(p)?),
            "effects" => effects = parse_effects(p)?,
            "uuid" => uuid = Some(p.parse_uuid_group()?),
            "property" => properties.push(parse_property(p, &mut ids)?),
            other => p.skip_unknown(other)?,
        }
    }

    let (position, angle) = required(p, placement, "at")?;
    Ok(SchItem::Text(SchText {
        kind,
        text,
        position,
        angle,
        shape,
        effects,
        uuid,
        properties,
    }))
}

/// `(image (at X Y) [(scale S)] (uuid U) (data "BASE64" ...))`
fn parse_image(p: &mut SchParser<'_>, _: &str) -> Result<SchItem, ParseError> {
    let mut position = None;
    let mut scale = 1.0;
    let mut data: Option<String> = None;
    let mut uuid = None;

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "at" => position = Some(parse_point(p)?),
            "scale" => {
                scale = p.parse_f64("image scale")?;
                p.need_right()?;
            }
            "uuid" => uuid = Some(p.parse_uuid_group()?),
            "data" => {
                let data = data.get_or_insert_with(String::new);
                while p.stream.peek() != TokenKind::RParen {
                    data.push_str(&p.parse_string("image data")?);
                }
                p.need_right()?;
            }
            other => p.skip_unknown(other)?,
        }
    }

    Ok(SchItem::Bitmap(Bitmap {
        position: required(p, position, "at")?,
        scale,
        data: required(p, data, "data")?,
        uuid,
    }))
}

/// `(sheet (at X Y) (size W H) (stroke ...) (fill ...) (uuid U)
///  (property "Sheet name" ...) (property "Sheet file" ...) (pin ...)*)`
///
/// Only records the sheet. Its file is loaded by the caller.
fn parse_sheet(p: &mut SchParser<'_>, _: &str) -> Result<SchItem, ParseError> {
    let mut position = None;
    let mut size = None;
    let mut sheet = SchSheet::default();
    let mut ids = FieldIds::for_sheet();

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "at" => position = Some(parse_point(p)?),
            "size" => size = Some(parse_size(p)?),
            "stroke" => sheet.stroke = parse_stroke(p)?,
            "fill" => sheet.fill = parse_fill(p)?,
            "uuid" => sheet.uuid = Some(p.parse_uuid_group()?),
            "property" => sheet.fields.push(parse_property(p, &mut ids)?),
            "pin" => sheet.pins.push(parse_sheet_pin(p)?),
            other => p.skip_unknown(other)?,
        }
    }

    sheet.position = required(p, position, "at")?;
    sheet.size = required(p, size, "size")?;
    if !sheet.fields.iter().any(|f| f.id == sheet_field::FILE) {
        return Err(p.missing("Sheet file property"));
    }
    trace!("Sheet '{}' in {}", sheet.name(), sheet.file_name());
    Ok(SchItem::Sheet(sheet))
}

/// `(pin "NAME" SHAPE (at X Y A) (effects ...) (uuid U))` inside a sheet
fn parse_sheet_pin(p: &mut SchParser<'_>) -> Result<SheetPin, ParseError> {
    let name = p.parse_string("sheet pin name")?;
    let shape = p.parse_enum("sheet pin shape")?;
    let mut placement = None;
    let mut effects = TextEffects::default();
    let mut uuid = None;

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "at" => placement = Some(parse_at(p)?),
            "effects" => effects = parse_effects(p)?,
            "uuid" => uuid = Some(p.parse_uuid_group()?),
            other => p.skip_unknown(other)?,
        }
    }

    let (position, angle) = required(p, placement, "at")?;
    Ok(SheetPin {
        name,
        shape,
        position,
        angle,
        effects,
        uuid,
    })
}

/// `(bus_alias "NAME" (members "A" "B" ...))`
fn parse_bus_alias(p: &mut SchParser<'_>) -> Result<BusAlias, ParseError> {
    let name = p.parse_string("bus alias name")?;
    let mut members = Vec::new();
    while let Some(keyword) = p.next_group()? {
        match keyword {
            "members" => {
                while p.stream.peek() != TokenKind::RParen {
                    members.push(p.parse_string("bus alias member")?);
                }
                p.need_right()?;
            }
            other => p.skip_unknown(other)?,
        }
    }
    Ok(BusAlias { name, members })
}

fn parse_sheet_path(p: &mut SchParser<'_>) -> Result<SheetPath, ParseError> {
    let at = p.stream.position();
    let text = p.parse_string("sheet path")?;
    SheetPath::try_from(text.as_str()).map_err(|_| ParseError::Structural {
        expected: "sheet path of uuids".to_owned(),
        found: text,
        at,
    })
}

/// `(sheet_instances (path "/" (page "1")) ...)`
fn parse_sheet_instances(p: &mut SchParser<'_>) -> Result<Vec<SheetInstance>, ParseError> {
    let mut instances = Vec::new();
    loop {
        let at = p.stream.position();
        match p.next_group()? {
            None => return Ok(instances),
            Some("path") => {
                let path = parse_sheet_path(p)?;
                let mut page = String::new();
                while let Some(keyword) = p.next_group()? {
                    match keyword {
                        "page" => {
                            page = p.parse_string("page number")?;
                            p.need_right()?;
                        }
                        other => p.skip_unknown(other)?,
                    }
                }
                instances.push(SheetInstance { path, page });
            }
            Some(other) => return Err(p.unexpected_keyword(other, at, "path")),
        }
    }
}

/// `(symbol_instances (path "/UUID/..." (reference "R1") (unit 1) (value "10k") (footprint ""))
///  ...)`
fn parse_symbol_instances(p: &mut SchParser<'_>) -> Result<Vec<SymbolInstance>, ParseError> {
    let mut instances = Vec::new();
    loop {
        let at = p.stream.position();
        match p.next_group()? {
            None => return Ok(instances),
            Some("path") => {
                let mut instance = SymbolInstance {
                    path: parse_sheet_path(p)?,
                    reference: String::new(),
                    unit: 1,
                    value: String::new(),
                    footprint: String::new(),
                };
                while let Some(keyword) = p.next_group()? {
                    match keyword {
                        "reference" => instance.reference = p.parse_string("reference")?,
                        "unit" => instance.unit = p.parse_u32("unit")?,
                        "value" => instance.value = p.parse_string("value")?,
                        "footprint" => instance.footprint = p.parse_string("footprint")?,
                        other => {
                            p.skip_unknown(other)?;
                            continue;
                        }
                    }
                    p.need_right()?;
                }
                instances.push(instance);
            }
            Some(other) => return Err(p.unexpected_keyword(other, at, "path")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{field_id, Mirror, PaperSize, Size},
        parser::MAX_SUPPORTED_VERSION,
    };
    use rstest::*;
    use uuid::Uuid;

    fn parse(body: &str) -> Result<Screen, ParseError> {
        let input = format!(
            "(kicad_sch (version {MAX_SUPPORTED_VERSION}) (generator \"test\") {body})"
        );
        let mut sheet = SchSheet::root("test.kicad_sch");
        SchParser::new(&input).parse_schematic(&mut sheet)?;
        Ok(sheet
            .screen
            .map(|screen| (*screen).clone())
            .unwrap_or_default())
    }

    fn single_item(body: &str) -> SchItem {
        let mut screen = parse(body).unwrap();
        assert_eq!(screen.items.len(), 1);
        screen.items.remove(0)
    }

    const SYMBOL_UUID: &str = "2c1d5e3b-6a1f-4f50-8d4e-9b0c1a2b3c4d";
    const SHEET_UUID: &str = "7a0c5d8e-2f31-4b6a-9c47-11d2e3f4a5b6";

    #[test]
    fn minimal_schematic() {
        let screen = parse(r#"(paper "A4")"#).unwrap();
        assert!(screen.items.is_empty());
        assert_eq!(screen.page.paper, PaperSize::A4);
        assert_eq!(screen.version, MAX_SUPPORTED_VERSION);
        assert_eq!(screen.generator, "test");
    }

    #[test]
    fn placed_symbol() {
        let item = single_item(&format!(
            r#"(symbol (lib_id "Device:R") (at 63.5 38.1 90) (mirror y) (unit 2) (convert 2)
                 (in_bom no) (on_board yes) (uuid {SYMBOL_UUID})
                 (property "Reference" "R1" (id 0) (at 63.5 35 0))
                 (property "Value" "10k" (id 1) (at 63.5 41 0))
                 (property "MPN" "RC0603")
                 (pin "1" (uuid 00000000-0000-0000-0000-000000000001))
                 (pin "2" (uuid 00000000-0000-0000-0000-000000000002)))"#
        ));
        let SchItem::Symbol(symbol) = item else {
            panic!("expected a symbol, got {item:?}");
        };
        assert_eq!(symbol.lib_id, LibId::new("Device", "R"));
        assert_eq!(symbol.position, Point::new(635_000, 381_000));
        assert_eq!(symbol.rotation, Rotation::R90);
        assert_eq!(symbol.mirror, Some(Mirror::Y));
        assert_eq!((symbol.unit, symbol.body_style), (2, 2));
        assert!(!symbol.in_bom && symbol.on_board);
        assert_eq!(symbol.uuid, Some(Uuid::parse_str(SYMBOL_UUID).unwrap()));
        assert_eq!(symbol.reference(), Some("R1"));
        assert_eq!(symbol.value(), Some("10k"));
        assert_eq!(symbol.field(field_id::FIRST_USER).unwrap().value, "RC0603");
        assert_eq!(symbol.pin_uuids.len(), 2);
        assert_eq!(symbol.pin_uuids[1].0, "2");
    }

    #[test]
    fn placed_symbol_with_odd_rotation() {
        let err = parse(r#"(symbol (lib_id "Device:R") (at 0 0 45))"#).unwrap_err();
        assert!(err.is_structural());
    }

    #[rstest]
    #[case("wire", LineLayer::Wire)]
    #[case("bus", LineLayer::Bus)]
    #[case("polyline", LineLayer::Notes)]
    fn lines(#[case] keyword: &str, #[case] layer: LineLayer) {
        let item = single_item(&format!(
            "({keyword} (pts (xy 10 20) (xy 30 20))
               (stroke (width 0) (type solid) (color 0 0 0 0)))"
        ));
        let SchItem::Line(line) = item else {
            panic!("expected a line, got {item:?}");
        };
        assert_eq!(line.layer, layer);
        assert_eq!(line.start, Point::new(100_000, 200_000));
        assert_eq!(line.end, Point::new(300_000, 200_000));
    }

    #[test]
    fn line_needs_two_points() {
        let err = parse("(wire (pts (xy 0 0) (xy 1 1) (xy 2 2)))").unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn wiring_items() {
        let screen = parse(
            "(junction (at 1 2) (diameter 1.016) (color 0 0 0 0))
             (no_connect (at 3 4))
             (bus_entry (at 5 6) (size 2.54 2.54) (stroke (width 0)))",
        )
        .unwrap();
        assert_eq!(screen.items.len(), 3);
        assert!(matches!(
            &screen.items[0],
            SchItem::Junction(Junction { diameter: 10_160, .. })
        ));
        assert!(matches!(
            &screen.items[1],
            SchItem::NoConnect(NoConnect { position, .. })
                if *position == Point::new(30_000, 40_000)
        ));
        assert!(matches!(
            &screen.items[2],
            SchItem::BusEntry(BusEntry { size: Size { width: 25_400, height: 25_400 }, .. })
        ));
    }

    #[rstest]
    #[case(r#"(text "note" (at 0 0 0))"#, TextKind::Note, None)]
    #[case(r#"(label "SDA" (at 0 0 0))"#, TextKind::Label, None)]
    #[case(
        r#"(global_label "CLK" (shape output) (at 0 0 180) (effects (font (size 1.27 1.27))))"#,
        TextKind::GlobalLabel,
        Some(LabelShape::Output)
    )]
    #[case(
        r#"(hierarchical_label "EN" (at 0 0 0))"#,
        TextKind::HierarchicalLabel,
        Some(LabelShape::Input)
    )]
    fn texts(#[case] body: &str, #[case] kind: TextKind, #[case] shape: Option<LabelShape>) {
        let item = single_item(body);
        let SchItem::Text(text) = item else {
            panic!("expected text, got {item:?}");
        };
        assert_eq!(text.kind, kind);
        assert_eq!(text.shape, shape);
    }

    #[test]
    fn image_data_chunks_are_joined() {
        let item = single_item(r#"(image (at 10 10) (scale 2) (data "iVBOR" "w0KGgo="))"#);
        let SchItem::Bitmap(bitmap) = item else {
            panic!("expected an image, got {item:?}");
        };
        assert_eq!(bitmap.scale, 2.0);
        assert_eq!(bitmap.data, "iVBORw0KGgo=");
    }

    #[test]
    fn sheet_with_pins() {
        let item = single_item(&format!(
            r#"(sheet (at 100 50) (size 20 10) (stroke (width 0)) (fill (color 0 0 0 0))
                 (uuid {SHEET_UUID})
                 (property "Sheet name" "Power" (id 0) (at 100 49 0))
                 (property "Sheet file" "power.kicad_sch" (id 1) (at 100 61 0))
                 (pin "VIN" input (at 100 55 180) (effects (font (size 1.27 1.27)) (justify left)))
                 (pin "VOUT" output (at 120 55 0)))"#
        ));
        let SchItem::Sheet(sheet) = item else {
            panic!("expected a sheet, got {item:?}");
        };
        assert_eq!(sheet.name(), "Power");
        assert_eq!(sheet.file_name(), "power.kicad_sch");
        assert_eq!(sheet.size, Size { width: 200_000, height: 100_000 });
        assert_eq!(sheet.pins.len(), 2);
        assert_eq!(sheet.pins[0].shape, LabelShape::Input);
        assert_eq!(sheet.pins[1].name, "VOUT");
        assert!(sheet.screen.is_none());
    }

    #[test]
    fn sheet_without_file_is_rejected() {
        let err = parse(r#"(sheet (at 0 0) (size 1 1) (property "Sheet name" "x"))"#).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn bus_alias() {
        let screen = parse(r#"(bus_alias "DATA" (members "D0" "D1" "D2"))"#).unwrap();
        let alias = screen.bus_alias("DATA").unwrap();
        assert_eq!(alias.members, ["D0", "D1", "D2"]);
    }

    #[test]
    fn instances_are_assigned_to_symbols() {
        let screen = parse(&format!(
            r#"(symbol (lib_id "Device:R") (at 0 0 0) (uuid {SYMBOL_UUID}))
               (sheet_instances (path "/" (page "1")) (path "/{SHEET_UUID}" (page "2")))
               (symbol_instances
                 (path "/{SYMBOL_UUID}" (reference "R1") (unit 1)
                   (value "10k") (footprint "R_0603"))
                 (path "/{SHEET_UUID}/{SYMBOL_UUID}" (reference "R101") (unit 1)
                   (value "10k") (footprint "")))"#
        ))
        .unwrap();
        assert_eq!(screen.sheet_instances.len(), 2);
        assert!(screen.sheet_instances[0].path.is_root());
        assert_eq!(screen.sheet_instances[1].page, "2");

        let symbol = screen.symbols().next().unwrap();
        assert_eq!(symbol.instances.len(), 2);
        let nested = SheetPath::try_from(format!("/{SHEET_UUID}/{SYMBOL_UUID}").as_str()).unwrap();
        assert_eq!(symbol.instance_reference(&nested), Some("R101"));
        assert_eq!(symbol.instances[0].footprint, "R_0603");
    }

    #[test]
    fn embedded_library_symbols() {
        let screen = parse(
            r#"(lib_symbols
                 (symbol "Device:R_Small" (extends "R") (property "Value" "R_Small"))
                 (symbol "Device:R" (property "Reference" "R")
                   (symbol "R_0_1" (rectangle (start 0 0) (end 1 1)))))"#,
        )
        .unwrap();
        assert_eq!(screen.lib_symbols.len(), 2);
        let small = screen.lib_symbols.get("Device:R_Small").unwrap();
        assert!(small.is_alias());
        assert_eq!(small.draw_items().len(), 1);
        assert_eq!(small.reference(), Some("R"));
    }

    #[rstest]
    #[case("(frobnicate 1)")]
    #[case("stray")]
    #[case(r#"(lib_symbols (wire))"#)]
    #[case(r#"(sheet_instances (page "1"))"#)]
    #[case(r#"(symbol_instances (path "/not-a-uuid" (reference "R1")))"#)]
    fn malformed_documents(#[case] body: &str) {
        let err = parse(body).unwrap_err();
        assert!(err.is_structural(), "{err:?}");
    }

    #[test]
    fn missing_required_child() {
        let err = parse("(junction (uuid 00000000-0000-0000-0000-000000000001))").unwrap_err();
        assert!(matches!(err, ParseError::Structural { ref expected, .. } if expected == "at"));
    }

    #[test]
    fn truncated_document_is_lexical() {
        let input = format!(
            "(kicad_sch (version {MAX_SUPPORTED_VERSION}) (generator x) (wire (pts (xy 0 0)"
        );
        let err = SchParser::new(&input)
            .parse_schematic(&mut SchSheet::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::Lexical { .. }));
    }

    #[test]
    fn too_recent_schematic_leaves_sheet_empty() {
        let input = format!(
            "(kicad_sch (version {}) (generator x) (this is (not parsed",
            MAX_SUPPORTED_VERSION + 1
        );
        let mut parser = SchParser::new(&input);
        let mut sheet = SchSheet::default();
        parser.parse_schematic(&mut sheet).unwrap();
        assert!(parser.is_too_recent());
        assert!(sheet.screen.is_none());
    }
}
