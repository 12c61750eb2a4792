//! Library symbol drawing primitives.

use super::{
    lexer::TokenKind,
    primitives::{
        parse_at, parse_effects, parse_fill, parse_point, parse_pts, parse_stroke, required,
    },
    SchParser,
};
use crate::{
    error::ParseError,
    model::{
        Fill, GraphicItem, LibArc, LibBezier, LibCircle, LibPin, LibPolyline, LibRectangle,
        LibText, PinOrientation, Point, Stroke, TextEffects,
    },
};

/// Parses the body of one primitive, after its opening keyword
pub(super) type DrawItemParser = fn(&mut SchParser<'_>) -> Result<GraphicItem, ParseError>;

const DRAW_ITEM_PARSERS: &[(&str, DrawItemParser)] = &[
    ("arc", parse_arc),
    ("bezier", parse_bezier),
    ("circle", parse_circle),
    ("pin", parse_pin),
    ("polyline", parse_polyline),
    ("rectangle", parse_rectangle),
    ("text", parse_text),
];

pub(super) fn draw_item_parser(keyword: &str) -> Option<DrawItemParser> {
    DRAW_ITEM_PARSERS
        .iter()
        .find(|(name, _)| *name == keyword)
        .map(|(_, parse)| *parse)
}

/// Stroke and fill, the children every outline primitive may carry
#[derive(Default)]
struct Outline {
    stroke: Option<Stroke>,
    fill: Option<Fill>,
}

impl Outline {
    /// Reads `stroke` or `fill`, skips anything unknown
    fn child(&mut self, p: &mut SchParser<'_>, keyword: &str) -> Result<(), ParseError> {
        match keyword {
            "stroke" => self.stroke = Some(parse_stroke(p)?),
            "fill" => self.fill = Some(parse_fill(p)?),
            other => p.skip_unknown(other)?,
        }
        Ok(())
    }

    fn stroke(&self) -> Stroke {
        self.stroke.unwrap_or_default()
    }

    fn fill(&self) -> Fill {
        self.fill.unwrap_or_default()
    }
}

/// `(arc (start X Y) [(mid X Y)] (end X Y) [(radius (at X Y) (length R) (angles A B))]
///  stroke fill)`
pub(super) fn parse_arc(p: &mut SchParser<'_>) -> Result<GraphicItem, ParseError> {
    let mut start = None;
    let mut mid = None;
    let mut end = None;
    let mut center = None;
    let mut radius = None;
    let mut angles = None;
    let mut outline = Outline::default();

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "start" => start = Some(parse_point(p)?),
            "mid" => mid = Some(parse_point(p)?),
            "end" => end = Some(parse_point(p)?),
            "radius" => {
                while let Some(keyword) = p.next_group()? {
                    match keyword {
                        "at" => center = Some(parse_point(p)?),
                        "length" => {
                            radius = Some(p.parse_internal_units("radius length")?);
                            p.need_right()?;
                        }
                        "angles" => {
                            let a = p.parse_f64("start angle")?;
                            let b = p.parse_f64("end angle")?;
                            p.need_right()?;
                            angles = Some((a, b));
                        }
                        other => p.skip_unknown(other)?,
                    }
                }
            }
            other => outline.child(p, other)?,
        }
    }

    let start = required(p, start, "start")?;
    let end = required(p, end, "end")?;
    Ok(GraphicItem::Arc(LibArc {
        start,
        mid,
        end,
        center,
        radius,
        angles,
        stroke: outline.stroke(),
        fill: outline.fill(),
    }))
}

/// `(circle (center X Y) (radius R) stroke fill)`
pub(super) fn parse_circle(p: &mut SchParser<'_>) -> Result<GraphicItem, ParseError> {
    let mut center = None;
    let mut radius = None;
    let mut outline = Outline::default();

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "center" => center = Some(parse_point(p)?),
            "radius" => {
                radius = Some(p.parse_internal_units("radius")?);
                p.need_right()?;
            }
            other => outline.child(p, other)?,
        }
    }

    let center = required(p, center, "center")?;
    let radius = required(p, radius, "radius")?;
    Ok(GraphicItem::Circle(LibCircle {
        center,
        radius,
        stroke: outline.stroke(),
        fill: outline.fill(),
    }))
}

/// `(bezier (pts X1 Y1 X2 Y2 X3 Y3 X4 Y4) stroke fill)`
pub(super) fn parse_bezier(p: &mut SchParser<'_>) -> Result<GraphicItem, ParseError> {
    let mut points = None;
    let mut outline = Outline::default();

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "pts" => {
                let at = p.stream.position();
                let pts = parse_pts(p)?;
                let count = pts.len();
                let pts: [Point; 4] = pts.try_into().map_err(|_| ParseError::Structural {
                    expected: "four bezier points".to_owned(),
                    found: format!("{count} points"),
                    at,
                })?;
                points = Some(pts);
            }
            other => outline.child(p, other)?,
        }
    }

    let points = required(p, points, "pts")?;
    Ok(GraphicItem::Bezier(LibBezier {
        points,
        stroke: outline.stroke(),
        fill: outline.fill(),
    }))
}

/// `(polyline (pts (xy X Y) ...) stroke fill)`
pub(super) fn parse_polyline(p: &mut SchParser<'_>) -> Result<GraphicItem, ParseError> {
    let mut points = None;
    let mut outline = Outline::default();

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "pts" => points = Some(parse_pts(p)?),
            other => outline.child(p, other)?,
        }
    }

    let points = required(p, points, "pts")?;
    Ok(GraphicItem::Polyline(LibPolyline {
        points,
        stroke: outline.stroke(),
        fill: outline.fill(),
    }))
}

/// `(rectangle (start X Y) (end X Y) stroke fill)`
pub(super) fn parse_rectangle(p: &mut SchParser<'_>) -> Result<GraphicItem, ParseError> {
    let mut start = None;
    let mut end = None;
    let mut outline = Outline::default();

    while let Some(keyword) = p.next_group()? {
        match keyword {
            "start" => start = Some(parse_point(p)?),
            "end" => end = Some(parse_point(p)?),
            other => outline.child(p, other)?,
        }
    }

    let start = required(p, start, "start")?;
    let end = required(p, end, "end")?;
    Ok(GraphicItem::Rectangle(LibRectangle {
        start,
        end,
        stroke: outline.stroke(),
        fill: outline.fill(),
    }))
}

/// `(text "TEXT" X Y ANGLE (effects ...))` or `(text "TEXT" (at X Y ANGLE) (effects ...))`
pub(super) fn parse_text(p: &mut SchParser<'_>) -> Result<GraphicItem, ParseError> {
    let text = p.parse_string("text string")?;

    let mut at = None;
    if p.stream.peek() == TokenKind::Number {
        let position = p.parse_xy()?;
        let angle = p.parse_f64("text angle")?;
        at = Some((position, angle));
    }

    let mut effects = TextEffects::default();
    while let Some(keyword) = p.next_group()? {
        match keyword {
            "at" => at = Some(parse_at(p)?),
            "effects" => effects = parse_effects(p)?,
            other => p.skip_unknown(other)?,
        }
    }

    let (position, angle) = required(p, at, "at")?;
    Ok(GraphicItem::Text(LibText {
        text,
        position,
        angle,
        effects,
    }))
}

/// `(pin "NAME" "NUMBER" TYPE STYLE (at X Y ANGLE) (length L) [hide] name-effects number-effects)`
///
/// The name and number may instead be given as `(name "NAME" (effects ...))` and
/// `(number "NUMBER" (effects ...))` groups.
pub(super) fn parse_pin(p: &mut SchParser<'_>) -> Result<GraphicItem, ParseError> {
    let mut name = None;
    let mut number = None;
    if p.stream.peek() == TokenKind::String {
        name = Some(p.parse_string("pin name")?);
        number = Some(p.parse_string("pin number")?);
    }

    let electrical_type = p.parse_enum("pin electrical type")?;
    let shape = p.parse_enum("pin graphic style")?;

    let mut at = None;
    let mut length = None;
    let mut visible = true;
    let mut name_effects = TextEffects::default();
    let mut number_effects = TextEffects::default();
    loop {
        let keyword = p.next_child(|_, token, _| {
            if token == "hide" {
                visible = false;
            }
            Ok(())
        })?;
        let Some(keyword) = keyword else {
            break;
        };
        match keyword {
            "at" => {
                let angle_at = p.stream.position();
                let (position, angle) = parse_at(p)?;
                let orientation =
                    PinOrientation::from_angle(angle).ok_or_else(|| ParseError::Structural {
                        expected: "pin orientation 0, 90, 180 or 270".to_owned(),
                        found: angle.to_string(),
                        at: angle_at,
                    })?;
                at = Some((position, orientation));
            }
            "length" => {
                length = Some(p.parse_internal_units("pin length")?);
                p.need_right()?;
            }
            "name" => {
                name = Some(p.parse_string("pin name")?);
                name_effects = parse_optional_effects(p)?;
            }
            "number" => {
                number = Some(p.parse_string("pin number")?);
                number_effects = parse_optional_effects(p)?;
            }
            other => p.skip_unknown(other)?,
        }
    }

    let (position, orientation) = required(p, at, "at")?;
    let length = required(p, length, "length")?;
    let name = required(p, name, "name")?;
    let number = required(p, number, "number")?;
    Ok(GraphicItem::Pin(LibPin {
        name,
        number,
        electrical_type,
        shape,
        position,
        orientation,
        length,
        visible,
        name_effects,
        number_effects,
    }))
}

/// Reads an optional `(effects ...)` and the `)` closing the enclosing group
fn parse_optional_effects(p: &mut SchParser<'_>) -> Result<TextEffects, ParseError> {
    let mut effects = TextEffects::default();
    while let Some(keyword) = p.next_group()? {
        match keyword {
            "effects" => effects = parse_effects(p)?,
            other => p.skip_unknown(other)?,
        }
    }
    Ok(effects)
}
