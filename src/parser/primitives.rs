//! Self-contained value groups: stroke, fill, colors, text effects, positions,
//! properties, page settings and the title block.
//!
//! Each function is called once the group's opening keyword has been read and
//! consumes everything up to and including its closing parenthesis.

use super::{lexer::TokenKind, SchParser};
use crate::{
    error::ParseError,
    model::{
        field_id, sheet_field, Color, Fill, HJustify, PageInfo, PaperSize, Point, Property, Size,
        Stroke, TextEffects, TitleBlock, VJustify, MAX_TITLE_BLOCK_COMMENTS,
    },
};

/// Unwraps a required child value, failing with the child's name if it never appeared
pub(super) fn required<T>(
    p: &mut SchParser<'_>,
    value: Option<T>,
    name: &str,
) -> Result<T, ParseError> {
    match value {
        Some(value) => Ok(value),
        None => Err(p.missing(name)),
    }
}

/// `(stroke (width W) (type T) (color R G B A))`
pub(super) fn parse_stroke(p: &mut SchParser<'_>) -> Result<Stroke, ParseError> {
    let mut stroke = Stroke::default();
    while let Some(keyword) = p.next_group()? {
        match keyword {
            "width" => {
                stroke.width = p.parse_internal_units("stroke width")?;
                p.need_right()?;
            }
            "type" => {
                stroke.dash = p.parse_enum("stroke type")?;
                p.need_right()?;
            }
            "color" => stroke.color = parse_color(p)?,
            other => p.skip_unknown(other)?,
        }
    }
    Ok(stroke)
}

/// `(fill (type T) (color R G B A))`
pub(super) fn parse_fill(p: &mut SchParser<'_>) -> Result<Fill, ParseError> {
    let mut fill = Fill::default();
    while let Some(keyword) = p.next_group()? {
        match keyword {
            "type" => {
                fill.fill_type = p.parse_enum("fill type")?;
                p.need_right()?;
            }
            "color" => fill.color = parse_color(p)?,
            other => p.skip_unknown(other)?,
        }
    }
    Ok(fill)
}

/// `(color R G B A)` with 0..255 channels and a 0..1 alpha
pub(super) fn parse_color(p: &mut SchParser<'_>) -> Result<Color, ParseError> {
    let r = p.parse_f64("red")?;
    let g = p.parse_f64("green")?;
    let b = p.parse_f64("blue")?;
    let a = p.parse_f64("alpha")?;
    p.need_right()?;
    let channel = |v: f64| v.clamp(0.0, 255.0).round() as u8;
    Ok(Color {
        r: channel(r),
        g: channel(g),
        b: channel(b),
        a: a.clamp(0.0, 1.0),
    })
}

/// `(at X Y [ANGLE])`, returning the position and the angle in degrees
pub(super) fn parse_at(p: &mut SchParser<'_>) -> Result<(Point, f64), ParseError> {
    let position = p.parse_xy()?;
    let angle = if p.stream.peek() == TokenKind::Number {
        p.parse_f64("angle")?
    } else {
        0.0
    };
    p.need_right()?;
    Ok((position, angle))
}

/// `(xy X Y)` or any other group holding exactly one point
pub(super) fn parse_point(p: &mut SchParser<'_>) -> Result<Point, ParseError> {
    let point = p.parse_xy()?;
    p.need_right()?;
    Ok(point)
}

/// `(size W H)`
pub(super) fn parse_size(p: &mut SchParser<'_>) -> Result<Size, ParseError> {
    let width = p.parse_internal_units("width")?;
    let height = p.parse_internal_units("height")?;
    p.need_right()?;
    Ok(Size { width, height })
}

/// `(pts (xy X Y) ...)`, also accepting the flat `(pts X1 Y1 X2 Y2 ...)` form
pub(super) fn parse_pts(p: &mut SchParser<'_>) -> Result<Vec<Point>, ParseError> {
    let mut points = Vec::new();
    loop {
        match p.stream.peek() {
            TokenKind::RParen => {
                p.stream.skip()?;
                return Ok(points);
            }
            TokenKind::Number => points.push(p.parse_xy()?),
            _ => {
                p.need_left()?;
                let (keyword, at) = p.keyword_at()?;
                if keyword != "xy" {
                    return Err(p.unexpected_keyword(keyword, at, "xy"));
                }
                points.push(parse_point(p)?);
            }
        }
    }
}

/// `(effects (font (size H W) (thickness T) italic bold) (justify ...) hide)`
pub(super) fn parse_effects(p: &mut SchParser<'_>) -> Result<TextEffects, ParseError> {
    let mut effects = TextEffects::default();
    loop {
        let keyword = p.next_child(|_, token, _| {
            if token == "hide" {
                effects.visible = false;
            }
            Ok(())
        })?;
        match keyword {
            None => return Ok(effects),
            Some("font") => parse_font(p, &mut effects)?,
            Some("justify") => parse_justify(p, &mut effects)?,
            Some(other) => p.skip_unknown(other)?,
        }
    }
}

fn parse_font(p: &mut SchParser<'_>, effects: &mut TextEffects) -> Result<(), ParseError> {
    loop {
        let keyword = p.next_child(|_, token, _| {
            match token {
                "italic" => effects.italic = true,
                "bold" => effects.bold = true,
                _ => {}
            }
            Ok(())
        })?;
        match keyword {
            None => return Ok(()),
            Some("size") => {
                let height = p.parse_internal_units("text height")?;
                let width = p.parse_internal_units("text width")?;
                p.need_right()?;
                effects.size = Size { width, height };
            }
            Some("thickness") => {
                effects.thickness = Some(p.parse_internal_units("text thickness")?);
                p.need_right()?;
            }
            Some(other) => p.skip_unknown(other)?,
        }
    }
}

fn parse_justify(p: &mut SchParser<'_>, effects: &mut TextEffects) -> Result<(), ParseError> {
    loop {
        let tok = p.stream.get()?;
        match (tok.kind, p.stream.text(&tok)) {
            (TokenKind::RParen, _) => return Ok(()),
            (TokenKind::Symbol, "left") => effects.h_justify = HJustify::Left,
            (TokenKind::Symbol, "right") => effects.h_justify = HJustify::Right,
            (TokenKind::Symbol, "top") => effects.v_justify = VJustify::Top,
            (TokenKind::Symbol, "bottom") => effects.v_justify = VJustify::Bottom,
            (TokenKind::Symbol, "mirror") => effects.mirrored = true,
            (TokenKind::Symbol, other) => {
                return Err(ParseError::UnknownValue {
                    expected: "text justification".to_owned(),
                    found: other.to_owned(),
                    at: p.stream.position_of(&tok),
                })
            }
            _ => return Err(p.stream.unexpected(&tok, "text justification")),
        }
    }
}

/// Hands out field ids while the properties of one symbol or sheet are read
#[derive(Debug)]
pub(super) struct FieldIds {
    next: u32,
    mandatory: fn(&str) -> Option<u32>,
}

impl FieldIds {
    pub(super) fn for_symbol() -> Self {
        FieldIds {
            next: field_id::FIRST_USER,
            mandatory: field_id::mandatory,
        }
    }

    pub(super) fn for_sheet() -> Self {
        FieldIds {
            next: sheet_field::FILE + 1,
            mandatory: sheet_field_id,
        }
    }

    fn assign(&mut self, name: &str, explicit: Option<u32>) -> u32 {
        if let Some(id) = explicit {
            self.next = self.next.max(id.saturating_add(1));
            return id;
        }
        if let Some(id) = (self.mandatory)(name) {
            return id;
        }
        let id = self.next;
        self.next += 1;
        id
    }
}

fn sheet_field_id(name: &str) -> Option<u32> {
    match name {
        "Sheet name" => Some(sheet_field::NAME),
        "Sheet file" => Some(sheet_field::FILE),
        _ => None,
    }
}

/// `(property "NAME" "VALUE" (id N) (at X Y ANGLE) (effects ...))`
pub(super) fn parse_property(
    p: &mut SchParser<'_>,
    ids: &mut FieldIds,
) -> Result<Property, ParseError> {
    let at = p.stream.position();
    let name = p.parse_string("property name")?;
    if name.is_empty() {
        return Err(ParseError::Structural {
            expected: "non-empty property name".to_owned(),
            found: name,
            at,
        });
    }
    let value = p.parse_string("property value")?;

    let mut explicit_id = None;
    let mut position = Point::default();
    let mut angle = 0.0;
    let mut effects = TextEffects::default();
    while let Some(keyword) = p.next_group()? {
        match keyword {
            "id" => {
                explicit_id = Some(p.parse_u32("field id")?);
                p.need_right()?;
            }
            "at" => (position, angle) = parse_at(p)?,
            "effects" => effects = parse_effects(p)?,
            other => p.skip_unknown(other)?,
        }
    }

    Ok(Property {
        id: ids.assign(&name, explicit_id),
        name,
        value,
        position,
        angle,
        effects,
    })
}

/// `(paper "A4" [portrait])` or `(paper "User" WIDTH HEIGHT [portrait])`
pub(super) fn parse_page_info(p: &mut SchParser<'_>) -> Result<PageInfo, ParseError> {
    let at = p.stream.position();
    let name = p.parse_string("paper size")?;
    let paper = if name == "User" {
        let width = p.parse_f64("page width")?;
        let height = p.parse_f64("page height")?;
        PaperSize::User { width, height }
    } else {
        PaperSize::try_from(name.as_str()).map_err(|e| ParseError::UnknownValue {
            expected: e.kind.to_owned(),
            found: e.found,
            at,
        })?
    };

    let mut portrait = false;
    loop {
        let tok = p.stream.get()?;
        match tok.kind {
            TokenKind::RParen => break,
            TokenKind::Symbol if p.stream.text(&tok) == "portrait" => portrait = true,
            TokenKind::LParen => p.skip_group()?,
            TokenKind::Eof => return Err(p.stream.unexpected(&tok, "')'")),
            _ => {}
        }
    }
    Ok(PageInfo { paper, portrait })
}

/// `(title_block (title "T") (date "D") (rev "R") (company "C") (comment N "TEXT"))`
pub(super) fn parse_title_block(p: &mut SchParser<'_>) -> Result<TitleBlock, ParseError> {
    let mut title_block = TitleBlock::default();
    while let Some(keyword) = p.next_group()? {
        let field = match keyword {
            "title" => &mut title_block.title,
            "date" => &mut title_block.date,
            "rev" => &mut title_block.revision,
            "company" => &mut title_block.company,
            "comment" => {
                let at = p.stream.position();
                let n = p.parse_int("comment number")?;
                let index = usize::try_from(n)
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .filter(|&i| i < MAX_TITLE_BLOCK_COMMENTS)
                    .ok_or_else(|| ParseError::Structural {
                        expected: format!("comment number 1 to {MAX_TITLE_BLOCK_COMMENTS}"),
                        found: n.to_string(),
                        at,
                    })?;
                &mut title_block.comments[index]
            }
            other => {
                p.skip_unknown(other)?;
                continue;
            }
        };
        *field = p.parse_string(keyword)?;
        p.need_right()?;
    }
    Ok(title_block)
}
