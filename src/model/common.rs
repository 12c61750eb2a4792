use crate::error::UnknownKeyword;
use crate::units;

/// A coordinate pair in internal units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// A width/height pair in internal units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// An RGBA color. Channels are 0..=255, alpha is 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    /// Sentinel meaning "use the default color for this item"
    pub const UNSPECIFIED: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };

    pub fn is_specified(&self) -> bool {
        *self != Color::UNSPECIFIED
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::UNSPECIFIED
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashType {
    /// Inherit the line style of the item kind
    #[default]
    Default,
    Solid,
    Dash,
    Dot,
    DashDot,
}

impl TryFrom<&str> for DashType {
    type Error = UnknownKeyword;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "default" => Ok(Self::Default),
            "solid" => Ok(Self::Solid),
            "dash" => Ok(Self::Dash),
            "dot" => Ok(Self::Dot),
            "dash_dot" => Ok(Self::DashDot),
            s => Err(UnknownKeyword::new("stroke type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: i32,
    pub dash: DashType,
    pub color: Color,
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke {
            width: units::default_line_width(),
            dash: DashType::Default,
            color: Color::UNSPECIFIED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillType {
    #[default]
    None,
    /// Filled with the outline color
    Outline,
    /// Filled with the body background color
    Background,
    /// Filled with the color given in the fill group
    Color,
}

impl TryFrom<&str> for FillType {
    type Error = UnknownKeyword;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "none" => Ok(Self::None),
            "outline" => Ok(Self::Outline),
            "background" => Ok(Self::Background),
            "color" => Ok(Self::Color),
            s => Err(UnknownKeyword::new("fill type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fill {
    pub fill_type: FillType,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HJustify {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VJustify {
    Top,
    #[default]
    Center,
    Bottom,
}

/// Font and placement attributes shared by every text-like item
#[derive(Debug, Clone, PartialEq)]
pub struct TextEffects {
    pub size: Size,
    pub thickness: Option<i32>,
    pub italic: bool,
    pub bold: bool,
    pub h_justify: HJustify,
    pub v_justify: VJustify,
    pub mirrored: bool,
    pub visible: bool,
}

/// Text size used when a document does not give one, 50 mils
pub const DEFAULT_TEXT_SIZE: i32 = 12_700;

impl Default for TextEffects {
    fn default() -> Self {
        TextEffects {
            size: Size {
                width: DEFAULT_TEXT_SIZE,
                height: DEFAULT_TEXT_SIZE,
            },
            thickness: None,
            italic: false,
            bold: false,
            h_justify: HJustify::default(),
            v_justify: VJustify::default(),
            mirrored: false,
            visible: true,
        }
    }
}

/// A field attached to a library symbol, a placed component or a sheet
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: u32,
    pub name: String,
    pub value: String,
    pub position: Point,
    /// Text angle in degrees
    pub angle: f64,
    pub effects: TextEffects,
}

impl Property {
    pub fn is_visible(&self) -> bool {
        self.effects.visible
    }
}

/// Field ids reserved for the fields every symbol carries
pub mod field_id {
    pub const REFERENCE: u32 = 0;
    pub const VALUE: u32 = 1;
    pub const FOOTPRINT: u32 = 2;
    pub const DATASHEET: u32 = 3;
    /// First id handed out to user fields
    pub const FIRST_USER: u32 = 4;

    pub fn mandatory(name: &str) -> Option<u32> {
        match name {
            "Reference" => Some(REFERENCE),
            "Value" => Some(VALUE),
            "Footprint" => Some(FOOTPRINT),
            "Datasheet" => Some(DATASHEET),
            _ => None,
        }
    }
}
