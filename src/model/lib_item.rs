use super::common::{Fill, Point, Stroke, TextEffects};
use crate::error::UnknownKeyword;

/// Electrical type of a symbol pin
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PinType {
    Input,
    Output,
    Bidirectional,
    TriState,
    Passive,
    PowerInput,
    PowerOutput,
    OpenCollector,
    OpenEmitter,
    Unspecified,
    Unconnected,
}

impl TryFrom<&str> for PinType {
    type Error = UnknownKeyword;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            "bidirectional" => Ok(Self::Bidirectional),
            "tri_state" => Ok(Self::TriState),
            "passive" => Ok(Self::Passive),
            "power_in" => Ok(Self::PowerInput),
            "power_out" => Ok(Self::PowerOutput),
            "open_collector" => Ok(Self::OpenCollector),
            "open_emitter" => Ok(Self::OpenEmitter),
            "unspecified" => Ok(Self::Unspecified),
            "no_connect" => Ok(Self::Unconnected),
            s => Err(UnknownKeyword::new("pin electrical type", s)),
        }
    }
}

/// How the pin is drawn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PinShape {
    #[default]
    Line,
    Inverted,
    Clock,
    InvertedClock,
    InputLow,
    ClockLow,
    OutputLow,
    EdgeClockHigh,
    NonLogic,
}

impl TryFrom<&str> for PinShape {
    type Error = UnknownKeyword;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "line" => Ok(Self::Line),
            "inverted" => Ok(Self::Inverted),
            "clock" => Ok(Self::Clock),
            "inverted_clock" => Ok(Self::InvertedClock),
            "input_low" => Ok(Self::InputLow),
            "clock_low" => Ok(Self::ClockLow),
            "output_low" => Ok(Self::OutputLow),
            "edge_clock_high" => Ok(Self::EdgeClockHigh),
            "non_logic" => Ok(Self::NonLogic),
            s => Err(UnknownKeyword::new("pin graphic style", s)),
        }
    }
}

/// Direction the pin points to, from its connection point towards the body
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PinOrientation {
    #[default]
    Right,
    Up,
    Left,
    Down,
}

impl PinOrientation {
    pub fn from_angle(angle: f64) -> Option<Self> {
        let angle = angle.rem_euclid(360.0);
        if angle.fract() != 0.0 {
            return None;
        }
        match angle as i32 {
            0 => Some(Self::Right),
            90 => Some(Self::Up),
            180 => Some(Self::Left),
            270 => Some(Self::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibArc {
    pub start: Point,
    pub mid: Option<Point>,
    pub end: Point,
    pub center: Option<Point>,
    pub radius: Option<i32>,
    /// Start and end angles in degrees
    pub angles: Option<(f64, f64)>,
    pub stroke: Stroke,
    pub fill: Fill,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibCircle {
    pub center: Point,
    pub radius: i32,
    pub stroke: Stroke,
    pub fill: Fill,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibBezier {
    /// Start, two control points, end
    pub points: [Point; 4],
    pub stroke: Stroke,
    pub fill: Fill,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibPolyline {
    pub points: Vec<Point>,
    pub stroke: Stroke,
    pub fill: Fill,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibRectangle {
    pub start: Point,
    pub end: Point,
    pub stroke: Stroke,
    pub fill: Fill,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibText {
    pub text: String,
    pub position: Point,
    /// Degrees
    pub angle: f64,
    pub effects: TextEffects,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibPin {
    pub name: String,
    pub number: String,
    pub electrical_type: PinType,
    pub shape: PinShape,
    pub position: Point,
    pub orientation: PinOrientation,
    pub length: i32,
    pub visible: bool,
    pub name_effects: TextEffects,
    pub number_effects: TextEffects,
}

/// One drawing primitive of a library symbol
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicItem {
    Arc(LibArc),
    Circle(LibCircle),
    Bezier(LibBezier),
    Polyline(LibPolyline),
    Rectangle(LibRectangle),
    Text(LibText),
    Pin(LibPin),
}

impl GraphicItem {
    pub fn as_pin(&self) -> Option<&LibPin> {
        match self {
            GraphicItem::Pin(pin) => Some(pin),
            _ => None,
        }
    }
}

/// A graphic item bound to the unit and body style it belongs to.
/// Unit or body style 0 means the item is shared by all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub unit: u32,
    pub body_style: u32,
    pub item: GraphicItem,
}

impl DrawItem {
    pub fn is_drawn_for(&self, unit: u32, body_style: u32) -> bool {
        (self.unit == 0 || self.unit == unit)
            && (self.body_style == 0 || self.body_style == body_style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("input", PinType::Input)]
    #[case("tri_state", PinType::TriState)]
    #[case("power_in", PinType::PowerInput)]
    #[case("open_emitter", PinType::OpenEmitter)]
    #[case("no_connect", PinType::Unconnected)]
    fn pin_type_keywords(#[case] keyword: &str, #[case] expected: PinType) {
        assert_eq!(PinType::try_from(keyword), Ok(expected));
    }

    #[test]
    fn unknown_pin_type_is_rejected() {
        let err = PinType::try_from("bogus").unwrap_err();
        assert_eq!(err.found, "bogus");
    }

    #[rstest]
    #[case(0.0, Some(PinOrientation::Right))]
    #[case(90.0, Some(PinOrientation::Up))]
    #[case(180.0, Some(PinOrientation::Left))]
    #[case(-90.0, Some(PinOrientation::Down))]
    #[case(45.0, None)]
    fn pin_orientation_from_angle(#[case] angle: f64, #[case] expected: Option<PinOrientation>) {
        assert_eq!(PinOrientation::from_angle(angle), expected);
    }
}
