use std::{fmt::Display, sync::Arc};

use uuid::Uuid;

use super::{
    common::{field_id, Color, Fill, Point, Property, Size, Stroke, TextEffects},
    page::{PageInfo, TitleBlock},
    symbol::LibId,
};
use crate::{error::UnknownKeyword, library::SymbolLib};

/// Field ids of the two mandatory sheet fields
pub mod sheet_field {
    pub const NAME: u32 = 0;
    pub const FILE: u32 = 1;
}

/// Sequence of sheet uuids from the root sheet to one sheet instance.
/// The root sheet itself has the empty path, written as `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SheetPath(pub Vec<Uuid>);

impl SheetPath {
    pub fn last(&self) -> Option<&Uuid> {
        self.0.last()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<&str> for SheetPath {
    type Error = uuid::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Uuid::parse_str)
            .collect::<Result<Vec<_>, _>>()
            .map(SheetPath)
    }
}

impl Display for SheetPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for id in &self.0 {
            write!(f, "/{}", id)?;
        }
        Ok(())
    }
}

/// Page number of one sheet instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInstance {
    pub path: SheetPath,
    pub page: String,
}

/// Annotation of a placed symbol under one sheet instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInstance {
    pub path: SheetPath,
    pub reference: String,
    pub unit: u32,
    pub value: String,
    pub footprint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub fn from_angle(angle: f64) -> Option<Self> {
        let angle = angle.rem_euclid(360.0);
        if angle.fract() != 0.0 {
            return None;
        }
        match angle as i32 {
            0 => Some(Self::R0),
            90 => Some(Self::R90),
            180 => Some(Self::R180),
            270 => Some(Self::R270),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirror {
    /// Mirrored around the X axis
    X,
    /// Mirrored around the Y axis
    Y,
}

impl TryFrom<&str> for Mirror {
    type Error = UnknownKeyword;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            s => Err(UnknownKeyword::new("mirror axis", s)),
        }
    }
}

/// A symbol placed on a sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SchSymbol {
    pub lib_id: LibId,
    pub position: Point,
    pub rotation: Rotation,
    pub mirror: Option<Mirror>,
    pub unit: u32,
    pub body_style: u32,
    pub in_bom: bool,
    pub on_board: bool,
    pub uuid: Option<Uuid>,
    pub fields: Vec<Property>,
    /// Pin number to pin uuid
    pub pin_uuids: Vec<(String, Uuid)>,
    /// Per sheet instance annotation, filled from `symbol_instances`
    pub instances: Vec<SymbolInstance>,
}

impl SchSymbol {
    pub fn field(&self, id: u32) -> Option<&Property> {
        self.fields.iter().find(|p| p.id == id)
    }

    pub fn reference(&self) -> Option<&str> {
        self.field(field_id::REFERENCE).map(|p| p.value.as_str())
    }

    pub fn value(&self) -> Option<&str> {
        self.field(field_id::VALUE).map(|p| p.value.as_str())
    }

    /// Reference designator used under the sheet instance `path`
    pub fn instance_reference(&self, path: &SheetPath) -> Option<&str> {
        self.instances
            .iter()
            .find(|i| &i.path == path)
            .map(|i| i.reference.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLayer {
    Wire,
    Bus,
    /// Graphic line without electrical meaning
    Notes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchLine {
    pub layer: LineLayer,
    pub start: Point,
    pub end: Point,
    pub stroke: Stroke,
    pub uuid: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    pub position: Point,
    /// 0 selects the default diameter
    pub diameter: i32,
    pub color: Color,
    pub uuid: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoConnect {
    pub position: Point,
    pub uuid: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BusEntry {
    pub position: Point,
    pub size: Size,
    pub stroke: Stroke,
    pub uuid: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Note,
    Label,
    GlobalLabel,
    HierarchicalLabel,
}

/// Shape of a global or hierarchical label, or of a sheet pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelShape {
    #[default]
    Input,
    Output,
    Bidirectional,
    TriState,
    Passive,
}

impl TryFrom<&str> for LabelShape {
    type Error = UnknownKeyword;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            "bidirectional" => Ok(Self::Bidirectional),
            "tri_state" => Ok(Self::TriState),
            "passive" => Ok(Self::Passive),
            s => Err(UnknownKeyword::new("label shape", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchText {
    pub kind: TextKind,
    pub text: String,
    pub position: Point,
    pub angle: f64,
    pub shape: Option<LabelShape>,
    pub effects: TextEffects,
    pub uuid: Option<Uuid>,
    pub properties: Vec<Property>,
}

/// An embedded image, kept as its base64 encoded PNG data
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub position: Point,
    pub scale: f64,
    pub data: String,
    pub uuid: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetPin {
    pub name: String,
    pub shape: LabelShape,
    pub position: Point,
    pub angle: f64,
    pub effects: TextEffects,
    pub uuid: Option<Uuid>,
}

/// A hierarchical sheet. The root sheet of a document is one too.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchSheet {
    pub position: Point,
    pub size: Size,
    pub stroke: Stroke,
    pub fill: Fill,
    pub uuid: Option<Uuid>,
    pub fields: Vec<Property>,
    pub pins: Vec<SheetPin>,
    /// Content of the sheet, set once its file has been parsed
    pub screen: Option<Arc<Screen>>,
}

impl SchSheet {
    /// The top level sheet of a hierarchy stored in `file_name`
    pub fn root(file_name: &str) -> Self {
        SchSheet {
            fields: vec![Property {
                id: sheet_field::FILE,
                name: "Sheet file".to_owned(),
                value: file_name.to_owned(),
                position: Point::default(),
                angle: 0.0,
                effects: TextEffects::default(),
            }],
            ..Default::default()
        }
    }

    fn field_value(&self, id: u32) -> &str {
        self.fields
            .iter()
            .find(|p| p.id == id)
            .map_or("", |p| p.value.as_str())
    }

    pub fn name(&self) -> &str {
        self.field_value(sheet_field::NAME)
    }

    pub fn file_name(&self) -> &str {
        self.field_value(sheet_field::FILE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusAlias {
    pub name: String,
    pub members: Vec<String>,
}

/// Anything that can be placed on a sheet
#[derive(Debug, Clone, PartialEq)]
pub enum SchItem {
    Symbol(SchSymbol),
    Line(SchLine),
    Junction(Junction),
    NoConnect(NoConnect),
    BusEntry(BusEntry),
    Text(SchText),
    Bitmap(Bitmap),
    Sheet(SchSheet),
}

/// Content of one schematic file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Screen {
    pub version: i64,
    pub generator: String,
    pub uuid: Option<Uuid>,
    pub page: PageInfo,
    pub title_block: TitleBlock,
    pub lib_symbols: SymbolLib,
    pub items: Vec<SchItem>,
    pub bus_aliases: Vec<BusAlias>,
    pub sheet_instances: Vec<SheetInstance>,
    pub symbol_instances: Vec<SymbolInstance>,
}

impl Screen {
    pub fn symbols(&self) -> impl Iterator<Item = &SchSymbol> {
        self.items.iter().filter_map(|item| match item {
            SchItem::Symbol(symbol) => Some(symbol),
            _ => None,
        })
    }

    pub fn sheets(&self) -> impl Iterator<Item = &SchSheet> {
        self.items.iter().filter_map(|item| match item {
            SchItem::Sheet(sheet) => Some(sheet),
            _ => None,
        })
    }

    pub fn sheets_mut(&mut self) -> impl Iterator<Item = &mut SchSheet> {
        self.items.iter_mut().filter_map(|item| match item {
            SchItem::Sheet(sheet) => Some(sheet),
            _ => None,
        })
    }

    pub fn bus_alias(&self, name: &str) -> Option<&BusAlias> {
        self.bus_aliases.iter().find(|a| a.name == name)
    }

    /// Adds each entry of `instances` to the placed symbol whose uuid ends the
    /// entry's path. Paths a symbol already knows are left alone.
    pub fn assign_symbol_instances(&mut self, instances: &[SymbolInstance]) {
        for item in &mut self.items {
            let SchItem::Symbol(symbol) = item else {
                continue;
            };
            let Some(uuid) = symbol.uuid else {
                continue;
            };
            for instance in instances {
                if instance.path.last() != Some(&uuid)
                    || symbol.instances.iter().any(|i| i.path == instance.path)
                {
                    continue;
                }
                symbol.instances.push(instance.clone());
            }
        }
    }
}
