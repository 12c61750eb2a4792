//! The object graph produced by the parser.

mod common;
mod lib_item;
mod page;
mod schematic;
mod symbol;

pub use common::{
    field_id, Color, DashType, Fill, FillType, HJustify, Point, Property, Size, Stroke,
    TextEffects, VJustify, DEFAULT_TEXT_SIZE,
};
pub use lib_item::{
    DrawItem, GraphicItem, LibArc, LibBezier, LibCircle, LibPin, LibPolyline, LibRectangle,
    LibText, PinOrientation, PinShape, PinType,
};
pub use page::{PageInfo, PaperSize, TitleBlock, MAX_TITLE_BLOCK_COMMENTS};
pub use schematic::{
    sheet_field, Bitmap, BusAlias, BusEntry, Junction, LabelShape, LineLayer, Mirror, NoConnect,
    Rotation, SchItem, SchLine, SchSheet, SchSymbol, SchText, Screen, SheetInstance, SheetPath,
    SheetPin, SymbolInstance, TextKind,
};
pub use symbol::{LibId, LibSymbol};
