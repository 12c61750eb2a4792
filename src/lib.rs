//! Reader for the KiCad s-expression schematic (`.kicad_sch`) and symbol
//! library (`.kicad_sym`) file formats.
//!
//! ```no_run
//! use kicad_schematic::{SchParser, SchSheet, SymbolLib};
//!
//! let text = std::fs::read_to_string("Device.kicad_sym")?;
//! let mut lib = SymbolLib::new();
//! SchParser::new(&text).parse_lib(&mut lib)?;
//!
//! let text = std::fs::read_to_string("top.kicad_sch")?;
//! let mut sheet = SchSheet::root("top.kicad_sch");
//! SchParser::new(&text).parse_schematic(&mut sheet)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Coordinates are stored as integer internal units of 100 nm, see [`units`].

pub mod error;
pub mod library;
pub mod loader;
pub mod model;
pub mod parser;
pub mod units;

pub use error::{LoadError, ParseError, Position};
pub use library::SymbolLib;
pub use loader::{load_symbol_libraries, FsSheetSource, HierarchyLoader, SheetSource};
pub use model::{LibId, LibSymbol, SchSheet, Screen};
pub use parser::{DocumentHeader, SchParser, MAX_SUPPORTED_VERSION, MIN_SUPPORTED_VERSION};
