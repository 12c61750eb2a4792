//! Loading of whole sheet hierarchies and sets of symbol libraries.
//!
//! The parser itself never touches the file system. [`HierarchyLoader`] reads a
//! root schematic and then each sub-sheet it declares through a [`SheetSource`],
//! and [`load_symbol_libraries`] reads a list of library files, keeping the ones
//! that could be read.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::{
    error::LoadError,
    library::SymbolLib,
    model::{LibId, LibSymbol, SchSheet, Screen, SymbolInstance},
    parser::SchParser,
};

/// Sub-sheets nested deeper than this are rejected
pub const DEFAULT_MAX_SHEET_DEPTH: usize = 32;

/// Provides the text of schematic files by the file name a sheet declares
pub trait SheetSource {
    fn read(&self, file_name: &str) -> std::io::Result<String>;
}

/// Reads sheet files relative to a project directory
#[derive(Debug, Clone)]
pub struct FsSheetSource {
    root: PathBuf,
}

impl FsSheetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsSheetSource { root: root.into() }
    }
}

impl SheetSource for FsSheetSource {
    fn read(&self, file_name: &str) -> std::io::Result<String> {
        std::fs::read_to_string(self.root.join(file_name))
    }
}

/// In-memory documents keyed by file name
impl SheetSource for HashMap<String, String> {
    fn read(&self, file_name: &str) -> std::io::Result<String> {
        self.get(file_name).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no sheet named {file_name}"),
            )
        })
    }
}

/// Reads a schematic and every sub-sheet below it.
///
/// A file referenced by several sheets is parsed once, and all of those sheets
/// share its [`Screen`].
pub struct HierarchyLoader<S> {
    source: S,
    max_depth: usize,
}

impl<S: SheetSource> HierarchyLoader<S> {
    pub fn new(source: S) -> Self {
        HierarchyLoader {
            source,
            max_depth: DEFAULT_MAX_SHEET_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Loads the hierarchy whose top level sheet is stored in `file_name`.
    ///
    /// The top level `symbol_instances` table annotates symbols in every file
    /// of the hierarchy, so each sub-sheet's symbols receive their entries.
    pub fn load(&self, file_name: &str) -> Result<SchSheet, LoadError> {
        let mut root = SchSheet::root(file_name);
        let mut state = LoadState::default();
        self.load_sheet(&mut root, &mut state)?;
        debug!("Loaded {} schematic files", state.screens.len());
        Ok(root)
    }

    fn load_sheet(&self, sheet: &mut SchSheet, state: &mut LoadState) -> Result<(), LoadError> {
        let file_name = sheet.file_name().to_owned();
        if state.stack.contains(&file_name) {
            return Err(LoadError::RecursiveSheet {
                path: file_name.into(),
            });
        }
        if state.stack.len() >= self.max_depth {
            return Err(LoadError::TooDeep {
                path: file_name.into(),
                max_depth: self.max_depth,
            });
        }
        if let Some(screen) = state.screens.get(&file_name) {
            sheet.screen = Some(Arc::clone(screen));
            return Ok(());
        }

        let text = self
            .source
            .read(&file_name)
            .map_err(|source| LoadError::Io {
                path: file_name.clone().into(),
                source,
            })?;
        let mut parser = SchParser::new(&text);
        parser
            .parse_schematic(sheet)
            .map_err(|source| LoadError::Parse {
                path: file_name.clone().into(),
                source,
            })?;
        let Some(screen) = sheet.screen.take() else {
            return Err(too_recent(&parser, &file_name));
        };

        let mut screen = Arc::unwrap_or_clone(screen);
        if state.stack.is_empty() {
            state.root_instances = screen.symbol_instances.clone();
        } else {
            screen.assign_symbol_instances(&state.root_instances);
        }
        state.stack.push(file_name.clone());
        for child in screen.sheets_mut() {
            self.load_sheet(child, state)?;
        }
        state.stack.pop();

        let screen = Arc::new(screen);
        state.screens.insert(file_name, Arc::clone(&screen));
        sheet.screen = Some(screen);
        Ok(())
    }
}

#[derive(Default)]
struct LoadState {
    /// Files currently being descended into
    stack: Vec<String>,
    screens: HashMap<String, Arc<Screen>>,
    root_instances: Vec<SymbolInstance>,
}

fn too_recent(parser: &SchParser<'_>, path: impl Into<PathBuf>) -> LoadError {
    LoadError::TooRecent {
        path: path.into(),
        version: parser.header().map_or(0, |h| h.version),
    }
}

/// Reads one symbol library file
pub fn load_symbol_library(path: &Path) -> Result<SymbolLib, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    let mut lib = SymbolLib::new();
    let mut parser = SchParser::new(&text);
    parser.parse_lib(&mut lib).map_err(|source| LoadError::Parse {
        path: path.to_owned(),
        source,
    })?;
    if parser.is_too_recent() {
        return Err(too_recent(&parser, path));
    }
    Ok(lib)
}

/// Outcome of loading a set of libraries
#[derive(Debug, Default)]
pub struct LibraryLoad {
    /// Libraries that were read, keyed by nickname (the file stem)
    pub libraries: IndexMap<String, SymbolLib>,
    pub failures: Vec<LoadError>,
}

impl LibraryLoad {
    /// Looks a symbol up by `nickname:name`
    pub fn symbol(&self, lib_id: &LibId) -> Option<&Arc<LibSymbol>> {
        self.libraries.get(&lib_id.nickname)?.get(&lib_id.name)
    }
}

/// Reads every library in `paths`. A library that cannot be read is reported
/// in [`LibraryLoad::failures`] and does not stop the others from loading.
pub fn load_symbol_libraries<P: AsRef<Path>>(paths: &[P]) -> LibraryLoad {
    let mut load = LibraryLoad::default();
    for path in paths {
        let path = path.as_ref();
        let nickname = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        match load_symbol_library(path) {
            Ok(lib) => {
                debug!("Library '{}' has {} symbols", nickname, lib.len());
                load.libraries.insert(nickname, lib);
            }
            Err(e) => {
                warn!("Skipping symbol library: {}", e);
                load.failures.push(e);
            }
        }
    }
    load
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::SheetPath, parser::MAX_SUPPORTED_VERSION};
    use std::io::Write;

    const SUB_UUID_A: &str = "11111111-1111-4111-8111-111111111111";
    const SUB_UUID_B: &str = "22222222-2222-4222-8222-222222222222";

    fn schematic(body: &str) -> String {
        format!("(kicad_sch (version {MAX_SUPPORTED_VERSION}) (generator test) {body})")
    }

    fn sheet(uuid: &str, file: &str) -> String {
        format!(
            r#"(sheet (at 0 0) (size 10 10) (uuid {uuid})
                 (property "Sheet name" "{file}") (property "Sheet file" "{file}"))"#
        )
    }

    fn sources(files: &[(&str, String)]) -> HashMap<String, String> {
        files
            .iter()
            .map(|(name, text)| (name.to_string(), text.clone()))
            .collect()
    }

    #[test]
    fn repeated_sheets_share_one_screen() {
        let files = sources(&[
            (
                "top.kicad_sch",
                schematic(&format!(
                    "{} {}",
                    sheet(SUB_UUID_A, "amp.kicad_sch"),
                    sheet(SUB_UUID_B, "amp.kicad_sch")
                )),
            ),
            (
                "amp.kicad_sch",
                schematic("(wire (pts (xy 0 0) (xy 1 0)))"),
            ),
        ]);
        let root = HierarchyLoader::new(files).load("top.kicad_sch").unwrap();
        let screen = root.screen.as_ref().unwrap();
        let children: Vec<_> = screen.sheets().collect();
        assert_eq!(children.len(), 2);
        let a = children[0].screen.as_ref().unwrap();
        let b = children[1].screen.as_ref().unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(a.items.len(), 1);
    }

    #[test]
    fn top_level_annotation_reaches_shared_sheets() {
        const AMP_SYMBOL: &str = "33333333-3333-4333-8333-333333333333";
        let files = sources(&[
            (
                "top.kicad_sch",
                schematic(&format!(
                    r#"{} {}
                       (symbol_instances
                         (path "/{SUB_UUID_A}/{AMP_SYMBOL}" (reference "R1") (unit 1)
                           (value "10k") (footprint ""))
                         (path "/{SUB_UUID_B}/{AMP_SYMBOL}" (reference "R2") (unit 1)
                           (value "10k") (footprint "")))"#,
                    sheet(SUB_UUID_A, "amp.kicad_sch"),
                    sheet(SUB_UUID_B, "amp.kicad_sch")
                )),
            ),
            (
                "amp.kicad_sch",
                schematic(&format!(
                    r#"(symbol (lib_id "Device:R") (at 0 0 0) (uuid {AMP_SYMBOL}))"#
                )),
            ),
        ]);
        let root = HierarchyLoader::new(files).load("top.kicad_sch").unwrap();
        let top = root.screen.as_ref().unwrap();
        let amp = top.sheets().next().unwrap().screen.as_ref().unwrap();
        let symbol = amp.symbols().next().unwrap();
        assert_eq!(symbol.instances.len(), 2);

        let path =
            |sub: &str| SheetPath::try_from(format!("/{sub}/{AMP_SYMBOL}").as_str()).unwrap();
        assert_eq!(symbol.instance_reference(&path(SUB_UUID_A)), Some("R1"));
        assert_eq!(symbol.instance_reference(&path(SUB_UUID_B)), Some("R2"));
        assert!(amp.symbol_instances.is_empty());
    }

    #[test]
    fn recursive_sheets_are_rejected() {
        let files = sources(&[
            ("top.kicad_sch", schematic(&sheet(SUB_UUID_A, "sub.kicad_sch"))),
            ("sub.kicad_sch", schematic(&sheet(SUB_UUID_B, "top.kicad_sch"))),
        ]);
        let err = HierarchyLoader::new(files).load("top.kicad_sch").unwrap_err();
        assert!(matches!(err, LoadError::RecursiveSheet { .. }));
        assert_eq!(err.path(), Path::new("top.kicad_sch"));
    }

    #[test]
    fn depth_is_limited() {
        let files = sources(&[
            ("top.kicad_sch", schematic(&sheet(SUB_UUID_A, "sub.kicad_sch"))),
            ("sub.kicad_sch", schematic("")),
        ]);
        let err = HierarchyLoader::new(files)
            .with_max_depth(1)
            .load("top.kicad_sch")
            .unwrap_err();
        assert!(matches!(err, LoadError::TooDeep { max_depth: 1, .. }));
    }

    #[test]
    fn missing_sheet_file() {
        let files = sources(&[("top.kicad_sch", schematic(&sheet(SUB_UUID_A, "gone.kicad_sch")))]);
        let err = HierarchyLoader::new(files).load("top.kicad_sch").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(err.path(), Path::new("gone.kicad_sch"));
    }

    #[test]
    fn too_recent_sheet() {
        let files = sources(&[(
            "top.kicad_sch",
            format!(
                "(kicad_sch (version {}) (generator test))",
                MAX_SUPPORTED_VERSION + 1
            ),
        )]);
        let err = HierarchyLoader::new(files).load("top.kicad_sch").unwrap_err();
        assert!(matches!(
            err,
            LoadError::TooRecent { version, .. } if version == MAX_SUPPORTED_VERSION + 1
        ));
    }

    #[test]
    fn hierarchy_from_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("top.kicad_sch"),
            schematic(&sheet(SUB_UUID_A, "sub.kicad_sch")),
        )
        .unwrap();
        std::fs::write(dir.path().join("sub.kicad_sch"), schematic(r#"(label "X" (at 0 0 0))"#))
            .unwrap();

        let root = HierarchyLoader::new(FsSheetSource::new(dir.path()))
            .load("top.kicad_sch")
            .unwrap();
        let sub = root.screen.as_ref().unwrap().sheets().next().unwrap();
        assert_eq!(sub.screen.as_ref().unwrap().items.len(), 1);
    }

    #[test]
    fn libraries_load_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("Device.kicad_sym");
        let mut file = std::fs::File::create(&good).unwrap();
        write!(
            file,
            r#"(kicad_symbol_lib (version {MAX_SUPPORTED_VERSION}) (generator test)
                 (symbol "R" (property "Reference" "R")))"#
        )
        .unwrap();
        let bad = dir.path().join("Broken.kicad_sym");
        std::fs::write(&bad, "(kicad_symbol_lib (version 20200310) (generator test) (symbol")
            .unwrap();
        let missing = dir.path().join("Missing.kicad_sym");

        let load = load_symbol_libraries(&[&good, &bad, &missing]);
        assert_eq!(load.libraries.len(), 1);
        assert_eq!(load.failures.len(), 2);
        assert!(matches!(load.failures[0], LoadError::Parse { .. }));
        assert!(matches!(load.failures[1], LoadError::Io { .. }));
        let r = load.symbol(&LibId::new("Device", "R")).unwrap();
        assert_eq!(r.reference(), Some("R"));
    }
}
