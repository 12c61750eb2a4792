//! Symbol library container and derived symbol resolution.
//!
//! Symbols are read in two phases. The parser first collects every symbol of a
//! document into a [`PendingLib`], where a derived symbol only knows the name of
//! its parent. Once the whole document has been read, [`PendingLib::resolve`]
//! links each derived symbol to its parent, so parents may appear after their
//! children in the file.

use std::{collections::HashSet, sync::Arc};

use indexmap::IndexMap;

use crate::{
    error::{ParseError, Position},
    model::{LibSymbol, Property},
};

/// Symbols keyed by name, in document order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolLib {
    symbols: IndexMap<String, Arc<LibSymbol>>,
}

impl SymbolLib {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<LibSymbol>> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<LibSymbol>)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Adds or replaces a symbol, returning the one it replaced
    pub fn insert(&mut self, symbol: Arc<LibSymbol>) -> Option<Arc<LibSymbol>> {
        self.symbols.insert(symbol.name(), symbol)
    }

    /// Looks up the parent of a derived symbol. Embedded symbols refer to
    /// their parent by bare name, so the child's nickname is tried as well.
    fn parent_of(&self, child: &LibSymbol, parent: &str) -> Option<&Arc<LibSymbol>> {
        self.symbols.get(parent).or_else(|| {
            (!child.lib_id.nickname.is_empty())
                .then(|| format!("{}:{}", child.lib_id.nickname, parent))
                .and_then(|key| self.symbols.get(&key))
        })
    }
}

/// Symbols read from a document whose parents are not linked yet
#[derive(Debug, Default)]
pub(crate) struct PendingLib {
    entries: IndexMap<String, (LibSymbol, Position)>,
}

impl PendingLib {
    pub(crate) fn insert(&mut self, symbol: LibSymbol, at: Position) {
        self.entries.insert(symbol.name(), (symbol, at));
    }

    fn lookup<'s>(
        &'s self,
        lib: &'s SymbolLib,
        child: &LibSymbol,
        parent: &str,
    ) -> Option<&'s LibSymbol> {
        self.entries
            .get(parent)
            .or_else(|| {
                (!child.lib_id.nickname.is_empty())
                    .then(|| format!("{}:{}", child.lib_id.nickname, parent))
                    .and_then(|key| self.entries.get(&key))
            })
            .map(|(symbol, _)| symbol)
            .or_else(|| lib.parent_of(child, parent).map(|s| &**s))
    }

    /// Rejects cycles, missing parents and inheritance chains deeper than one level
    fn check_chain(
        &self,
        lib: &SymbolLib,
        name: &str,
        symbol: &LibSymbol,
        at: Position,
    ) -> Result<(), ParseError> {
        let mut visited = HashSet::from([name.to_owned()]);
        let mut current = symbol;
        let mut depth = 0;
        while let Some(parent_name) = current.extends.as_deref() {
            let parent = self.lookup(lib, current, parent_name).ok_or_else(|| {
                structural(format!("parent symbol '{parent_name}'"), name, at)
            })?;
            if !visited.insert(parent.name()) {
                return Err(structural(
                    "symbol inheritance without a cycle".to_owned(),
                    name,
                    at,
                ));
            }
            depth += 1;
            current = parent;
        }
        if depth > 1 {
            return Err(structural(
                "a parent symbol that is not itself derived".to_owned(),
                name,
                at,
            ));
        }
        Ok(())
    }

    /// Links every derived symbol to its parent and moves all symbols into `lib`
    pub(crate) fn resolve(self, lib: &mut SymbolLib) -> Result<(), ParseError> {
        for (name, (symbol, at)) in &self.entries {
            self.check_chain(lib, name, symbol, *at)?;
        }

        let mut roots = SymbolLib::new();
        for (symbol, _) in self.entries.values() {
            if !symbol.is_alias() {
                roots.insert(Arc::new(symbol.clone()));
            }
        }

        for (name, (symbol, _)) in self.entries {
            let resolved = match symbol.extends.as_deref() {
                None => roots
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(|| Arc::new(symbol.clone())),
                Some(parent_name) => {
                    // check_chain guarantees the parent exists and is a root
                    let parent = roots
                        .parent_of(&symbol, parent_name)
                        .or_else(|| lib.parent_of(&symbol, parent_name))
                        .cloned();
                    match parent {
                        Some(parent) => Arc::new(derive(symbol, parent)),
                        None => Arc::new(symbol),
                    }
                }
            };
            lib.insert(resolved);
        }
        Ok(())
    }
}

/// Links a single symbol into `lib`. A derived symbol's parent must already be in `lib`.
pub(crate) fn resolve_one(
    symbol: LibSymbol,
    at: Position,
    lib: &mut SymbolLib,
) -> Result<Arc<LibSymbol>, ParseError> {
    let name = symbol.name();
    let resolved = match symbol.extends.as_deref() {
        None => Arc::new(symbol),
        Some(parent_name) => {
            let parent = lib
                .parent_of(&symbol, parent_name)
                .cloned()
                .ok_or_else(|| structural(format!("parent symbol '{parent_name}'"), &name, at))?;
            if parent.is_alias() {
                return Err(structural(
                    "a parent symbol that is not itself derived".to_owned(),
                    &name,
                    at,
                ));
            }
            Arc::new(derive(symbol, parent))
        }
    };
    lib.insert(Arc::clone(&resolved));
    Ok(resolved)
}

/// Builds a derived symbol: the parent's fields, overridden by the child's
/// own fields of the same name, followed by the child's additional fields.
fn derive(mut child: LibSymbol, parent: Arc<LibSymbol>) -> LibSymbol {
    let own = std::mem::take(&mut child.properties);
    let mut properties: Vec<Property> = parent
        .properties
        .iter()
        .map(|inherited| {
            own.iter()
                .find(|p| p.name == inherited.name)
                .unwrap_or(inherited)
                .clone()
        })
        .collect();
    properties.extend(
        own.into_iter()
            .filter(|p| !parent.properties.iter().any(|q| q.name == p.name)),
    );
    child.properties = properties;
    child.parent = Some(parent);
    child
}

fn structural(expected: String, found: &str, at: Position) -> ParseError {
    ParseError::Structural {
        expected,
        found: found.to_owned(),
        at,
    }
}
