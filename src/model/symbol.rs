use std::{fmt::Display, sync::Arc};

use super::{
    common::{field_id, Property},
    lib_item::{DrawItem, LibPin},
};

/// Symbol identifier of the form `nickname:name`. The nickname is empty for
/// symbols that live in a standalone library file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LibId {
    pub nickname: String,
    pub name: String,
}

impl LibId {
    pub fn new(nickname: &str, name: &str) -> Self {
        LibId {
            nickname: nickname.to_owned(),
            name: name.to_owned(),
        }
    }

    /// Splits at the first `:`; a string without one is a bare symbol name
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((nickname, name)) => LibId::new(nickname, name),
            None => LibId::new("", s),
        }
    }
}

impl Display for LibId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.nickname.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.nickname, self.name)
        }
    }
}

/// A symbol definition from a library or from a schematic's `lib_symbols`
#[derive(Debug, Clone, PartialEq)]
pub struct LibSymbol {
    pub lib_id: LibId,
    /// Name of the parent symbol this one is derived from
    pub extends: Option<String>,
    /// The resolved parent, set once the whole library has been read
    pub parent: Option<Arc<LibSymbol>>,
    pub power: bool,
    pub pin_name_offset: Option<i32>,
    pub show_pin_names: bool,
    pub show_pin_numbers: bool,
    pub in_bom: bool,
    pub on_board: bool,
    pub properties: Vec<Property>,
    pub draw_items: Vec<DrawItem>,
    pub unit_count: u32,
    pub has_alternate_body_style: bool,
}

impl LibSymbol {
    pub fn new(lib_id: LibId) -> Self {
        LibSymbol {
            lib_id,
            extends: None,
            parent: None,
            power: false,
            pin_name_offset: None,
            show_pin_names: true,
            show_pin_numbers: true,
            in_bom: true,
            on_board: true,
            properties: Vec::new(),
            draw_items: Vec::new(),
            unit_count: 1,
            has_alternate_body_style: false,
        }
    }

    /// Full identifier used as the library key
    pub fn name(&self) -> String {
        self.lib_id.to_string()
    }

    pub fn is_alias(&self) -> bool {
        self.extends.is_some()
    }

    /// Drawing items, taken from the parent for a derived symbol
    pub fn draw_items(&self) -> &[DrawItem] {
        match &self.parent {
            Some(parent) => &parent.draw_items,
            None => &self.draw_items,
        }
    }

    pub fn unit_count(&self) -> u32 {
        match &self.parent {
            Some(parent) => parent.unit_count,
            None => self.unit_count,
        }
    }

    pub fn has_alternate_body_style(&self) -> bool {
        match &self.parent {
            Some(parent) => parent.has_alternate_body_style,
            None => self.has_alternate_body_style,
        }
    }

    pub fn pins(&self) -> impl Iterator<Item = &LibPin> {
        self.draw_items().iter().filter_map(|d| d.item.as_pin())
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn field(&self, id: u32) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    pub fn reference(&self) -> Option<&str> {
        self.field(field_id::REFERENCE).map(|p| p.value.as_str())
    }

    pub fn value(&self) -> Option<&str> {
        self.field(field_id::VALUE).map(|p| p.value.as_str())
    }
}
