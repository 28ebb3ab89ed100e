// src/ir_map.rs
use macroquad::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;

/// Canonical, format-agnostic map. Both loaders produce this.
#[derive(Debug, Clone)]
pub struct IrMap {
    pub width: u32,
    pub height: u32,
    pub tile_w: u32,
    pub tile_h: u32,
    pub properties: Properties,
    pub tilesets: Vec<IrTileset>, // must be sorted by first_gid
    pub layers: Vec<IrLayer>,     // draw order: array order
}

/// One image atlas sliced on a regular grid.
#[derive(Debug, Clone)]
pub struct IrTileset {
    pub name: String,
    pub first_gid: u32,
    /// `None` for image-collection tilesets, which we cannot slice.
    pub image: Option<IrImage>,
    pub tile_w: u32,
    pub tile_h: u32,
    pub spacing: u32, // 0 if not used
    pub margin: u32,  // 0 if not used
    pub properties: Properties,
}

#[derive(Debug, Clone)]
pub struct IrImage {
    /// Relative to the map directory.
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub enum IrLayerKind {
    Tiles {
        width: usize,
        height: usize,
        data: Vec<u32>, // raw GIDs (including flip flags ok)
    },
    Objects {
        objects: Vec<IrObject>,
    },
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct IrLayer {
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub tint: Option<Color>,
    pub offset: Vec2, // world offset for this layer
    pub properties: Properties,
    pub kind: IrLayerKind,
}

#[derive(Debug, Clone)]
pub struct IrObject {
    pub id: u32,
    pub name: String,
    pub class_name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub visible: bool,
    pub shape: IrObjectShape,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrObjectShape {
    Rectangle,
    Ellipse,
    Point,
    Text,
    Polygon(Vec<Vec2>),
    Polyline(Vec<Vec2>),
    Tile { gid: u32 },
}

/// A single custom property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `bool` property.
    Bool(bool),
    /// `int` and `object` properties.
    I64(i64),
    /// `float` property.
    F32(f32),
    /// `string`, `file` and `color` properties.
    String(String),
}

/// Custom properties attached to a map, layer, tileset or object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {
    /// Empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    /// Raw access.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when there are no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Boolean value, if present with that type.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value, if present and representable as `i64`.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value, if present and within `i32` range.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    /// Float value. Integers are widened.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            PropertyValue::F32(v) => Some(*v),
            PropertyValue::I64(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// String value.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl FromIterator<(String, PropertyValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Properties(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_reject_mismatched_types() {
        let mut props = Properties::new();
        props.insert("solid", PropertyValue::Bool(true));
        props.insert("hp", PropertyValue::I64(12));
        props.insert("big", PropertyValue::I64(5_000_000_000));
        props.insert("name", PropertyValue::String("door".into()));

        assert_eq!(props.get_bool("solid"), Some(true));
        assert_eq!(props.get_string("solid"), None);
        assert_eq!(props.get_i32("hp"), Some(12));
        assert_eq!(props.get_f32("hp"), Some(12.0));
        assert_eq!(props.get_i32("big"), None);
        assert_eq!(props.get_i64("big"), Some(5_000_000_000));
        assert_eq!(props.get_string("name"), Some("door"));
        assert_eq!(props.get_bool("missing"), None);
    }
}
