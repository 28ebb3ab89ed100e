// src/loader/json_loader.rs
use crate::error::MapError;
use crate::ir_map::*;
use macroquad::prelude::*;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    width: usize,
    #[serde(default)]
    height: usize,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "one")]
    opacity: f32,
    #[serde(default)]
    offsetx: f32,
    #[serde(default)]
    offsety: f32,
    #[serde(default)]
    tintcolor: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>, // "tilelayer" expected here
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    objects: Vec<JsonObject>,
    #[serde(default)]
    layers: Vec<JsonLayer>, // children of a "group" layer
    #[serde(default)]
    chunks: Vec<JsonChunk>, // infinite maps store cells here instead of `data`
}

#[derive(Deserialize)]
struct JsonChunk {
    data: Vec<u32>,
    x: i32,
    y: i32,
    width: usize,
    height: usize,
}

fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}

#[derive(Deserialize)]
struct JsonTilesetRef {
    firstgid: u32,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    inline: JsonTileset,
}

#[derive(Deserialize)]
struct JsonMap {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonTilesetRef>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

/// Fields shared by embedded and external tilesets.
#[derive(Deserialize, Default)]
struct JsonTileset {
    #[serde(default)]
    name: String,
    #[serde(default)]
    tilewidth: u32,
    #[serde(default)]
    tileheight: u32,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    imagewidth: u32,
    #[serde(default)]
    imageheight: u32,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonObject {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    point: bool,
    #[serde(default)]
    ellipse: bool,
    #[serde(default)]
    text: Option<JsonValue>,
    #[serde(default)]
    polygon: Vec<JsonObjectPoint>,
    #[serde(default)]
    polyline: Vec<JsonObjectPoint>,
    #[serde(default)]
    gid: Option<u32>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonObjectPoint {
    x: f32,
    y: f32,
}

fn json_property_to_ir(prop: JsonProperty) -> Result<Option<(String, PropertyValue)>, MapError> {
    let JsonProperty { name, kind, value } = prop;

    let parsed = match kind.as_deref() {
        Some("bool") => value.as_bool().map(PropertyValue::Bool),
        Some("int") | Some("object") => value.as_i64().map(PropertyValue::I64),
        Some("float") => value.as_f64().map(|n| PropertyValue::F32(n as f32)),
        Some("string") | Some("file") | Some("color") | Some("class") => {
            value.as_str().map(|s| PropertyValue::String(s.to_owned()))
        }
        Some(other) => {
            return Err(MapError::UnsupportedPropertyType {
                name,
                kind: other.to_owned(),
            });
        }
        None => {
            if let Some(v) = value.as_bool() {
                Some(PropertyValue::Bool(v))
            } else if let Some(v) = value.as_i64() {
                Some(PropertyValue::I64(v))
            } else if let Some(v) = value.as_f64() {
                Some(PropertyValue::F32(v as f32))
            } else {
                value.as_str().map(|s| PropertyValue::String(s.to_owned()))
            }
        }
    };

    Ok(parsed.map(|value| (name, value)))
}

fn properties_from_json(props: Vec<JsonProperty>) -> Result<Properties, MapError> {
    let mut out = Properties::new();
    for p in props {
        if let Some((name, value)) = json_property_to_ir(p)? {
            out.insert(name, value);
        }
    }
    Ok(out)
}

/// `#rrggbb` or `#aarrggbb`, as Tiled writes colors.
pub(crate) fn parse_tiled_color(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Color::from_rgba(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Color::from_rgba(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
        _ => None,
    }
}

fn object_to_ir(obj: JsonObject) -> Result<IrObject, MapError> {
    let shape = if let Some(gid) = obj.gid {
        IrObjectShape::Tile { gid }
    } else if obj.point {
        IrObjectShape::Point
    } else if obj.ellipse {
        IrObjectShape::Ellipse
    } else if obj.text.is_some() {
        IrObjectShape::Text
    } else if !obj.polygon.is_empty() {
        IrObjectShape::Polygon(obj.polygon.into_iter().map(|p| vec2(p.x, p.y)).collect())
    } else if !obj.polyline.is_empty() {
        IrObjectShape::Polyline(obj.polyline.into_iter().map(|p| vec2(p.x, p.y)).collect())
    } else {
        IrObjectShape::Rectangle
    };

    let class_name = if !obj.class.is_empty() {
        obj.class
    } else {
        obj.kind
    };

    Ok(IrObject {
        id: obj.id,
        name: obj.name,
        class_name,
        x: obj.x,
        y: obj.y,
        width: obj.width,
        height: obj.height,
        rotation: obj.rotation,
        visible: obj.visible,
        shape,
        properties: properties_from_json(obj.properties)?,
    })
}

fn tileset_to_ir(first_gid: u32, ts: JsonTileset, base: &Path) -> Result<IrTileset, MapError> {
    let image = ts.image.map(|img| IrImage {
        source: base.join(img),
        width: ts.imagewidth,
        height: ts.imageheight,
    });
    Ok(IrTileset {
        name: ts.name,
        first_gid,
        image,
        tile_w: ts.tilewidth,
        tile_h: ts.tileheight,
        spacing: ts.spacing,
        margin: ts.margin,
        properties: properties_from_json(ts.properties)?,
    })
}

/// Dense grid covering every chunk of an infinite layer. Returns the grid and the
/// tile coordinate of its top-left cell.
fn chunks_to_grid(
    name: &str,
    chunks: &[JsonChunk],
) -> Result<(usize, usize, Vec<u32>, IVec2), MapError> {
    let mut min = IVec2::new(i32::MAX, i32::MAX);
    let mut max = IVec2::new(i32::MIN, i32::MIN);
    for c in chunks {
        if c.data.len() != c.width * c.height {
            return Err(MapError::InvalidMap(format!(
                "chunk ({}, {}) of layer '{name}' has {} cells, expected {}x{}",
                c.x,
                c.y,
                c.data.len(),
                c.width,
                c.height
            )));
        }
        min = min.min(IVec2::new(c.x, c.y));
        max = max.max(IVec2::new(c.x + c.width as i32, c.y + c.height as i32));
    }
    if chunks.is_empty() {
        return Ok((0, 0, Vec::new(), IVec2::ZERO));
    }

    let width = (max.x - min.x) as usize;
    let height = (max.y - min.y) as usize;
    let mut data = vec![0u32; width * height];
    for c in chunks {
        let left = (c.x - min.x) as usize;
        let top = (c.y - min.y) as usize;
        for (row, cells) in c.data.chunks(c.width.max(1)).enumerate() {
            let start = (top + row) * width + left;
            data[start..start + cells.len()].copy_from_slice(cells);
        }
    }
    Ok((width, height, data, min))
}

// Group layers are flattened: children inherit visibility, opacity and offset.
fn push_layers(
    layers: Vec<JsonLayer>,
    parent: Option<(bool, f32, Vec2)>,
    tile_size: Vec2,
    out: &mut Vec<IrLayer>,
) -> Result<(), MapError> {
    for l in layers {
        let (p_visible, p_opacity, p_offset) = parent.unwrap_or((true, 1.0, Vec2::ZERO));
        let visible = l.visible && p_visible;
        let opacity = l.opacity * p_opacity;
        let mut offset = vec2(l.offsetx, l.offsety) + p_offset;

        let layer_kind = match l.kind.as_deref().unwrap_or("tilelayer") {
            "group" => {
                push_layers(l.layers, Some((visible, opacity, offset)), tile_size, out)?;
                continue;
            }
            "tilelayer" if !l.chunks.is_empty() => {
                let (width, height, data, origin) = chunks_to_grid(&l.name, &l.chunks)?;
                log::debug!(
                    "layer '{}': {} chunks into {width}x{height} cells",
                    l.name,
                    l.chunks.len()
                );
                // grid starts at the top-left chunk, not at tile (0, 0)
                offset += origin.as_vec2() * tile_size;
                IrLayerKind::Tiles {
                    width,
                    height,
                    data,
                }
            }
            "tilelayer" => {
                if !l.data.is_empty() && l.width * l.height != l.data.len() {
                    return Err(MapError::InvalidMap(format!(
                        "layer '{}' has {} cells, expected {}x{}",
                        l.name,
                        l.data.len(),
                        l.width,
                        l.height
                    )));
                }
                IrLayerKind::Tiles {
                    width: l.width,
                    height: l.height,
                    data: l.data,
                }
            }
            "objectgroup" => IrLayerKind::Objects {
                objects: l
                    .objects
                    .into_iter()
                    .map(object_to_ir)
                    .collect::<Result<Vec<_>, _>>()?,
            },
            other => {
                log::debug!("ignoring {other} layer '{}'", l.name);
                IrLayerKind::Unsupported
            }
        };
        out.push(IrLayer {
            name: l.name,
            visible,
            opacity,
            tint: l.tintcolor.as_deref().and_then(parse_tiled_color),
            offset,
            properties: properties_from_json(l.properties)?,
            kind: layer_kind,
        });
    }
    Ok(())
}

/// Parse a Tiled JSON map. Image paths are resolved against the file that names them.
pub fn decode_map_file_to_ir(path: &Path) -> Result<IrMap, MapError> {
    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let j: JsonMap = serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let map_dir = path
        .parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"));

    // Build IR tilesets
    let mut ir_tilesets = Vec::with_capacity(j.tilesets.len());
    for ts in j.tilesets {
        let Some(source) = ts.source else {
            ir_tilesets.push(tileset_to_ir(ts.firstgid, ts.inline, &map_dir)?);
            continue;
        };
        if !(source.ends_with(".json") || source.ends_with(".tsj")) {
            return Err(MapError::InvalidMap(format!(
                "External tileset must be JSON: {source}"
            )));
        }
        let ts_path = map_dir.join(&source);
        let ext_txt = std::fs::read_to_string(&ts_path).map_err(|source| MapError::Io {
            path: ts_path.clone(),
            source,
        })?;
        let ext: JsonTileset = serde_json::from_str(&ext_txt).map_err(|source| MapError::Json {
            path: ts_path.clone(),
            source,
        })?;

        // image paths in an external tileset are relative to that file
        let ts_dir = ts_path.parent().unwrap_or(&map_dir).to_path_buf();
        ir_tilesets.push(tileset_to_ir(ts.firstgid, ext, &ts_dir)?);
    }

    // Sort by first_gid to make LUT building trivial
    ir_tilesets.sort_by_key(|t| t.first_gid);

    let mut ir_layers = Vec::with_capacity(j.layers.len());
    let tile_size = vec2(j.tilewidth as f32, j.tileheight as f32);
    push_layers(j.layers, None, tile_size, &mut ir_layers)?;

    Ok(IrMap {
        width: j.width,
        height: j.height,
        tile_w: j.tilewidth,
        tile_h: j.tileheight,
        properties: properties_from_json(j.properties)?,
        tilesets: ir_tilesets,
        layers: ir_layers,
    })
}
