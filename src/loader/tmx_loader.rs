// src/loader/tmx_loader.rs
use crate::error::MapError;
use crate::ir_map::*;
use crate::tileset::{slice_tileset, FLIP_D, FLIP_H, FLIP_V};
use macroquad::prelude::*;
use std::path::Path;
use tiled::{LayerType, ObjectShape, TileLayer, TilesetLocation};

// tiled stores infinite layers as 16x16 chunks
const CHUNK: i32 = 16;

fn color_from_tiled(c: tiled::Color) -> Color {
    Color::from_rgba(c.red, c.green, c.blue, c.alpha)
}

fn properties_from_tiled(props: &tiled::Properties) -> Properties {
    props
        .iter()
        .filter_map(|(name, value)| {
            let v = match value {
                tiled::PropertyValue::BoolValue(b) => PropertyValue::Bool(*b),
                tiled::PropertyValue::IntValue(i) => PropertyValue::I64(*i as i64),
                tiled::PropertyValue::ObjectValue(id) => PropertyValue::I64(*id as i64),
                tiled::PropertyValue::FloatValue(f) => PropertyValue::F32(*f),
                tiled::PropertyValue::StringValue(s) | tiled::PropertyValue::FileValue(s) => {
                    PropertyValue::String(s.clone())
                }
                tiled::PropertyValue::ColorValue(c) => PropertyValue::String(format!(
                    "#{:02x}{:02x}{:02x}{:02x}",
                    c.alpha, c.red, c.green, c.blue
                )),
                // class values have no flat representation
                _ => return None,
            };
            Some((name.clone(), v))
        })
        .collect()
}

/// The tiled crate resolves gids to `(tileset index, local id)`. We hand out our own
/// consecutive first gids so every tile keeps a unique global id.
fn assign_first_gids(map: &tiled::Map) -> Vec<u32> {
    let mut next = 1u32;
    map.tilesets()
        .iter()
        .map(|ts| {
            let first = next;
            let sliced = ts.image.as_ref().map_or(0, |img| {
                let image = image_to_ir(img);
                slice_tileset(ts.tile_width, ts.tile_height, ts.margin, ts.spacing, &image).len()
            });
            let sliced = u32::try_from(sliced).unwrap_or(u32::MAX);
            // out-of-range ranges are rejected when the gid table is built
            next = next.saturating_add(ts.tilecount.max(sliced).max(1));
            first
        })
        .collect()
}

fn image_to_ir(img: &tiled::Image) -> IrImage {
    IrImage {
        source: img.source.clone(),
        width: img.width.max(0) as u32,
        height: img.height.max(0) as u32,
    }
}

fn encode_gid(
    first_gids: &[u32],
    tileset_index: usize,
    id: u32,
    flip_h: bool,
    flip_v: bool,
    flip_d: bool,
) -> u32 {
    let Some(first) = first_gids.get(tileset_index) else {
        return 0;
    };
    let mut gid = first + id;
    if flip_h {
        gid |= FLIP_H;
    }
    if flip_v {
        gid |= FLIP_V;
    }
    if flip_d {
        gid |= FLIP_D;
    }
    gid
}

fn layer_tile_gid(first_gids: &[u32], t: &tiled::LayerTile<'_>) -> u32 {
    encode_gid(first_gids, t.tileset_index(), t.id(), t.flip_h, t.flip_v, t.flip_d)
}

fn tile_layer_to_ir(
    layer: &TileLayer<'_>,
    first_gids: &[u32],
    tile_size: Vec2,
) -> (IrLayerKind, Vec2) {
    match layer {
        TileLayer::Finite(finite) => {
            let width = finite.width() as usize;
            let height = finite.height() as usize;
            let mut data = vec![0u32; width * height];
            for y in 0..height {
                for x in 0..width {
                    if let Some(t) = finite.get_tile(x as i32, y as i32) {
                        data[y * width + x] = layer_tile_gid(first_gids, &t);
                    }
                }
            }
            (IrLayerKind::Tiles { width, height, data }, Vec2::ZERO)
        }
        TileLayer::Infinite(infinite) => {
            let mut min = (i32::MAX, i32::MAX);
            let mut max = (i32::MIN, i32::MIN);
            for ((cx, cy), _) in infinite.chunks() {
                min = (min.0.min(cx), min.1.min(cy));
                max = (max.0.max(cx), max.1.max(cy));
            }
            if min.0 > max.0 {
                let empty = IrLayerKind::Tiles {
                    width: 0,
                    height: 0,
                    data: Vec::new(),
                };
                return (empty, Vec2::ZERO);
            }

            let width = ((max.0 - min.0 + 1) * CHUNK) as usize;
            let height = ((max.1 - min.1 + 1) * CHUNK) as usize;
            let mut data = vec![0u32; width * height];
            for ((cx, cy), chunk) in infinite.chunks() {
                for y in 0..CHUNK {
                    for x in 0..CHUNK {
                        let Some(t) = chunk.get_tile(x, y) else {
                            continue;
                        };
                        let gx = ((cx - min.0) * CHUNK + x) as usize;
                        let gy = ((cy - min.1) * CHUNK + y) as usize;
                        data[gy * width + gx] = layer_tile_gid(first_gids, &t);
                    }
                }
            }
            // grid starts at the top-left chunk, not at tile (0, 0)
            let origin = vec2(
                (min.0 * CHUNK) as f32 * tile_size.x,
                (min.1 * CHUNK) as f32 * tile_size.y,
            );
            (IrLayerKind::Tiles { width, height, data }, origin)
        }
    }
}

fn object_to_ir(object: &tiled::Object<'_>, first_gids: &[u32]) -> IrObject {
    let (mut width, mut height) = (0.0, 0.0);
    let mut shape = match &object.shape {
        ObjectShape::Rect { width: w, height: h } => {
            (width, height) = (*w, *h);
            IrObjectShape::Rectangle
        }
        ObjectShape::Ellipse { width: w, height: h } => {
            (width, height) = (*w, *h);
            IrObjectShape::Ellipse
        }
        ObjectShape::Text { width: w, height: h, .. } => {
            (width, height) = (*w, *h);
            IrObjectShape::Text
        }
        ObjectShape::Polyline { points } => {
            IrObjectShape::Polyline(points.iter().map(|(x, y)| vec2(*x, *y)).collect())
        }
        ObjectShape::Polygon { points } => {
            IrObjectShape::Polygon(points.iter().map(|(x, y)| vec2(*x, *y)).collect())
        }
        ObjectShape::Point(..) => IrObjectShape::Point,
    };

    if let Some(tile) = object.tile_data() {
        match tile.tileset_location() {
            TilesetLocation::Map(index) => {
                let gid = encode_gid(
                    first_gids,
                    *index,
                    tile.id(),
                    tile.flip_h,
                    tile.flip_v,
                    tile.flip_d,
                );
                shape = IrObjectShape::Tile { gid };
            }
            TilesetLocation::Template(_) => {
                log::warn!(
                    "object {} uses a template-only tileset; drawing it as a rectangle",
                    object.id()
                );
            }
        }
    }

    IrObject {
        id: object.id(),
        name: object.name.clone(),
        class_name: object.user_type.clone(),
        x: object.x,
        y: object.y,
        width,
        height,
        rotation: object.rotation,
        visible: object.visible,
        shape,
        properties: properties_from_tiled(&object.properties),
    }
}

// Group layers are flattened: children inherit visibility, opacity and offset.
fn push_layer(
    layer: tiled::Layer<'_>,
    parent: (bool, f32, Vec2),
    first_gids: &[u32],
    tile_size: Vec2,
    out: &mut Vec<IrLayer>,
) {
    let visible = layer.visible && parent.0;
    let opacity = layer.opacity * parent.1;
    let offset = vec2(layer.offset_x, layer.offset_y) + parent.2;

    let (kind, origin) = match layer.layer_type() {
        LayerType::Tiles(tiles) => tile_layer_to_ir(&tiles, first_gids, tile_size),
        LayerType::Objects(objects) => (
            IrLayerKind::Objects {
                objects: objects.objects().map(|o| object_to_ir(&o, first_gids)).collect(),
            },
            Vec2::ZERO,
        ),
        LayerType::Group(group) => {
            for child in group.layers() {
                push_layer(child, (visible, opacity, offset), first_gids, tile_size, out);
            }
            return;
        }
        LayerType::Image(_) => {
            log::debug!("ignoring image layer '{}'", layer.name);
            (IrLayerKind::Unsupported, Vec2::ZERO)
        }
    };

    out.push(IrLayer {
        name: layer.name.clone(),
        visible,
        opacity,
        tint: layer.tint_color.map(color_from_tiled),
        offset: offset + origin,
        properties: properties_from_tiled(&layer.properties),
        kind,
    });
}

/// Convert an already parsed [`tiled::Map`].
pub fn map_to_ir(map: &tiled::Map) -> IrMap {
    let first_gids = assign_first_gids(map);
    let tile_size = vec2(map.tile_width as f32, map.tile_height as f32);

    let tilesets = map
        .tilesets()
        .iter()
        .zip(&first_gids)
        .map(|(ts, first_gid)| IrTileset {
            name: ts.name.clone(),
            first_gid: *first_gid,
            image: ts.image.as_ref().map(image_to_ir),
            tile_w: ts.tile_width,
            tile_h: ts.tile_height,
            spacing: ts.spacing,
            margin: ts.margin,
            properties: properties_from_tiled(&ts.properties),
        })
        .collect();

    let mut layers = Vec::new();
    for layer in map.layers() {
        push_layer(layer, (true, 1.0, Vec2::ZERO), &first_gids, tile_size, &mut layers);
    }

    IrMap {
        width: map.width,
        height: map.height,
        tile_w: map.tile_width,
        tile_h: map.tile_height,
        properties: properties_from_tiled(&map.properties),
        tilesets,
        layers,
    }
}

/// Parse a TMX file. Tileset and image paths come back resolved by the `tiled` crate.
pub fn decode_map_file_to_ir(path: &Path) -> Result<IrMap, MapError> {
    let mut loader = tiled::Loader::new();
    let map = loader.load_tmx_map(path).map_err(|source| MapError::Tmx {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(map_to_ir(&map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mq_tiled_tmx_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    const MAP_TMX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" tiledversion="1.10.2" orientation="orthogonal" renderorder="right-down" width="3" height="2" tilewidth="16" tileheight="16" infinite="0" nextlayerid="4" nextobjectid="3">
 <properties>
  <property name="music" value="forest.ogg"/>
  <property name="gravity" type="float" value="9.5"/>
 </properties>
 <tileset firstgid="1" name="terrain" tilewidth="16" tileheight="16" spacing="2" margin="1" tilecount="6" columns="3">
  <image source="terrain.png" width="55" height="37"/>
 </tileset>
 <tileset firstgid="7" name="items" tilewidth="16" tileheight="16" tilecount="2" columns="2">
  <image source="items.png" width="32" height="16"/>
 </tileset>
 <layer id="1" name="ground" width="3" height="2" opacity="0.5">
  <properties>
   <property name="solid" type="bool" value="true"/>
  </properties>
  <data encoding="csv">
1,0,7,
0,2147483654,0
</data>
 </layer>
 <objectgroup id="2" name="things">
  <object id="1" name="ring" type="marker" x="4" y="6" width="10" height="20">
   <ellipse/>
  </object>
  <object id="2" name="gem" gid="8" x="32" y="48" width="16" height="16"/>
 </objectgroup>
 <group id="3" name="deco" visible="0">
  <layer id="4" name="inner" width="3" height="2">
   <data encoding="csv">
0,0,0,
0,0,1
</data>
  </layer>
 </group>
</map>
"#;

    #[test]
    fn decodes_tilesets_layers_and_objects() {
        let dir = temp_dir();
        let path = dir.join("level.tmx");
        fs::write(&path, MAP_TMX).expect("failed to write map");

        let ir = decode_map_file_to_ir(&path).expect("decode");
        assert_eq!((ir.width, ir.height, ir.tile_w, ir.tile_h), (3, 2, 16, 16));
        assert_eq!(ir.properties.get_string("music"), Some("forest.ogg"));
        assert_eq!(ir.properties.get_f32("gravity"), Some(9.5));

        assert_eq!(ir.tilesets.len(), 2);
        assert_eq!(ir.tilesets[0].first_gid, 1);
        assert_eq!(ir.tilesets[1].first_gid, 7);
        let image = ir.tilesets[0].image.as_ref().expect("image");
        assert_eq!((image.width, image.height), (55, 37));
        assert_eq!(ir.tilesets[0].margin, 1);
        assert_eq!(ir.tilesets[0].spacing, 2);

        assert_eq!(ir.layers.len(), 3);
        let ground = &ir.layers[0];
        assert_eq!(ground.opacity, 0.5);
        assert_eq!(ground.properties.get_bool("solid"), Some(true));
        let IrLayerKind::Tiles { width, height, data } = &ground.kind else {
            panic!("expected tile layer");
        };
        assert_eq!((*width, *height), (3, 2));
        assert_eq!(data[0], 1);
        assert_eq!(data[1], 0);
        assert_eq!(data[2], 7);
        // 2147483654 is gid 6 with the horizontal flip bit
        assert_eq!(data[4], 6 | FLIP_H);

        let IrLayerKind::Objects { objects } = &ir.layers[1].kind else {
            panic!("expected object layer");
        };
        assert_eq!(objects[0].shape, IrObjectShape::Ellipse);
        assert_eq!(objects[0].class_name, "marker");
        assert_eq!((objects[0].width, objects[0].height), (10.0, 20.0));
        assert_eq!(objects[1].shape, IrObjectShape::Tile { gid: 8 });

        assert_eq!(ir.layers[2].name, "inner");
        assert!(!ir.layers[2].visible);
    }

    #[test]
    fn missing_file_is_a_tmx_error() {
        let dir = temp_dir();
        let err = decode_map_file_to_ir(&dir.join("nope.tmx"))
            .err()
            .expect("expected decode error");
        assert!(matches!(err, MapError::Tmx { .. }));
    }
}
