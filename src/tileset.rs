use crate::error::MapError;
use crate::ir_map::{IrImage, IrTileset};
use macroquad::prelude::*;
use std::collections::HashMap;

pub const FLIP_H: u32 = 0x8000_0000; // bit 31
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits (bit 28 is free)

/// Global tile id as stored in layer data, flip bits included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gid(pub u32);

impl Gid {
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn clean(self) -> u32 {
        self.0 & GID_MASK
    }

    #[inline]
    pub fn flip_h(self) -> bool {
        (self.0 & FLIP_H) != 0
    }

    #[inline]
    pub fn flip_v(self) -> bool {
        (self.0 & FLIP_V) != 0
    }

    #[inline]
    pub fn flip_d(self) -> bool {
        (self.0 & FLIP_D) != 0
    }
}

/// Index into a map's texture arena. One per tileset image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// Where a gid lives: a source rectangle inside one shared texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileEntry {
    pub source: Rect,
    pub texture: TextureId,
}

/// Image backing a [`TextureId`]; the arena is loaded from these in order.
#[derive(Debug, Clone)]
pub struct TilesetImage {
    pub tileset: String,
    pub image: IrImage,
}

/// Gid → [`TileEntry`] table built once per map.
#[derive(Debug, Clone, Default)]
pub struct TileLookup {
    entries: HashMap<u32, TileEntry>,
}

impl TileLookup {
    /// Slice every tileset image into tile rectangles and assign consecutive gids
    /// starting at each tileset's `first_gid`.
    ///
    /// Tilesets without an image are skipped; their gids stay unresolved. A tileset
    /// whose gid range leaves the 29 bit gid space is rejected.
    pub fn build(tilesets: &[IrTileset]) -> Result<(Self, Vec<TilesetImage>), MapError> {
        let mut lookup = TileLookup::default();
        let mut images = Vec::new();

        for ts in tilesets {
            if ts.first_gid == 0 || ts.first_gid > GID_MASK {
                return Err(MapError::InvalidMap(format!(
                    "tileset '{}' has first gid {} outside 1..={GID_MASK}",
                    ts.name, ts.first_gid
                )));
            }
            let Some(image) = &ts.image else {
                log::warn!(
                    "tileset '{}' has no single image; its tiles will not be drawn",
                    ts.name
                );
                continue;
            };

            let texture = TextureId(images.len());
            images.push(TilesetImage {
                tileset: ts.name.clone(),
                image: image.clone(),
            });

            let rects = slice_tileset(ts.tile_w, ts.tile_h, ts.margin, ts.spacing, image);
            log::debug!(
                "tileset '{}': {} tiles from gid {}",
                ts.name,
                rects.len(),
                ts.first_gid
            );
            for (i, source) in rects.into_iter().enumerate() {
                let gid = u32::try_from(i)
                    .ok()
                    .and_then(|i| ts.first_gid.checked_add(i))
                    .filter(|gid| *gid <= GID_MASK)
                    .ok_or_else(|| {
                        MapError::InvalidMap(format!(
                            "tileset '{}' runs past the largest gid {GID_MASK}",
                            ts.name
                        ))
                    })?;
                lookup.insert(gid, TileEntry { source, texture });
            }
        }

        Ok((lookup, images))
    }

    fn insert(&mut self, gid: u32, entry: TileEntry) {
        if self.entries.contains_key(&gid) {
            log::warn!("gid {gid} claimed by two tilesets; keeping the first");
            return;
        }
        self.entries.insert(gid, entry);
    }

    /// Resolve a gid; flip bits are ignored. Gid 0 never resolves.
    #[inline]
    pub fn get(&self, gid: Gid) -> Option<&TileEntry> {
        self.entries.get(&gid.clean())
    }

    /// Number of resolvable gids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Row-major tile rectangles of one atlas. A row or column is only emitted while the
/// whole tile fits inside the image, matching Tiled's own column count.
pub fn slice_tileset(
    tile_w: u32,
    tile_h: u32,
    margin: u32,
    spacing: u32,
    image: &IrImage,
) -> Vec<Rect> {
    let mut out = Vec::new();
    if tile_w == 0 || tile_h == 0 {
        return out;
    }

    let step_x = tile_w + spacing;
    let step_y = tile_h + spacing;

    let mut y = margin;
    while y + tile_h <= image.height {
        let mut x = margin;
        while x + tile_w <= image.width {
            out.push(Rect::new(x as f32, y as f32, tile_w as f32, tile_h as f32));
            x += step_x;
        }
        y += step_y;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir_map::Properties;
    use std::path::PathBuf;

    fn atlas(
        name: &str,
        first_gid: u32,
        w: u32,
        h: u32,
        margin: u32,
        spacing: u32,
    ) -> IrTileset {
        IrTileset {
            name: name.into(),
            first_gid,
            image: Some(IrImage {
                source: PathBuf::from(format!("{name}.png")),
                width: w,
                height: h,
            }),
            tile_w: 16,
            tile_h: 16,
            spacing,
            margin,
            properties: Properties::new(),
        }
    }

    #[test]
    fn slices_row_major_from_margin() {
        // 3 columns x 2 rows with margin 1 and spacing 2
        let ts = atlas("terrain", 1, 55, 37, 1, 2);
        let (lookup, images) = TileLookup::build(&[ts]).unwrap();

        assert_eq!(images.len(), 1);
        assert_eq!(lookup.len(), 6);
        let source = |gid| lookup.get(Gid(gid)).unwrap().source;
        assert_eq!(source(1), Rect::new(1.0, 1.0, 16.0, 16.0));
        assert_eq!(source(2), Rect::new(19.0, 1.0, 16.0, 16.0));
        assert_eq!(source(3), Rect::new(37.0, 1.0, 16.0, 16.0));
        assert_eq!(source(4), Rect::new(1.0, 19.0, 16.0, 16.0));
        assert_eq!(source(6), Rect::new(37.0, 19.0, 16.0, 16.0));
        assert!(lookup.get(Gid(7)).is_none());
    }

    #[test]
    fn partial_tiles_at_the_edge_are_not_emitted() {
        let ts = atlas("odd", 1, 40, 20, 0, 0);
        let rects = slice_tileset(16, 16, 0, 0, ts.image.as_ref().unwrap());
        assert_eq!(rects.len(), 2);
    }

    #[test]
    fn gids_are_global_across_tilesets() {
        let a = atlas("a", 1, 32, 32, 0, 0); // gids 1..=4
        let b = atlas("b", 5, 16, 16, 0, 0); // gid 5
        let (lookup, images) = TileLookup::build(&[a, b]).unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(lookup.len(), 5);
        assert_eq!(lookup.get(Gid(4)).unwrap().texture, TextureId(0));
        assert_eq!(lookup.get(Gid(5)).unwrap().texture, TextureId(1));
        assert_eq!(lookup.get(Gid(5)).unwrap().source, Rect::new(0.0, 0.0, 16.0, 16.0));
    }

    #[test]
    fn gid_zero_and_flip_bits() {
        let (lookup, _) = TileLookup::build(&[atlas("a", 1, 16, 16, 0, 0)]).unwrap();
        assert!(lookup.get(Gid(0)).is_none());
        assert!(lookup.get(Gid(1 | FLIP_H | FLIP_V)).is_some());
        assert!(Gid(1 | FLIP_H).flip_h());
        assert!(!Gid(1 | FLIP_H).flip_v());
    }

    #[test]
    fn tileset_without_image_is_skipped() {
        let mut ts = atlas("collection", 1, 16, 16, 0, 0);
        ts.image = None;
        let (lookup, images) = TileLookup::build(&[ts]).unwrap();
        assert!(lookup.is_empty());
        assert!(images.is_empty());
    }

    #[test]
    fn large_first_gid_stays_sparse() {
        // 2^28 is a legal gid; the table must not grow to cover everything below it
        let (lookup, _) = TileLookup::build(&[atlas("far", 1 << 28, 32, 16, 0, 0)]).unwrap();
        assert_eq!(lookup.len(), 2);
        assert!(lookup.get(Gid(1 << 28)).is_some());
        assert!(lookup.get(Gid((1 << 28) + 1)).is_some());
        assert!(lookup.get(Gid(1)).is_none());
    }

    #[test]
    fn gid_range_outside_gid_space_is_rejected() {
        for first_gid in [0, GID_MASK + 1, u32::MAX] {
            let err = TileLookup::build(&[atlas("bad", first_gid, 16, 16, 0, 0)]);
            assert!(matches!(err, Err(MapError::InvalidMap(_))), "first gid {first_gid}");
        }

        // starts inside the gid space but its second tile does not fit
        let err = TileLookup::build(&[atlas("edge", GID_MASK, 32, 16, 0, 0)]);
        assert!(matches!(err, Err(MapError::InvalidMap(_))));
    }
}
