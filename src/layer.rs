use crate::command::{RenderStates, RenderTarget};
use crate::ir_map::{IrLayer, IrLayerKind, Properties};
use crate::render::cull::is_visible;
use crate::tile::Tile;
use crate::tileset::{Gid, TileLookup};
use crate::view::View;
use macroquad::prelude::*;

/// A tile layer turned into positioned sprites.
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    /// Tint; alpha comes from the layer opacity.
    pub color: Color,
    pub visible: bool,
    pub offset: Vec2,
    pub properties: Properties,
    tiles: Vec<Tile>,
}

/// Tiled stores opacity as `0.0..=1.0`.
pub fn opacity_to_alpha(opacity: f32) -> u8 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Layer {
    /// Build from an IR tile layer. Cells with gid 0 or a gid the lookup cannot
    /// resolve produce no tile. Non-tile layers produce an empty layer.
    pub fn new(layer: &IrLayer, tile_size: Vec2, lookup: &TileLookup) -> Self {
        let mut tiles = Vec::new();
        if let IrLayerKind::Tiles { width, data, .. } = &layer.kind {
            let width = (*width).max(1);
            for (idx, raw) in data.iter().enumerate() {
                let gid = Gid(*raw);
                let Some(entry) = lookup.get(gid) else {
                    continue;
                };
                let col = idx % width;
                let row = idx / width;
                let world = vec2(col as f32 * tile_size.x, row as f32 * tile_size.y) + layer.offset;
                tiles.push(Tile::new(gid, world, entry));
            }
        }

        let alpha = opacity_to_alpha(layer.opacity);
        let color = match layer.tint {
            Some(t) => Color::from_rgba(
                (t.r * 255.0) as u8,
                (t.g * 255.0) as u8,
                (t.b * 255.0) as u8,
                ((t.a * alpha as f32).round()) as u8,
            ),
            None => Color::from_rgba(255, 255, 255, alpha),
        };

        log::debug!("layer '{}': {} tiles", layer.name, tiles.len());

        Self {
            name: layer.name.clone(),
            color,
            visible: layer.visible,
            offset: layer.offset,
            properties: layer.properties.clone(),
            tiles,
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tiles overlapping `visible`, in layer order.
    pub fn visible_tiles<'a>(&'a self, visible: &'a Rect) -> impl Iterator<Item = &'a Tile> + 'a {
        self.tiles
            .iter()
            .filter(move |t| is_visible(t.position(), t.size(), visible))
    }

    /// Whether drawing would emit anything at all.
    pub fn is_drawable(&self) -> bool {
        self.visible && self.color.a > 0.0
    }

    /// Draw every tile intersecting the view with the layer color.
    pub fn draw(&self, view: &View, target: &mut dyn RenderTarget, states: &RenderStates) {
        self.draw_in(&view.rect(), target, states);
    }

    pub(crate) fn draw_in(
        &self,
        visible: &Rect,
        target: &mut dyn RenderTarget,
        states: &RenderStates,
    ) {
        if !self.is_drawable() {
            return;
        }
        for tile in self.visible_tiles(visible) {
            tile.draw(self.color, target, states);
        }
    }
}
