use crate::command::{DrawCommand, RenderStates, RenderTarget};
use crate::tileset::{Gid, TextureId, TileEntry};
use macroquad::prelude::*;

/// One placed cell of a tile layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    position: Vec2,
    source: Rect,
    texture: TextureId,
    flip_x: bool,
    flip_y: bool,
}

impl Tile {
    pub(crate) fn new(gid: Gid, position: Vec2, entry: &TileEntry) -> Self {
        Self {
            position,
            source: entry.source,
            texture: entry.texture,
            flip_x: gid.flip_h(),
            flip_y: gid.flip_v(),
        }
    }

    /// Top-left corner in world pixels.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Rectangle inside the tileset texture.
    pub fn source(&self) -> Rect {
        self.source
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// Size in pixels, taken from the source rectangle.
    pub fn size(&self) -> Vec2 {
        vec2(self.source.w, self.source.h)
    }

    pub fn draw(&self, color: Color, target: &mut dyn RenderTarget, states: &RenderStates) {
        target.draw(
            DrawCommand::Sprite {
                texture: self.texture,
                dest: self.position,
                source: self.source,
                color,
                flip_x: self.flip_x,
                flip_y: self.flip_y,
            },
            states,
        );
    }
}
