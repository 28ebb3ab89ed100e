use crate::tileset::TextureId;
use macroquad::prelude::*;

/// One drawing primitive emitted by a tile, layer or object.
///
/// Positions are in world pixels; the target applies [`RenderStates::offset`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand<'a> {
    /// Part of a shared texture.
    Sprite {
        texture: TextureId,
        dest: Vec2,
        source: Rect,
        color: Color,
        flip_x: bool,
        flip_y: bool,
    },
    /// Filled axis-aligned rectangle.
    Rectangle { rect: Rect, color: Color },
    /// Filled circle.
    Circle { center: Vec2, radius: f32, color: Color },
    /// Filled polygon; `points` are relative to `origin`.
    Polygon { origin: Vec2, points: &'a [Vec2], color: Color },
    /// Open line strip; `points` are relative to `origin`.
    Polyline { origin: Vec2, points: &'a [Vec2], color: Color },
}

/// Per-call state applied on top of every command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStates {
    /// World-space translation.
    pub offset: Vec2,
    /// Multiplied into every command's color.
    pub tint: Color,
}

impl Default for RenderStates {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            tint: WHITE,
        }
    }
}

impl RenderStates {
    /// Translate by `offset`, keeping the tint.
    pub fn translated(self, offset: Vec2) -> Self {
        Self {
            offset: self.offset + offset,
            ..self
        }
    }

    /// Apply the tint to a command color.
    #[inline]
    pub fn modulate(&self, c: Color) -> Color {
        Color::new(
            c.r * self.tint.r,
            c.g * self.tint.g,
            c.b * self.tint.b,
            c.a * self.tint.a,
        )
    }
}

/// Anything that accepts [`DrawCommand`]s.
pub trait RenderTarget {
    fn draw(&mut self, command: DrawCommand<'_>, states: &RenderStates);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_states_are_identity() {
        let states = RenderStates::default();
        assert_eq!(states.modulate(RED), RED);
        assert_eq!(states.offset, Vec2::ZERO);
    }

    #[test]
    fn translated_accumulates_offsets() {
        let states = RenderStates::default()
            .translated(vec2(4.0, 2.0))
            .translated(vec2(1.0, 1.0));
        assert_eq!(states.offset, vec2(5.0, 3.0));
    }
}
