use crate::command::{DrawCommand, RenderStates, RenderTarget};
use macroquad::prelude::*;

const LINE_THICKNESS: f32 = 1.0;

/// Draws straight to the current macroquad camera.
pub struct ScreenTarget<'a> {
    textures: &'a [Texture2D],
}

impl<'a> ScreenTarget<'a> {
    pub fn new(textures: &'a [Texture2D]) -> Self {
        Self { textures }
    }
}

impl RenderTarget for ScreenTarget<'_> {
    fn draw(&mut self, command: DrawCommand<'_>, states: &RenderStates) {
        let off = states.offset;
        match command {
            DrawCommand::Sprite {
                texture,
                dest,
                source,
                color,
                flip_x,
                flip_y,
            } => {
                let Some(tex) = self.textures.get(texture.0) else {
                    log::debug!("texture {} not loaded, sprite skipped", texture.0);
                    return;
                };
                draw_texture_ex(
                    tex,
                    dest.x + off.x,
                    dest.y + off.y,
                    states.modulate(color),
                    DrawTextureParams {
                        source: Some(source),
                        flip_x,
                        flip_y,
                        ..Default::default()
                    },
                );
            }
            DrawCommand::Rectangle { rect, color } => {
                draw_rectangle(
                    rect.x + off.x,
                    rect.y + off.y,
                    rect.w,
                    rect.h,
                    states.modulate(color),
                );
            }
            DrawCommand::Circle { center, radius, color } => {
                draw_circle(center.x + off.x, center.y + off.y, radius, states.modulate(color));
            }
            DrawCommand::Polygon { origin, points, color } => {
                // triangle fan; Tiled polygons used for rendering are expected to be convex
                let base = origin + off;
                let color = states.modulate(color);
                if let Some((first, rest)) = points.split_first() {
                    for pair in rest.windows(2) {
                        draw_triangle(base + *first, base + pair[0], base + pair[1], color);
                    }
                }
            }
            DrawCommand::Polyline { origin, points, color } => {
                let base = origin + off;
                let color = states.modulate(color);
                for pair in points.windows(2) {
                    let a = base + pair[0];
                    let b = base + pair[1];
                    draw_line(a.x, a.y, b.x, b.y, LINE_THICKNESS, color);
                }
            }
        }
    }
}
