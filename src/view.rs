use macroquad::prelude::*;

/// Visible region used for culling: a center point and a size, both in world pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub center: Vec2,
    pub size: Vec2,
}

impl View {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// View whose top-left corner is at `min`.
    pub fn from_rect(min: Vec2, size: Vec2) -> Self {
        Self {
            center: min + size / 2.0,
            size,
        }
    }

    /// World region a [`Camera2D`] shows in a viewport of `viewport` pixels.
    pub fn from_camera(cam: &Camera2D, viewport: Vec2) -> Self {
        let (viewport_width, viewport_height) = match cam.viewport {
            Some((_, _, w, h)) => (w as f32, h as f32),
            None => (viewport.x, viewport.y),
        };

        // camera zoom maps world units to clip space (-1..1)
        let size = vec2(2.0 / cam.zoom.x.abs(), 2.0 / cam.zoom.y.abs());
        let size = if size.is_finite() {
            size
        } else {
            vec2(viewport_width, viewport_height)
        };
        Self {
            center: cam.target,
            size,
        }
    }

    /// The centered rectangle `[center - size/2, center + size/2]`.
    pub fn rect(&self) -> Rect {
        let half = self.size / 2.0;
        Rect::new(
            self.center.x - half.x,
            self.center.y - half.y,
            self.size.x,
            self.size.y,
        )
    }
}
