use crate::command::{DrawCommand, RenderStates, RenderTarget};
use crate::ir_map::Properties;
use crate::render::cull::intersects;
use crate::tileset::TextureId;
use crate::view::View;
use macroquad::prelude::*;

/// Which Tiled shape an [`Object`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Rectangle,
    Ellipse,
    Polyline,
    Polygon,
    Graphic,
}

/// Renderable geometry of an object. Points are relative to the object position.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectShape {
    Rectangle { size: Vec2 },
    /// Radius is half the declared width; Tiled's height is not used.
    Ellipse { radius: f32 },
    Polyline { points: Vec<Vec2> },
    Polygon { points: Vec<Vec2> },
    Graphic {
        texture: TextureId,
        source: Rect,
        flip_x: bool,
        flip_y: bool,
    },
}

impl ObjectShape {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectShape::Rectangle { .. } => ObjectKind::Rectangle,
            ObjectShape::Ellipse { .. } => ObjectKind::Ellipse,
            ObjectShape::Polyline { .. } => ObjectKind::Polyline,
            ObjectShape::Polygon { .. } => ObjectKind::Polygon,
            ObjectShape::Graphic { .. } => ObjectKind::Graphic,
        }
    }
}

/// A Tiled object converted for drawing.
#[derive(Debug, Clone)]
pub struct Object {
    pub id: u32,
    pub name: String,
    /// Tiled `class` (formerly `type`).
    pub class_name: String,
    /// Top-left corner. Graphic objects are already moved up by their height.
    pub position: Vec2,
    pub size: Vec2,
    pub rotation: f32,
    pub visible: bool,
    /// Fill color for non-graphic shapes; tint for graphics.
    pub color: Color,
    pub shape: ObjectShape,
    pub properties: Properties,
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        self.shape.kind()
    }

    /// World-space bounding box.
    pub fn bounding_rect(&self) -> Rect {
        let Vec2 { x, y } = self.position;
        match &self.shape {
            ObjectShape::Rectangle { size } => Rect::new(x, y, size.x, size.y),
            ObjectShape::Ellipse { radius } => Rect::new(x, y, radius * 2.0, radius * 2.0),
            ObjectShape::Polyline { points } | ObjectShape::Polygon { points } => {
                points_bounds(self.position, points)
            }
            ObjectShape::Graphic { .. } => Rect::new(x, y, self.size.x, self.size.y),
        }
    }

    /// Draw if visible and overlapping the view.
    pub fn draw(&self, view: &View, target: &mut dyn RenderTarget, states: &RenderStates) {
        self.draw_in(&view.rect(), target, states);
    }

    pub(crate) fn draw_in(
        &self,
        visible: &Rect,
        target: &mut dyn RenderTarget,
        states: &RenderStates,
    ) {
        if !self.visible || !overlaps(&self.bounding_rect(), visible) {
            return;
        }

        let color = self.color;
        let command = match &self.shape {
            ObjectShape::Rectangle { size } => DrawCommand::Rectangle {
                rect: Rect::new(self.position.x, self.position.y, size.x, size.y),
                color,
            },
            ObjectShape::Ellipse { radius } => DrawCommand::Circle {
                center: self.position + vec2(*radius, *radius),
                radius: *radius,
                color,
            },
            ObjectShape::Polyline { points } => DrawCommand::Polyline {
                origin: self.position,
                points,
                color,
            },
            ObjectShape::Polygon { points } => DrawCommand::Polygon {
                origin: self.position,
                points,
                color,
            },
            ObjectShape::Graphic {
                texture,
                source,
                flip_x,
                flip_y,
            } => DrawCommand::Sprite {
                texture: *texture,
                dest: self.position,
                source: *source,
                color,
                flip_x: *flip_x,
                flip_y: *flip_y,
            },
        };
        target.draw(command, states);
    }
}

// zero-area shapes (points, straight lines) still count when inside the view
fn overlaps(bounds: &Rect, visible: &Rect) -> bool {
    if bounds.w == 0.0 || bounds.h == 0.0 {
        let grown = Rect::new(
            bounds.x,
            bounds.y,
            bounds.w.max(f32::EPSILON),
            bounds.h.max(f32::EPSILON),
        );
        return intersects(&grown, visible);
    }
    intersects(bounds, visible)
}

fn points_bounds(origin: Vec2, points: &[Vec2]) -> Rect {
    if points.is_empty() {
        return Rect::new(origin.x, origin.y, 0.0, 0.0);
    }
    let (min, max) = points.iter().fold(
        (vec2(f32::MAX, f32::MAX), vec2(f32::MIN, f32::MIN)),
        |(lo, hi), p| (lo.min(*p), hi.max(*p)),
    );
    Rect::new(origin.x + min.x, origin.y + min.y, max.x - min.x, max.y - min.y)
}
