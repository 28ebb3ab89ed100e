use crate::view::View;
use macroquad::prelude::*;

/// Strict AABB overlap; rectangles that only touch along an edge do not intersect.
#[inline]
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
}

/// The view's rectangle grown by `padding` on every side.
pub fn cull_rect(view: &View, padding: f32) -> Rect {
    let r = view.rect();
    Rect::new(
        r.x - padding,
        r.y - padding,
        r.w + padding * 2.0,
        r.h + padding * 2.0,
    )
}

/// Does an item at `pos` with `size` show up inside `visible`?
#[inline]
pub fn is_visible(pos: Vec2, size: Vec2, visible: &Rect) -> bool {
    intersects(&Rect::new(pos.x, pos.y, size.x, size.y), visible)
}
