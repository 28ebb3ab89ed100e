//! Tiled map loader and renderer for Macroquad.
//!
//! Maps are decoded from TMX (via the `tiled` crate) or Tiled JSON into a small
//! format-agnostic IR, then turned into drawable [`Layer`]s and [`Object`]s that
//! share one texture per tileset image. Drawing goes through [`RenderTarget`], so
//! everything except the final GPU submission can run headless.
//!
//! ```no_run
//! use macroquad::prelude::*;
//! use macroquad_tiled_map::{LoadOptions, Map, RenderStates, View};
//!
//! # async fn run() -> Result<(), macroquad_tiled_map::MapError> {
//! let view = View::new(vec2(320.0, 240.0), vec2(640.0, 480.0));
//! let map = Map::load("assets/level.tmx", view, LoadOptions::default()).await?;
//! map.draw_screen(&RenderStates::default());
//! # Ok(())
//! # }
//! ```

mod command;
mod config;
mod error;
mod ir_map;
mod layer;
pub mod loader {
    //! Format specific decoders producing [`IrMap`](crate::IrMap).
    pub mod json_loader;
    pub mod tmx_loader;
}
mod map;
mod object;
pub mod render {
    //! Culling helpers and the on-screen draw target.
    pub mod cull;
    pub mod target;
}
mod tile;
mod tileset;
mod view;

pub use command::{DrawCommand, RenderStates, RenderTarget};
pub use config::LoadOptions;
pub use error::MapError;
pub use ir_map::{
    IrImage, IrLayer, IrLayerKind, IrMap, IrObject, IrObjectShape, IrTileset, Properties,
    PropertyValue,
};
pub use layer::{opacity_to_alpha, Layer};
pub use map::{decode_map_file, Map};
pub use object::{Object, ObjectKind, ObjectShape};
pub use render::target::ScreenTarget;
pub use tile::Tile;
pub use tileset::{
    slice_tileset, Gid, TextureId, TileEntry, TileLookup, TilesetImage, FLIP_D, FLIP_H, FLIP_V,
    GID_MASK,
};
pub use view::View;
