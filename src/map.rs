use crate::command::{RenderStates, RenderTarget};
use crate::config::LoadOptions;
use crate::error::MapError;
use crate::ir_map::*;
use crate::layer::{opacity_to_alpha, Layer};
use crate::loader::{json_loader, tmx_loader};
use crate::object::{Object, ObjectShape};
use crate::render::cull::cull_rect;
use crate::render::target::ScreenTarget;
use crate::tileset::{Gid, TileLookup, TilesetImage};
use crate::view::View;
use macroquad::prelude::*;
use std::path::Path;

// Tiled's default object color
const DEFAULT_OBJECT_COLOR: Color = Color::new(0.627, 0.627, 0.643, 1.0);

/// A loaded Tiled map: tile layers, objects and the shared tileset textures.
pub struct Map {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    pub tile_w: u32,
    pub tile_h: u32,
    pub properties: Properties,
    layers: Vec<Layer>,
    objects: Vec<Object>,
    lookup: TileLookup,
    images: Vec<TilesetImage>,
    textures: Vec<Texture2D>,
    view: View,
    options: LoadOptions,
}

/// Pick a loader from the file extension and decode to IR. Image paths in the
/// result are already resolved against the map or tileset file.
pub fn decode_map_file(path: &Path) -> Result<IrMap, MapError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tmx") => tmx_loader::decode_map_file_to_ir(path),
        Some("json") | Some("tmj") => json_loader::decode_map_file_to_ir(path),
        _ => Err(MapError::UnsupportedFormat(path.display().to_string())),
    }
}

impl Map {
    /// Decode the map at `path`, build layers and objects, then load every tileset
    /// image once.
    pub async fn load(
        path: impl AsRef<Path>,
        view: View,
        options: LoadOptions,
    ) -> Result<Self, MapError> {
        let mut map = Self::parse(path, view, options)?;
        map.load_textures().await?;
        Ok(map)
    }

    /// Same as [`Map::load`] without touching the GPU. Sprites drawn to a
    /// [`ScreenTarget`] are skipped until [`Map::load_textures`] runs.
    pub fn parse(
        path: impl AsRef<Path>,
        view: View,
        options: LoadOptions,
    ) -> Result<Self, MapError> {
        let path = path.as_ref();
        log::info!("loading map {}", path.display());
        let ir = decode_map_file(path)?;
        Self::from_ir(ir, view, options)
    }

    /// Build from an already decoded document.
    pub fn from_ir(ir: IrMap, view: View, options: LoadOptions) -> Result<Self, MapError> {
        let (lookup, images) = TileLookup::build(&ir.tilesets)?;
        let tile_size = vec2(ir.tile_w as f32, ir.tile_h as f32);

        let objects = convert_objects(&ir.layers, &lookup)?;

        let layers: Vec<Layer> = ir
            .layers
            .iter()
            .filter(|l| matches!(l.kind, IrLayerKind::Tiles { .. }))
            .map(|l| Layer::new(l, tile_size, &lookup))
            .collect();

        log::info!(
            "map {}x{}: {} tile layers, {} objects, {} gids",
            ir.width,
            ir.height,
            layers.len(),
            objects.len(),
            lookup.len()
        );

        Ok(Self {
            width: ir.width,
            height: ir.height,
            tile_w: ir.tile_w,
            tile_h: ir.tile_h,
            properties: ir.properties,
            layers,
            objects,
            lookup,
            images,
            textures: Vec::new(),
            view,
            options,
        })
    }

    /// Load one texture per tileset image, in [`TextureId`](crate::TextureId) order.
    pub async fn load_textures(&mut self) -> Result<(), MapError> {
        let mut textures = Vec::with_capacity(self.images.len());
        for img in &self.images {
            let path = &img.image.source;
            let path_str = path.to_str().ok_or_else(|| {
                MapError::InvalidMap(format!("non UTF-8 image path {}", path.display()))
            })?;
            let tex = load_texture(path_str).await.map_err(|source| MapError::Texture {
                path: path.clone(),
                source,
            })?;
            tex.set_filter(self.options.filter);
            log::debug!("tileset '{}' texture {}", img.tileset, path.display());
            textures.push(tex);
        }
        self.textures = textures;
        Ok(())
    }

    /// `(0, 0, width * tile_w, height * tile_h)` in pixels.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.width as f32 * self.tile_w as f32,
            self.height as f32 * self.tile_h as f32,
        )
    }

    pub fn tile_size(&self) -> Vec2 {
        vec2(self.tile_w as f32, self.tile_h as f32)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// First layer with this name.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn objects_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Object> + 'a {
        self.objects.iter().filter(move |o| o.name == name)
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn lookup(&self) -> &TileLookup {
        &self.lookup
    }

    pub fn textures(&self) -> &[Texture2D] {
        &self.textures
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    fn visible_rect(&self) -> Rect {
        cull_rect(&self.view, self.options.cull_padding)
    }

    /// Draw all layers in declaration order.
    pub fn draw(&self, target: &mut dyn RenderTarget, states: &RenderStates) {
        let visible = self.visible_rect();
        for layer in &self.layers {
            layer.draw_in(&visible, target, states);
        }
    }

    /// Draw the first layer called `name`.
    pub fn draw_layer_named(
        &self,
        name: &str,
        target: &mut dyn RenderTarget,
        states: &RenderStates,
    ) -> Result<(), MapError> {
        let layer = self
            .layer(name)
            .ok_or_else(|| MapError::LayerNotFound(name.to_owned()))?;
        layer.draw_in(&self.visible_rect(), target, states);
        Ok(())
    }

    /// Draw the layer at `index`.
    pub fn draw_layer_at(
        &self,
        index: usize,
        target: &mut dyn RenderTarget,
        states: &RenderStates,
    ) -> Result<(), MapError> {
        let layer = self.layers.get(index).ok_or(MapError::LayerIndexOutOfRange {
            index,
            len: self.layers.len(),
        })?;
        layer.draw_in(&self.visible_rect(), target, states);
        Ok(())
    }

    /// Draw every object overlapping the view.
    pub fn draw_objects(&self, target: &mut dyn RenderTarget, states: &RenderStates) {
        let visible = self.visible_rect();
        for object in &self.objects {
            object.draw_in(&visible, target, states);
        }
    }

    /// Layers then objects, straight to the screen.
    pub fn draw_screen(&self, states: &RenderStates) {
        let mut target = ScreenTarget::new(&self.textures);
        self.draw(&mut target, states);
        self.draw_objects(&mut target, states);
    }
}

fn convert_objects(layers: &[IrLayer], lookup: &TileLookup) -> Result<Vec<Object>, MapError> {
    let mut out = Vec::new();
    for layer in layers {
        let IrLayerKind::Objects { objects } = &layer.kind else {
            continue;
        };
        let alpha = opacity_to_alpha(layer.opacity) as f32 / 255.0;
        for o in objects {
            out.push(convert_object(o, layer, alpha, lookup)?);
        }
    }
    Ok(out)
}

fn convert_object(
    o: &IrObject,
    layer: &IrLayer,
    alpha: f32,
    lookup: &TileLookup,
) -> Result<Object, MapError> {
    let mut position = vec2(o.x, o.y) + layer.offset;
    let size = vec2(o.width, o.height);

    let (shape, base) = match &o.shape {
        IrObjectShape::Rectangle | IrObjectShape::Text => {
            (ObjectShape::Rectangle { size }, DEFAULT_OBJECT_COLOR)
        }
        IrObjectShape::Point => (
            ObjectShape::Rectangle { size: Vec2::ZERO },
            DEFAULT_OBJECT_COLOR,
        ),
        // height is ignored: ellipses are drawn as circles of half the width
        IrObjectShape::Ellipse => (
            ObjectShape::Ellipse {
                radius: o.width / 2.0,
            },
            DEFAULT_OBJECT_COLOR,
        ),
        IrObjectShape::Polyline(points) => (
            ObjectShape::Polyline { points: points.clone() },
            DEFAULT_OBJECT_COLOR,
        ),
        IrObjectShape::Polygon(points) => (
            ObjectShape::Polygon { points: points.clone() },
            DEFAULT_OBJECT_COLOR,
        ),
        IrObjectShape::Tile { gid } => {
            let gid = Gid(*gid);
            let entry = lookup.get(gid).ok_or_else(|| MapError::InvalidObjectGid {
                layer: layer.name.clone(),
                object_id: o.id,
                gid: gid.clean(),
            })?;
            // Tiled anchors tile objects at their bottom-left corner
            position.y -= o.height;
            (
                ObjectShape::Graphic {
                    texture: entry.texture,
                    source: entry.source,
                    flip_x: gid.flip_h(),
                    flip_y: gid.flip_v(),
                },
                WHITE,
            )
        }
    };

    let base = layer.tint.unwrap_or(base);
    Ok(Object {
        id: o.id,
        name: o.name.clone(),
        class_name: o.class_name.clone(),
        position,
        size,
        rotation: o.rotation,
        visible: o.visible && layer.visible,
        color: Color::new(base.r, base.g, base.b, base.a * alpha),
        shape,
        properties: o.properties.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DrawCommand;
    use crate::object::ObjectKind;
    use crate::tileset::{TextureId, FLIP_H, FLIP_V, GID_MASK};
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        sprites: Vec<(TextureId, Vec2, Rect)>,
        flips: Vec<(bool, bool)>,
        shapes: usize,
    }

    impl RenderTarget for Recorder {
        fn draw(&mut self, command: DrawCommand<'_>, _states: &RenderStates) {
            match command {
                DrawCommand::Sprite {
                    texture,
                    dest,
                    source,
                    flip_x,
                    flip_y,
                    ..
                } => {
                    self.sprites.push((texture, dest, source));
                    self.flips.push((flip_x, flip_y));
                }
                _ => self.shapes += 1,
            }
        }
    }

    fn tileset() -> IrTileset {
        IrTileset {
            name: "ts".into(),
            first_gid: 1,
            image: Some(IrImage {
                source: PathBuf::from("ts.png"),
                width: 32,
                height: 32,
            }),
            tile_w: 16,
            tile_h: 16,
            spacing: 0,
            margin: 0,
            properties: Properties::new(),
        }
    }

    fn tile_layer(name: &str, data: Vec<u32>) -> IrLayer {
        IrLayer {
            name: name.into(),
            visible: true,
            opacity: 1.0,
            tint: None,
            offset: Vec2::ZERO,
            properties: Properties::new(),
            kind: IrLayerKind::Tiles { width: 2, height: data.len() / 2, data },
        }
    }

    fn object(id: u32, shape: IrObjectShape) -> IrObject {
        IrObject {
            id,
            name: format!("obj{id}"),
            class_name: String::new(),
            x: 32.0,
            y: 48.0,
            width: 20.0,
            height: 8.0,
            rotation: 0.0,
            visible: true,
            shape,
            properties: Properties::new(),
        }
    }

    fn object_layer(objects: Vec<IrObject>) -> IrLayer {
        IrLayer {
            name: "objects".into(),
            visible: true,
            opacity: 1.0,
            tint: None,
            offset: Vec2::ZERO,
            properties: Properties::new(),
            kind: IrLayerKind::Objects { objects },
        }
    }

    fn ir(layers: Vec<IrLayer>) -> IrMap {
        IrMap {
            width: 10,
            height: 8,
            tile_w: 16,
            tile_h: 16,
            properties: Properties::new(),
            tilesets: vec![tileset()],
            layers,
        }
    }

    fn view() -> View {
        View::new(vec2(100.0, 100.0), vec2(200.0, 200.0))
    }

    #[test]
    fn bounds_cover_the_whole_grid() {
        let map = Map::from_ir(ir(vec![]), view(), LoadOptions::default()).unwrap();
        assert_eq!(map.bounds(), Rect::new(0.0, 0.0, 160.0, 128.0));
    }

    #[test]
    fn no_object_groups_means_no_objects() {
        let layers = vec![tile_layer("a", vec![1, 2])];
        let map = Map::from_ir(ir(layers), view(), LoadOptions::default()).unwrap();
        assert!(map.objects().is_empty());
        assert_eq!(map.layers().len(), 1);
    }

    #[test]
    fn converts_every_object_kind() {
        let layers = vec![object_layer(vec![
            object(1, IrObjectShape::Rectangle),
            object(2, IrObjectShape::Ellipse),
            object(3, IrObjectShape::Polyline(vec![Vec2::ZERO, vec2(4.0, 0.0)])),
            object(4, IrObjectShape::Polygon(vec![Vec2::ZERO, vec2(4.0, 0.0), vec2(0.0, 4.0)])),
            object(5, IrObjectShape::Tile { gid: 4 }),
        ])];
        let map = Map::from_ir(ir(layers), view(), LoadOptions::default()).unwrap();
        let kinds: Vec<_> = map.objects().iter().map(|o| o.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ObjectKind::Rectangle,
                ObjectKind::Ellipse,
                ObjectKind::Polyline,
                ObjectKind::Polygon,
                ObjectKind::Graphic
            ]
        );
    }

    #[test]
    fn ellipse_radius_is_half_the_width() {
        let map = Map::from_ir(
            ir(vec![object_layer(vec![object(1, IrObjectShape::Ellipse)])]),
            view(),
            LoadOptions::default(),
        )
        .unwrap();
        // 20 wide, 8 tall
        assert_eq!(map.objects()[0].shape, ObjectShape::Ellipse { radius: 10.0 });
    }

    #[test]
    fn graphic_objects_move_up_by_their_height() {
        let map = Map::from_ir(
            ir(vec![object_layer(vec![object(1, IrObjectShape::Tile { gid: 4 })])]),
            view(),
            LoadOptions::default(),
        )
        .unwrap();
        let o = &map.objects()[0];
        assert_eq!(o.position, vec2(32.0, 40.0));
        assert_eq!(
            o.shape,
            ObjectShape::Graphic {
                texture: TextureId(0),
                source: Rect::new(16.0, 16.0, 16.0, 16.0),
                flip_x: false,
                flip_y: false,
            }
        );
    }

    #[test]
    fn graphic_objects_keep_their_flips() {
        let layers = vec![object_layer(vec![
            object(1, IrObjectShape::Tile { gid: 4 | FLIP_H }),
            object(2, IrObjectShape::Tile { gid: 4 | FLIP_V }),
        ])];
        let map = Map::from_ir(ir(layers), view(), LoadOptions::default()).unwrap();

        let mut out = Recorder::default();
        map.draw_objects(&mut out, &RenderStates::default());
        assert_eq!(out.flips, vec![(true, false), (false, true)]);
        assert_eq!(out.sprites[0].2, Rect::new(16.0, 16.0, 16.0, 16.0));
    }

    #[test]
    fn bounds_do_not_overflow_for_huge_maps() {
        let mut doc = ir(vec![]);
        doc.width = 100_000;
        doc.tile_w = 100_000;
        let map = Map::from_ir(doc, view(), LoadOptions::default()).unwrap();
        assert_eq!(map.bounds().w, 1.0e10);
    }

    #[test]
    fn first_gid_outside_gid_space_is_rejected() {
        let mut doc = ir(vec![]);
        doc.tilesets[0].first_gid = GID_MASK + 1;
        let err = Map::from_ir(doc, view(), LoadOptions::default())
            .err()
            .expect("expected error");
        assert!(matches!(err, MapError::InvalidMap(_)));
    }

    #[test]
    fn unknown_object_gid_is_an_error() {
        let err = Map::from_ir(
            ir(vec![object_layer(vec![object(9, IrObjectShape::Tile { gid: 99 })])]),
            view(),
            LoadOptions::default(),
        )
        .err()
        .expect("expected error");
        assert!(matches!(err, MapError::InvalidObjectGid { object_id: 9, gid: 99, .. }));
    }

    #[test]
    fn draw_by_name_and_index() {
        let map = Map::from_ir(
            ir(vec![tile_layer("bg", vec![1, 0]), tile_layer("fg", vec![0, 2, 3, 4])]),
            view(),
            LoadOptions::default(),
        )
        .unwrap();

        let mut all = Recorder::default();
        map.draw(&mut all, &RenderStates::default());
        assert_eq!(all.sprites.len(), 4);

        let mut fg = Recorder::default();
        map.draw_layer_named("fg", &mut fg, &RenderStates::default()).unwrap();
        assert_eq!(fg.sprites.len(), 3);

        let mut bg = Recorder::default();
        map.draw_layer_at(0, &mut bg, &RenderStates::default()).unwrap();
        assert_eq!(bg.sprites, vec![(TextureId(0), Vec2::ZERO, Rect::new(0.0, 0.0, 16.0, 16.0))]);

        assert!(matches!(
            map.draw_layer_named("missing", &mut bg, &RenderStates::default()),
            Err(MapError::LayerNotFound(name)) if name == "missing"
        ));
        assert!(matches!(
            map.draw_layer_at(2, &mut bg, &RenderStates::default()),
            Err(MapError::LayerIndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn moving_the_view_changes_what_is_drawn() {
        let layers = vec![tile_layer("bg", vec![1, 1])];
        let mut map = Map::from_ir(ir(layers), view(), LoadOptions::default()).unwrap();

        map.set_view(View::new(vec2(1000.0, 1000.0), vec2(100.0, 100.0)));
        let mut out = Recorder::default();
        map.draw(&mut out, &RenderStates::default());
        assert!(out.sprites.is_empty());

        map.view_mut().center = vec2(16.0, 8.0);
        map.draw(&mut out, &RenderStates::default());
        assert_eq!(out.sprites.len(), 2);
    }

    #[test]
    fn objects_are_culled_and_drawn_separately() {
        let mut far = object(2, IrObjectShape::Rectangle);
        far.x = 900.0;
        let map = Map::from_ir(
            ir(vec![object_layer(vec![object(1, IrObjectShape::Rectangle), far])]),
            view(),
            LoadOptions::default(),
        )
        .unwrap();

        let mut out = Recorder::default();
        map.draw(&mut out, &RenderStates::default());
        assert_eq!(out.shapes, 0);
        map.draw_objects(&mut out, &RenderStates::default());
        assert_eq!(out.shapes, 1);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = Map::parse("level.txt", view(), LoadOptions::default())
            .err()
            .expect("expected error");
        assert!(matches!(err, MapError::UnsupportedFormat(p) if p == "level.txt"));
    }
}
