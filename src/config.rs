use macroquad::prelude::FilterMode;

/// Knobs applied while building and drawing a [`Map`](crate::Map).
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Sampling filter for tileset textures. Pixel art wants `Nearest`.
    pub filter: FilterMode,
    /// Extra world pixels added around the view on every side before culling.
    pub cull_padding: f32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            filter: FilterMode::Nearest,
            cull_padding: 0.0,
        }
    }
}

impl LoadOptions {
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_cull_padding(mut self, padding: f32) -> Self {
        self.cull_padding = padding.max(0.0);
        self
    }
}
