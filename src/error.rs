use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while loading or drawing a [`Map`](crate::Map).
#[derive(Debug, Error)]
pub enum MapError {
    /// A map, tileset or image file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// A Tiled JSON document did not parse.
    #[error("failed to parse JSON {path}: {source}")]
    Json {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// The `tiled` crate rejected a TMX/TSX document.
    #[error("failed to parse TMX {path}: {source}")]
    Tmx {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: tiled::Error,
    },
    /// A tileset image could not be turned into a texture.
    #[error("failed to load texture {path}: {source}")]
    Texture {
        /// Image that failed.
        path: PathBuf,
        /// Underlying error.
        source: macroquad::Error,
    },
    /// File extension is neither TMX nor JSON.
    #[error("unsupported map format: {0}")]
    UnsupportedFormat(String),
    /// Structurally invalid document.
    #[error("invalid map: {0}")]
    InvalidMap(String),
    /// A tile object references a gid no tileset covers.
    #[error("object {object_id} in layer '{layer}' references unknown gid {gid}")]
    InvalidObjectGid {
        /// Object group name.
        layer: String,
        /// Tiled object id.
        object_id: u32,
        /// Offending gid (flip bits cleared).
        gid: u32,
    },
    /// A JSON property declares a type we do not understand.
    #[error("property '{name}' has unsupported type '{kind}'")]
    UnsupportedPropertyType {
        /// Property name.
        name: String,
        /// Declared type.
        kind: String,
    },
    /// No layer carries the requested name.
    #[error("layer not found: '{0}'")]
    LayerNotFound(String),
    /// Layer index past the end of the layer list.
    #[error("layer index {index} out of range (map has {len} layers)")]
    LayerIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of layers.
        len: usize,
    },
}
