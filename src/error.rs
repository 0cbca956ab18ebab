use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for the level loader.
#[derive(Debug, Error)]
pub enum MapError {
    /// Reading a map or tileset file failed.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The document is not valid Tiled JSON.
    #[error("JSON parse error in {path}: {source}")]
    Json {
        /// File (or `<inline>`) that failed to parse.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The map itself is unusable (wrong file format, bad reference).
    #[error("invalid map: {0}")]
    InvalidMap(String),

    /// A custom property declares a type the loader can't represent.
    #[error("unsupported type '{kind}' for property '{name}'")]
    UnsupportedPropertyType {
        /// Property name.
        name: String,
        /// Declared Tiled type.
        kind: String,
    },

    /// A tileset is missing a required field or carries an impossible value.
    #[error("malformed tileset: {0}")]
    MalformedTileset(String),

    /// A collision polygon is degenerate, concave or self-intersecting.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// An object references a gid that no tileset defines.
    #[error("object {object_id} in layer '{layer}' references unknown tile gid {gid}")]
    UnresolvedReference {
        /// Layer holding the object.
        layer: String,
        /// Tiled object id (cell index for tile layers).
        object_id: u32,
        /// Masked global tile id.
        gid: u32,
    },

    /// A collision object kind with no body conversion (polyline, point, text).
    #[error("unsupported collision shape '{kind}'")]
    UnsupportedShape {
        /// Tiled object kind.
        kind: String,
    },
}
