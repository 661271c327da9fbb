use thiserror::Error;

/// Errors raised while building collision data. Resolution itself never fails.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CollisionError {
    /// Tile grid lines (columns, or rows for top-down input) differ in length.
    #[error("tile grid is not rectangular: line {index} has {found} tiles, expected {expected}")]
    JaggedTileGrid { index: usize, expected: usize, found: usize },

    #[error("tile size must be positive, got {width}x{height}")]
    InvalidTileSize { width: f32, height: f32 },

    #[error("slope corner height {height} is out of range (0..=15)")]
    SlopeHeightOutOfRange { height: u8 },

    /// Hit-point insets leave no room for both probes on a side.
    #[error("hit point insets on the {side} side do not fit inside the collider")]
    InvalidInsets { side: &'static str },

    #[error("unknown tile name {0:?}")]
    UnknownTileName(String),
}
