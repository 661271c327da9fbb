//! Integer grid coordinates and their world-space equivalents.

use std::fmt;
use std::ops::{Add, Sub};

use glam::Vec2;

use crate::types::Rect;

/// Column (`x`) and row (`y`) of a tile. Row 0 is the bottom of the map.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TiledPoint {
    pub x: i32,
    pub y: i32,
}

impl TiledPoint {
    pub const ZERO: TiledPoint = TiledPoint { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing the world point.
    pub fn from_world(point: Vec2, tile_size: Vec2) -> Self {
        Self {
            x: (point.x / tile_size.x).floor() as i32,
            y: (point.y / tile_size.y).floor() as i32,
        }
    }

    /// World position of the tile's bottom-left corner.
    pub fn to_world(self, tile_size: Vec2) -> Vec2 {
        Vec2::new(self.x as f32 * tile_size.x, self.y as f32 * tile_size.y)
    }

    pub fn tile_frame(self, tile_size: Vec2) -> Rect {
        Rect { origin: self.to_world(tile_size), size: tile_size }
    }

    /// Indices for array access. `None` for negative coordinates.
    pub fn indices(self) -> Option<(usize, usize)> {
        Some((usize::try_from(self.x).ok()?, usize::try_from(self.y).ok()?))
    }
}

impl Add for TiledPoint {
    type Output = TiledPoint;
    fn add(self, rhs: TiledPoint) -> TiledPoint {
        TiledPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for TiledPoint {
    type Output = TiledPoint;
    fn sub(self, rhs: TiledPoint) -> TiledPoint {
        TiledPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for TiledPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TiledSize {
    pub width: i32,
    pub height: i32,
}

impl TiledSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn to_world(self, tile_size: Vec2) -> Vec2 {
        Vec2::new(self.width as f32 * tile_size.x, self.height as f32 * tile_size.y)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TiledRect {
    pub origin: TiledPoint,
    pub size: TiledSize,
}

impl TiledRect {
    pub const fn new(origin: TiledPoint, size: TiledSize) -> Self {
        Self { origin, size }
    }

    pub fn to_world(self, tile_size: Vec2) -> Rect {
        Rect { origin: self.origin.to_world(tile_size), size: self.size.to_world(tile_size) }
    }

    pub fn contains(&self, point: TiledPoint) -> bool {
        point.x >= self.origin.x
            && point.x < self.origin.x + self.size.width
            && point.y >= self.origin.y
            && point.y < self.origin.y + self.size.height
    }
}

/// Inclusive block of tile indices, already clamped to the map.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TiledRange {
    pub left: usize,
    pub right: usize,
    pub bottom: usize,
    pub top: usize,
}

impl TiledRange {
    /// Column-major walk: every row of the leftmost column first.
    pub fn points(self) -> impl Iterator<Item = TiledPoint> {
        (self.left..=self.right).flat_map(move |column| {
            (self.bottom..=self.top).map(move |row| TiledPoint::new(column as i32, row as i32))
        })
    }

    pub fn contains(&self, point: TiledPoint) -> bool {
        match point.indices() {
            Some((c, r)) => c >= self.left && c <= self.right && r >= self.bottom && r <= self.top,
            None => false,
        }
    }
}
