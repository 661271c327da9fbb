//! Sub-tile slope surfaces.
//!
//! A slope tile is described by two corner codes: how many sixteenths of the tile
//! are empty above the surface at its left and right edges. Each supported pair maps
//! to a 16x16 bitmap of filled sub-tile points, built once on first use.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::tiled::TiledPoint;

/// Sub-tile samples per tile edge.
pub const SLOPE_RESOLUTION: i32 = 16;

/// Largest corner code.
pub const MAX_SLOPE_HEIGHT: u8 = 15;

/// Every corner pair that has a bitmap.
pub const SUPPORTED_SLOPES: [(u8, u8); 14] = [
    (15, 0),
    (0, 15),
    (15, 12),
    (11, 8),
    (7, 4),
    (3, 0),
    (12, 15),
    (8, 11),
    (4, 7),
    (0, 3),
    (15, 8),
    (7, 0),
    (8, 15),
    (0, 7),
];

static BITMAPS: Lazy<HashMap<(u8, u8), Vec<TiledPoint>>> = Lazy::new(|| {
    SUPPORTED_SLOPES
        .iter()
        .map(|&(left, right)| ((left, right), build_bitmap(left, right)))
        .collect()
});

/// Highest filled sub-tile row in column `x`.
fn surface_height(left: u8, right: u8, x: i32) -> i32 {
    let start = (MAX_SLOPE_HEIGHT - left) as f32;
    let end = (MAX_SLOPE_HEIGHT - right) as f32;
    let last = (SLOPE_RESOLUTION - 1) as f32;
    (start + (end - start) * x as f32 / last).round() as i32
}

fn build_bitmap(left: u8, right: u8) -> Vec<TiledPoint> {
    let mut points = Vec::new();
    for x in 0..SLOPE_RESOLUTION {
        for y in 0..=surface_height(left, right, x) {
            points.push(TiledPoint::new(x, y));
        }
    }
    points
}

pub fn is_supported(left: u8, right: u8) -> bool {
    BITMAPS.contains_key(&(left, right))
}

/// Filled points of the slope, or `None` for an unsupported pair.
pub fn bitmap_for(left: u8, right: u8) -> Option<&'static [TiledPoint]> {
    BITMAPS.get(&(left, right)).map(Vec::as_slice)
}

/// Topmost bitmap point in column `x`.
pub fn slope_point_with_max_y(x: i32, bitmap: &[TiledPoint]) -> Option<TiledPoint> {
    bitmap.iter().filter(|p| p.x == x).max_by_key(|p| p.y).copied()
}

/// Vertical distance, in sub-tile units, from `point` up to the slope surface above it.
/// Negative when the point is already above the surface. `None` for unsupported pairs.
pub fn slope_contact_offset(point: TiledPoint, left: u8, right: u8) -> Option<i32> {
    let bitmap = bitmap_for(left, right)?;
    let column = point.x.clamp(0, SLOPE_RESOLUTION - 1);
    let surface = slope_point_with_max_y(column, bitmap).unwrap_or(TiledPoint::ZERO);
    Some(surface.y - point.y)
}
