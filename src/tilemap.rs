//! Immutable collision snapshot of a level's tile grid.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CollisionError;
use crate::slope::MAX_SLOPE_HEIGHT;
use crate::tiled::{TiledPoint, TiledRange};
use crate::types::Rect;

/// Collision behavior of one occupied cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileDescriptor {
    Ground,
    /// Blocks only from above.
    OneWay,
    /// Corner codes are sixteenths of the tile left empty above the surface.
    Slope { left: u8, right: u8 },
}

/// How many tiles a slope needs to climb one tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlopeInclination {
    Steep,
    Medium,
    Gentle,
}

impl TileDescriptor {
    pub fn slope_values(&self) -> Option<(u8, u8)> {
        match *self {
            TileDescriptor::Slope { left, right } => Some((left, right)),
            _ => None,
        }
    }

    pub fn slope_inclination(&self) -> Option<SlopeInclination> {
        let (left, right) = self.slope_values()?;
        match left.abs_diff(right) {
            15 => Some(SlopeInclination::Steep),
            7 => Some(SlopeInclination::Medium),
            3 => Some(SlopeInclination::Gentle),
            _ => None,
        }
    }
}

impl FromStr for TileDescriptor {
    type Err = CollisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ground" => return Ok(TileDescriptor::Ground),
            "one_way" => return Ok(TileDescriptor::OneWay),
            _ => {}
        }
        let unknown = || CollisionError::UnknownTileName(s.to_string());
        let rest = s.strip_prefix("slope_").ok_or_else(unknown)?;
        let (l, r) = rest.split_once('_').ok_or_else(unknown)?;
        let left: u8 = l.parse().map_err(|_| unknown())?;
        let right: u8 = r.parse().map_err(|_| unknown())?;
        for height in [left, right] {
            if height > MAX_SLOPE_HEIGHT {
                return Err(CollisionError::SlopeHeightOutOfRange { height });
            }
        }
        Ok(TileDescriptor::Slope { left, right })
    }
}

impl fmt::Display for TileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileDescriptor::Ground => f.write_str("ground"),
            TileDescriptor::OneWay => f.write_str("one_way"),
            TileDescriptor::Slope { left, right } => write!(f, "slope_{left}_{right}"),
        }
    }
}

/// Maximal sequence of slope tiles forming one ramp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlopeRun {
    pub tile_positions: Vec<TiledPoint>,
    pub leftmost: TiledPoint,
    pub rightmost: TiledPoint,
    /// Descends left to right.
    pub is_inverse: bool,
}

impl SlopeRun {
    fn start(point: TiledPoint, is_inverse: bool) -> Self {
        Self { tile_positions: vec![point], leftmost: point, rightmost: point, is_inverse }
    }

    fn extend(&mut self, point: TiledPoint) {
        self.tile_positions.push(point);
        self.rightmost = point;
    }

    /// Number of tiles in the run.
    pub fn inclination(&self) -> usize {
        self.tile_positions.len()
    }

    pub fn contains(&self, point: TiledPoint) -> bool {
        self.tile_positions.contains(&point)
    }
}

/// Occupied or empty tile overlapping a collider frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TileIntersection {
    pub point: TiledPoint,
    pub tile: Option<TileDescriptor>,
    pub tile_frame: Rect,
    pub intersection: Rect,
}

/// Tile grid plus the collections derived from it at build time. Indexed `[column][row]`,
/// row 0 at the bottom.
#[derive(Clone, Debug)]
pub struct TileMap {
    tile_size: Vec2,
    columns: Vec<Vec<Option<TileDescriptor>>>,
    rows: usize,
    slope_runs: Vec<SlopeRun>,
    slope_index: HashMap<TiledPoint, usize>,
    corner_jumps: HashSet<TiledPoint>,
    column_gaps: Vec<Vec<(usize, usize)>>,
}

impl TileMap {
    /// Build from column-major data (`columns[x][y]`, `y = 0` at the bottom).
    pub fn new(
        columns: Vec<Vec<Option<TileDescriptor>>>,
        tile_size: Vec2,
    ) -> Result<Self, CollisionError> {
        if !(tile_size.x > 0.0 && tile_size.y > 0.0) {
            return Err(CollisionError::InvalidTileSize { width: tile_size.x, height: tile_size.y });
        }
        let rows = columns.first().map_or(0, Vec::len);
        for (index, column) in columns.iter().enumerate() {
            if column.len() != rows {
                return Err(CollisionError::JaggedTileGrid { index, expected: rows, found: column.len() });
            }
            for tile in column.iter().flatten() {
                if let Some((left, right)) = tile.slope_values() {
                    let height = left.max(right);
                    if height > MAX_SLOPE_HEIGHT {
                        return Err(CollisionError::SlopeHeightOutOfRange { height });
                    }
                }
            }
        }

        let mut map = Self {
            tile_size,
            columns,
            rows,
            slope_runs: Vec::new(),
            slope_index: HashMap::new(),
            corner_jumps: HashSet::new(),
            column_gaps: Vec::new(),
        };
        map.slope_runs = map.find_slope_runs();
        for (id, run) in map.slope_runs.iter().enumerate() {
            for p in &run.tile_positions {
                map.slope_index.insert(*p, id);
            }
        }
        map.corner_jumps = map.find_corner_jumps();
        map.column_gaps = map.find_column_gaps();

        debug!(
            columns = map.columns.len(),
            rows = map.rows,
            slope_runs = map.slope_runs.len(),
            corner_jumps = map.corner_jumps.len(),
            "built collision tile map"
        );
        Ok(map)
    }

    /// Build from row-major data with the first row at the top, as map editors export it.
    pub fn from_rows_top_down(
        rows: Vec<Vec<Option<TileDescriptor>>>,
        tile_size: Vec2,
    ) -> Result<Self, CollisionError> {
        let width = rows.first().map_or(0, Vec::len);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(CollisionError::JaggedTileGrid { index, expected: width, found: row.len() });
            }
        }
        let columns = (0..width)
            .map(|c| rows.iter().rev().map(|row| row[c]).collect())
            .collect();
        Self::new(columns, tile_size)
    }

    pub fn tile_size(&self) -> Vec2 { self.tile_size }
    pub fn column_count(&self) -> usize { self.columns.len() }
    pub fn row_count(&self) -> usize { self.rows }

    /// World size covered by the grid.
    pub fn map_size(&self) -> Vec2 {
        Vec2::new(self.columns.len() as f32 * self.tile_size.x, self.rows as f32 * self.tile_size.y)
    }

    /// Descriptor at `point`; `None` for empty or out-of-bounds cells.
    pub fn tile_at(&self, point: TiledPoint) -> Option<TileDescriptor> {
        let (c, r) = point.indices()?;
        *self.columns.get(c)?.get(r)?
    }

    fn is_empty_at(&self, c: usize, r: usize) -> bool {
        self.columns[c][r].is_none()
    }

    pub fn slope_runs(&self) -> &[SlopeRun] {
        &self.slope_runs
    }

    pub fn slope_run(&self, id: usize) -> Option<&SlopeRun> {
        self.slope_runs.get(id)
    }

    /// Run containing the slope tile at `point`, with its id.
    pub fn slope_run_at(&self, point: TiledPoint) -> Option<(usize, &SlopeRun)> {
        let id = *self.slope_index.get(&point)?;
        Some((id, &self.slope_runs[id]))
    }

    pub fn corner_jumps(&self) -> &HashSet<TiledPoint> {
        &self.corner_jumps
    }

    pub fn is_corner_jump(&self, point: TiledPoint) -> bool {
        self.corner_jumps.contains(&point)
    }

    /// Inclusive `(start_row, end_row)` runs of empty cells in `column`, bottom first.
    pub fn gaps_in_column(&self, column: usize) -> &[(usize, usize)] {
        self.column_gaps.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    fn find_slope_runs(&self) -> Vec<SlopeRun> {
        let mut runs = Vec::new();
        let mut current: Option<SlopeRun> = None;
        for (c, column) in self.columns.iter().enumerate() {
            for (r, tile) in column.iter().enumerate() {
                let Some((left, right)) = tile.as_ref().and_then(TileDescriptor::slope_values) else { continue };
                let point = TiledPoint::new(c as i32, r as i32);
                let direction = if left < right { -1 } else { 1 };
                let starts_run = (direction == 1 && left == MAX_SLOPE_HEIGHT) || (direction == -1 && left == 0);
                if starts_run {
                    if let Some(run) = current.take() {
                        runs.push(run);
                    }
                    current = Some(SlopeRun::start(point, direction == -1));
                } else {
                    match current.as_mut() {
                        Some(run) => run.extend(point),
                        None => current = Some(SlopeRun::start(point, direction == -1)),
                    }
                }
            }
        }
        if let Some(run) = current {
            runs.push(run);
        }
        runs
    }

    fn find_corner_jumps(&self) -> HashSet<TiledPoint> {
        let mut out = HashSet::new();
        let cols = self.columns.len();
        for c in 0..cols {
            for r in 0..self.rows {
                if !matches!(self.columns[c][r], Some(TileDescriptor::Ground | TileDescriptor::OneWay)) {
                    continue;
                }
                if r + 1 >= self.rows || !self.is_empty_at(c, r + 1) {
                    continue;
                }
                if c > 0 && self.is_empty_at(c - 1, r) {
                    out.insert(TiledPoint::new(c as i32 - 1, r as i32));
                }
                if c + 1 < cols && self.is_empty_at(c + 1, r) {
                    out.insert(TiledPoint::new(c as i32 + 1, r as i32));
                }
            }
        }
        out
    }

    fn find_column_gaps(&self) -> Vec<Vec<(usize, usize)>> {
        self.columns
            .iter()
            .map(|column| {
                let mut gaps = Vec::new();
                let mut start: Option<usize> = None;
                for (r, tile) in column.iter().enumerate() {
                    match (tile, start) {
                        (None, None) => start = Some(r),
                        (Some(_), Some(s)) => {
                            gaps.push((s, r - 1));
                            start = None;
                        }
                        _ => {}
                    }
                }
                if let Some(s) = start {
                    gaps.push((s, column.len() - 1));
                }
                gaps
            })
            .collect()
    }

    /// Tiles around `frame`, grown by one tile on each side and clamped to the map.
    /// `None` for a map without tiles.
    pub fn tile_range_around_frame(&self, frame: &Rect) -> Option<TiledRange> {
        let cols = self.columns.len();
        if cols == 0 || self.rows == 0 {
            return None;
        }
        let clamp = |v: i32, n: usize| v.clamp(0, n as i32 - 1) as usize;
        let cell = |v: f32, size: f32| (v / size).floor() as i32;
        let (tw, th) = (self.tile_size.x, self.tile_size.y);
        Some(TiledRange {
            left: clamp(cell(frame.min_x(), tw).saturating_sub(1), cols),
            right: clamp(cell(frame.max_x(), tw).saturating_add(1), cols),
            bottom: clamp(cell(frame.min_y(), th).saturating_sub(1), self.rows),
            top: clamp(cell(frame.max_y(), th).saturating_add(1), self.rows),
        })
    }

    /// Tiles with a positive-area overlap, nearest tile center to `from` first.
    pub fn tile_intersections(&self, frame: &Rect, from: Vec2) -> Vec<TileIntersection> {
        let Some(range) = self.tile_range_around_frame(frame) else { return Vec::new() };
        let mut out: Vec<TileIntersection> = range
            .points()
            .filter_map(|point| {
                let tile_frame = point.tile_frame(self.tile_size);
                let intersection = tile_frame.intersection(frame)?;
                Some(TileIntersection { point, tile: self.tile_at(point), tile_frame, intersection })
            })
            .collect();
        out.sort_by(|a, b| {
            let da = from.distance(a.tile_frame.center());
            let db = from.distance(b.tile_frame.center());
            da.total_cmp(&db)
        });
        out
    }

    /// True when the empty tile belongs to a gap that starts below the collider frame.
    pub fn does_contact_gap(&self, tile: TiledPoint, frame: &Rect) -> bool {
        let Some((column, row)) = tile.indices() else { return false };
        self.gaps_in_column(column)
            .iter()
            .filter(|(start, end)| row >= *start && row <= *end)
            .any(|(start, _)| {
                let gap_start = TiledPoint::new(tile.x, *start as i32).tile_frame(self.tile_size);
                gap_start.min_y() < frame.min_y()
            })
    }
}
