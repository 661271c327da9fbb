//! Collider geometry, hit points and the per-collider state double buffer.

use bitflags::bitflags;
use glam::Vec2;

use crate::error::CollisionError;
use crate::types::{ContactSide, Rect};

/// Inset pair for a horizontal edge (top or bottom), measured inward from its ends.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HorizontalInsets {
    pub left: f32,
    pub right: f32,
}

/// Inset pair for a vertical edge (left or right).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct VerticalInsets {
    pub bottom: f32,
    pub top: f32,
}

/// Size, center offset and hit-point insets of a rectangular collider.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColliderGeometry {
    pub size: Vec2,
    pub offset: Vec2,
    pub left: VerticalInsets,
    pub right: VerticalInsets,
    pub top: HorizontalInsets,
    pub bottom: HorizontalInsets,
}

impl ColliderGeometry {
    /// Collider with no offset and zero insets.
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            offset: Vec2::ZERO,
            left: VerticalInsets::default(),
            right: VerticalInsets::default(),
            top: HorizontalInsets::default(),
            bottom: HorizontalInsets::default(),
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Same inset on both probes of every side.
    pub fn with_uniform_insets(mut self, inset: f32) -> Self {
        self.left = VerticalInsets { bottom: inset, top: inset };
        self.right = self.left;
        self.top = HorizontalInsets { left: inset, right: inset };
        self.bottom = self.top;
        self
    }

    pub fn with_insets(
        mut self,
        left: VerticalInsets,
        right: VerticalInsets,
        top: HorizontalInsets,
        bottom: HorizontalInsets,
    ) -> Self {
        self.left = left;
        self.right = right;
        self.top = top;
        self.bottom = bottom;
        self
    }

    /// Both 1x1 probes of each side must fit on that side without crossing.
    pub fn validate(&self) -> Result<(), CollisionError> {
        let (w, h) = (self.size.x, self.size.y);
        if self.top.left + self.top.right + 2.0 > w {
            return Err(CollisionError::InvalidInsets { side: "top" });
        }
        if self.bottom.left + self.bottom.right + 2.0 > w {
            return Err(CollisionError::InvalidInsets { side: "bottom" });
        }
        if self.left.bottom + self.left.top + 2.0 > h {
            return Err(CollisionError::InvalidInsets { side: "left" });
        }
        if self.right.bottom + self.right.top + 2.0 > h {
            return Err(CollisionError::InvalidInsets { side: "right" });
        }
        Ok(())
    }

    /// World frame for a collider centered at `position`.
    pub fn frame_at(&self, position: Vec2) -> Rect {
        Rect { origin: position - self.size * 0.5 + self.offset, size: self.size }
    }

    pub fn hit_points_at(&self, position: Vec2) -> HitPoints {
        let f = self.frame_at(position);
        let px = |x: f32, y: f32| Rect::new(x, y, 1.0, 1.0);
        HitPoints {
            left: VerticalProbes {
                bottom: px(f.min_x(), f.min_y() + self.left.bottom),
                top: px(f.min_x(), f.max_y() - self.left.top - 1.0),
            },
            right: VerticalProbes {
                bottom: px(f.max_x() - 1.0, f.min_y() + self.right.bottom),
                top: px(f.max_x() - 1.0, f.max_y() - self.right.top - 1.0),
            },
            top: HorizontalProbes {
                left: px(f.min_x() + self.top.left, f.max_y() - 1.0),
                right: px(f.max_x() - self.top.right - 1.0, f.max_y() - 1.0),
            },
            bottom: HorizontalProbes {
                left: px(f.min_x() + self.bottom.left, f.min_y()),
                right: px(f.max_x() - self.bottom.right - 1.0, f.min_y()),
            },
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VerticalProbes {
    pub bottom: Rect,
    pub top: Rect,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HorizontalProbes {
    pub left: Rect,
    pub right: Rect,
}

/// The eight 1x1 probe rectangles on a collider's edges.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitPoints {
    pub left: VerticalProbes,
    pub right: VerticalProbes,
    pub top: HorizontalProbes,
    pub bottom: HorizontalProbes,
}

bitflags! {
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ColliderFlags: u16 {
        const ON_GROUND           = 1 << 0;
        const AT_CEILING          = 1 << 1;
        const PUSHES_LEFT_WALL    = 1 << 2;
        const PUSHES_RIGHT_WALL   = 1 << 3;
        const ON_SLOPE            = 1 << 4;
        const ON_CORNER_JUMP      = 1 << 5;
        const ON_GAP              = 1 << 6;
        const PUSHES_DOWN         = 1 << 7;
        const OUTSIDE_MAP_BOUNDS  = 1 << 8;
        const KILLED_BY_COLLISION = 1 << 9;
        const SNAPPING            = 1 << 10;
    }
}

/// Flags for this step (`current`) and the one before (`previous`). Owned by the caller,
/// handed back to the world every step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColliderState {
    pub current: ColliderFlags,
    pub previous: ColliderFlags,
    /// Corner-jump support was refused this step.
    pub discards_corner_jump: bool,
    /// Id of the slope run ridden this step.
    pub slope_run: Option<usize>,
    pub previous_slope_run: Option<usize>,
    /// Where corner-jump support began.
    pub corner_jump_anchor: Option<Vec2>,
}

impl ColliderState {
    /// Swap the buffers at the start of a step.
    pub fn advance(&mut self) {
        self.previous = self.current;
        self.current = ColliderFlags::empty();
        self.discards_corner_jump = false;
        self.previous_slope_run = self.slope_run.take();
    }

    #[inline] pub fn is(&self, flag: ColliderFlags) -> bool { self.current.contains(flag) }
    #[inline] pub fn was(&self, flag: ColliderFlags) -> bool { self.previous.contains(flag) }

    pub fn set(&mut self, flag: ColliderFlags, on: bool) {
        self.current.set(flag, on);
    }

    pub fn is_on_ground(&self) -> bool { self.is(ColliderFlags::ON_GROUND) }
    pub fn was_on_ground(&self) -> bool { self.was(ColliderFlags::ON_GROUND) }
    pub fn on_slope(&self) -> bool { self.is(ColliderFlags::ON_SLOPE) }
    pub fn was_on_slope(&self) -> bool { self.was(ColliderFlags::ON_SLOPE) }
    pub fn on_gap(&self) -> bool { self.is(ColliderFlags::ON_GAP) }
    pub fn on_corner_jump(&self) -> bool { self.is(ColliderFlags::ON_CORNER_JUMP) }
    pub fn was_on_corner_jump(&self) -> bool { self.was(ColliderFlags::ON_CORNER_JUMP) }
    pub fn did_push_down(&self) -> bool { self.was(ColliderFlags::PUSHES_DOWN) }
    pub fn is_outside_map_bounds(&self) -> bool { self.is(ColliderFlags::OUTSIDE_MAP_BOUNDS) }
    pub fn is_snapping(&self) -> bool { self.is(ColliderFlags::SNAPPING) }
    pub fn was_snapping(&self) -> bool { self.was(ColliderFlags::SNAPPING) }

    pub fn apply_contact_sides(&mut self, sides: &[ContactSide]) {
        for side in sides {
            match side {
                ContactSide::Top => self.set(ColliderFlags::AT_CEILING, true),
                ContactSide::Bottom => self.set(ColliderFlags::ON_GROUND, true),
                ContactSide::Left => self.set(ColliderFlags::PUSHES_LEFT_WALL, true),
                ContactSide::Right => self.set(ColliderFlags::PUSHES_RIGHT_WALL, true),
                ContactSide::Unspecified => {}
            }
        }
    }

    /// Squeezed between floor and ceiling, or between two walls.
    pub fn should_be_killed_by_collision(&self) -> bool {
        let crushed_vertically = self.is(ColliderFlags::AT_CEILING) && self.is(ColliderFlags::ON_GROUND);
        let crushed_horizontally =
            self.is(ColliderFlags::PUSHES_LEFT_WALL) && self.is(ColliderFlags::PUSHES_RIGHT_WALL);
        crushed_vertically || crushed_horizontally
    }
}

/// One sub-move under test: where the collider is and where it wants to be.
#[derive(Copy, Clone, Debug)]
pub struct ColliderMovement {
    pub current_position: Vec2,
    pub proposed_position: Vec2,
    pub proposed_frame: Rect,
    pub current_hit_points: HitPoints,
    pub proposed_hit_points: HitPoints,
}

impl ColliderMovement {
    pub fn new(geometry: &ColliderGeometry, current_position: Vec2, proposed_position: Vec2) -> Self {
        Self {
            current_position,
            proposed_position,
            proposed_frame: geometry.frame_at(proposed_position),
            current_hit_points: geometry.hit_points_at(current_position),
            proposed_hit_points: geometry.hit_points_at(proposed_position),
        }
    }
}
