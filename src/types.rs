use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collider::{ColliderGeometry, ColliderState};

/// User-defined opaque key identifying a collider across steps (e.g., pack your entity id).
pub type ColKey = u64;

/// Frame-local handle for bodies pushed this step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u32);

/// Axis-aligned rectangle in world space. `origin` is the bottom-left corner (y up).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const ZERO: Rect = Rect { origin: Vec2::ZERO, size: Vec2::ZERO };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { origin: Vec2::new(x, y), size: Vec2::new(width, height) }
    }

    /// Rectangle of `size` centered on `center`.
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self { origin: center - size * 0.5, size }
    }

    #[inline] pub fn min_x(&self) -> f32 { self.origin.x }
    #[inline] pub fn min_y(&self) -> f32 { self.origin.y }
    #[inline] pub fn max_x(&self) -> f32 { self.origin.x + self.size.x }
    #[inline] pub fn max_y(&self) -> f32 { self.origin.y + self.size.y }
    #[inline] pub fn width(&self) -> f32 { self.size.x }
    #[inline] pub fn height(&self) -> f32 { self.size.y }

    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    /// Overlapping region with positive area, if any. Rectangles sharing only an edge do not intersect.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let min_x = self.min_x().max(other.min_x());
        let min_y = self.min_y().max(other.min_y());
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());
        if max_x - min_x > 0.0 && max_y - min_y > 0.0 {
            Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
        } else {
            None
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    pub fn translated(&self, by: Vec2) -> Rect {
        Rect { origin: self.origin + by, size: self.size }
    }
}

bitflags! {
    /// Category bits used for contact-test registration. Every bit is user-assignable
    /// except `COLLIDER_TILE`, which stands for the tile map.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CategoryMask: u32 {
        const COLLIDER_TILE = 1 << 31;

        const _ = !0;
    }
}

impl CategoryMask {
    /// Mask with only bit `index` set.
    pub const fn bit(index: u32) -> Self {
        Self::from_bits_retain(1 << index)
    }
}

bitflags! {
    /// Capabilities a body brings into resolution.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BodyRoles: u8 {
        /// Blocked by ground, one-way and slope tiles.
        const HOLDS_TILES = 1 << 0;
        /// Can ride snappables.
        const SNAPPER     = 1 << 1;
        /// Platform-like body others can ride. Never resolved against the environment.
        const SNAPPABLE   = 1 << 2;
        /// Snappable that only blocks from above.
        const ONE_WAY     = 1 << 3;
    }
}

/// Which edge of a collider touches another object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContactSide {
    Top,
    Bottom,
    Left,
    Right,
    Unspecified,
}

impl ContactSide {
    /// Order in which the max-offset filter visits sides.
    pub const ALL: [ContactSide; 5] = [
        ContactSide::Top,
        ContactSide::Bottom,
        ContactSide::Left,
        ContactSide::Right,
        ContactSide::Unspecified,
    ];
}

/// Raw classifier candidate: a side and the signed correction it asks for.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContactSideAndOffset {
    pub side: ContactSide,
    pub offset: f32,
}

impl ContactSideAndOffset {
    pub fn new(side: ContactSide, offset: f32) -> Self {
        Self { side, offset }
    }
}

/// Tuning parameters for the resolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionsConfig {
    /// Largest per-axis displacement of one sub-move before a step is subdivided.
    pub interpolation_max_delta: f32,
    /// Distance from the point where corner-jump support began beyond which it is dropped.
    /// `None` leaves only the hit-point rule in charge.
    pub corner_jump_discard_distance: Option<f32>,
    /// Re-resolution passes allowed per collider per step.
    pub max_resolution_passes: usize,
}

impl Default for CollisionsConfig {
    fn default() -> Self {
        Self {
            interpolation_max_delta: 8.0,
            corner_jump_discard_distance: Some(16.0),
            max_resolution_passes: 16,
        }
    }
}

/// One body taking part in this step.
#[derive(Clone, Debug)]
pub struct BodyDesc {
    pub key: ColKey,
    pub geometry: ColliderGeometry,
    /// Center at the start of the step.
    pub position: Vec2,
    /// Center the caller wants to reach by the end of the step.
    pub proposed: Vec2,
    /// Points the move must pass through before `proposed`, in order.
    pub waypoints: Vec<Vec2>,
    pub category: CategoryMask,
    pub roles: BodyRoles,
    pub enabled: bool,
    /// Input for this step; one-way surfaces let the body through on the next step.
    pub pushes_down: bool,
    /// State handed back from the previous step's outcome.
    pub state: ColliderState,
}

impl BodyDesc {
    pub fn new(key: ColKey, geometry: ColliderGeometry, position: Vec2, proposed: Vec2) -> Self {
        Self {
            key,
            geometry,
            position,
            proposed,
            waypoints: Vec::new(),
            category: CategoryMask::empty(),
            roles: BodyRoles::empty(),
            enabled: true,
            pushes_down: false,
            state: ColliderState::default(),
        }
    }

    pub fn with_roles(mut self, roles: BodyRoles) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_category(mut self, category: CategoryMask) -> Self {
        self.category = category;
        self
    }

    pub fn with_state(mut self, state: ColliderState) -> Self {
        self.state = state;
        self
    }

    pub fn with_waypoints(mut self, waypoints: Vec<Vec2>) -> Self {
        self.waypoints = waypoints;
        self
    }

    pub fn pushing_down(mut self, pushes_down: bool) -> Self {
        self.pushes_down = pushes_down;
        self
    }

    pub fn frame(&self) -> Rect {
        self.geometry.frame_at(self.position)
    }

    pub fn proposed_frame(&self) -> Rect {
        self.geometry.frame_at(self.proposed)
    }
}

/// Result of a step for one body.
#[derive(Clone, Debug)]
pub struct BodyOutcome {
    pub id: FrameId,
    pub key: ColKey,
    /// Authoritative center for the end of the step.
    pub position: Vec2,
    pub state: ColliderState,
    /// Platform this body rides into the next step.
    pub snapped_to: Option<ColKey>,
}
