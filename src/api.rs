use smallvec::SmallVec;

use crate::collider::{ColliderGeometry, ColliderMovement};
use crate::contact::ContactEvent;
use crate::tilemap::TileMap;
use crate::types::*;

/// Classifier output; rarely more than two entries.
pub type ContactCandidates = SmallVec<[ContactSideAndOffset; 4]>;

/// Public API contract for the step-based collision world.
pub trait CollisionWorldApi {
    /// Construct a new world with the given configuration and optional tile map.
    fn new(cfg: CollisionsConfig, tile_map: Option<TileMap>) -> Self
    where
        Self: Sized;

    // --- Frame lifecycle ---------------------------------------------------

    /// Begin a new step. Clears the bodies and outcomes of the previous step.
    fn begin_frame(&mut self);

    /// Insert a body for this step and return its frame-local handle.
    fn push(&mut self, desc: BodyDesc) -> FrameId;

    /// Resolve every pushed body against the tile map, snappables and each other.
    fn step(&mut self);

    /// Resolved positions and states for this step, in push order.
    fn drain_bodies(&mut self) -> Vec<BodyOutcome>;

    /// Contact events classified against the previous step.
    fn drain_events(&mut self) -> Vec<ContactEvent>;

    // --- Contact-test registration -------------------------------------------

    /// Opt `category` into non-blocking contacts with `other`.
    fn map_contact(&mut self, category: CategoryMask, other: CategoryMask);

    fn unregister_contacts(&mut self, category: CategoryMask);

    /// Forget every registration.
    fn reset_contacts(&mut self);

    fn can_have_contact(&self, a: CategoryMask, b: CategoryMask) -> bool;

    // --- Level -------------------------------------------------------------

    /// Replace the tile map, e.g. on a level transition. Prior contacts are discarded.
    fn set_tile_map(&mut self, tile_map: Option<TileMap>);

    fn tile_map(&self) -> Option<&TileMap>;
}

/// Contact side classifier signatures.
pub trait ContactSidesApi {
    fn top_contact_sides(
        geometry: &ColliderGeometry,
        movement: &ColliderMovement,
        intersection: &Rect,
        other_frame: &Rect,
    ) -> ContactCandidates;

    /// `was_on_slope` forces bottom classification.
    fn bottom_contact_sides(
        geometry: &ColliderGeometry,
        movement: &ColliderMovement,
        intersection: &Rect,
        other_frame: &Rect,
        was_on_slope: bool,
    ) -> ContactCandidates;

    /// `contacts_bottom` tells whether the vertical classifiers already found a bottom contact.
    fn left_contact_sides(
        geometry: &ColliderGeometry,
        movement: &ColliderMovement,
        intersection: &Rect,
        other_frame: &Rect,
        contacts_bottom: bool,
    ) -> ContactCandidates;

    fn right_contact_sides(
        geometry: &ColliderGeometry,
        movement: &ColliderMovement,
        intersection: &Rect,
        other_frame: &Rect,
        contacts_bottom: bool,
    ) -> ContactCandidates;

    fn contact_side_with_max_offset(
        side: ContactSide,
        candidates: &[ContactSideAndOffset],
    ) -> Option<ContactSideAndOffset>;

    /// One candidate per side, the largest correction, earliest on ties.
    fn filtered_contact_sides(candidates: &[ContactSideAndOffset]) -> ContactCandidates;

    /// All four classifiers, combined and filtered.
    fn contact_sides(
        geometry: &ColliderGeometry,
        movement: &ColliderMovement,
        intersection: &Rect,
        other_frame: &Rect,
        was_on_slope: bool,
    ) -> ContactCandidates;
}
