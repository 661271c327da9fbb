use smallvec::SmallVec;

use crate::api::{ContactCandidates, ContactSidesApi};
use crate::collider::{ColliderGeometry, ColliderMovement};
use crate::types::*;

/// Hit-point based contact side classification.
pub struct ContactSides;

impl ContactSidesApi for ContactSides {
    fn top_contact_sides(
        geometry: &ColliderGeometry,
        movement: &ColliderMovement,
        intersection: &Rect,
        other_frame: &Rect,
    ) -> ContactCandidates {
        let mut out = SmallVec::new();
        let (w, h) = (intersection.width(), intersection.height());
        let current = &movement.current_hit_points.top;
        let proposed = &movement.proposed_hit_points.top;

        if intersection.intersects(&proposed.left) {
            if current.left.max_y() <= other_frame.min_y() {
                out.push(ContactSideAndOffset::new(ContactSide::Top, -h));
            } else if current.left.min_x() >= other_frame.max_x() {
                out.push(ContactSideAndOffset::new(ContactSide::Left, w - geometry.top.left));
            }
        }
        if intersection.intersects(&proposed.right) {
            if current.right.max_y() <= other_frame.min_y() {
                out.push(ContactSideAndOffset::new(ContactSide::Top, -h));
            } else if current.right.max_x() <= other_frame.min_x() {
                out.push(ContactSideAndOffset::new(ContactSide::Right, -(w - geometry.top.right)));
            }
        }
        out
    }

    fn bottom_contact_sides(
        geometry: &ColliderGeometry,
        movement: &ColliderMovement,
        intersection: &Rect,
        other_frame: &Rect,
        was_on_slope: bool,
    ) -> ContactCandidates {
        let mut out = SmallVec::new();
        let (w, h) = (intersection.width(), intersection.height());
        let current = &movement.current_hit_points.bottom;
        let proposed = &movement.proposed_hit_points.bottom;

        if intersection.intersects(&proposed.left) {
            if current.left.min_y() >= other_frame.max_y() || was_on_slope {
                out.push(ContactSideAndOffset::new(ContactSide::Bottom, h));
            } else if current.left.min_x() >= other_frame.max_x() {
                out.push(ContactSideAndOffset::new(ContactSide::Left, w - geometry.bottom.left));
            }
        }
        if intersection.intersects(&proposed.right) {
            if current.right.min_y() >= other_frame.max_y() || was_on_slope {
                out.push(ContactSideAndOffset::new(ContactSide::Bottom, h));
            } else if current.right.max_x() <= other_frame.min_x() {
                out.push(ContactSideAndOffset::new(ContactSide::Right, -(w - geometry.bottom.right)));
            }
        }
        out
    }

    fn left_contact_sides(
        geometry: &ColliderGeometry,
        movement: &ColliderMovement,
        intersection: &Rect,
        other_frame: &Rect,
        contacts_bottom: bool,
    ) -> ContactCandidates {
        let mut out = SmallVec::new();
        let (w, h) = (intersection.width(), intersection.height());
        let current = &movement.current_hit_points.left;
        let proposed = &movement.proposed_hit_points.left;

        if intersection.intersects(&proposed.top) {
            if current.top.min_x() >= other_frame.max_x() {
                out.push(ContactSideAndOffset::new(ContactSide::Left, w));
            } else if current.top.max_y() <= other_frame.min_y() {
                out.push(ContactSideAndOffset::new(ContactSide::Top, -(h - geometry.left.top)));
            }
        }
        if intersection.intersects(&proposed.bottom) {
            if current.bottom.min_x() >= other_frame.max_x()
                || (current.bottom.min_y() >= other_frame.max_y() && !contacts_bottom)
            {
                out.push(ContactSideAndOffset::new(ContactSide::Left, w));
            }
        }
        out
    }

    fn right_contact_sides(
        geometry: &ColliderGeometry,
        movement: &ColliderMovement,
        intersection: &Rect,
        other_frame: &Rect,
        contacts_bottom: bool,
    ) -> ContactCandidates {
        let mut out = SmallVec::new();
        let (w, h) = (intersection.width(), intersection.height());
        let current = &movement.current_hit_points.right;
        let proposed = &movement.proposed_hit_points.right;

        if intersection.intersects(&proposed.top) {
            if current.top.max_x() <= other_frame.min_x() {
                out.push(ContactSideAndOffset::new(ContactSide::Right, -w));
            } else if current.top.max_y() <= other_frame.min_y() {
                out.push(ContactSideAndOffset::new(ContactSide::Top, -(h - geometry.right.top)));
            }
        }
        if intersection.intersects(&proposed.bottom) {
            if current.bottom.max_x() <= other_frame.min_x()
                || (current.bottom.min_y() >= other_frame.max_y() && !contacts_bottom)
            {
                out.push(ContactSideAndOffset::new(ContactSide::Right, -w));
            }
        }
        out
    }

    fn contact_side_with_max_offset(
        side: ContactSide,
        candidates: &[ContactSideAndOffset],
    ) -> Option<ContactSideAndOffset> {
        // First candidate wins ties.
        candidates
            .iter()
            .filter(|c| c.side == side)
            .fold(None, |best: Option<ContactSideAndOffset>, c| match best {
                Some(b) if b.offset.abs() >= c.offset.abs() => Some(b),
                _ => Some(*c),
            })
    }

    fn filtered_contact_sides(candidates: &[ContactSideAndOffset]) -> ContactCandidates {
        ContactSide::ALL
            .iter()
            .filter_map(|side| Self::contact_side_with_max_offset(*side, candidates))
            .collect()
    }

    fn contact_sides(
        geometry: &ColliderGeometry,
        movement: &ColliderMovement,
        intersection: &Rect,
        other_frame: &Rect,
        was_on_slope: bool,
    ) -> ContactCandidates {
        let mut raw: SmallVec<[ContactSideAndOffset; 8]> = SmallVec::new();
        raw.extend(Self::top_contact_sides(geometry, movement, intersection, other_frame));
        raw.extend(Self::bottom_contact_sides(geometry, movement, intersection, other_frame, was_on_slope));
        let contacts_bottom = raw.iter().any(|c| c.side == ContactSide::Bottom);
        raw.extend(Self::left_contact_sides(geometry, movement, intersection, other_frame, contacts_bottom));
        raw.extend(Self::right_contact_sides(geometry, movement, intersection, other_frame, contacts_bottom));
        Self::filtered_contact_sides(&raw)
    }
}

/// Apply classified offsets to `proposed`: vertical sides move y, lateral sides move x.
pub fn apply_offsets(proposed: glam::Vec2, sides: &[ContactSideAndOffset]) -> glam::Vec2 {
    let mut out = proposed;
    for c in sides {
        match c.side {
            ContactSide::Top | ContactSide::Bottom => out.y += c.offset,
            ContactSide::Left | ContactSide::Right => out.x += c.offset,
            ContactSide::Unspecified => {}
        }
    }
    out
}
