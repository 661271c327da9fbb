//! Collider against other colliders: riding snappables and contact tests between bodies.

use glam::Vec2;

use crate::api::ContactSidesApi;
use crate::collider::{ColliderGeometry, ColliderMovement};
use crate::contact::{ContactContext, ContactPolicy, ContactedObject, SideList};
use crate::ground::begin_corner_jump;
use crate::narrowphase::ContactSides;
use crate::types::*;
use crate::world::CollisionWorld;

/// Per-step copy of a snappable, taken before any body is resolved.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SnappableBody {
    pub key: ColKey,
    pub geometry: ColliderGeometry,
    pub position: Vec2,
    pub proposed: Vec2,
    pub enabled: bool,
    pub one_way: bool,
    pub was_on_slope: bool,
}

impl SnappableBody {
    pub fn from_body(body: &BodyDesc) -> Self {
        Self {
            key: body.key,
            geometry: body.geometry,
            position: body.position,
            proposed: body.proposed,
            enabled: body.enabled,
            one_way: body.roles.contains(BodyRoles::ONE_WAY),
            was_on_slope: body.state.was_on_slope(),
        }
    }

    fn frame(&self) -> Rect {
        self.geometry.frame_at(self.position)
    }

    fn proposed_frame(&self) -> Rect {
        self.geometry.frame_at(self.proposed)
    }
}

/// Sides `geometry` shows toward `other_frame` while moving from `position` to `proposed`.
fn side_list(
    geometry: &ColliderGeometry,
    position: Vec2,
    proposed: Vec2,
    intersection: &Rect,
    other_frame: &Rect,
    was_on_slope: bool,
) -> SideList {
    let movement = ColliderMovement::new(geometry, position, proposed);
    ContactSides::contact_sides(geometry, &movement, intersection, other_frame, was_on_slope)
        .iter()
        .map(|c| c.side)
        .collect()
}

impl CollisionWorld {
    /// First blocking snappable for this sub-move; touches go to `non_collisions`.
    /// Without a collision, snappable edges may still grant corner-jump support.
    pub(crate) fn snappable_contact(
        &self,
        body: &mut BodyDesc,
        movement: &ColliderMovement,
        snappables: &[SnappableBody],
        contacts: &[ContactContext],
        non_collisions: &mut Vec<ContactContext>,
    ) -> Option<ContactContext> {
        let key = body.key;
        for snappable in snappables.iter().filter(|s| s.key != key) {
            let contacted = contacts
                .iter()
                .any(|c| c.collider == key && c.other == ContactedObject::Collider(snappable.key));
            if contacted {
                continue;
            }
            match self.contact_with_snappable(body, movement, snappable) {
                Some(c) if c.is_collision => return Some(c),
                Some(c) => non_collisions.push(c),
                None => {}
            }
        }
        for snappable in snappables.iter().filter(|s| s.key != key) {
            self.snappable_corner_jump(body, movement, snappable);
        }
        None
    }

    fn contact_with_snappable(
        &self,
        body: &BodyDesc,
        movement: &ColliderMovement,
        snappable: &SnappableBody,
    ) -> Option<ContactContext> {
        let intersection = movement.proposed_frame.intersection(&snappable.proposed_frame())?;
        let other_frame = snappable.frame();
        let between = |policy: ContactPolicy| {
            ContactContext::between(
                body.key,
                &body.geometry,
                body.state.was_on_slope(),
                movement,
                intersection,
                ContactedObject::Collider(snappable.key),
                &other_frame,
                policy,
            )
        };

        let should_collide = body.roles.contains(BodyRoles::SNAPPER) && snappable.enabled;
        let contact = if should_collide {
            let policy = if snappable.one_way { ContactPolicy::CollideOneWay } else { ContactPolicy::Collide };
            let passes_through = snappable.one_way && body.state.did_push_down();
            match between(policy) {
                Some(c) if c.is_collision && !passes_through => Some(c),
                _ => between(ContactPolicy::Touch),
            }
        } else {
            between(ContactPolicy::Touch)
        };

        contact.map(|mut c| {
            c.other_sides = side_list(
                &snappable.geometry,
                snappable.position,
                snappable.proposed,
                &intersection,
                &body.frame(),
                snappable.was_on_slope,
            );
            c.other_intersection = intersection;
            c
        })
    }

    /// Tile-sized virtual frames just past each top edge of a snappable act as corner jumps.
    fn snappable_corner_jump(&self, body: &mut BodyDesc, movement: &ColliderMovement, snappable: &SnappableBody) {
        let Some(map) = &self.tile_map else { return };
        let state = &mut body.state;
        if state.on_corner_jump() || state.discards_corner_jump {
            return;
        }
        if !(body.roles.contains(BodyRoles::SNAPPER) && snappable.enabled) {
            return;
        }

        let frame = snappable.proposed_frame();
        let tile = map.tile_size();
        let y = frame.max_y() - tile.y + 1.0;
        let left = Rect::new(frame.min_x() - tile.x, y, tile.x, tile.y);
        let right = Rect::new(frame.max_x(), y, tile.x, tile.y);
        let Some(intersection) = movement
            .proposed_frame
            .intersection(&left)
            .or_else(|| movement.proposed_frame.intersection(&right))
        else {
            return;
        };

        let bottom = &movement.proposed_hit_points.bottom;
        if !(intersection.intersects(&bottom.left) || intersection.intersects(&bottom.right)) {
            return;
        }
        if state.was_on_corner_jump() {
            self.continue_corner_jump(state, movement.proposed_position);
        } else if state.was_on_ground() {
            begin_corner_jump(state, movement.proposed_position);
        } else {
            state.discards_corner_jump = true;
        }
    }

    /// Non-blocking contacts between enabled bodies whose categories were registered.
    /// Uses the resolved positions of this step.
    pub(crate) fn contacts_between_entities(&self, bodies: &[BodyDesc], contacts: &mut Vec<ContactContext>) {
        for (i, body) in bodies.iter().enumerate() {
            if body.roles.contains(BodyRoles::SNAPPABLE) || !body.enabled {
                continue;
            }
            for (j, other) in bodies.iter().enumerate() {
                if i == j || !other.enabled {
                    continue;
                }
                if !self.contact_tests.can_have_contact(body.category, other.category) {
                    continue;
                }
                let contacted = contacts.iter().any(|c| {
                    (c.collider == body.key && c.other == ContactedObject::Collider(other.key))
                        || (c.collider == other.key && c.other == ContactedObject::Collider(body.key))
                });
                if contacted {
                    continue;
                }
                if let Some(c) = entity_contact(body, other) {
                    contacts.push(c);
                }
            }
        }
    }
}

fn entity_contact(body: &BodyDesc, other: &BodyDesc) -> Option<ContactContext> {
    let movement = ColliderMovement::new(&body.geometry, body.position, body.proposed);
    let intersection = movement.proposed_frame.intersection(&other.proposed_frame())?;
    let mut contact = ContactContext::between(
        body.key,
        &body.geometry,
        body.state.was_on_slope(),
        &movement,
        intersection,
        ContactedObject::Collider(other.key),
        &other.frame(),
        ContactPolicy::Touch,
    )?;
    contact.other_sides = side_list(
        &other.geometry,
        other.position,
        other.proposed,
        &intersection,
        &body.frame(),
        other.state.was_on_slope(),
    );
    contact.other_intersection = intersection;
    Some(contact)
}
