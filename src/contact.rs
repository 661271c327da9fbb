//! Contact records produced by resolution and their step-to-step classification.

use std::collections::HashSet;

use glam::Vec2;
use smallvec::SmallVec;

use crate::api::ContactSidesApi;
use crate::collider::{ColliderGeometry, ColliderMovement};
use crate::narrowphase::{apply_offsets, ContactSides};
use crate::types::*;

pub type SideList = SmallVec<[ContactSide; 4]>;

/// What a collider touched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContactedObject {
    /// Ground or one-way tile.
    Tile,
    /// Cell without a descriptor (gaps, corner jumps).
    EmptyTile,
    /// Slope run, by id in the tile map.
    Slope(usize),
    Collider(ColKey),
}

/// How a pairwise test may affect the mover.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContactPolicy {
    /// Report only; never corrects.
    Touch,
    /// Blocking on every classified side.
    Collide,
    /// Blocking on the bottom side only.
    CollideOneWay,
}

/// One resolved pairwise interaction, from the mover's point of view.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactContext {
    pub collider: ColKey,
    pub other: ContactedObject,
    pub is_collision: bool,
    pub collider_sides: SideList,
    pub collider_intersection: Rect,
    /// Filled only when `other` is a collider.
    pub other_sides: SideList,
    pub other_intersection: Rect,
    pub proposed_position: Vec2,
}

/// Identity used to diff contacts across steps.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContactId {
    pub collider: ColKey,
    pub other: ContactedObject,
    pub is_collision: bool,
}

impl ContactContext {
    /// Classify the mover against `other_frame` and build a contact per `policy`.
    ///
    /// `Collide` with nothing classified yields a non-blocking `Unspecified` contact.
    /// `CollideOneWay` without a bottom side yields nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn between(
        collider: ColKey,
        geometry: &ColliderGeometry,
        was_on_slope: bool,
        movement: &ColliderMovement,
        intersection: Rect,
        other: ContactedObject,
        other_frame: &Rect,
        policy: ContactPolicy,
    ) -> Option<ContactContext> {
        let mut candidates = ContactSides::contact_sides(geometry, movement, &intersection, other_frame, was_on_slope);
        let proposed = movement.proposed_position;
        let build = |is_collision: bool, sides: SideList, proposed_position: Vec2| ContactContext {
            collider,
            other,
            is_collision,
            collider_sides: sides,
            collider_intersection: intersection,
            other_sides: SideList::new(),
            other_intersection: Rect::ZERO,
            proposed_position,
        };
        let sides_of = |c: &[ContactSideAndOffset]| c.iter().map(|c| c.side).collect::<SideList>();

        match policy {
            ContactPolicy::Touch => Some(build(false, sides_of(candidates.as_slice()), proposed)),
            ContactPolicy::Collide if candidates.is_empty() => {
                Some(build(false, SmallVec::from_slice(&[ContactSide::Unspecified]), proposed))
            }
            ContactPolicy::Collide => Some(build(true, sides_of(candidates.as_slice()), apply_offsets(proposed, &candidates))),
            ContactPolicy::CollideOneWay => {
                candidates.retain(|c| c.side == ContactSide::Bottom);
                if candidates.is_empty() {
                    return None;
                }
                Some(build(true, sides_of(candidates.as_slice()), apply_offsets(proposed, &candidates)))
            }
        }
    }

    pub fn id(&self) -> ContactId {
        ContactId { collider: self.collider, other: self.other, is_collision: self.is_collision }
    }

    pub fn is_unspecified(&self) -> bool {
        self.collider_sides.contains(&ContactSide::Unspecified)
    }

    pub fn involves(&self, key: ColKey) -> bool {
        self.collider == key || self.other == ContactedObject::Collider(key)
    }

    /// The mover's view.
    pub fn for_collider(&self) -> Contact {
        Contact {
            collider: self.collider,
            other: self.other,
            is_collision: self.is_collision,
            sides: self.collider_sides.clone(),
            intersection: self.collider_intersection,
            other_sides: self.other_sides.clone(),
            other_intersection: self.other_intersection,
        }
    }

    /// The other collider's view, with roles swapped. `None` unless the other party is a collider.
    pub fn for_other_collider(&self) -> Option<Contact> {
        let ContactedObject::Collider(other_key) = self.other else { return None };
        Some(Contact {
            collider: other_key,
            other: ContactedObject::Collider(self.collider),
            is_collision: self.is_collision,
            sides: self.other_sides.clone(),
            intersection: self.other_intersection,
            other_sides: self.collider_sides.clone(),
            other_intersection: self.collider_intersection,
        })
    }
}

/// A contact as seen by one party.
#[derive(Clone, Debug, PartialEq)]
pub struct Contact {
    pub collider: ColKey,
    pub other: ContactedObject,
    pub is_collision: bool,
    pub sides: SideList,
    pub intersection: Rect,
    pub other_sides: SideList,
    pub other_intersection: Rect,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContactPhase {
    New,
    Continuing,
    Finished,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub contact: Contact,
}

/// Keep the first context for each identity.
pub fn dedup_contacts(contacts: &mut Vec<ContactContext>) {
    let mut seen = HashSet::new();
    contacts.retain(|c| seen.insert(c.id()));
}

/// Diff `current` against `previous` and emit one event per party.
pub fn classify_contacts(previous: &[ContactContext], current: &[ContactContext]) -> Vec<ContactEvent> {
    let previous_ids: HashSet<ContactId> = previous.iter().map(ContactContext::id).collect();
    let current_ids: HashSet<ContactId> = current.iter().map(ContactContext::id).collect();
    let mut events = Vec::new();
    let mut emit = |phase: ContactPhase, ctx: &ContactContext| {
        events.push(ContactEvent { phase, contact: ctx.for_collider() });
        if let Some(contact) = ctx.for_other_collider() {
            events.push(ContactEvent { phase, contact });
        }
    };
    for ctx in current {
        let phase = if previous_ids.contains(&ctx.id()) { ContactPhase::Continuing } else { ContactPhase::New };
        emit(phase, ctx);
    }
    for ctx in previous.iter().filter(|c| !current_ids.contains(&c.id())) {
        emit(ContactPhase::Finished, ctx);
    }
    events
}
